//! `silver_patients_dim`: cleaned patients enriched with their latest payer

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::contract::silver;
use crate::error::TransformError;
use crate::table::Table;
use crate::value::Value;

use super::{
    age_in_years, assemble, empty_candidate, require_columns, title_case, TransformContext,
    TransformResult, DEFAULT_PAYER_NAME, DEFAULT_STRING,
};

const REQUIRED: [&str; 4] = ["patient_id", "date_of_birth", "first_name", "last_name"];

/// Build the patient dimension.
///
/// Each patient's payer comes from their encounter with the greatest
/// `(encounter_date, encounter_id)`; encounters without a usable date are
/// ignored. Without a payer table every patient is self-pay with no payer id.
pub fn transform(
    patients: &Table,
    encounters: &Table,
    payers: &Table,
    context: &TransformContext,
) -> TransformResult {
    tracing::info!(table = silver::PATIENTS.name, "Starting transform");
    if patients.is_empty() {
        return Ok(empty_candidate(
            &silver::PATIENTS,
            silver::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(patients, "patients", &REQUIRED)?;
    require_columns(patients, "patients", &["gender"])?;

    let latest_payer = latest_payer_by_patient(encounters)?;
    let payer_names = if payers.is_empty() {
        None
    } else {
        Some(payer_names(payers)?)
    };

    let mut rows = Vec::with_capacity(patients.len());
    for record in patients.records() {
        if REQUIRED.iter().any(|c| record.get(c).is_missing()) {
            continue;
        }

        let patient_id = record.get("patient_id");
        let date_of_birth = record.get("date_of_birth").to_timestamp();
        let age = date_of_birth.map(|dob| age_in_years(dob, context.processing_timestamp));

        let (payer_id, payer_name) = match &payer_names {
            Some(names) => {
                let payer_id = patient_id
                    .as_str()
                    .and_then(|id| latest_payer.get(id))
                    .cloned()
                    .unwrap_or_default();
                let payer_name = payer_id
                    .as_str()
                    .and_then(|id| names.get(id))
                    .cloned()
                    .unwrap_or_else(|| Value::text(DEFAULT_PAYER_NAME));
                (payer_id, payer_name)
            }
            None => (Value::Missing, Value::text(DEFAULT_PAYER_NAME)),
        };

        rows.push(vec![
            patient_id.clone(),
            title_cased(record.get("first_name")),
            title_cased(record.get("last_name")),
            Value::from(date_of_birth),
            normalize_gender(record.get("gender")),
            Value::from(age),
            payer_id,
            payer_name,
        ]);
    }

    tracing::debug!(
        dropped = patients.len() - rows.len(),
        "Dropped patients missing id, name or date of birth"
    );
    assemble(&silver::PATIENTS, silver::PROCESSING_TIMESTAMP_COLUMN, rows, &[])
}

/// Map raw gender codes to curated values. Unrecognized values pass through.
pub fn normalize_gender(value: &Value) -> Value {
    match value.as_str() {
        None => Value::text(DEFAULT_STRING),
        Some("M") => Value::text("Male"),
        Some("F") => Value::text("Female"),
        Some("O") => Value::text("Other"),
        Some(_) => value.clone(),
    }
}

fn title_cased(value: &Value) -> Value {
    match value.as_str() {
        Some(text) => Value::text(title_case(text)),
        None => Value::Missing,
    }
}

/// Payer id of each patient's latest dated encounter
fn latest_payer_by_patient(
    encounters: &Table,
) -> Result<HashMap<String, Value>, TransformError> {
    if encounters.is_empty() {
        return Ok(HashMap::new());
    }
    require_columns(
        encounters,
        "encounters",
        &["encounter_id", "patient_id", "payer_id", "encounter_date"],
    )?;

    let mut latest: HashMap<String, ((NaiveDateTime, String), Value)> = HashMap::new();
    for record in encounters.records() {
        let (Some(patient_id), Some(date)) = (
            record.get("patient_id").as_str(),
            record.get("encounter_date").to_timestamp(),
        ) else {
            continue;
        };
        let key = (
            date,
            record.get("encounter_id").to_text().unwrap_or_default(),
        );

        match latest.get(patient_id) {
            Some((current, _)) if *current >= key => {}
            _ => {
                latest.insert(
                    patient_id.to_string(),
                    (key, record.get("payer_id").clone()),
                );
            }
        }
    }

    Ok(latest
        .into_iter()
        .map(|(patient, (_, payer))| (patient, payer))
        .collect())
}

/// Payer names by id; the first complete row for an id wins
fn payer_names(payers: &Table) -> Result<HashMap<String, Value>, TransformError> {
    require_columns(payers, "payers", &["payer_id", "payer_name"])?;

    let mut names = HashMap::new();
    for record in payers.records() {
        let name = record.get("payer_name");
        if name.is_missing() {
            continue;
        }
        if let Some(id) = record.get("payer_id").as_str() {
            names.entry(id.to_string()).or_insert_with(|| name.clone());
        }
    }
    Ok(names)
}
