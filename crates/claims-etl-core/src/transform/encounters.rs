//! `silver_encounters_fact`: encounters with derived length of stay

use crate::contract::silver;
use crate::table::Table;
use crate::value::Value;

use super::{
    absent_columns, assemble, empty_candidate, require_columns, upper_or, whole_days,
    TransformResult, DEFAULT_STRING,
};

/// Build the encounters fact.
///
/// `length_of_stay_days` is the floored number of days from encounter to
/// discharge, clamped at zero; a missing discharge yields zero.
pub fn transform(encounters: &Table) -> TransformResult {
    tracing::info!(table = silver::ENCOUNTERS.name, "Starting transform");
    if encounters.is_empty() {
        return Ok(empty_candidate(
            &silver::ENCOUNTERS,
            silver::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        encounters,
        "encounters",
        &[
            "encounter_id",
            "patient_id",
            "encounter_date",
            "discharge_date",
            "encounter_type",
            "total_claim_cost",
            "payer_coverage",
        ],
    )?;
    let absent = absent_columns(encounters, &["provider_id", "payer_id"]);

    let mut rows = Vec::with_capacity(encounters.len());
    for record in encounters.records() {
        let encounter_id = record.get("encounter_id");
        let patient_id = record.get("patient_id");
        let Some(start) = record.get("encounter_date").to_timestamp() else {
            continue;
        };
        if encounter_id.is_missing() || patient_id.is_missing() {
            continue;
        }

        let discharge = record.get("discharge_date").to_timestamp();
        let length_of_stay = discharge
            .map(|end| whole_days(start, end).max(0))
            .unwrap_or(0);

        rows.push(vec![
            encounter_id.clone(),
            patient_id.clone(),
            record.get("provider_id").clone(),
            record.get("payer_id").clone(),
            Value::Timestamp(start),
            Value::from(discharge),
            upper_or(record.get("encounter_type"), Some(DEFAULT_STRING)),
            Value::Integer(length_of_stay),
            Value::Number(record.get("total_claim_cost").to_decimal_or_zero()),
            Value::Number(record.get("payer_coverage").to_decimal_or_zero()),
        ]);
    }

    tracing::debug!(
        dropped = encounters.len() - rows.len(),
        "Dropped encounters missing id, patient or date"
    );
    assemble(&silver::ENCOUNTERS, silver::PROCESSING_TIMESTAMP_COLUMN, rows, &absent)
}
