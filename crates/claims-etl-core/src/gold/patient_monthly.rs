//! `gold_patient_monthly_summary`

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::contract::gold;
use crate::table::Table;
use crate::transform::{add_amount, assemble, empty_candidate, require_columns, TransformResult};
use crate::value::Value;

use super::{average, count, key};

#[derive(Default)]
struct Month {
    claims: BTreeSet<String>,
    billed: Decimal,
    paid: Decimal,
}

/// Claims per patient per calendar month of `claim_start_date`
pub fn transform(patients: &Table, claims: &Table) -> TransformResult {
    tracing::info!(table = gold::PATIENT_MONTHLY_SUMMARY.name, "Starting aggregation");
    if patients.is_empty() || claims.is_empty() {
        return Ok(empty_candidate(
            &gold::PATIENT_MONTHLY_SUMMARY,
            gold::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(patients, "silver_patients_dim", &["patient_id", "first_name", "last_name"])?;
    require_columns(
        claims,
        "silver_claims_fact",
        &[
            "claim_id",
            "patient_id",
            "claim_start_date",
            "total_billed_amount",
            "total_paid_amount",
        ],
    )?;

    let mut months: BTreeMap<(String, String), Month> = BTreeMap::new();
    for record in claims.records() {
        let (Some(patient_id), Some(start)) = (
            key(record.get("patient_id")),
            record.get("claim_start_date").to_timestamp(),
        ) else {
            continue;
        };
        let month = months
            .entry((patient_id, start.format("%Y-%m").to_string()))
            .or_default();
        if let Some(claim_id) = key(record.get("claim_id")) {
            month.claims.insert(claim_id);
        }
        let table = gold::PATIENT_MONTHLY_SUMMARY.name;
        add_amount(&mut month.billed, &record, table, "total_billed_amount")?;
        add_amount(&mut month.paid, &record, table, "total_paid_amount")?;
    }

    let mut names: HashMap<String, (Value, Value)> = HashMap::new();
    for record in patients.records() {
        if let Some(patient_id) = key(record.get("patient_id")) {
            names.entry(patient_id).or_insert_with(|| {
                (record.get("first_name").clone(), record.get("last_name").clone())
            });
        }
    }

    let rows = months
        .into_iter()
        .map(|((patient_id, year_month), month)| {
            let (first_name, last_name) = names.get(&patient_id).cloned().unwrap_or_default();
            vec![
                Value::text(patient_id),
                first_name,
                last_name,
                Value::text(year_month),
                count(month.claims.len()),
                Value::Number(month.billed),
                Value::Number(month.paid),
                Value::Number(average(month.billed, month.claims.len())),
            ]
        })
        .collect();

    assemble(
        &gold::PATIENT_MONTHLY_SUMMARY,
        gold::PROCESSING_TIMESTAMP_COLUMN,
        rows,
        &[],
    )
}
