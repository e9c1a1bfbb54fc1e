//! `gold_encounter_summary`

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::contract::gold;
use crate::table::Table;
use crate::transform::{
    absent_columns, assemble, checked_total, empty_candidate, require_columns,
    TransformContext, TransformResult,
};
use crate::value::Value;

use super::key;

/// Encounters with the billed total of the patient's claims that started
/// during the stay.
///
/// The stay runs from `encounter_date` to `discharge_date` inclusive; open
/// stays end at the processing timestamp.
pub fn transform(
    encounters: &Table,
    claims: &Table,
    context: &TransformContext,
) -> TransformResult {
    tracing::info!(table = gold::ENCOUNTER_SUMMARY.name, "Starting aggregation");
    if encounters.is_empty() || claims.is_empty() {
        return Ok(empty_candidate(
            &gold::ENCOUNTER_SUMMARY,
            gold::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        encounters,
        "silver_encounters_fact",
        &[
            "encounter_id",
            "patient_id",
            "encounter_date",
            "discharge_date",
            "length_of_stay_days",
        ],
    )?;
    require_columns(
        claims,
        "silver_claims_fact",
        &["patient_id", "claim_start_date", "total_billed_amount"],
    )?;
    let absent = absent_columns(encounters, &["provider_id", "encounter_type"]);

    let mut claims_by_patient: HashMap<String, Vec<(NaiveDateTime, Decimal)>> = HashMap::new();
    for record in claims.records() {
        if let (Some(patient_id), Some(start)) = (
            key(record.get("patient_id")),
            record.get("claim_start_date").to_timestamp(),
        ) {
            claims_by_patient
                .entry(patient_id)
                .or_default()
                .push((start, record.get("total_billed_amount").to_decimal_or_zero()));
        }
    }

    let mut rows = Vec::with_capacity(encounters.len());
    for record in encounters.records() {
        let start = record.get("encounter_date").to_timestamp();
        let discharge = record.get("discharge_date").to_timestamp();
        let end = discharge.unwrap_or(context.processing_timestamp);

        let mut billed = Decimal::ZERO;
        if let (Some(start), Some(patient_id)) = (start, key(record.get("patient_id"))) {
            for (_, amount) in claims_by_patient
                .get(&patient_id)
                .into_iter()
                .flatten()
                .filter(|(claim_start, _)| *claim_start >= start && *claim_start <= end)
            {
                billed = checked_total(
                    billed,
                    *amount,
                    gold::ENCOUNTER_SUMMARY.name,
                    "total_billed_amount_encounter",
                )?;
            }
        }

        rows.push(vec![
            record.get("encounter_id").clone(),
            record.get("patient_id").clone(),
            Value::from(start),
            Value::from(discharge),
            record.get("provider_id").clone(),
            record.get("encounter_type").clone(),
            record.get("length_of_stay_days").clone(),
            Value::Number(billed),
        ]);
    }

    assemble(
        &gold::ENCOUNTER_SUMMARY,
        gold::PROCESSING_TIMESTAMP_COLUMN,
        rows,
        &absent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold::test_support::{at, column, raw_table};

    #[test]
    fn test_claims_inside_stay_are_summed() {
        let encounters = raw_table(
            &[
                "encounter_id",
                "patient_id",
                "encounter_date",
                "discharge_date",
                "provider_id",
                "encounter_type",
                "length_of_stay_days",
            ],
            &[
                &["e1", "p1", "2024-01-01", "2024-01-05", "d1", "INPATIENT", "4"],
                &["e2", "p1", "2024-03-01", "", "d1", "EMERGENCY", "0"],
                &["e3", "p2", "2024-01-01", "2024-01-02", "d2", "AMBULATORY", "1"],
            ],
        );
        let claims = raw_table(
            &["patient_id", "claim_start_date", "total_billed_amount"],
            &[
                &["p1", "2024-01-05", "100"],
                &["p1", "2024-01-06", "999"],
                &["p1", "2024-03-15", "40"],
                &["p1", "2024-06-01", "7"],
            ],
        );
        let context = TransformContext::new(at(2024, 4, 1));
        let out = transform(&encounters, &claims, &context).unwrap();

        assert_eq!(
            column(&out, "total_billed_amount_encounter"),
            vec![
                Value::Number(Decimal::from(100)),
                Value::Number(Decimal::from(40)),
                Value::Number(Decimal::ZERO),
            ]
        );
        assert_eq!(column(&out, "encounter_date")[0], Value::Timestamp(at(2024, 1, 1)));
        assert!(column(&out, "discharge_date")[1].is_missing());
    }
}
