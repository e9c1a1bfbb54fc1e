//! `gold_provider_activity_summary`

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::contract::gold;
use crate::table::Table;
use crate::transform::{add_amount, assemble, empty_candidate, require_columns, TransformResult};
use crate::value::Value;

use super::{average, count, key};

#[derive(Default)]
struct Provider {
    patients: BTreeSet<String>,
    encounters: BTreeSet<String>,
    billed: Decimal,
}

/// Encounter volume per provider, largest billed total first
pub fn transform(encounters: &Table) -> TransformResult {
    tracing::info!(table = gold::PROVIDER_ACTIVITY.name, "Starting aggregation");
    if encounters.is_empty() {
        return Ok(empty_candidate(
            &gold::PROVIDER_ACTIVITY,
            gold::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        encounters,
        "silver_encounters_fact",
        &["provider_id", "patient_id", "encounter_id", "total_claim_cost"],
    )?;

    let mut providers: BTreeMap<String, Provider> = BTreeMap::new();
    for record in encounters.records() {
        let Some(provider_id) = key(record.get("provider_id")) else {
            continue;
        };
        let provider = providers.entry(provider_id).or_default();
        if let Some(patient_id) = key(record.get("patient_id")) {
            provider.patients.insert(patient_id);
        }
        if let Some(encounter_id) = key(record.get("encounter_id")) {
            provider.encounters.insert(encounter_id);
        }
        add_amount(
            &mut provider.billed,
            &record,
            gold::PROVIDER_ACTIVITY.name,
            "total_claim_cost",
        )?;
    }

    let mut ranked: Vec<(String, Provider)> = providers.into_iter().collect();
    ranked.sort_by(|a, b| b.1.billed.cmp(&a.1.billed));

    let rows = ranked
        .into_iter()
        .map(|(provider_id, provider)| {
            vec![
                Value::text(provider_id),
                count(provider.patients.len()),
                count(provider.encounters.len()),
                Value::Number(provider.billed),
                Value::Number(average(provider.billed, provider.encounters.len())),
            ]
        })
        .collect();

    assemble(&gold::PROVIDER_ACTIVITY, gold::PROCESSING_TIMESTAMP_COLUMN, rows, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold::test_support::{column, raw_table};

    #[test]
    fn test_counts_distinct_patients_and_encounters() {
        let encounters = raw_table(
            &["encounter_id", "patient_id", "provider_id", "total_claim_cost"],
            &[
                &["e1", "p1", "d1", "100"],
                &["e2", "p1", "d1", "50"],
                &["e3", "p2", "d1", "30"],
                &["e4", "p3", "d2", "500"],
                &["e5", "p3", "", "1000"],
            ],
        );
        let out = transform(&encounters).unwrap();

        assert_eq!(
            column(&out, "provider_id"),
            vec![Value::text("d2"), Value::text("d1")]
        );
        assert_eq!(column(&out, "total_patients_seen")[1], Value::Integer(2));
        assert_eq!(column(&out, "total_encounters")[1], Value::Integer(3));
        assert_eq!(
            column(&out, "avg_billed_per_encounter")[1],
            Value::Number(Decimal::new(60, 0))
        );
    }
}
