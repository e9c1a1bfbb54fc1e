//! `gold_payer_performance`

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::contract::gold;
use crate::table::Table;
use crate::transform::{
    add_amount, assemble, empty_candidate, require_columns, TransformResult, DEFAULT_PAYER_NAME,
};
use crate::value::Value;

use super::{average, count, key, UNASSIGNED_PAYER_ID};

#[derive(Default)]
struct PayerTotals {
    claims: BTreeSet<String>,
    billed: Decimal,
    paid: Decimal,
    responsibility: Decimal,
}

/// Claim totals per payer, via each claim's patient
pub fn transform(claims: &Table, patients: &Table) -> TransformResult {
    tracing::info!(table = gold::PAYER_PERFORMANCE.name, "Starting aggregation");
    if claims.is_empty() || patients.is_empty() {
        return Ok(empty_candidate(
            &gold::PAYER_PERFORMANCE,
            gold::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        claims,
        "silver_claims_fact",
        &[
            "claim_id",
            "patient_id",
            "total_billed_amount",
            "total_paid_amount",
            "patient_responsibility_amount",
        ],
    )?;
    require_columns(patients, "silver_patients_dim", &["patient_id", "payer_id", "payer_name"])?;

    let mut payer_of: HashMap<String, (Option<String>, Option<String>)> = HashMap::new();
    for record in patients.records() {
        if let Some(patient_id) = key(record.get("patient_id")) {
            payer_of
                .entry(patient_id)
                .or_insert_with(|| (key(record.get("payer_id")), key(record.get("payer_name"))));
        }
    }

    let mut payers: BTreeMap<(String, String), PayerTotals> = BTreeMap::new();
    for record in claims.records() {
        let (payer_id, payer_name) = key(record.get("patient_id"))
            .and_then(|id| payer_of.get(&id).cloned())
            .unwrap_or_default();
        let group = payers
            .entry((
                payer_id.unwrap_or_else(|| UNASSIGNED_PAYER_ID.to_string()),
                payer_name.unwrap_or_else(|| DEFAULT_PAYER_NAME.to_string()),
            ))
            .or_default();

        if let Some(claim_id) = key(record.get("claim_id")) {
            group.claims.insert(claim_id);
        }
        let table = gold::PAYER_PERFORMANCE.name;
        add_amount(&mut group.billed, &record, table, "total_billed_amount")?;
        add_amount(&mut group.paid, &record, table, "total_paid_amount")?;
        add_amount(
            &mut group.responsibility,
            &record,
            table,
            "patient_responsibility_amount",
        )?;
    }

    let rows = payers
        .into_iter()
        .map(|((payer_id, payer_name), totals)| {
            let n = totals.claims.len();
            vec![
                Value::text(payer_id),
                Value::text(payer_name),
                count(n),
                Value::Number(totals.billed),
                Value::Number(totals.paid),
                Value::Number(average(totals.paid, n)),
                Value::Number(average(totals.responsibility, n)),
            ]
        })
        .collect();

    assemble(&gold::PAYER_PERFORMANCE, gold::PROCESSING_TIMESTAMP_COLUMN, rows, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold::test_support::{column, raw_table};

    #[test]
    fn test_unassigned_and_named_payers() {
        let patients = raw_table(
            &["patient_id", "payer_id", "payer_name"],
            &[
                &["p1", "A", "Plan A"],
                &["p2", "", "Self-Pay / Unspecified"],
            ],
        );
        let claims = raw_table(
            &[
                "claim_id",
                "patient_id",
                "total_billed_amount",
                "total_paid_amount",
                "patient_responsibility_amount",
            ],
            &[
                &["c1", "p1", "100", "80", "20"],
                &["c2", "p1", "50", "40", "10"],
                &["c3", "p2", "30", "0", "30"],
                &["c4", "ghost", "5", "0", "5"],
            ],
        );
        let out = transform(&claims, &patients).unwrap();

        assert_eq!(
            column(&out, "payer_id"),
            vec![Value::text("A"), Value::text("UNASSIGNED")]
        );
        assert_eq!(column(&out, "total_claims_count")[0], Value::Integer(2));
        assert_eq!(column(&out, "avg_paid_per_claim")[0], Value::Number(Decimal::from(60)));
        assert_eq!(column(&out, "total_claims_count")[1], Value::Integer(2));
        assert_eq!(
            column(&out, "avg_patient_responsibility")[1],
            Value::Number(Decimal::new(175, 1))
        );
        assert_eq!(
            column(&out, "payer_name")[1],
            Value::text(DEFAULT_PAYER_NAME)
        );
    }

    #[test]
    fn test_total_past_decimal_range_fails_table() {
        let patients = raw_table(
            &["patient_id", "payer_id", "payer_name"],
            &[&["p1", "A", "Plan A"]],
        );
        let claims = raw_table(
            &[
                "claim_id",
                "patient_id",
                "total_billed_amount",
                "total_paid_amount",
                "patient_responsibility_amount",
            ],
            &[
                &["c1", "p1", "70000000000000000000000000000", "0", "0"],
                &["c2", "p1", "70000000000000000000000000000", "0", "0"],
            ],
        );
        let err = transform(&claims, &patients).unwrap_err();
        assert_eq!(
            err,
            crate::error::TransformError::overflow(
                "gold_payer_performance",
                "total_billed_amount"
            )
        );
    }
}
