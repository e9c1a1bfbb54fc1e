//! `silver_claims_fact`: claims with financial totals from their transactions

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::contract::silver;
use crate::error::TransformError;
use crate::table::Table;
use crate::value::Value;

use super::{
    absent_columns, add_amount, assemble, empty_candidate, require_columns, TransformResult,
};

#[derive(Debug, Default, Clone, Copy)]
struct Financials {
    billed: Decimal,
    paid: Decimal,
    outstanding: Decimal,
}

/// Build the claims fact.
///
/// Billed, paid and patient-responsibility totals are the sums of the
/// matching transactions' `transaction_amount`, `payments` and `outstanding`.
/// Non-numeric amounts count as zero; claims without transactions total zero.
/// A total past the decimal range fails the table with
/// [`TransformError::Overflow`].
pub fn transform(claims: &Table, transactions: &Table) -> TransformResult {
    tracing::info!(table = silver::CLAIMS.name, "Starting transform");
    if claims.is_empty() {
        return Ok(empty_candidate(&silver::CLAIMS, silver::PROCESSING_TIMESTAMP_COLUMN));
    }
    require_columns(claims, "claims", &["claim_id", "patient_id", "claim_start_date"])?;
    let absent = absent_columns(claims, &["provider_id", "claim_end_date"]);

    let financials = financials_by_claim(transactions)?;

    let mut rows = Vec::with_capacity(claims.len());
    for record in claims.records() {
        let claim_id = record.get("claim_id");
        let patient_id = record.get("patient_id");
        let Some(start) = record.get("claim_start_date").to_timestamp() else {
            continue;
        };
        if claim_id.is_missing() || patient_id.is_missing() {
            continue;
        }

        let totals = claim_id
            .as_str()
            .and_then(|id| financials.get(id))
            .copied()
            .unwrap_or_default();

        rows.push(vec![
            claim_id.clone(),
            patient_id.clone(),
            record.get("provider_id").clone(),
            Value::Timestamp(start),
            Value::from(record.get("claim_end_date").to_timestamp()),
            Value::Number(totals.billed),
            Value::Number(totals.paid),
            Value::Number(totals.outstanding),
        ]);
    }

    tracing::debug!(
        dropped = claims.len() - rows.len(),
        "Dropped claims missing id, patient or start date"
    );
    assemble(&silver::CLAIMS, silver::PROCESSING_TIMESTAMP_COLUMN, rows, &absent)
}

fn financials_by_claim(
    transactions: &Table,
) -> Result<HashMap<String, Financials>, TransformError> {
    let mut totals: HashMap<String, Financials> = HashMap::new();
    if transactions.is_empty() {
        return Ok(totals);
    }
    require_columns(
        transactions,
        "claims_transactions",
        &["claim_id", "transaction_amount", "payments", "outstanding"],
    )?;

    for record in transactions.records() {
        let Some(claim_id) = record.get("claim_id").as_str() else {
            continue;
        };
        let entry = totals.entry(claim_id.to_string()).or_default();
        let table = silver::CLAIMS.name;
        add_amount(&mut entry.billed, &record, table, "transaction_amount")?;
        add_amount(&mut entry.paid, &record, table, "payments")?;
        add_amount(&mut entry.outstanding, &record, table, "outstanding")?;
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::{at, column, raw_table};

    fn claims() -> Table {
        raw_table(
            &["claim_id", "patient_id", "provider_id", "claim_start_date", "claim_end_date"],
            &[
                &["c1", "p1", "dr1", "2024-01-05", "2024-01-06"],
                &["c2", "p1", "", "2024-02-01 10:30:00", "garbage"],
                &["c3", "p2", "dr2", "not a date", ""],
                &["", "p2", "dr2", "2024-01-01", ""],
            ],
        )
    }

    #[test]
    fn test_sums_matching_transactions() {
        let transactions = raw_table(
            &["transaction_id", "claim_id", "transaction_amount", "payments", "outstanding"],
            &[
                &["t1", "c1", "100.50", "80", "20.50"],
                &["t2", "c1", "49.50", "n/a", "0"],
                &["t3", "other", "999", "999", "999"],
            ],
        );
        let out = transform(&claims(), &transactions).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(column(&out, "total_billed_amount")[0], Value::Number(Decimal::from(150)));
        assert_eq!(column(&out, "total_paid_amount")[0], Value::Number(Decimal::from(80)));
        assert_eq!(
            column(&out, "patient_responsibility_amount")[0],
            Value::Number(Decimal::new(2050, 2))
        );
        assert_eq!(column(&out, "claim_start_date")[0], Value::Timestamp(at(2024, 1, 5)));
        assert!(column(&out, "claim_end_date")[1].is_missing());
    }

    #[test]
    fn test_claim_without_transactions_totals_zero() {
        let out = transform(&claims(), &Table::default()).unwrap();
        for name in ["total_billed_amount", "total_paid_amount", "patient_responsibility_amount"] {
            assert!(column(&out, name)
                .iter()
                .all(|v| *v == Value::Number(Decimal::ZERO)));
        }
    }

    #[test]
    fn test_absent_optional_column_not_projected() {
        let input = raw_table(
            &["claim_id", "patient_id", "claim_start_date", "claim_end_date"],
            &[&["c1", "p1", "2024-01-05", ""]],
        );
        let out = transform(&input, &Table::default()).unwrap();
        assert!(!out.has_column("provider_id"));
        assert!(out.has_column("total_paid_amount"));
    }

    #[test]
    fn test_total_past_decimal_range_fails_table() {
        let huge = "70000000000000000000000000000";
        let transactions = raw_table(
            &["transaction_id", "claim_id", "transaction_amount", "payments", "outstanding"],
            &[&["t1", "c1", huge, "0", "0"], &["t2", "c1", huge, "0", "0"]],
        );
        let err = transform(&claims(), &transactions).unwrap_err();
        assert_eq!(
            err,
            TransformError::overflow("silver_claims_fact", "transaction_amount")
        );
    }

    #[test]
    fn test_transactions_need_financial_columns() {
        let transactions = raw_table(&["claim_id", "transaction_amount"], &[&["c1", "1"]]);
        assert!(transform(&claims(), &transactions).is_err());
    }
}
