//! `gold_procedure_analysis`

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::contract::gold;
use crate::table::Table;
use crate::transform::{add_amount, assemble, empty_candidate, require_columns, TransformResult};
use crate::value::Value;

use super::{average, count, key};

/// Transaction type counted as a billed procedure
pub const CHARGE: &str = "CHARGE";

#[derive(Default)]
struct Procedure {
    transactions: BTreeSet<String>,
    total: Decimal,
}

/// Charge volume per procedure code, largest total first
pub fn transform(transactions: &Table) -> TransformResult {
    tracing::info!(table = gold::PROCEDURE_ANALYSIS.name, "Starting aggregation");
    if transactions.is_empty() {
        return Ok(empty_candidate(
            &gold::PROCEDURE_ANALYSIS,
            gold::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        transactions,
        "silver_claims_transactions_fact",
        &["transaction_id", "transaction_amount", "procedure_code", "transaction_type"],
    )?;

    let mut procedures: BTreeMap<String, Procedure> = BTreeMap::new();
    for record in transactions.records() {
        if record.get("transaction_type").as_str() != Some(CHARGE) {
            continue;
        }
        let Some(code) = key(record.get("procedure_code")) else {
            continue;
        };
        let procedure = procedures.entry(code).or_default();
        if let Some(id) = key(record.get("transaction_id")) {
            procedure.transactions.insert(id);
        }
        add_amount(
            &mut procedure.total,
            &record,
            gold::PROCEDURE_ANALYSIS.name,
            "transaction_amount",
        )?;
    }

    let mut ranked: Vec<(String, Procedure)> = procedures.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    let rows = ranked
        .into_iter()
        .map(|(code, procedure)| {
            let n = procedure.transactions.len();
            vec![
                Value::text(code),
                count(n),
                Value::Number(procedure.total),
                Value::Number(average(procedure.total, n)),
            ]
        })
        .collect();

    assemble(&gold::PROCEDURE_ANALYSIS, gold::PROCESSING_TIMESTAMP_COLUMN, rows, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold::test_support::{column, raw_table};

    #[test]
    fn test_charges_ranked_by_total() {
        let transactions = raw_table(
            &["transaction_id", "transaction_amount", "procedure_code", "transaction_type"],
            &[
                &["t1", "10", "A", "CHARGE"],
                &["t2", "30", "B", "CHARGE"],
                &["t3", "500", "A", "PAYMENT"],
                &["t4", "10", "C", "CHARGE"],
                &["t5", "5", "", "CHARGE"],
                &["t6", "20", "A", "CHARGE"],
            ],
        );
        let out = transform(&transactions).unwrap();

        assert_eq!(
            column(&out, "procedure_code"),
            vec![Value::text("A"), Value::text("B"), Value::text("C")]
        );
        assert_eq!(column(&out, "transaction_count")[0], Value::Integer(2));
        assert_eq!(column(&out, "avg_amount")[0], Value::Number(Decimal::from(15)));
    }
}
