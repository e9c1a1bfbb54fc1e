//! `silver_claims_transactions_fact`

use crate::contract::silver;
use crate::table::Table;
use crate::value::Value;

use super::{
    absent_columns, assemble, empty_candidate, require_columns, upper_or, TransformResult,
};

pub fn transform(transactions: &Table) -> TransformResult {
    tracing::info!(table = silver::CLAIMS_TRANSACTIONS.name, "Starting transform");
    if transactions.is_empty() {
        return Ok(empty_candidate(
            &silver::CLAIMS_TRANSACTIONS,
            silver::PROCESSING_TIMESTAMP_COLUMN,
        ));
    }
    require_columns(
        transactions,
        "claims_transactions",
        &["transaction_id", "claim_id", "transaction_date", "transaction_amount", "type"],
    )?;
    let absent = absent_columns(transactions, &["procedure_code"]);

    let mut rows = Vec::with_capacity(transactions.len());
    for record in transactions.records() {
        let transaction_id = record.get("transaction_id");
        let claim_id = record.get("claim_id");
        let Some(date) = record.get("transaction_date").to_timestamp() else {
            continue;
        };
        if transaction_id.is_missing() || claim_id.is_missing() {
            continue;
        }

        rows.push(vec![
            transaction_id.clone(),
            claim_id.clone(),
            Value::Timestamp(date),
            Value::Number(record.get("transaction_amount").to_decimal_or_zero()),
            record.get("procedure_code").clone(),
            upper_or(record.get("type"), None),
        ]);
    }

    tracing::debug!(
        dropped = transactions.len() - rows.len(),
        "Dropped transactions missing id, claim or date"
    );
    assemble(
        &silver::CLAIMS_TRANSACTIONS,
        silver::PROCESSING_TIMESTAMP_COLUMN,
        rows,
        &absent,
    )
}
