//! `silver_payers_dim`

use crate::contract::silver;
use crate::table::Table;

use super::{assemble, empty_candidate, require_columns, TransformResult};

/// Project payers to id and name, dropping incomplete rows
pub fn transform(payers: &Table) -> TransformResult {
    tracing::info!(table = silver::PAYERS.name, "Starting transform");
    if payers.is_empty() {
        return Ok(empty_candidate(&silver::PAYERS, silver::PROCESSING_TIMESTAMP_COLUMN));
    }
    require_columns(payers, "payers", &["payer_id", "payer_name"])?;

    let rows: Vec<_> = payers
        .records()
        .filter(|r| !r.get("payer_id").is_missing() && !r.get("payer_name").is_missing())
        .map(|r| vec![r.get("payer_id").clone(), r.get("payer_name").clone()])
        .collect();

    assemble(&silver::PAYERS, silver::PROCESSING_TIMESTAMP_COLUMN, rows, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::raw_table;

    #[test]
    fn test_projects_and_drops_nulls() {
        let input = raw_table(
            &["payer_id", "payer_name", "city"],
            &[&["A", "Plan A", "x"], &["B", "", "y"], &["", "Plan C", "z"]],
        );
        let out = transform(&input).unwrap();
        assert_eq!(out.columns(), &["payer_id", "payer_name"]);
        assert_eq!(out.len(), 1);
    }
}
