//! Silver transforms
//!
//! One pure function per Silver table. Each takes the Bronze source tables it
//! needs and returns a candidate table whose columns follow the target
//! contract's order, minus the processing timestamp which the
//! [`LayerRunner`](crate::pipeline::LayerRunner) stamps at load time.
//!
//! Shared policy:
//!
//! - an empty primary source short-circuits to an empty candidate;
//! - a source column the transform reads must exist, otherwise
//!   [`TransformError::MissingColumn`];
//! - optional pass-through columns absent from the source are left out of the
//!   candidate so the validator reports them.

pub mod claims;
pub mod encounters;
pub mod patients;
pub mod payers;
pub mod transactions;

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::contract::{silver, TableContract};
use crate::error::TransformError;
use crate::table::{Record, Table};
use crate::value::Value;

/// Payer name used when no payer can be attached to a patient
pub const DEFAULT_PAYER_NAME: &str = "Self-Pay / Unspecified";

/// Fill value for missing categorical fields
pub const DEFAULT_STRING: &str = "Unknown";

/// Result of a single transform
pub type TransformResult = Result<Table, TransformError>;

/// Run-wide inputs shared by every transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformContext {
    /// Fixed reference time of the run; age and open-ended intervals use it
    pub processing_timestamp: NaiveDateTime,
}

impl TransformContext {
    pub fn new(processing_timestamp: NaiveDateTime) -> Self {
        Self { processing_timestamp }
    }
}

/// The five Bronze source tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BronzeTables {
    pub patients: Table,
    pub claims: Table,
    pub claims_transactions: Table,
    pub encounters: Table,
    pub payers: Table,
}

impl BronzeTables {
    /// Source table names in the Bronze schema, in extraction order
    pub const SOURCES: [&'static str; 5] = [
        "bronze_patients",
        "bronze_claims",
        "bronze_claims_transactions",
        "bronze_encounters",
        "bronze_payers",
    ];
}

/// Run every Silver transform, in load order
pub fn transform_all(
    bronze: &BronzeTables,
    context: &TransformContext,
) -> Vec<(&'static TableContract, TransformResult)> {
    vec![
        (
            &silver::PATIENTS,
            patients::transform(&bronze.patients, &bronze.encounters, &bronze.payers, context),
        ),
        (
            &silver::CLAIMS,
            claims::transform(&bronze.claims, &bronze.claims_transactions),
        ),
        (
            &silver::CLAIMS_TRANSACTIONS,
            transactions::transform(&bronze.claims_transactions),
        ),
        (&silver::ENCOUNTERS, encounters::transform(&bronze.encounters)),
        (&silver::PAYERS, payers::transform(&bronze.payers)),
    ]
}

/// Fail with [`TransformError::MissingColumn`] unless every column exists
pub fn require_columns(table: &Table, source: &str, columns: &[&str]) -> Result<(), TransformError> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(column) => Err(TransformError::missing_column(source, *column)),
        None => Ok(()),
    }
}

/// Add the decimal value of `column` to `total`, reading non-numeric cells as
/// zero. Fails with [`TransformError::Overflow`] instead of wrapping.
pub(crate) fn add_amount(
    total: &mut Decimal,
    record: &Record<'_>,
    table: &str,
    column: &str,
) -> Result<(), TransformError> {
    *total = checked_total(*total, record.get(column).to_decimal_or_zero(), table, column)?;
    Ok(())
}

/// `total + amount`, or [`TransformError::Overflow`]
pub(crate) fn checked_total(
    total: Decimal,
    amount: Decimal,
    table: &str,
    column: &str,
) -> Result<Decimal, TransformError> {
    total
        .checked_add(amount)
        .ok_or_else(|| TransformError::overflow(table, column))
}

/// Pass-through columns the source does not carry
pub(crate) fn absent_columns(source: &Table, candidates: &[&'static str]) -> Vec<&'static str> {
    candidates
        .iter()
        .copied()
        .filter(|c| !source.has_column(c))
        .collect()
}

/// Empty candidate with the contract's columns
pub(crate) fn empty_candidate(contract: &TableContract, stamp_column: &str) -> Table {
    Table::with_columns(contract.column_names_without(stamp_column))
}

/// Build a candidate from rows in contract order, dropping absent columns
pub(crate) fn assemble(
    contract: &TableContract,
    stamp_column: &str,
    rows: Vec<Vec<Value>>,
    absent: &[&str],
) -> TransformResult {
    let columns = contract.column_names_without(stamp_column);
    let table = Table::from_rows(columns.iter().copied(), rows)
        .map_err(|e| TransformError::table(contract.name, e))?;

    if absent.is_empty() {
        return Ok(table);
    }

    let kept: Vec<&str> = columns.into_iter().filter(|c| !absent.contains(c)).collect();
    Ok(table.project(&kept))
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Whole days from `from` to `to`, rounded toward negative infinity
pub fn whole_days(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}

/// Age in completed years: whole days divided by 365.25, truncated
pub fn age_in_years(date_of_birth: NaiveDateTime, at: NaiveDateTime) -> i64 {
    let days = Decimal::from(whole_days(date_of_birth, at));
    (days / Decimal::new(36525, 2))
        .trunc()
        .to_i64()
        .unwrap_or_default()
}

/// Upper-cased text, or the fallback when missing
pub(crate) fn upper_or(value: &Value, fallback: Option<&str>) -> Value {
    match value.as_str() {
        Some(text) => Value::text(text.to_uppercase()),
        None => fallback.map(|f| Value::text(f.to_uppercase())).unwrap_or(Value::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mARIA da silva"), "Maria Da Silva");
        assert_eq!(title_case("o'neil-SMITH"), "O'Neil-Smith");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_whole_days_floors() {
        assert_eq!(whole_days(at(2024, 1, 10), at(2024, 1, 8)), -2);
        let late = at(2024, 1, 1).date().and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(whole_days(late, at(2024, 1, 2)), 0);
        assert_eq!(whole_days(at(2024, 1, 2), late), -1);
    }

    #[test]
    fn test_age_reference_case() {
        assert_eq!(age_in_years(at(2000, 1, 1), at(2024, 1, 1)), 24);
        assert_eq!(age_in_years(at(2000, 1, 2), at(2024, 1, 1)), 23);
        assert_eq!(age_in_years(at(2024, 1, 1), at(2024, 1, 1)), 0);
    }

    #[test]
    fn test_require_columns_names_first_missing() {
        let table = Table::with_columns(["a", "b"]);
        assert!(require_columns(&table, "src", &["a", "b"]).is_ok());
        assert_eq!(
            require_columns(&table, "src", &["a", "c", "d"]).unwrap_err(),
            TransformError::missing_column("src", "c")
        );
    }

    #[test]
    fn test_assemble_drops_absent_columns() {
        let table = assemble(
            &silver::PAYERS,
            silver::PROCESSING_TIMESTAMP_COLUMN,
            vec![vec![Value::text("P1"), Value::text("Acme")]],
            &["payer_name"],
        )
        .unwrap();
        assert_eq!(table.columns(), &["payer_id"]);
    }
}
