//! Gold aggregations over the published Silver tables
//!
//! Silver tables may come back from the store as typed cells or as text, so
//! every read goes through the [`Value`] coercions. Grouping uses ordered maps
//! and the output order is fixed for a given input.

pub mod encounter_summary;
pub mod patient_monthly;
pub mod payer_performance;
pub mod procedure_analysis;
pub mod provider_activity;

use rust_decimal::Decimal;

use crate::contract::{gold, TableContract};
use crate::table::Table;
use crate::transform::{TransformContext, TransformResult};
use crate::value::Value;

/// Payer id assigned to claims whose patient has no payer
pub const UNASSIGNED_PAYER_ID: &str = "UNASSIGNED";

/// The Silver tables Gold reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilverTables {
    pub patients: Table,
    pub claims: Table,
    pub encounters: Table,
    pub claims_transactions: Table,
}

impl SilverTables {
    /// Source table names in the Silver schema, in extraction order
    pub const SOURCES: [&'static str; 4] = [
        "silver_patients_dim",
        "silver_claims_fact",
        "silver_encounters_fact",
        "silver_claims_transactions_fact",
    ];
}

/// Run every Gold aggregation, in load order
pub fn transform_all(
    silver: &SilverTables,
    context: &TransformContext,
) -> Vec<(&'static TableContract, TransformResult)> {
    vec![
        (
            &gold::PATIENT_MONTHLY_SUMMARY,
            patient_monthly::transform(&silver.patients, &silver.claims),
        ),
        (
            &gold::PAYER_PERFORMANCE,
            payer_performance::transform(&silver.claims, &silver.patients),
        ),
        (
            &gold::ENCOUNTER_SUMMARY,
            encounter_summary::transform(&silver.encounters, &silver.claims, context),
        ),
        (
            &gold::PROCEDURE_ANALYSIS,
            procedure_analysis::transform(&silver.claims_transactions),
        ),
        (
            &gold::PROVIDER_ACTIVITY,
            provider_activity::transform(&silver.encounters),
        ),
    ]
}

/// `total / count`, or zero for an empty group
pub fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total
        .checked_div(Decimal::from(count as u64))
        .map(|avg| avg.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

/// Group key text, skipping missing values
pub(crate) fn key(value: &Value) -> Option<String> {
    value.to_text()
}

/// Count cell
pub(crate) fn count(n: usize) -> Value {
    Value::Integer(n as i64)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        assert_eq!(average(Decimal::from(10), 0), Decimal::ZERO);
        assert_eq!(average(Decimal::from(10), 4), Decimal::new(25, 1));
        assert_eq!(average(Decimal::from(10), 3), Decimal::new(33333, 4));
    }
}
