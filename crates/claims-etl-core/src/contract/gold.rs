//! Contracts for the Gold analytics tables

use super::{FieldSpec, TableContract};

/// Column stamped with the run's processing timestamp on every Gold row
pub const PROCESSING_TIMESTAMP_COLUMN: &str = "gold_processing_timestamp";

pub static PATIENT_MONTHLY_SUMMARY: TableContract = TableContract {
    name: "gold_patient_monthly_summary",
    fields: &[
        FieldSpec::text("patient_id"),
        FieldSpec::text("first_name"),
        FieldSpec::text("last_name"),
        FieldSpec::text("year_month").matching(r"^\d{4}-\d{2}$"),
        FieldSpec::integer("total_claims_count").at_least(0),
        FieldSpec::number("total_billed_amount_month").at_least(0),
        FieldSpec::number("total_paid_amount_month").at_least(0),
        FieldSpec::number("avg_claim_value_month").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static PAYER_PERFORMANCE: TableContract = TableContract {
    name: "gold_payer_performance",
    fields: &[
        FieldSpec::text("payer_id"),
        FieldSpec::text("payer_name"),
        FieldSpec::integer("total_claims_count").at_least(0),
        FieldSpec::number("total_billed_amount").at_least(0),
        FieldSpec::number("total_paid_amount").at_least(0),
        FieldSpec::number("avg_paid_per_claim").at_least(0),
        FieldSpec::number("avg_patient_responsibility").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static ENCOUNTER_SUMMARY: TableContract = TableContract {
    name: "gold_encounter_summary",
    fields: &[
        FieldSpec::text("encounter_id").unique(),
        FieldSpec::text("patient_id"),
        FieldSpec::timestamp("encounter_date"),
        FieldSpec::timestamp("discharge_date").nullable(),
        FieldSpec::text("provider_id").nullable(),
        FieldSpec::text("encounter_type").nullable(),
        FieldSpec::integer("length_of_stay_days").at_least(0),
        FieldSpec::number("total_billed_amount_encounter").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static PROCEDURE_ANALYSIS: TableContract = TableContract {
    name: "gold_procedure_analysis",
    fields: &[
        FieldSpec::text("procedure_code"),
        FieldSpec::integer("transaction_count").at_least(0),
        FieldSpec::number("total_amount"),
        FieldSpec::number("avg_amount"),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static PROVIDER_ACTIVITY: TableContract = TableContract {
    name: "gold_provider_activity_summary",
    fields: &[
        FieldSpec::text("provider_id"),
        FieldSpec::integer("total_patients_seen").at_least(0),
        FieldSpec::integer("total_encounters").at_least(0),
        FieldSpec::number("total_billed_from_encounters").at_least(0),
        FieldSpec::number("avg_billed_per_encounter").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

/// All Gold contracts in load order
pub fn all() -> [&'static TableContract; 5] {
    [
        &PATIENT_MONTHLY_SUMMARY,
        &PAYER_PERFORMANCE,
        &ENCOUNTER_SUMMARY,
        &PROCEDURE_ANALYSIS,
        &PROVIDER_ACTIVITY,
    ]
}
