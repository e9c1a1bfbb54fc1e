//! Contracts for the five published Silver tables

use super::{FieldSpec, TableContract};

/// Column stamped with the run's processing timestamp on every Silver row
pub const PROCESSING_TIMESTAMP_COLUMN: &str = "silver_processing_timestamp";

/// Allowed curated gender values
pub const GENDERS: &[&str] = &["Male", "Female", "Other", "Unknown"];

pub static PATIENTS: TableContract = TableContract {
    name: "silver_patients_dim",
    fields: &[
        FieldSpec::text("patient_id").unique(),
        FieldSpec::text("first_name"),
        FieldSpec::text("last_name"),
        FieldSpec::timestamp("date_of_birth"),
        FieldSpec::text("gender").one_of(GENDERS),
        FieldSpec::integer("age").between(0, 120),
        FieldSpec::text("payer_id").nullable(),
        FieldSpec::text("payer_name"),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static CLAIMS: TableContract = TableContract {
    name: "silver_claims_fact",
    fields: &[
        FieldSpec::text("claim_id").unique(),
        FieldSpec::text("patient_id"),
        FieldSpec::text("provider_id").nullable(),
        FieldSpec::timestamp("claim_start_date"),
        FieldSpec::timestamp("claim_end_date").nullable(),
        FieldSpec::number("total_billed_amount").at_least(0),
        FieldSpec::number("total_paid_amount").at_least(0),
        FieldSpec::number("patient_responsibility_amount").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static CLAIMS_TRANSACTIONS: TableContract = TableContract {
    name: "silver_claims_transactions_fact",
    fields: &[
        FieldSpec::text("transaction_id").unique(),
        FieldSpec::text("claim_id"),
        FieldSpec::timestamp("transaction_date"),
        FieldSpec::number("transaction_amount"),
        FieldSpec::text("procedure_code").nullable(),
        FieldSpec::text("transaction_type").nullable(),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static ENCOUNTERS: TableContract = TableContract {
    name: "silver_encounters_fact",
    fields: &[
        FieldSpec::text("encounter_id").unique(),
        FieldSpec::text("patient_id"),
        FieldSpec::text("provider_id").nullable(),
        FieldSpec::text("payer_id").nullable(),
        FieldSpec::timestamp("encounter_date"),
        FieldSpec::timestamp("discharge_date").nullable(),
        FieldSpec::text("encounter_type").nullable(),
        FieldSpec::integer("length_of_stay_days").at_least(0),
        FieldSpec::number("total_claim_cost").at_least(0),
        FieldSpec::number("payer_coverage").at_least(0),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

pub static PAYERS: TableContract = TableContract {
    name: "silver_payers_dim",
    fields: &[
        FieldSpec::text("payer_id").unique(),
        FieldSpec::text("payer_name"),
        FieldSpec::timestamp(PROCESSING_TIMESTAMP_COLUMN),
    ],
};

/// All Silver contracts in load order
pub fn all() -> [&'static TableContract; 5] {
    [&PATIENTS, &CLAIMS, &CLAIMS_TRANSACTIONS, &ENCOUNTERS, &PAYERS]
}
