//! Bronze fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use claims_etl_core::{InMemoryStore, Table, Value};

pub const BRONZE: &str = "bronze";

const METADATA: [&str; 4] = ["snapshot_date", "execution_timestamp", "source_file", "loaded_by"];

pub fn processing_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Raw Bronze table: every cell is text, blank strings are nulls, and the
/// ingestion metadata columns are appended
pub fn bronze_table(columns: &[&str], rows: &[&[&str]]) -> Table {
    let mut all: Vec<&str> = columns.to_vec();
    all.extend(METADATA);
    Table::from_rows(
        all,
        rows.iter()
            .map(|row| {
                let mut cells: Vec<Value> = row
                    .iter()
                    .map(|s| if s.is_empty() { Value::Missing } else { Value::text(*s) })
                    .collect();
                cells.extend([
                    Value::text("2024-01-01"),
                    Value::text("2024-01-01 03:00:00"),
                    Value::text("fixture.csv"),
                    Value::text("tests"),
                ]);
                cells
            })
            .collect(),
    )
    .unwrap()
}

pub fn patients() -> Table {
    bronze_table(
        &["patient_id", "first_name", "last_name", "date_of_birth", "gender"],
        &[
            &["p1", "ana", "SOUZA", "2000-01-01", "F"],
            &["p2", "bob", "lee", "1980-07-04", "M"],
            &["p3", "cy", "nguyen", "1975-03-10", ""],
            &["p4", "", "dropped", "1990-01-01", "O"],
        ],
    )
}

pub fn claims() -> Table {
    bronze_table(
        &["claim_id", "patient_id", "provider_id", "claim_start_date", "claim_end_date"],
        &[
            &["c1", "p1", "d1", "2023-03-02", "2023-03-05"],
            &["c2", "p1", "d1", "2023-03-20", ""],
            &["c3", "p2", "d2", "2023-05-01 08:00:00", "2023-05-01 12:00:00"],
            &["c4", "p3", "", "2023-07-15", ""],
        ],
    )
}

pub fn claims_transactions() -> Table {
    bronze_table(
        &[
            "transaction_id",
            "claim_id",
            "transaction_date",
            "transaction_amount",
            "payments",
            "outstanding",
            "type",
            "procedure_code",
        ],
        &[
            &["t1", "c1", "2023-03-02", "120.00", "100.00", "20.00", "charge", "99213"],
            &["t2", "c1", "2023-03-03", "30.50", "30.50", "0", "charge", "85025"],
            &["t3", "c2", "2023-03-20", "80", "0", "80", "CHARGE", "99213"],
            &["t4", "c3", "2023-05-01", "200", "150", "50", "charge", "71045"],
        ],
    )
}

pub fn encounters() -> Table {
    bronze_table(
        &[
            "encounter_id",
            "patient_id",
            "provider_id",
            "payer_id",
            "encounter_date",
            "discharge_date",
            "encounter_type",
            "total_claim_cost",
            "payer_coverage",
        ],
        &[
            &["e1", "p1", "d1", "A", "2023-03-01", "2023-03-06", "inpatient", "150.50", "130.50"],
            &["e2", "p1", "d1", "B", "2023-08-01", "2023-07-30", "", "80", "0"],
            &["e3", "p2", "d2", "A", "2023-05-01", "", "ambulatory", "200", "150"],
        ],
    )
}

pub fn payers() -> Table {
    bronze_table(
        &["payer_id", "payer_name"],
        &[&["A", "Acme Health"], &["B", "Blue Plan"], &["C", ""]],
    )
}

/// A store holding every Bronze source table
pub fn bronze_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_table(BRONZE, "bronze_patients", patients())
        .with_table(BRONZE, "bronze_claims", claims())
        .with_table(BRONZE, "bronze_claims_transactions", claims_transactions())
        .with_table(BRONZE, "bronze_encounters", encounters())
        .with_table(BRONZE, "bronze_payers", payers())
}

/// Cells of one column of a stored table
pub fn column(table: &Table, name: &str) -> Vec<Value> {
    table
        .column_values(name)
        .unwrap_or_else(|| panic!("column {} missing", name))
        .into_iter()
        .cloned()
        .collect()
}
