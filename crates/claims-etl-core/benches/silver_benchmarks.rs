use chrono::NaiveDate;
use claims_etl_core::contract::silver;
use claims_etl_core::transform::{self, TransformContext};
use claims_etl_core::{Table, Validator, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn encounters(rows: usize) -> Table {
    Table::from_rows(
        [
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
        (0..rows)
            .map(|i| {
                vec![
                    Value::text(format!("e{}", i)),
                    Value::text(format!("p{}", i % 97)),
                    Value::text(format!("d{}", i % 13)),
                    Value::text(format!("P{}", i % 5)),
                    Value::text(format!("2023-{:02}-01 08:00:00", i % 12 + 1)),
                    Value::text(format!("2023-{:02}-{:02}", i % 12 + 1, i % 27 + 2)),
                    Value::text("inpatient"),
                    Value::text(format!("{}.{:02}", i % 900, i % 100)),
                    Value::text("10.00"),
                ]
            })
            .collect(),
    )
    .unwrap_or_default()
}

fn bench_encounters_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("silver_encounters");
    for rows in [1_000, 10_000] {
        let input = encounters(rows);
        group.bench_with_input(BenchmarkId::new("transform", rows), &input, |b, input| {
            b.iter(|| transform::encounters::transform(black_box(input)))
        });
    }
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let stamp = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let context = TransformContext::new(stamp);
    let validator = Validator::new();

    let mut candidate = transform::encounters::transform(&encounters(10_000)).unwrap_or_default();
    candidate.set_constant_column(
        silver::PROCESSING_TIMESTAMP_COLUMN,
        Value::Timestamp(context.processing_timestamp),
    );

    c.bench_function("validate_encounters_10k", |b| {
        b.iter(|| validator.validate(black_box(&candidate), &silver::ENCOUNTERS))
    });
}

criterion_group!(benches, bench_encounters_transform, bench_validation);
criterion_main!(benches);
