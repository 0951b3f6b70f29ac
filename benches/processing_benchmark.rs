use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use i94_etl::models::{DemographicsRecord, Table, TableSchema, Value};
use i94_etl::processors::{DemographicsProcessor, InvariantChecker, QualityReport};

const RACES: [&str; 4] = [
    "White",
    "Asian",
    "Hispanic or Latino",
    "Black or African-American",
];

// Raw demographics table: one row per city and race, as in the source file
fn create_raw_demographics(city_count: usize) -> Table {
    let schema = TableSchema::utf8(&[
        "City",
        "State",
        "Median Age",
        "Male Population",
        "Female Population",
        "Total Population",
        "Number of Veterans",
        "Foreign-born",
        "Average Household Size",
        "State Code",
        "Race",
        "Count",
    ]);

    let mut rows = Vec::with_capacity(city_count * RACES.len());
    for city in 0..city_count {
        let male = 40_000 + city as i64 * 3;
        let female = 42_000 + city as i64 * 5;
        for (i, race) in RACES.iter().enumerate() {
            rows.push(vec![
                Value::from(format!("City {}", city).as_str()),
                Value::from("Massachusetts"),
                Value::from("38.5"),
                Value::from(male.to_string().as_str()),
                Value::from(female.to_string().as_str()),
                Value::from((male + female).to_string().as_str()),
                Value::from("4100"),
                Value::from("12000"),
                Value::from("2.45"),
                Value::from("MA"),
                Value::from(*race),
                Value::from((1000 + i * 17).to_string().as_str()),
            ]);
        }
    }

    Table::from_rows(schema, rows).expect("rows match schema")
}

fn create_cities(city_count: usize) -> Vec<DemographicsRecord> {
    (0..city_count)
        .map(|city| {
            let male = 40_000 + city as i64 * 3;
            let female = 42_000 + city as i64 * 5;
            DemographicsRecord {
                city: format!("City {}", city),
                state: "Massachusetts".to_string(),
                median_age: 38.5,
                male_population: male,
                female_population: female,
                // every tenth city overcounts its population split
                population: if city % 10 == 0 { male } else { male + female },
                veterans: 4100,
                foreign_born: 12_000,
                avg_household_size: 2.45,
                state_code: "MA".to_string(),
            }
        })
        .collect()
}

fn benchmark_dedup(c: &mut Criterion) {
    let raw = create_raw_demographics(2_000);

    c.bench_function("demographics_collapse", |b| {
        b.iter(|| {
            let table = raw
                .clone()
                .drop_columns(&["Race", "Count"])
                .expect("columns exist")
                .dedup();
            black_box(table.num_rows())
        })
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let raw = create_raw_demographics(2_000);
    let processor = DemographicsProcessor::new(false);

    c.bench_function("demographics_transform", |b| {
        b.iter(|| {
            let table = processor.transform(raw.clone()).expect("clean input");
            black_box(table.num_rows())
        })
    });
}

fn benchmark_invariant_checking(c: &mut Criterion) {
    let mut group = c.benchmark_group("invariant_checking_by_size");
    let invariants = DemographicsProcessor::invariants();

    for &size in &[1_000, 10_000, 100_000] {
        let cities = create_cities(size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &cities, |b, cities| {
            let checker = InvariantChecker::new().with_parallel_threshold(usize::MAX);
            b.iter(|| {
                let mut report = QualityReport::new("demographics");
                checker.check_all(cities, &invariants, &mut report);
                black_box(report.total_violations())
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &cities, |b, cities| {
            let checker = InvariantChecker::new().with_parallel_threshold(1);
            b.iter(|| {
                let mut report = QualityReport::new("demographics");
                checker.check_all(cities, &invariants, &mut report);
                black_box(report.total_violations())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_dedup,
    benchmark_transform,
    benchmark_invariant_checking
);
criterion_main!(benches);
