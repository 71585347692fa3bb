use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use snf_costreport::cleaner::{CleaningRules, clean_year};
use snf_costreport::config::PipelineConfig;
use snf_costreport::data::Cell;
use snf_costreport::frame::{Table, YearTable};
use snf_costreport::pipeline::{IoOptions, run_pipeline};
use tempfile::TempDir;

const COLUMNS: &[&str] = &[
    "rpt_rec_num",
    "Provider CCN",
    "Facility Name",
    "Type of Control",
    "Rural versus Urban",
    "SNF Number of Beds",
    "Total Costs",
    "Total Charges",
    "Net Income",
    "Total Assets",
    "Sparse Column",
];

fn synthetic_row(i: usize) -> Vec<String> {
    let sparse = if i % 2 == 0 { String::new() } else { (i * 3).to_string() };
    let net_income = if i % 17 == 0 { String::new() } else { format!("{}", (i as i64 % 500) - 250) };
    vec![
        (100_000 + i).to_string(),
        format!("{:06}", 15_000 + i),
        format!("Facility {i}"),
        ((i % 13) + 1).to_string(),
        if i % 3 == 0 { "R" } else { "U" }.to_string(),
        (20 + i % 180).to_string(),
        (1_000_000 + i * 37).to_string(),
        (1_500_000 + i * 41).to_string(),
        net_income,
        (750_000 + i * 11).to_string(),
        sparse,
    ]
}

fn synthetic_year(rows: usize) -> YearTable {
    let columns = COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    let rows = (0..rows)
        .map(|i| {
            synthetic_row(i)
                .into_iter()
                .map(|raw| if raw.is_empty() { Cell::Missing } else { Cell::Text(raw) })
                .collect()
        })
        .collect();
    YearTable {
        year: 2016,
        source: PathBuf::from("SNF_CostReport_2016.csv"),
        table: Table::new(columns, rows).expect("rectangular table"),
    }
}

fn write_inputs(years: &[i32], rows: usize) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    for year in years {
        let path = temp_dir.path().join(format!("SNF_CostReport_{year}.csv"));
        let mut file = File::create(&path).expect("create csv");
        writeln!(file, "{}", COLUMNS.join(",")).expect("header");
        for i in 0..rows {
            writeln!(file, "{}", synthetic_row(i).join(",")).expect("row");
        }
    }
    temp_dir
}

fn bench_clean_year(c: &mut Criterion) {
    let rules = CleaningRules::default();
    let input = synthetic_year(20_000);

    let mut group = c.benchmark_group("clean_year");
    group.bench_function("in_memory_20k_rows", |b| {
        b.iter(|| clean_year(&input, &rules));
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let inputs = write_inputs(&[2014, 2015, 2020, 2021], 5_000);
    let config = PipelineConfig::default();

    let mut group = c.benchmark_group("run_pipeline");
    group.sample_size(10);
    group.bench_function("four_years_5k_rows", |b| {
        b.iter_batched(
            || tempfile::tempdir().expect("output dir"),
            |output| {
                run_pipeline(inputs.path(), output.path(), &config, IoOptions::default())
                    .expect("pipeline run");
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_clean_year, bench_pipeline);
criterion_main!(benches);
