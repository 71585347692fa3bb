mod common;

use common::{HEADER_2012, TestWorkspace, write_two_year_scenario};
use snf_costreport::cleaner::LogRecord;
use snf_costreport::config::{PipelineConfig, YearWindow};
use snf_costreport::error::PipelineError;
use snf_costreport::pipeline::{IoOptions, run_pipeline};

const TRAIN: &str = "Final_SNF_CostReport_Cleaned_2012_2019.csv";
const TEST: &str = "Final_SNF_CostReport_Cleaned_2020_2021.csv";
const LOG: &str = "SNF_cleaning_log.csv";

fn run_default(workspace: &TestWorkspace) -> anyhow::Result<snf_costreport::pipeline::PipelineReport> {
    run_pipeline(
        workspace.path(),
        workspace.path(),
        &PipelineConfig::default(),
        IoOptions::default(),
    )
}

fn read_log(workspace: &TestWorkspace) -> Vec<LogRecord> {
    let mut reader = csv::Reader::from_path(workspace.path().join(LOG)).expect("open log");
    reader
        .deserialize()
        .collect::<Result<Vec<LogRecord>, _>>()
        .expect("parse log")
}

#[test]
fn two_year_scenario_splits_cleaned_rows_into_windows() {
    let workspace = TestWorkspace::new();
    write_two_year_scenario(&workspace);

    let report = run_default(&workspace).expect("pipeline run");

    assert_eq!(
        report.common_columns,
        vec!["Net Income", "Provider CCN", "Total Costs", "Year"]
    );
    assert_eq!(
        workspace.read(TRAIN),
        "Net Income,Provider CCN,Total Costs,Year\n50,100,1000,2012\n55,103,3500,2012\n"
    );
    assert_eq!(
        workspace.read(TEST),
        "Net Income,Provider CCN,Total Costs,Year\n70,200,4000,2020\n75,203,6500,2020\n"
    );
    assert_eq!(report.windows[0].rows, 2);
    assert_eq!(report.windows[1].rows, 2);
    assert_eq!(report.windows[0].columns, 4);
}

#[test]
fn two_year_scenario_writes_log_sorted_by_year() {
    let workspace = TestWorkspace::new();
    write_two_year_scenario(&workspace);
    run_default(&workspace).expect("pipeline run");

    let log = read_log(&workspace);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].year, 2012);
    assert_eq!(log[1].year, 2020);

    let first = &log[0];
    assert_eq!(first.n_rows_original, 4);
    assert_eq!(first.n_rows_after_filter, 3);
    assert_eq!(first.n_rows_final, 2);
    assert_eq!(first.n_cols_original, 5);
    assert_eq!(first.n_cols_after_drop, 5);
    assert_eq!(first.kept_columns_count, 4);
    assert_eq!(first.missing_target_vars_count, 13);
    assert!(first.missing_target_vars.starts_with("Rural versus Urban; SNF Admissions Total"));
    assert!(!first.missing_target_vars.contains("Net Income;"));
}

#[test]
fn empty_directory_aborts_without_writing_outputs() {
    let workspace = TestWorkspace::new();
    workspace.write("notes.txt", "not a cost report\n");
    workspace.write("SNF_CostReport_latest.csv", "a\n1\n");

    let err = run_default(&workspace).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::NoInputFiles { .. })
    ));
    assert_eq!(
        workspace.file_names(),
        vec!["SNF_CostReport_latest.csv", "notes.txt"]
    );
}

#[test]
fn rows_outside_every_window_are_left_out() {
    let workspace = TestWorkspace::new();
    write_two_year_scenario(&workspace);
    workspace.write_year(2025, HEADER_2012, &["300,4,1,2,q"]);

    let report = run_default(&workspace).expect("pipeline run");

    let train = workspace.read(TRAIN);
    let test = workspace.read(TEST);
    assert!(!train.contains("2025"));
    assert!(!test.contains("2025"));
    assert_eq!(report.windows.iter().map(|w| w.rows).sum::<usize>(), 4);
    // The year is still logged.
    assert!(read_log(&workspace).iter().any(|record| record.year == 2025));
}

#[test]
fn target_missing_in_one_year_is_removed_for_all_years() {
    let workspace = TestWorkspace::new();
    workspace.write_year(
        2015,
        "Provider CCN,Total Costs,Total Assets",
        &["1,10,100", "2,20,200"],
    );
    workspace.write_year(2021, "Provider CCN,Total Costs", &["3,30"]);

    let report = run_default(&workspace).expect("pipeline run");

    assert_eq!(report.common_columns, vec!["Provider CCN", "Total Costs", "Year"]);
    assert!(!workspace.read(TRAIN).contains("Total Assets"));
    let log = read_log(&workspace);
    assert!(!log[0].missing_target_vars.contains("Total Assets"));
    assert!(log[1].missing_target_vars.contains("Total Assets"));
}

#[test]
fn yaml_config_overrides_threshold_and_windows() {
    let workspace = TestWorkspace::new();
    write_two_year_scenario(&workspace);
    let output = TestWorkspace::new();
    let config = PipelineConfig::from_yaml_str(
        "missing_threshold: 0.2\n\
         windows:\n  \
           - name: all\n    start: 2000\n    end: 2030\n    file_name: everything.csv\n",
    )
    .expect("parse config");
    assert_eq!(config.windows, vec![YearWindow {
        name: "all".to_string(),
        start: 2000,
        end: 2030,
        file_name: "everything.csv".to_string(),
    }]);

    let report = run_pipeline(workspace.path(), output.path(), &config, IoOptions::default())
        .expect("pipeline run");

    // A 25% missing share now crosses the threshold, so Net Income is gone.
    assert_eq!(report.common_columns, vec!["Provider CCN", "Total Costs", "Year"]);
    assert_eq!(output.file_names(), vec![LOG, "everything.csv"]);
    let everything = output.read("everything.csv");
    assert_eq!(everything.lines().count(), 1 + 6);
}

#[test]
fn invalid_config_fails_before_touching_files() {
    let workspace = TestWorkspace::new();
    write_two_year_scenario(&workspace);
    let config = PipelineConfig {
        windows: Vec::new(),
        ..PipelineConfig::default()
    };
    let err = run_pipeline(workspace.path(), workspace.path(), &config, IoOptions::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidConfig(_))
    ));
    assert_eq!(workspace.file_names().len(), 2);
}
