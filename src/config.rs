//! Pipeline configuration.
//!
//! [`PipelineConfig::default()`] carries the built-in cost report rules. A
//! YAML file may override any subset of fields; omitted fields keep their
//! defaults. Values are checked by [`PipelineConfig::validate()`] before any
//! file is touched.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{data::DEFAULT_MISSING_MARKERS, error::PipelineError};

pub const YEAR_COLUMN: &str = "Year";

pub const DEFAULT_FILE_PATTERN: &str = r"^SNF_CostReport_(\d{4})\.csv$";
pub const DEFAULT_LOG_FILE: &str = "SNF_cleaning_log.csv";
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.30;
pub const DEFAULT_CATEGORICAL_COLUMN: &str = "Type of Control";
pub const DEFAULT_PROPRIETARY_CODES: &[i64] = &[3, 4, 5, 6];

pub const DEFAULT_TARGETS: &[&str] = &[
    "Provider CCN",
    "Rural versus Urban",
    "SNF Admissions Total",
    "SNF Days Total",
    "SNF Number of Beds",
    "Total Charges",
    "Total Costs",
    "Total Salaries (adjusted)",
    "Accounts Receivable",
    "Wage-related Costs (core)",
    "Prepaid expenses",
    "Total Assets",
    "Less Contractual Allowance and discounts on patients' accounts",
    "Net Income from service to patients",
    "Net Income",
    "Allowable Bad Debts",
];

/// Identifying and redundant fields removed before target projection.
pub const DEFAULT_DROP: &[&str] = &[
    "rpt_rec_num",
    "Facility Name",
    "Street Address",
    "City",
    "State Code",
    "Zip Code",
    "County",
    "Medicare CBSA Number",
    "Fiscal Year Begin Date",
    "Fiscal Year End Date",
    "Type of Control",
    "Total Days Title V",
    "Total Days Title XVIII",
    "Total Days Title XIX",
    "Total Days Other",
    "Total Days Total",
    "Number of Beds",
    "Total Bed Days Available",
    "Total Discharges Title V",
    "Total Discharges Title XVIII",
    "Total Discharges Title XIX",
    "Total Discharges Title Other",
    "Total Discharges Total",
    "SNF Average Length of Stay Title V",
    "SNF Average Length of Stay Title XVIII",
    "SNF Average Length of Stay Title XIX",
    "SNF Average Length of Stay Total",
    "SNF Admissions Title V",
    "SNF Admissions Title XVIII",
    "SNF Admissions Title XIX",
    "SNF Admissions Other",
    "SNF Days Title V",
    "SNF Days Title XVIII",
    "SNF Days Title XIX",
    "SNF Days Other",
    "SNF Bed Days Available",
    "SNF Discharges Title V",
    "SNF Discharges Title XVIII",
    "SNF Discharges Title XIX",
    "SNF Discharges Title Other",
    "SNF Discharges Total",
    "NF Number of Beds",
    "NF Bed Days Available",
    "NF Days Title V",
    "NF Days Title XIX",
    "NF Days Other",
    "NF Days Total",
    "NF Discharges Title V",
    "NF Discharges Title XIX",
    "NF Discharges Title Other",
    "NF Discharges Total",
    "NF Average Length of Stay Title V",
    "NF Average Length of Stay Title XIX",
    "NF Average Length of Stay Total",
    "NF Admissions Title V",
    "NF Admissions Title XIX",
    "NF Admissions Other",
    "NF Admissions Total",
    "Total RUG Days",
    "Total Salaries From Worksheet A",
    "Overhead Non-Salary Costs",
    "Contract Labor",
    "Cash on hand and in banks",
    "Temporary Investments",
    "Notes Receivable",
    "Less: Allowances for uncollectible notes and accounts receivable",
    "Inventory",
    "Other current assets",
    "Total Current Assets",
    "Land",
    "Land improvements",
    "Buildings",
    "Leasehold improvements",
    "Fixed equipment",
    "Major movable equipment",
    "Minor equipment depreciable",
    "Total fixed Assets",
    "Investments",
    "Other Assets",
    "Total other Assets",
    "Accounts payable",
    "Salaries, wages, and fees payable",
    "Payroll taxes payable",
    "Notes and Loans Payable (short term)",
    "Deferred income",
    "Other current liabilities",
    "Total current liabilities",
    "Mortgage payable",
    "Notes Payable",
    "Unsecured Loans",
    "Other long term liabilities",
    "Total long term liabilities",
    "Total liabilities",
    "General fund balance",
    "Total fund balances",
    "Total Liabilities and fund balances",
    "Total General Inpatient Care Services Revenue",
    "Inpatient Revenue",
    "Outpatient Revenue",
    "Gross Revenue",
    "Net Patient Revenue",
    "Less Total Operating Expense",
    "Total Other Income",
    "Total Income",
    "Inpatient PPS Amount",
    "Nursing and Allied Health Education Activities",
];

/// Inclusive range of years written to one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub file_name: String,
}

impl YearWindow {
    pub fn new(name: &str, start: i32, end: i32) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            file_name: format!("Final_SNF_CostReport_Cleaned_{start}_{end}.csv"),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    fn overlaps(&self, other: &YearWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoricalFilter {
    pub column: String,
    pub accepted: Vec<i64>,
}

impl Default for CategoricalFilter {
    fn default() -> Self {
        Self {
            column: DEFAULT_CATEGORICAL_COLUMN.to_string(),
            accepted: DEFAULT_PROPRIETARY_CODES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub file_pattern: String,
    pub targets: Vec<String>,
    pub drop: Vec<String>,
    pub missing_threshold: f64,
    pub missing_markers: Vec<String>,
    pub categorical: CategoricalFilter,
    pub windows: Vec<YearWindow>,
    pub log_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            targets: DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect(),
            drop: DEFAULT_DROP.iter().map(|s| s.to_string()).collect(),
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            missing_markers: DEFAULT_MISSING_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            categorical: CategoricalFilter::default(),
            windows: vec![
                YearWindow::new("train", 2012, 2019),
                YearWindow::new("test", 2020, 2021),
            ],
            log_file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut raw = String::new();
        BufReader::new(file)
            .read_to_string(&mut raw)
            .with_context(|| format!("Reading config file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn year_regex(&self) -> Result<Regex, PipelineError> {
        let regex = Regex::new(&self.file_pattern).map_err(|err| {
            PipelineError::InvalidConfig(format!(
                "file_pattern '{}' is not a valid regex: {err}",
                self.file_pattern
            ))
        })?;
        if regex.captures_len() < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "file_pattern '{}' needs a capture group for the year",
                self.file_pattern
            )));
        }
        Ok(regex)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.missing_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "missing_threshold must lie within [0, 1], got {}",
                self.missing_threshold
            )));
        }
        self.year_regex()?;
        if self.windows.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one year window is required".to_string(),
            ));
        }
        for (idx, window) in self.windows.iter().enumerate() {
            if window.start > window.end {
                return Err(PipelineError::InvalidConfig(format!(
                    "window '{}' starts after it ends ({} > {})",
                    window.name, window.start, window.end
                )));
            }
            if window.file_name.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "window '{}' has an empty file_name",
                    window.name
                )));
            }
            if let Some(other) = self.windows[..idx].iter().find(|w| w.overlaps(window)) {
                return Err(PipelineError::InvalidConfig(format!(
                    "windows '{}' and '{}' overlap",
                    other.name, window.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.targets.len(), 16);
        assert_eq!(config.windows[0].file_name, "Final_SNF_CostReport_Cleaned_2012_2019.csv");
        assert_eq!(config.windows[1].file_name, "Final_SNF_CostReport_Cleaned_2020_2021.csv");
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let config = PipelineConfig::from_yaml_str(
            "missing_threshold: 0.5\ncategorical:\n  accepted: [4]\n",
        )
        .unwrap();
        assert_eq!(config.missing_threshold, 0.5);
        assert_eq!(config.categorical.accepted, vec![4]);
        assert_eq!(config.categorical.column, DEFAULT_CATEGORICAL_COLUMN);
        assert_eq!(config.drop.len(), DEFAULT_DROP.len());
    }

    #[test]
    fn yaml_round_trip_preserves_every_field() {
        let mut config = PipelineConfig {
            missing_threshold: 0.25,
            windows: vec![YearWindow::new("all", 2010, 2030)],
            ..PipelineConfig::default()
        };
        config.categorical.accepted = vec![4, 5];
        let rendered = config.to_yaml_string().unwrap();
        assert!(rendered.contains("missing_threshold: 0.25"));
        assert_eq!(PipelineConfig::from_yaml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        assert!(PipelineConfig::from_yaml_str("threshold: 0.5\n").is_err());
    }

    #[test]
    fn validate_rejects_overlapping_windows() {
        let config = PipelineConfig {
            windows: vec![YearWindow::new("a", 2012, 2019), YearWindow::new("b", 2019, 2021)],
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn validate_rejects_pattern_without_capture_group() {
        let config = PipelineConfig {
            file_pattern: r"^SNF_CostReport_\d{4}\.csv$".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let config = PipelineConfig {
            missing_threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
