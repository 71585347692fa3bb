#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const HEADER_2012: &str =
    "Provider CCN,Type of Control,Total Costs,Net Income,Extra2012Only";
pub const HEADER_2020: &str =
    "Provider CCN,Type of Control,Total Costs,Net Income,Extra2020Only";

/// Scratch directory holding yearly input files; removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Writes `SNF_CostReport_<year>.csv` from a header line and data lines.
    pub fn write_year(&self, year: i32, header: &str, rows: &[&str]) -> PathBuf {
        let mut contents = String::from(header);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write(&format!("SNF_CostReport_{year}.csv"), &contents)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("read output file")
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names = fs::read_dir(self.path())
            .expect("list workspace")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}

/// The two-year scenario: proprietary (`4`, `5`) and non-proprietary (`1`)
/// facilities, one missing `Net Income` per year (a 25% share, below the
/// column threshold), and a year-only column each.
pub fn write_two_year_scenario(workspace: &TestWorkspace) {
    workspace.write_year(
        2012,
        HEADER_2012,
        &[
            "100,4,1000,50,a",
            "101,1,2000,60,b",
            "102,4,3000,,c",
            "103,5,3500,55,d",
        ],
    );
    workspace.write_year(
        2020,
        HEADER_2020,
        &[
            "200,4,4000,70,x",
            "201,1,5000,80,y",
            "202,4,6000,,z",
            "203,5,6500,75,w",
        ],
    );
}
