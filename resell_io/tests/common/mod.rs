#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Temp workspace with `data/` (transactions + catalog side by side) and `out/`.
pub struct Workspace {
    _dir: TempDir, // keep alive for the life of the test
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("data")).expect("mkdir data");
        Self { _dir: dir, root }
    }

    pub fn data(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    pub fn write(&self, rel: &str, body: &str) -> PathBuf {
        let p = self.root.join(rel);
        std::fs::write(&p, body).expect("write fixture");
        p
    }

    /// Config TOML pointing at this workspace.
    pub fn config_toml(&self, extra_index: &str, extra_pipeline: &str) -> String {
        format!(
            r#"
[index]
baseline_date = "2025-01-31T00:00:00Z"
{extra_index}

[input]
transactions = '{tx}'
catalog = '{cat}'

[output]
dir = '{out}'

[pipeline]
{extra_pipeline}
"#,
            tx = self.data().display(),
            cat = self.data().join("product_meta.csv").display(),
            out = self.out().display(),
        )
    }
}

pub fn read(p: &Path) -> String {
    std::fs::read_to_string(p).expect("read output")
}
