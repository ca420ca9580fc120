use crate::error::Result;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Settings for the load driver. Every key is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Queue capacity, zero or less for unbounded.
    pub capacity: i64,
    pub producers: usize,
    pub consumers: usize,
    pub items_per_producer: usize,
    /// Upper bound of the simulated work per item, in microseconds.
    pub max_work_us: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capacity: 50,
            producers: 10,
            consumers: 9,
            items_per_producer: 100,
            max_work_us: 0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new(s: &str) -> Result<Config> {
        if s.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }
    /// Reads `./config.yaml`, falling back to the defaults when it is absent.
    pub fn from_cwd_config() -> Result<Config> {
        match Self::from_file("./config.yaml") {
            Err(crate::Error::Io(ref e)) if e.kind() == ErrorKind::NotFound => {
                Ok(Config::default())
            }
            other => other,
        }
    }
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Config> {
        let mut f = OpenOptions::new().read(true).open(file)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        Self::new(&buf)
    }
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
