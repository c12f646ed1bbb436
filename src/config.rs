//! Run configuration.
//!
//! Values are resolved in layers, later layers winning:
//!
//! 1. built-in defaults (`RunConfig::default`)
//! 2. an optional TOML file (`--config`, or `SPREADS_CONFIG` from the
//!    environment / `.env`)
//! 3. `SPREADS_DATA_DIR` / `SPREADS_OUT_DIR` from the environment
//! 4. CLI flags (applied by `app`)
//!
//! Example file:
//!
//! ```toml
//! data_dir = "data/raw"
//! out_dir = "out"
//! window = { last-n = 60 }
//! day_count = "act/365f"
//!
//! [anomaly]
//! min_bp = -10.0
//! max_bp = 10.0
//!
//! [[di_tenors]]
//! label = "1Y"
//! years = 1.0
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Benchmark, DayCount, TargetTenorGrid, TenorBucket, WindowSpec};
use crate::error::AppError;
use crate::spread::AnomalyRange;

pub const CONFIG_ENV: &str = "SPREADS_CONFIG";
pub const DATA_DIR_ENV: &str = "SPREADS_DATA_DIR";
pub const OUT_DIR_ENV: &str = "SPREADS_OUT_DIR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding the input CSV files.
    pub data_dir: PathBuf,
    /// Directory receiving every artifact.
    pub out_dir: PathBuf,

    /// Bond master sheet export.
    pub bonds_file: String,
    /// Yield time-series sheet export.
    pub yields_file: String,
    pub di_curve_file: String,
    pub ipca_curve_file: String,

    pub di_tenors: Vec<TenorBucket>,
    pub ipca_tenors: Vec<TenorBucket>,

    pub window: WindowSpec,
    pub day_count: DayCount,
    pub anomaly: AnomalyRange,

    /// DI quotes need `volume` strictly above this when the column exists.
    pub di_volume_floor: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("out"),
            bonds_file: "bonds.csv".to_string(),
            yields_file: "yields.csv".to_string(),
            di_curve_file: "di_curve.csv".to_string(),
            ipca_curve_file: "ipca_curve.csv".to_string(),
            di_tenors: buckets(&[
                ("3M", 0.25),
                ("6M", 0.5),
                ("1Y", 1.0),
                ("2Y", 2.0),
                ("3Y", 3.0),
                ("4Y", 4.0),
                ("5Y", 5.0),
                ("7Y", 7.0),
                ("10Y", 10.0),
            ]),
            ipca_tenors: buckets(&[
                ("1Y", 1.0),
                ("2Y", 2.0),
                ("3Y", 3.0),
                ("5Y", 5.0),
                ("7Y", 7.0),
                ("10Y", 10.0),
                ("15Y", 15.0),
                ("20Y", 20.0),
                ("30Y", 30.0),
            ]),
            window: WindowSpec::default(),
            day_count: DayCount::default(),
            anomaly: AnomalyRange::default(),
            di_volume_floor: 1000.0,
        }
    }
}

impl RunConfig {
    /// Resolve defaults, file and environment layers.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os(OUT_DIR_ENV) {
            config.out_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config '{}': {e}", path.display())))?;
        Self::from_toml(&text).map_err(|e| AppError::config(format!("Invalid config '{}': {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.grid(Benchmark::Di)?;
        self.grid(Benchmark::Ipca)?;

        let AnomalyRange { min_bp, max_bp } = self.anomaly;
        if !(min_bp.is_finite() && max_bp.is_finite() && min_bp <= max_bp) {
            return Err(AppError::config(format!(
                "Invalid anomaly range [{min_bp}, {max_bp}] (must be finite with min <= max)."
            )));
        }
        match self.window {
            WindowSpec::LastN(0) | WindowSpec::CalendarDays(0) => {
                return Err(AppError::config("Observation window must be > 0."));
            }
            _ => {}
        }
        if !self.di_volume_floor.is_finite() {
            return Err(AppError::config("DI volume floor must be finite."));
        }
        Ok(())
    }

    pub fn grid(&self, benchmark: Benchmark) -> Result<TargetTenorGrid, AppError> {
        let buckets = match benchmark {
            Benchmark::Di => &self.di_tenors,
            Benchmark::Ipca => &self.ipca_tenors,
        };
        TargetTenorGrid::new(buckets.clone())
            .map_err(|e| AppError::config(format!("{} tenor grid: {e}", benchmark.display_name())))
    }

    pub fn bonds_path(&self) -> PathBuf {
        self.data_dir.join(&self.bonds_file)
    }

    pub fn yields_path(&self) -> PathBuf {
        self.data_dir.join(&self.yields_file)
    }

    pub fn curve_path(&self, benchmark: Benchmark) -> PathBuf {
        match benchmark {
            Benchmark::Di => self.data_dir.join(&self.di_curve_file),
            Benchmark::Ipca => self.data_dir.join(&self.ipca_curve_file),
        }
    }

    /// Volume floor applied to this benchmark's quotes, if any.
    pub fn volume_floor(&self, benchmark: Benchmark) -> Option<f64> {
        match benchmark {
            Benchmark::Di => Some(self.di_volume_floor),
            Benchmark::Ipca => None,
        }
    }
}

fn buckets(pairs: &[(&str, f64)]) -> Vec<TenorBucket> {
    pairs
        .iter()
        .map(|&(label, years)| TenorBucket {
            label: label.to_string(),
            years,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = RunConfig::default();
        c.validate().unwrap();
        assert_eq!(c.anomaly, AnomalyRange { min_bp: -10.0, max_bp: 10.0 });
        assert_eq!(c.grid(Benchmark::Di).unwrap().label(0), "3M");
        assert_eq!(c.volume_floor(Benchmark::Ipca), None);
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let c = RunConfig::from_toml(
            r#"
            data_dir = "raw"
            window = { calendar-days = 90 }
            day_count = "act/365.25"

            [anomaly]
            min_bp = -200.0
            max_bp = 2000.0

            [[ipca_tenors]]
            label = "2Y"
            years = 2.0

            [[ipca_tenors]]
            label = "1Y"
            years = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("raw"));
        assert_eq!(c.window, WindowSpec::CalendarDays(90));
        assert_eq!(c.day_count, DayCount::Act365_25);
        assert_eq!(c.anomaly.max_bp, 2000.0);
        assert_eq!(c.grid(Benchmark::Ipca).unwrap().tenors(), vec![1.0, 2.0]);
        assert_eq!(c.di_tenors, RunConfig::default().di_tenors);
        assert_eq!(c.curve_path(Benchmark::Di), PathBuf::from("raw").join("di_curve.csv"));
    }

    #[test]
    fn partial_anomaly_table_keeps_other_bound() {
        let c = RunConfig::from_toml("[anomaly]\nmin_bp = -50.0\n").unwrap();
        assert_eq!(c.anomaly, AnomalyRange { min_bp: -50.0, max_bp: 10.0 });
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        assert!(RunConfig::from_toml("unknown_key = 1").is_err());

        let mut c = RunConfig::default();
        c.anomaly = AnomalyRange { min_bp: 5.0, max_bp: -5.0 };
        assert!(matches!(c.validate(), Err(AppError::Configuration(_))));

        let mut c = RunConfig::default();
        c.window = WindowSpec::LastN(0);
        assert!(c.validate().is_err());

        let mut c = RunConfig::default();
        c.di_tenors.push(TenorBucket { label: "1Y".to_string(), years: 1.5 });
        assert!(c.validate().is_err());
    }
}
