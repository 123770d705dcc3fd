use std::path::{Path, PathBuf};

use chrono::Duration;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{
    engine::SyncPolicy,
    error::{ConfigError, GridResult},
    logging::LoggingConfig,
};

/// Prefix of environment overrides, e.g.
/// `GRIDCOVER__GRID__SUBDIVISION__THRESHOLD=45`.
pub const ENV_PREFIX: &str = "GRIDCOVER";
const ENV_SEPARATOR: &str = "__";

/// Engine tuning. Validated once at startup, then shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of base-grid tiles.
    pub base_cell_size_km: f64,
    /// Age after which a `PROCESSING` claim is considered abandoned.
    pub stale_after_minutes: u32,
    pub subdivision: SubdivisionConfig,
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionConfig {
    /// Result count at which a cell is presumed clipped by the search
    /// pagination cap and gets split.
    pub threshold: u32,
    pub max_depth: u8,
    /// Smallest allowed side of a split cell, in metres.
    pub min_cell_size_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Largest combined result count of a merged pair.
    pub max_merged_results: u32,
    /// Largest side of a merged cell.
    pub max_merged_cell_size_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Journal file of the cell store.
    pub path: PathBuf,
    pub sync: SyncPolicy,
}

/// Process-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub grid: GridConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    /// JSON boundary document of the scanned region.
    pub boundary_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct GridConfigBuilder {
    base_cell_size_km: Option<f64>,
    stale_after_minutes: Option<u32>,
    threshold: Option<u32>,
    max_depth: Option<u8>,
    min_cell_size_m: Option<f64>,
    max_merged_results: Option<u32>,
    max_merged_cell_size_km: Option<f64>,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl Settings {
    /// Loads defaults, then `path` (TOML, JSON or YAML by extension) if
    /// given, then `GRIDCOVER__*` environment variables, and validates the
    /// result.
    pub fn load(path: Option<&Path>) -> GridResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.logging.validate()
    }
}

impl GridConfig {
    pub fn builder() -> GridConfigBuilder {
        GridConfigBuilder::default()
    }

    /// Checks every setting against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("base_cell_size_km", self.base_cell_size_km, 0.1, 50.0)?;
        ConfigError::check_range(
            "stale_after_minutes",
            self.stale_after_minutes as f64,
            1.0,
            1440.0,
        )?;
        ConfigError::check_range(
            "subdivision.threshold",
            self.subdivision.threshold as f64,
            1.0,
            60.0,
        )?;
        ConfigError::check_range(
            "subdivision.max_depth",
            self.subdivision.max_depth as f64,
            0.0,
            12.0,
        )?;
        ConfigError::check_range(
            "subdivision.min_cell_size_m",
            self.subdivision.min_cell_size_m,
            10.0,
            10_000.0,
        )?;
        ConfigError::check_range(
            "merge.max_merged_results",
            self.merge.max_merged_results as f64,
            1.0,
            60.0,
        )?;
        ConfigError::check_range(
            "merge.max_merged_cell_size_km",
            self.merge.max_merged_cell_size_km,
            0.1,
            100.0,
        )?;

        if self.merge.max_merged_results > self.subdivision.threshold {
            return Err(ConfigError::Inconsistent {
                reason: format!(
                    "merge.max_merged_results ({}) exceeds subdivision.threshold ({}); merged cells would be split again",
                    self.merge.max_merged_results, self.subdivision.threshold
                ),
            });
        }
        Ok(())
    }

    pub fn staleness_window(&self) -> Duration {
        Duration::minutes(self.stale_after_minutes as i64)
    }
}

impl SubdivisionConfig {
    pub fn min_cell_size_km(&self) -> f64 {
        self.min_cell_size_m / 1000.0
    }
}

impl GridConfigBuilder {
    pub fn base_cell_size_km(
        mut self,
        km: f64,
    ) -> Self {
        self.base_cell_size_km = Some(km);
        self
    }

    pub fn stale_after_minutes(
        mut self,
        minutes: u32,
    ) -> Self {
        self.stale_after_minutes = Some(minutes);
        self
    }

    pub fn threshold(
        mut self,
        threshold: u32,
    ) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn max_depth(
        mut self,
        depth: u8,
    ) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn min_cell_size_m(
        mut self,
        metres: f64,
    ) -> Self {
        self.min_cell_size_m = Some(metres);
        self
    }

    pub fn max_merged_results(
        mut self,
        results: u32,
    ) -> Self {
        self.max_merged_results = Some(results);
        self
    }

    pub fn max_merged_cell_size_km(
        mut self,
        km: f64,
    ) -> Self {
        self.max_merged_cell_size_km = Some(km);
        self
    }

    /// Fills unset fields with defaults and validates.
    pub fn build(self) -> Result<GridConfig, ConfigError> {
        let default = GridConfig::default();
        let config = GridConfig {
            base_cell_size_km: self.base_cell_size_km.unwrap_or(default.base_cell_size_km),
            stale_after_minutes: self
                .stale_after_minutes
                .unwrap_or(default.stale_after_minutes),
            subdivision: SubdivisionConfig {
                threshold: self.threshold.unwrap_or(default.subdivision.threshold),
                max_depth: self.max_depth.unwrap_or(default.subdivision.max_depth),
                min_cell_size_m: self
                    .min_cell_size_m
                    .unwrap_or(default.subdivision.min_cell_size_m),
            },
            merge: MergeConfig {
                max_merged_results: self
                    .max_merged_results
                    .unwrap_or(default.merge.max_merged_results),
                max_merged_cell_size_km: self
                    .max_merged_cell_size_km
                    .unwrap_or(default.merge.max_merged_cell_size_km),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations
////////////////////////////////////////////////////////////////////////////////

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_cell_size_km: 2.0,
            stale_after_minutes: 30,
            subdivision: SubdivisionConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            max_depth: 5,
            min_cell_size_m: 250.0,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_merged_results: 40,
            max_merged_cell_size_km: 5.0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/cells.jsonl"),
            sync: SyncPolicy::No,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
