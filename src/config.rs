use std::{
    fs::File,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    correlation::DEFAULT_HOVER_THRESHOLD_M,
    errors::LaplineError,
    telemetry::ChannelId,
    track_map::{ClassifierThresholds, DEFAULT_GRANULARITY_M, TrackMapConfig},
};

const APP_DIR_NAME: &str = "lapline";
const CONFIG_FILE_NAME: &str = "config.json";

/// Channels shown by default before the user picks their own
const DEFAULT_VISIBLE: [ChannelId; 4] = [
    ChannelId::Speed,
    ChannelId::Throttle,
    ChannelId::Brake,
    ChannelId::Steering,
];

/// One chart row: which channel, under what label, and where.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub id: ChannelId,
    pub label: String,
    pub visible: bool,
    pub order: usize,
}

pub fn default_charts() -> Vec<ChartConfig> {
    ChannelId::all()
        .into_iter()
        .filter(|id| !matches!(id, ChannelId::Tc | ChannelId::Abs))
        .enumerate()
        .map(|(order, id)| ChartConfig {
            id,
            label: id.label(),
            visible: DEFAULT_VISIBLE.contains(&id),
            order,
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub charts: Vec<ChartConfig>,
    pub thresholds: ClassifierThresholds,
    pub index_granularity_m: f64,
    pub hover_threshold_m: f64,
    pub track_map: TrackMapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            charts: default_charts(),
            thresholds: ClassifierThresholds::default(),
            index_granularity_m: DEFAULT_GRANULARITY_M,
            hover_threshold_m: DEFAULT_HOVER_THRESHOLD_M,
            track_map: TrackMapConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, LaplineError> {
        Ok(dirs::config_dir()
            .ok_or(LaplineError::NoConfigDir)?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Config saved in the user's config directory, `None` if there isn't one yet.
    pub fn from_local_file() -> Result<Option<Self>, LaplineError> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        let config_path = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Self::from_path(&config_path).map(Some)
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Ok(None)
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LaplineError> {
        let file = File::open(path).map_err(|e| LaplineError::ConfigIOError { source: e })?;
        let config: AppConfig = serde_json::from_reader(file)
            .map_err(|e| LaplineError::ConfigSerializeError { source: e })?;
        config.validate()?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<(), LaplineError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LaplineError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LaplineError::ConfigIOError { source: e })?;
            }
        }

        let file = File::create(path).map_err(|e| LaplineError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LaplineError::ConfigSerializeError { source: e })
    }

    pub fn validate(&self) -> Result<(), LaplineError> {
        if let Some(id) = self.charts.iter().map(|c| c.id).duplicates().next() {
            return Err(LaplineError::InvalidChartConfig {
                reason: format!("channel {id} configured more than once"),
            });
        }
        if !(self.index_granularity_m.is_finite() && self.index_granularity_m > 0.0) {
            return Err(LaplineError::InvalidChartConfig {
                reason: format!(
                    "index granularity must be a positive number of meters, got {}",
                    self.index_granularity_m
                ),
            });
        }
        if !(self.hover_threshold_m.is_finite() && self.hover_threshold_m >= 0.0) {
            return Err(LaplineError::InvalidChartConfig {
                reason: format!("invalid hover threshold {}", self.hover_threshold_m),
            });
        }
        let track_map = &self.track_map;
        for (name, padding) in [
            ("full", track_map.full_padding),
            ("zoom", track_map.zoom_padding),
        ] {
            if !(padding.is_finite() && padding > 0.0) {
                return Err(LaplineError::InvalidChartConfig {
                    reason: format!("{name} padding must be positive, got {padding}"),
                });
            }
        }
        Ok(())
    }

    /// Visible channels in chart order.
    pub fn visible_channels(&self) -> Vec<ChannelId> {
        self.charts
            .iter()
            .filter(|c| c.visible)
            .sorted_by_key(|c| c.order)
            .map(|c| c.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Corner;
    use tempfile::TempDir;

    #[test]
    fn test_default_charts() {
        let charts = default_charts();
        assert_eq!(charts.len(), 30);
        assert_eq!(charts[7].id, ChannelId::TirePressure(Corner::FrontLeft));
        assert_eq!(charts[7].label, "Tire Pressure FL");
        assert_eq!(charts[29].id, ChannelId::TrackEdge);
        assert_eq!(
            AppConfig::default().visible_channels(),
            DEFAULT_VISIBLE.to_vec()
        );
    }

    #[test]
    fn test_visible_channels_follow_order() {
        let mut config = AppConfig::default();
        for chart in config.charts.iter_mut() {
            match chart.id {
                ChannelId::Gear => {
                    chart.visible = true;
                    chart.order = 0;
                }
                ChannelId::Speed => chart.order = 40,
                _ => {}
            }
        }
        let visible = config.visible_channels();
        assert_eq!(visible.first(), Some(&ChannelId::Gear));
        assert_eq!(visible.last(), Some(&ChannelId::Speed));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.thresholds.brake = 10.0;
        config.hover_threshold_m = 1.5;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"hover_threshold_m": 5.0}"#).unwrap();

        let loaded = AppConfig::from_path(&path).unwrap();
        assert_eq!(loaded.hover_threshold_m, 5.0);
        assert_eq!(loaded.charts, default_charts());
        assert_eq!(loaded.index_granularity_m, DEFAULT_GRANULARITY_M);
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(
            &path,
            r#"{"charts": [
                {"id": "speed", "label": "Speed", "visible": true, "order": 0},
                {"id": "speed", "label": "Speed again", "visible": true, "order": 1}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(LaplineError::InvalidChartConfig { .. })
        ));

        std::fs::write(
            &path,
            r#"{"charts": [{"id": "boost", "label": "Boost", "visible": true, "order": 0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(LaplineError::ConfigSerializeError { .. })
        ));

        assert!(matches!(
            AppConfig::from_path(&temp_dir.path().join("missing.json")),
            Err(LaplineError::ConfigIOError { .. })
        ));
    }

    #[test]
    fn test_track_map_padding_must_be_positive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.track_map.zoom_padding = 0.0;
        assert!(matches!(
            config.save_to(&path),
            Err(LaplineError::InvalidChartConfig { .. })
        ));
        assert!(!path.exists());

        config.track_map.zoom_padding = 50.0;
        config.track_map.full_padding = f64::NAN;
        assert!(config.validate().is_err());
        config.track_map.full_padding = -10.0;
        assert!(config.validate().is_err());

        std::fs::write(&path, r#"{"track_map": {"full_padding": 0}}"#).unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(LaplineError::InvalidChartConfig { .. })
        ));
    }
}
