use serde::{Deserialize, Serialize};
use uuid::Uuid;
use btleplug::api::bleuuid::uuid_from_u16;

use crate::error::ConfigError;

/// Largest accepted canvas side in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Read the characteristic on a fixed cadence
    Poll,
    /// Subscribe to the characteristic and consume every notification
    Notify,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            InputMode::Poll => "poll",
            InputMode::Notify => "notify",
        };

        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    pub address: String,
    pub characteristic: String,
    pub mode: InputMode,
    pub poll_interval_ms: u64,
    pub scan_timeout_ms: u64,
}

impl DeviceConfig {
    /// Accepts either a 16-bit assigned number ("2a4d") or a full 128-bit uuid.
    pub fn characteristic_uuid(&self) -> Result<Uuid, ConfigError> {
        let value = self.characteristic.trim();

        if value.len() == 4 {
            return u16::from_str_radix(value, 16)
                .map(uuid_from_u16)
                .map_err(|err| ConfigError::Invalid { field: "characteristic", reason: err.to_string() });
        }

        Uuid::parse_str(value)
            .map_err(|err| ConfigError::Invalid { field: "characteristic", reason: err.to_string() })
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            address: "E0:E2:E6:63:23:96".to_string(),
            characteristic: "2a4d".to_string(),
            mode: InputMode::Poll,
            poll_interval_ms: 20,
            scan_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub brush_color: Rgb,
    pub brush_radius: u32,
    pub indicator_radius: u32,
    pub frame_rate: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            title: "Tapete Corpus Christi - Pincel Virtual".to_string(),
            width: 900,
            height: 900,
            background: Rgb(255, 255, 255),
            brush_color: Rgb(255, 0, 0),
            brush_radius: 20,
            indicator_radius: 10,
            frame_rate: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub device: DeviceConfig,
    pub canvas: CanvasConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("canvas.width", self.canvas.width as u64),
            ("canvas.height", self.canvas.height as u64),
            ("canvas.frameRate", self.canvas.frame_rate as u64),
            ("device.pollIntervalMs", self.device.poll_interval_ms),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid { field, reason: "must be greater than 0".to_string() });
            }
        }

        for (field, value) in [("canvas.width", self.canvas.width), ("canvas.height", self.canvas.height)] {
            if value > MAX_CANVAS_SIDE {
                return Err(ConfigError::Invalid { field, reason: format!("must be at most {}", MAX_CANVAS_SIDE) });
            }
        }

        // a disc larger than the diagonal covers the whole canvas anyway
        let diagonal = (self.canvas.width as f64).hypot(self.canvas.height as f64).ceil() as u32;
        for (field, value) in [("canvas.brushRadius", self.canvas.brush_radius), ("canvas.indicatorRadius", self.canvas.indicator_radius)] {
            if value > diagonal {
                return Err(ConfigError::Invalid { field, reason: format!("must be at most {} (the canvas diagonal)", diagonal) });
            }
        }

        self.device.characteristic_uuid()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fixed_setup() {
        let config = Config::default();
        assert_eq!(config.device.address, "E0:E2:E6:63:23:96");
        assert_eq!(config.device.poll_interval_ms, 20);
        assert_eq!((config.canvas.width, config.canvas.height), (900, 900));
        assert_eq!(config.canvas.brush_color, Rgb(255, 0, 0));
        assert_eq!(config.canvas.frame_rate, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"canvas": {"width": 600, "brushColor": [0, 0, 255]}}"#).unwrap();
        assert_eq!(config.canvas.width, 600);
        assert_eq!(config.canvas.height, 900);
        assert_eq!(config.canvas.brush_color, Rgb(0, 0, 255));
        assert_eq!(config.device, DeviceConfig::default());
    }

    #[test]
    fn mode_is_lowercase_in_json() {
        let config: Config = serde_json::from_str(r#"{"device": {"mode": "notify"}}"#).unwrap();
        assert_eq!(config.device.mode, InputMode::Notify);
    }

    #[test]
    fn short_characteristic_expands_on_base_uuid() {
        let uuid = DeviceConfig::default().characteristic_uuid().unwrap();
        assert_eq!(uuid.to_string(), "00002a4d-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn full_characteristic_uuid_is_accepted() {
        let device = DeviceConfig {
            characteristic: "06d1e5e7-79ad-4a71-8faa-373789f7d93c".to_string(),
            ..DeviceConfig::default()
        };
        assert_eq!(device.characteristic_uuid().unwrap().to_string(), "06d1e5e7-79ad-4a71-8faa-373789f7d93c");
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut config = Config::default();
        config.canvas.frame_rate = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "canvas.frameRate", .. })));

        let mut config = Config::default();
        config.device.characteristic = "zz".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let mut config = Config::default();
        config.canvas.width = MAX_CANVAS_SIDE;
        assert!(config.validate().is_ok());

        config.canvas.height = MAX_CANVAS_SIDE + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "canvas.height", .. })));
    }

    #[test]
    fn radii_beyond_the_diagonal_are_rejected() {
        // 900x900 has a diagonal of 1272.8 pixels
        let mut config = Config::default();
        config.canvas.brush_radius = 1273;
        assert!(config.validate().is_ok());

        config.canvas.brush_radius = 4_000_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "canvas.brushRadius", .. })));

        let mut config = Config::default();
        config.canvas.indicator_radius = 1274;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "canvas.indicatorRadius", .. })));
    }
}
