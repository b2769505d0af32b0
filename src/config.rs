use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WheelError};
use crate::spin::SpinTuning;
use crate::store::DEFAULT_LOCK_KEY;

pub const DEFAULT_SLICES: [&str; 6] = [
    "10% OFF",
    "Free keychain",
    "Free bracelet",
    "5% OFF",
    "Spin again",
    "15% OFF",
];

/// Color representation for wheel elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Parse from hex string like "#FF0000" or "FF0000"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| format!("invalid colour {s:?}, expected #rrggbb"))
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Colours for everything drawn on the surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelStyle {
    pub palette: Vec<Color>,
    pub background: Color,
    pub label: Color,
    pub pointer: Color,
    pub cap_outer: Color,
    pub cap_inner: Color,
    pub button: Color,
    pub button_text: Color,
    pub text: Color,
    pub muted_text: Color,
}

impl Default for WheelStyle {
    fn default() -> Self {
        Self {
            palette: vec![
                Color::new(0xff, 0x5c, 0x8a),
                Color::new(0x6e, 0xe7, 0xff),
                Color::new(0xa7, 0x8b, 0xfa),
                Color::new(0x34, 0xd3, 0x99),
                Color::new(0xfb, 0xbf, 0x24),
                Color::new(0x94, 0xa3, 0xb8),
            ],
            background: Color::new(0x0b, 0x0d, 0x14),
            label: Color::new(0x0a, 0x0c, 0x12),
            pointer: Color::new(0xf8, 0xfa, 0xfc),
            cap_outer: Color::new(0xff, 0xff, 0xff),
            cap_inner: Color::new(0x0f, 0x12, 0x1e),
            button: Color::new(0xfb, 0xbf, 0x24),
            button_text: Color::new(0x0a, 0x0c, 0x12),
            text: Color::new(0xf1, 0xf5, 0xf9),
            muted_text: Color::new(0x94, 0xa3, 0xb8),
        }
    }
}

impl WheelStyle {
    /// Palette entries repeat when there are more slices than colours.
    pub fn slice_color(&self, color_index: usize) -> Color {
        if self.palette.is_empty() {
            return self.muted_text;
        }
        self.palette[color_index % self.palette.len()]
    }

    /// Light stroke between slices.
    pub fn divider_color(&self) -> (u8, u8, u8) {
        Color::new(0xff, 0xff, 0xff).as_tuple_alpha_blend(self.background.as_tuple(), 0.22)
    }
}

/// Configuration for application window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub max_framerate: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Spin the Wheel".to_string(),
            width: 520,
            height: 680,
            max_framerate: 60.0,
        }
    }
}

impl WindowConfig {
    /// Rejects sizes and frame rates the window loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WheelError::Configuration(format!(
                "window size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        let fps = self.max_framerate;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(WheelError::Configuration(format!(
                "window.max_framerate must be positive, got {fps}"
            )));
        }
        Ok(())
    }
}

/// Spin ranges as they appear in the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinSettings {
    pub min_turns: u32,
    pub max_turns: u32,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            min_turns: 5,
            max_turns: 8,
            min_duration_ms: 3200.0,
            max_duration_ms: 4000.0,
        }
    }
}

impl From<&SpinSettings> for SpinTuning {
    fn from(s: &SpinSettings) -> Self {
        SpinTuning {
            turns: s.min_turns..=s.max_turns,
            duration_ms: s.min_duration_ms..s.max_duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSettings {
    pub slices: Vec<String>,
    pub storage_key: String,
    /// Where the lock flag lives; the platform data dir when unset.
    pub state_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            slices: DEFAULT_SLICES.iter().map(|s| s.to_string()).collect(),
            storage_key: DEFAULT_LOCK_KEY.to_string(),
            state_path: None,
            font_path: None,
        }
    }
}

/// Settings file, `~/.config/prize-wheel/config.toml` by default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wheel: WheelSettings,
    pub spin: SpinSettings,
    pub window: WindowConfig,
    pub style: WheelStyle,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WheelError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            WheelError::Configuration(msg) => {
                WheelError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| WheelError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wheel.slices.is_empty() {
            return Err(WheelError::Configuration(
                "wheel.slices must name at least one slice".to_string(),
            ));
        }
        if self.wheel.storage_key.is_empty() {
            return Err(WheelError::Configuration(
                "wheel.storage_key must not be empty".to_string(),
            ));
        }
        self.window.validate()?;
        SpinTuning::from(&self.spin).validate()
    }

    /// Get the default XDG config path (~/.config/prize-wheel/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prize-wheel").join("config.toml"))
    }

    /// Load from the default path if it exists. Parse errors are logged and
    /// the defaults used instead.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_parse_and_print() {
        let c = Color::from_hex("#ff5c8a").unwrap();
        assert_eq!(c, Color::new(0xff, 0x5c, 0x8a));
        assert_eq!(c.to_string(), "#ff5c8a");
        assert_eq!(Color::from_hex("34D399"), Some(Color::new(0x34, 0xd3, 0x99)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn palette_wraps() {
        let style = WheelStyle::default();
        assert_eq!(style.slice_color(6), style.slice_color(0));
        let empty = WheelStyle {
            palette: Vec::new(),
            ..WheelStyle::default()
        };
        assert_eq!(empty.slice_color(3), empty.muted_text);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.wheel.slices.len(), 6);
        assert_eq!(settings.wheel.storage_key, "spin_demo_locked_v1");
        assert_eq!(SpinTuning::from(&settings.spin), SpinTuning::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let settings = Settings::parse(
            r##"
            [wheel]
            slices = ["Mug", "Spin again", "Sticker"]

            [spin]
            max_turns = 6

            [style]
            palette = ["#000000", "#ffffff"]
            "##,
        )
        .unwrap();
        assert_eq!(settings.wheel.slices, vec!["Mug", "Spin again", "Sticker"]);
        assert_eq!(settings.spin.min_turns, 5);
        assert_eq!(settings.spin.max_turns, 6);
        assert_eq!(settings.style.palette.len(), 2);
        assert_eq!(settings.window, WindowConfig::default());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(Settings::parse("[wheel]\nslices = []").is_err());
        assert!(Settings::parse("[spin]\nmin_turns = 9").is_err());
        assert!(Settings::parse("[style]\nbackground = \"red\"").is_err());
        assert!(Settings::parse("[window]\nmax_framerate = 0").is_err());
        assert!(Settings::parse("[window]\nwidth = 0").is_err());
        assert!(Settings::parse("[spin]\nmin_turns = 1\nmax_turns = 1").is_err());
    }

    #[test]
    fn parse_errors_stay_typed() {
        assert!(matches!(
            Settings::parse("[wheel\nslices = 3"),
            Err(WheelError::Configuration(_))
        ));
        assert!(matches!(
            Settings::parse("[spin]\nmin_turns = 2"),
            Err(WheelError::Configuration(msg)) if msg.contains("at least 3 turns")
        ));
    }

    #[test]
    fn load_prefixes_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[window]\nmax_framerate = -1").unwrap();
        match Settings::load(&path) {
            Err(WheelError::Configuration(msg)) => {
                assert!(msg.starts_with(&path.display().to_string()), "{msg}");
                assert!(msg.contains("max_framerate"), "{msg}");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let text = toml::to_string(&Settings::default()).unwrap();
        assert_eq!(Settings::parse(&text).unwrap(), Settings::default());
    }
}
