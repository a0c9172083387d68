//! Configuration management for the Reflow Grid host.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. The platform config directory (`%APPDATA%`, `~/Library/Application Support`, `$XDG_CONFIG_HOME`)
//! 2. `~/.config/reflow-grid/config.toml`
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use reflow_grid_core::{ItemStyle, DEFAULT_VERTICAL_PADDING};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout defaults shared by every grid.
    pub layout: LayoutConfig,
    /// How new item heights are chosen.
    pub items: ItemsConfig,
    /// Item appearance handed to the render surface.
    pub style: StyleConfig,
    /// Behavior configuration.
    pub behavior: BehaviorConfig,
    /// Grid regions on the board, back to front.
    #[serde(default = "default_grids")]
    pub grids: Vec<GridConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            items: ItemsConfig::default(),
            style: StyleConfig::default(),
            behavior: BehaviorConfig::default(),
            grids: default_grids(),
        }
    }
}

/// Layout-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of every item in pixels.
    #[serde(default = "default_item_width")]
    pub item_width: f64,

    /// Gap between vertically adjacent items in pixels.
    #[serde(default = "default_vertical_padding")]
    pub vertical_padding: f64,

    /// Whether dragging an item live-reorders its grid.
    #[serde(default = "default_true")]
    pub reorderable: bool,

    /// Whether drag callbacks fire, enabling transfer between grids.
    #[serde(default = "default_true")]
    pub draggable: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            item_width: default_item_width(),
            vertical_padding: default_vertical_padding(),
            reorderable: true,
            draggable: true,
        }
    }
}

/// Item height generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    /// Smallest generated height.
    #[serde(default = "default_base_height")]
    pub base_height: f64,

    /// Heights are drawn from `base_height..base_height + height_variance`.
    #[serde(default = "default_height_variance")]
    pub height_variance: u32,

    /// Seed for reproducible heights. Random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            base_height: default_base_height(),
            height_variance: default_height_variance(),
            seed: None,
        }
    }
}

/// Item appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    #[serde(default = "default_header_height")]
    pub header_height: f64,

    #[serde(default = "default_footer_height")]
    pub footer_height: f64,

    /// Colors as `#rrggbb`.
    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_border")]
    pub border: String,

    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            header_height: default_header_height(),
            footer_height: default_footer_height(),
            background: default_background(),
            border: default_border(),
            accent: default_accent(),
        }
    }
}

impl StyleConfig {
    /// Build the item style, falling back to the default for unparseable colors.
    pub fn item_style(&self) -> ItemStyle {
        let fallback = ItemStyle::default();
        ItemStyle {
            header_height: self.header_height,
            footer_height: self.footer_height,
            background: parse_hex_color(&self.background).unwrap_or(fallback.background),
            border: parse_hex_color(&self.border).unwrap_or(fallback.border),
            accent: parse_hex_color(&self.accent).unwrap_or(fallback.accent),
        }
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A named grid region on the board.
///
/// # Example Config
///
/// ```toml
/// [[grids]]
/// name = "inbox"
/// x = 0
/// y = 0
/// width = 400
/// height = 600
/// initial_items = 8
///
/// [[grids]]
/// name = "archive"
/// x = 400
/// y = 0
/// width = 400
/// height = 600
/// reorderable = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Overrides `layout.reorderable` for this grid.
    #[serde(default)]
    pub reorderable: Option<bool>,
    /// Overrides `layout.draggable` for this grid.
    #[serde(default)]
    pub draggable: Option<bool>,
    /// Items created when the host starts.
    #[serde(default)]
    pub initial_items: usize,
}

/// A problem found and corrected while validating the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// Default value functions for serde
fn default_item_width() -> f64 {
    180.0
}

fn default_vertical_padding() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_base_height() -> f64 {
    100.0
}

fn default_height_variance() -> u32 {
    100
}

fn default_header_height() -> f64 {
    50.0
}

fn default_footer_height() -> f64 {
    5.0
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_border() -> String {
    "#e9e9e9".to_string()
}

fn default_accent() -> String {
    "#414141".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A narrow "selected" tray on the left and a wide "items" grid beside it.
fn default_grids() -> Vec<GridConfig> {
    vec![
        GridConfig {
            name: "selected".to_string(),
            x: 0.0,
            y: 0.0,
            width: 234.0,
            height: 600.0,
            reorderable: Some(false),
            draggable: Some(true),
            initial_items: 0,
        },
        GridConfig {
            name: "items".to_string(),
            x: 234.0,
            y: 0.0,
            width: 566.0,
            height: 600.0,
            reorderable: Some(false),
            draggable: Some(true),
            initial_items: 20,
        },
    ]
}

/// Parse a `#rrggbb` color.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        for path in &config_paths() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Clamp or replace values the layout can't use.
    ///
    /// Every correction is returned as a warning for the caller to log.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(self.layout.item_width.is_finite() && self.layout.item_width > 0.0) {
            warnings.push(ConfigWarning::new(
                "layout.item_width",
                format!("{} is not a positive width, using {}", self.layout.item_width, default_item_width()),
            ));
            self.layout.item_width = default_item_width();
        }
        if !(self.layout.vertical_padding.is_finite() && self.layout.vertical_padding >= 0.0) {
            warnings.push(ConfigWarning::new(
                "layout.vertical_padding",
                format!("{} is not a non-negative padding, using {}", self.layout.vertical_padding, DEFAULT_VERTICAL_PADDING),
            ));
            self.layout.vertical_padding = DEFAULT_VERTICAL_PADDING;
        }
        if !(self.items.base_height.is_finite() && self.items.base_height > 0.0) {
            warnings.push(ConfigWarning::new(
                "items.base_height",
                format!("{} is not a positive height, using {}", self.items.base_height, default_base_height()),
            ));
            self.items.base_height = default_base_height();
        }

        for (field, value, fallback) in [
            ("style.background", &mut self.style.background, default_background()),
            ("style.border", &mut self.style.border, default_border()),
            ("style.accent", &mut self.style.accent, default_accent()),
        ] {
            if parse_hex_color(value).is_none() {
                warnings.push(ConfigWarning::new(
                    field,
                    format!("'{}' is not a #rrggbb color, using {}", value, fallback),
                ));
                *value = fallback;
            }
        }

        if !matches!(
            self.behavior.log_level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            warnings.push(ConfigWarning::new(
                "behavior.log_level",
                format!("unknown level '{}', using info", self.behavior.log_level),
            ));
            self.behavior.log_level = default_log_level();
        }

        let mut seen = HashSet::new();
        self.grids.retain(|grid| {
            let sized = grid.width.is_finite()
                && grid.height.is_finite()
                && grid.width > 0.0
                && grid.height > 0.0;
            if !sized {
                warnings.push(ConfigWarning::new(
                    format!("grids.{}", grid.name),
                    format!("size {}x{} is empty, grid dropped", grid.width, grid.height),
                ));
                return false;
            }
            if !seen.insert(grid.name.clone()) {
                warnings.push(ConfigWarning::new(
                    format!("grids.{}", grid.name),
                    "duplicate grid name, later definition dropped",
                ));
                return false;
            }
            true
        });

        if self.grids.is_empty() {
            warnings.push(ConfigWarning::new("grids", "no usable grids, using the default board"));
            self.grids = default_grids();
        }

        warnings
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("com", "reflow-grid", "reflow-grid") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    if let Some(home) = dirs_home() {
        paths.push(home.join(".config").join("reflow-grid").join("config.toml"));
    }

    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
