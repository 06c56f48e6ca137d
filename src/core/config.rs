//! Game configuration with documented defaults
//!
//! Loaded from TOML. Every section is optional; missing fields fall back
//! to the defaults below.

use crate::core::error::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which side of the divider the player may move in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayableHalf {
    /// Rows strictly above the middle row
    #[default]
    Upper,
    /// Rows strictly below the middle row
    Lower,
}

/// What happens to a dropped block that lands on other objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// Blocks may stack; same-value stacks merge into the next denomination
    #[default]
    Stack,
    /// A block dropped onto another object is moved to the nearest free cell
    Spread,
}

/// How targets are laid out in the non-playable half
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLayout {
    /// Uniformly random free cells
    Random,
    /// One row, constant random spacing
    #[default]
    Even,
    /// One row, independently random spacing
    Uneven,
    /// One column, constant random spacing
    Vertical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid height in grid units
    pub rows: i32,
    /// Grid width in grid units
    pub cols: i32,
    /// Side length of one grid unit in pixels
    pub pixel_density: usize,
    /// Draw a divider across the middle row and restrict the player to one half
    pub divided: bool,
    pub playable_half: PlayableHalf,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 50,
            pixel_density: 1,
            divided: true,
            playable_half: PlayableHalf::Upper,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Minimum number of targets per episode (inclusive)
    pub min: usize,
    /// Maximum number of targets per episode (inclusive)
    pub max: usize,
    pub layout: TargetLayout,
    /// Largest gap between neighbouring targets for the uneven layout
    pub max_spacing: i32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            min: 1,
            max: 10,
            layout: TargetLayout::Even,
            max_spacing: 5,
        }
    }
}

/// Complete configuration for a registry and its episodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub drop_policy: DropPolicy,
    /// Penalty reported alongside a `Full` event
    pub full_grid_penalty: f32,
    pub targets: TargetConfig,
    /// Seed for episode generation; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            drop_policy: DropPolicy::Stack,
            full_grid_penalty: -1.0,
            targets: TargetConfig::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.rows <= 0 || grid.cols <= 0 {
            return Err(GridError::InvalidConfig(format!(
                "grid must have positive dimensions, got {}x{}",
                grid.rows, grid.cols
            )));
        }
        if grid.pixel_density == 0 {
            return Err(GridError::InvalidConfig(
                "pixel_density must be at least 1".into(),
            ));
        }
        // A divided grid needs at least one row on each side of the divider
        if grid.divided && grid.rows < 3 {
            return Err(GridError::InvalidConfig(format!(
                "a divided grid needs at least 3 rows, got {}",
                grid.rows
            )));
        }
        if self.targets.min > self.targets.max {
            return Err(GridError::InvalidConfig(format!(
                "targets.min ({}) should be <= targets.max ({})",
                self.targets.min, self.targets.max
            )));
        }
        if self.targets.max_spacing < 0 {
            return Err(GridError::InvalidConfig(
                "targets.max_spacing must not be negative".into(),
            ));
        }
        Ok(())
    }
}
