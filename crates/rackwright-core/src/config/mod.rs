//! Immutable layout configuration.
//!
//! A [`LayoutConfig`] is built once per engine and passed by reference into every layout function.
//! Integrators override parts of it with a partial JSON document that is deep-merged onto the
//! defaults before deserialization.

use crate::colors::{ColorScheme, MIN_JOB_PALETTE_LEN};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 2D rack canvas constants, in pixels unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub rack_margin_left: f64,
    pub rack_margin_top: f64,
    /// Space above the rack frame reserved for the rack name.
    pub rack_name_height: f64,
    pub rack_border_width: f64,
    pub rack_unit_height: f64,
    pub rack_inside_width: f64,
    /// Rack height in rack units.
    pub rack_units: f64,
    /// Gap between a node's outline and its core grid.
    pub node_padding: f64,
    pub led_size: f64,
    /// Gap between the LED and the core grid.
    pub led_margin: f64,
    /// Inset applied to every core cell.
    pub core_padding: f64,
    pub font_size: f64,
    pub text_padding: f64,
    /// Labels never get less room than this, even on tiny nodes.
    pub min_label_width: f64,
    pub ellipsis: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            rack_margin_left: 10.0,
            rack_margin_top: 10.0,
            rack_name_height: 20.0,
            rack_border_width: 10.0,
            rack_unit_height: 12.0,
            rack_inside_width: 200.0,
            rack_units: 42.0,
            node_padding: 2.0,
            led_size: 4.0,
            led_margin: 2.0,
            core_padding: 0.5,
            font_size: 8.0,
            text_padding: 2.0,
            min_label_width: 12.0,
            ellipsis: "...".to_string(),
        }
    }
}

impl CanvasConfig {
    pub fn rack_height(&self) -> f64 {
        self.rack_units * self.rack_unit_height + 2.0 * self.rack_border_width
    }

    pub fn rack_width(&self) -> f64 {
        self.rack_inside_width + 2.0 * self.rack_border_width
    }

    /// Horizontal space of a node that cores cannot use (padding plus LED column).
    pub fn core_padding_horizontal(&self) -> f64 {
        2.0 * self.node_padding + self.led_size + self.led_margin
    }

    pub fn core_padding_vertical(&self) -> f64 {
        2.0 * self.node_padding
    }

    /// Full canvas size needed by one rack.
    pub fn canvas_size(&self) -> (f64, f64) {
        (
            2.0 * self.rack_margin_left + self.rack_width(),
            2.0 * self.rack_margin_top + self.rack_name_height + self.rack_height(),
        )
    }
}

/// Floor-plan grid constants, in cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Walkable aisle around the racks and between facing ranges.
    pub path_width: usize,
    /// Gap between back-to-back ranges.
    pub hot_aisle_width: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            path_width: 2,
            hot_aisle_width: 1,
        }
    }
}

/// 3D scene constants, in world units (meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// World size of one grid column (X).
    pub cell_width: f64,
    /// World size of one grid row (Z).
    pub cell_depth: f64,
    pub rack_width: f64,
    pub rack_depth: f64,
    pub rack_unit_height: f64,
    pub rack_units: f64,
    /// Fraction of the rack depth a node occupies.
    pub node_depth_ratio: f64,
    /// Explicitly declared room footprint; the grid footprint wins when larger.
    pub room_width: Option<f64>,
    pub room_depth: Option<f64>,
    /// World size of one floor/wall texture tile when tiling by explicit dimensions.
    pub texture_size: f64,
    /// Grid cells covered by one texture tile when tiling by units.
    pub cells_per_texture: f64,
    pub ceiling_clearance: f64,
    pub collision_margin: f64,
    pub led_size: f64,
    pub cpu_padding: f64,
    /// Distance between a node front and the CPU blocks / LEDs drawn on it.
    pub front_offset: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cell_width: 0.6,
            cell_depth: 1.2,
            rack_width: 0.6,
            rack_depth: 1.0,
            rack_unit_height: 0.0445,
            rack_units: 42.0,
            node_depth_ratio: 0.9,
            room_width: None,
            room_depth: None,
            texture_size: 1.0,
            cells_per_texture: 1.0,
            ceiling_clearance: 1.0,
            collision_margin: 0.2,
            led_size: 0.01,
            cpu_padding: 0.004,
            front_offset: 0.001,
        }
    }
}

impl SceneConfig {
    pub fn rack_height(&self) -> f64 {
        self.rack_units * self.rack_unit_height
    }
}

/// Topology graph sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub node_radius: f64,
    pub nodeset_radius: f64,
    pub switch_radius: f64,
    /// Added to `switch_radius` per switch level.
    pub switch_radius_step: f64,
    pub switch_link_weight: f64,
    pub nodeset_link_weight: f64,
    pub member_link_weight: f64,
    /// Distance between seed rings.
    pub ring_spacing: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node_radius: 4.0,
            nodeset_radius: 8.0,
            switch_radius: 10.0,
            switch_radius_step: 3.0,
            switch_link_weight: 1.0,
            nodeset_link_weight: 1.0,
            member_link_weight: 0.5,
            ring_spacing: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub canvas: CanvasConfig,
    pub room: RoomConfig,
    pub scene: SceneConfig,
    pub topology: TopologyConfig,
    pub colors: ColorScheme,
}

impl LayoutConfig {
    /// Defaults with `overrides` deep-merged on top.
    ///
    /// `overrides` may be partial (`{"canvas": {"rack_unit_height": 14}}`); `null` and `{}` keep
    /// the defaults.
    pub fn from_overrides(overrides: &Value) -> Result<Self> {
        if overrides.is_null() {
            return Ok(Self::default());
        }
        if !overrides.is_object() {
            return Err(Error::InvalidConfig {
                message: "overrides must be a JSON object".to_string(),
            });
        }
        let mut base = serde_json::to_value(Self::default())?;
        deep_merge_value(&mut base, overrides);
        let config: Self = serde_json::from_value(base).map_err(|err| Error::InvalidConfig {
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.canvas;
        let s = &self.scene;
        let positive = [
            ("canvas.rack_unit_height", c.rack_unit_height),
            ("canvas.rack_inside_width", c.rack_inside_width),
            ("canvas.rack_units", c.rack_units),
            ("canvas.font_size", c.font_size),
            ("scene.cell_width", s.cell_width),
            ("scene.cell_depth", s.cell_depth),
            ("scene.rack_width", s.rack_width),
            ("scene.rack_depth", s.rack_depth),
            ("scene.rack_unit_height", s.rack_unit_height),
            ("scene.texture_size", s.texture_size),
            ("scene.cells_per_texture", s.cells_per_texture),
        ];
        for (path, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig {
                    message: format!("`{path}` must be a positive number, got {value}"),
                });
            }
        }
        let non_negative = [
            ("canvas.rack_border_width", c.rack_border_width),
            ("canvas.node_padding", c.node_padding),
            ("canvas.core_padding", c.core_padding),
            ("scene.collision_margin", s.collision_margin),
            ("scene.ceiling_clearance", s.ceiling_clearance),
        ];
        for (path, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig {
                    message: format!("`{path}` must not be negative, got {value}"),
                });
            }
        }
        if self.colors.jobs.len() < MIN_JOB_PALETTE_LEN {
            return Err(Error::InvalidConfig {
                message: format!(
                    "`colors.jobs` needs at least {MIN_JOB_PALETTE_LEN} colors, got {}",
                    self.colors.jobs.len()
                ),
            });
        }
        Ok(())
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Convenience for tests and tools: an empty override document.
pub fn empty_overrides() -> Value {
    Value::Object(Map::new())
}
