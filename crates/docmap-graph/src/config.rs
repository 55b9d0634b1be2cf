//! Engine settings.
//!
//! Everything tunable lives here: layout physics, layered spacing, animation
//! frame counts, placement jitter and the nominal viewport. Every section is
//! `#[serde(default)]` so a settings file only needs the values it changes.
//!
//! A documented default file ships at `config/graph_settings.yaml`.

use crate::error::{GraphError, Result};
use crate::layout::{LayoutAlgorithm, LayoutDirection};
use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level settings for one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub layout: LayoutSettings,
    pub animation: AnimationSettings,
    pub placement: PlacementSettings,
    pub viewport: ViewportSettings,
}

// =============================================================================
// LAYOUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Algorithm used for fresh layouts
    pub algorithm: LayoutAlgorithm,
    /// Which axis carries the rank in layered layouts
    pub direction: LayoutDirection,

    // --- force simulation ---
    /// Iteration budget
    pub iterations: usize,
    /// Stop early once the summed displacement of one iteration drops below this
    pub convergence_threshold: f32,
    /// Coulomb-style repulsion constant
    pub repulsion: f32,
    /// Rest length of edge springs
    pub spring_length: f32,
    /// Hooke constant of edge springs
    pub spring_strength: f32,
    /// Pull toward the component centroid
    pub gravity: f32,
    /// Barnes-Hut opening angle (0 = exact, larger = coarser)
    pub theta: f32,
    /// Velocity retained between iterations
    pub damping: f32,
    /// Per-iteration step cap for a single node
    pub max_displacement: f32,
    /// Rectangle separation passes after the simulation
    pub collision_passes: usize,

    // --- layered ---
    /// Gap between neighbouring nodes in one rank
    pub node_spacing: f32,
    /// Distance between consecutive ranks
    pub rank_spacing: f32,
    /// Barycenter sweeps (each = one down + one up pass)
    pub crossing_passes: usize,

    // --- shared ---
    /// Gap between tiled disconnected components
    pub component_gap: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::Force,
            direction: LayoutDirection::TopDown,
            iterations: 300,
            convergence_threshold: 1.0,
            repulsion: 60_000.0,
            spring_length: 220.0,
            spring_strength: 0.04,
            gravity: 0.01,
            theta: 0.9,
            damping: 0.85,
            max_displacement: 60.0,
            collision_passes: 8,
            node_spacing: 40.0,
            rank_spacing: 140.0,
            crossing_passes: 4,
            component_gap: 80.0,
        }
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub entering_frames: usize,
    pub exiting_frames: usize,
    pub transition_frames: usize,
    /// Tick period for timer-driven hosts (`IntervalTicker`)
    pub tick_interval_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            entering_frames: 15,
            exiting_frames: 10,
            transition_frames: 20,
            tick_interval_ms: 16,
        }
    }
}

impl AnimationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// =============================================================================
// PLACEMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Distance from the neighbour centroid at which a new node lands
    pub neighbor_offset: f32,
    /// Extra random radius added on top of the offset
    pub jitter: f32,
    /// Fixed seed for reproducible placement; `None` draws from entropy
    pub seed: Option<u64>,
    /// How often a placed node is pushed outward to escape an overlap
    pub max_nudge_attempts: usize,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            neighbor_offset: 120.0,
            jitter: 40.0,
            seed: None,
            max_nudge_attempts: 12,
        }
    }
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Nominal viewport, used to centre layouts and to drop orphan nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl ViewportSettings {
    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width / 2.0, self.height / 2.0)
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl GraphSettings {
    /// Parse settings from YAML and validate them.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: GraphSettings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| GraphError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), "loaded graph settings");
        Ok(settings)
    }

    /// Builder: fix the placement seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.placement.seed = Some(seed);
        self
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(layout.theta > 0.0 && layout.theta <= 2.0) {
            return Err(invalid(format!(
                "layout.theta must be in (0, 2], got {}",
                layout.theta
            )));
        }
        if !(layout.damping > 0.0 && layout.damping <= 1.0) {
            return Err(invalid(format!(
                "layout.damping must be in (0, 1], got {}",
                layout.damping
            )));
        }
        if layout.iterations == 0 {
            return Err(invalid("layout.iterations must be at least 1".into()));
        }
        if layout.node_spacing < 0.0 || layout.rank_spacing <= 0.0 || layout.component_gap < 0.0
        {
            return Err(invalid(
                "layout spacings must be non-negative (rank_spacing positive)".into(),
            ));
        }
        if layout.max_displacement <= 0.0 {
            return Err(invalid("layout.max_displacement must be positive".into()));
        }

        let animation = &self.animation;
        for (name, frames) in [
            ("entering_frames", animation.entering_frames),
            ("exiting_frames", animation.exiting_frames),
            ("transition_frames", animation.transition_frames),
        ] {
            if frames < 2 {
                return Err(invalid(format!(
                    "animation.{name} must be at least 2, got {frames}"
                )));
            }
        }

        if animation.tick_interval_ms == 0 {
            return Err(invalid("animation.tick_interval_ms must be at least 1".into()));
        }

        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(invalid("viewport dimensions must be positive".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> GraphError {
    GraphError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shipped_settings_file_matches_defaults() {
        let yaml = include_str!("../config/graph_settings.yaml");
        let settings = GraphSettings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings, GraphSettings::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let settings = GraphSettings::from_yaml_str(
            "layout:\n  algorithm: hierarchical\n  iterations: 50\nplacement:\n  seed: 7\n",
        )
        .unwrap();
        assert_eq!(settings.layout.algorithm, LayoutAlgorithm::Hierarchical);
        assert_eq!(settings.layout.iterations, 50);
        assert_eq!(settings.layout.theta, 0.9);
        assert_eq!(settings.placement.seed, Some(7));
        assert_eq!(settings.animation.entering_frames, 15);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = GraphSettings::from_yaml_str("layout:\n  theta: 0.0\n").unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig(_)));

        let err = GraphSettings::from_yaml_str("animation:\n  exiting_frames: 1\n").unwrap_err();
        assert!(err.to_string().contains("exiting_frames"));
    }

    #[test]
    fn tick_interval_from_settings() {
        let settings = GraphSettings::from_yaml_str("animation:\n  tick_interval_ms: 33\n").unwrap();
        assert_eq!(settings.animation.tick_interval(), Duration::from_millis(33));

        let err = GraphSettings::from_yaml_str("animation:\n  tick_interval_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = GraphSettings::from_yaml_str("layout: [unclosed").unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GraphSettings::load("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn viewport_center() {
        let viewport = ViewportSettings {
            width: 400.0,
            height: 200.0,
        };
        assert_eq!(viewport.center(), Pos2::new(200.0, 100.0));
    }
}
