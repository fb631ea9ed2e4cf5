//! Model preset catalog.
//!
//! Presets are curated descriptions of the models this gateway is willing to
//! front: capabilities, defaults, and safe parameter ranges. The catalog is
//! loaded once at boot from a JSON array and never mutated afterwards; the
//! api layer shares it behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Inclusive integer range with a UI step hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInt {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub step: i64,
}

/// Inclusive float range with a UI step hint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFloat {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: f64,
}

/// Per-field numeric limits for a preset. Absent fields are unlimited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<RangeInt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<RangeInt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<RangeInt>,
    #[serde(rename = "cfgScale", skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<RangeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<RangeInt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<RangeInt>,
}

/// Default generation parameters for a preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefaults {
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub steps: i64,
    #[serde(default)]
    pub cfg_scale: f64,
    #[serde(default)]
    pub sampler: String,
    #[serde(default)]
    pub scheduler: String,
    #[serde(default)]
    pub denoise: f64,
    #[serde(default)]
    pub length: i64,
    #[serde(default)]
    pub fps: i64,
    #[serde(default)]
    pub tiling: bool,
    #[serde(default)]
    pub hires_fix: bool,
}

/// Whether a preset produces images or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Image,
    Video,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Image => "image",
            ModelKind::Video => "video",
        }
    }
}

/// A curated model preset.
///
/// `id` is the stable identity clients submit jobs against; it is
/// independent of whatever names grid workers advertise (see
/// [`crate::resolve`] for the mapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreset {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub samplers: Vec<String>,
    #[serde(default)]
    pub schedulers: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub defaults: ModelDefaults,
    #[serde(default)]
    pub limits: ModelLimits,
}

/// Generation constraints merged in from the on-chain model registry.
///
/// A zero bound means "absent" on chain, so each side of the intersection is
/// considered independently.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainConstraints {
    pub steps_min: i64,
    pub steps_max: i64,
    pub cfg_min: f64,
    pub cfg_max: f64,
    pub clip_skip: i64,
}

impl ModelLimits {
    /// Intersect these limits with chain constraints.
    ///
    /// Chain constraints may only narrow a bound, never widen it:
    /// `max = min(both maxes)`, `min = max(both mins)`. If the intersection
    /// would invert a range (min > max) the catalog bound is kept unchanged.
    /// Fields without a catalog limit stay unlimited; the chain cannot
    /// introduce a bound the catalog does not declare.
    pub fn intersect(&self, constraints: ChainConstraints) -> ModelLimits {
        let mut out = self.clone();

        if let Some(steps) = out.steps.as_mut() {
            if constraints.steps_max > 0 {
                let min = steps.min.max(constraints.steps_min);
                let max = steps.max.min(constraints.steps_max);
                if min <= max {
                    steps.min = min;
                    steps.max = max;
                }
            }
        }

        if let Some(cfg) = out.cfg_scale.as_mut() {
            if constraints.cfg_max > 0.0 {
                let min = cfg.min.max(constraints.cfg_min);
                let max = cfg.max.min(constraints.cfg_max);
                if min <= max {
                    cfg.min = min;
                    cfg.max = max;
                }
            }
        }

        out
    }
}

/// Immutable preset catalog, keyed by preset id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, ModelPreset>,
}

impl Catalog {
    /// Parse a catalog from a JSON array of presets.
    ///
    /// Entries with an empty id are skipped rather than rejected, matching
    /// the tolerant loading of the curated presets file.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let presets: Vec<ModelPreset> = serde_json::from_str(raw)
            .map_err(|e| CoreError::Internal(format!("decode presets: {e}")))?;

        let mut items = HashMap::with_capacity(presets.len());
        for preset in presets {
            if preset.id.is_empty() {
                continue;
            }
            items.insert(preset.id.clone(), preset);
        }
        Ok(Self { items })
    }

    /// Load the catalog from a JSON file on disk. Called once at boot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CoreError::Internal(format!("read presets {}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: &str) -> Option<&ModelPreset> {
        self.items.get(id)
    }

    pub fn list(&self) -> Vec<&ModelPreset> {
        self.items.values().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits_with(steps: RangeInt, cfg: RangeFloat) -> ModelLimits {
        ModelLimits {
            steps: Some(steps),
            cfg_scale: Some(cfg),
            ..ModelLimits::default()
        }
    }

    #[test]
    fn intersect_narrows_both_bounds() {
        let limits = limits_with(
            RangeInt { min: 1, max: 100, step: 1 },
            RangeFloat { min: 1.0, max: 20.0, step: 0.5 },
        );
        let constraints = ChainConstraints {
            steps_min: 5,
            steps_max: 50,
            cfg_min: 2.0,
            cfg_max: 10.0,
            clip_skip: 0,
        };

        let effective = limits.intersect(constraints);
        let steps = effective.steps.unwrap();
        assert_eq!((steps.min, steps.max), (5, 50));
        let cfg = effective.cfg_scale.unwrap();
        assert_eq!((cfg.min, cfg.max), (2.0, 10.0));
    }

    #[test]
    fn intersect_never_widens() {
        let limits = limits_with(
            RangeInt { min: 10, max: 30, step: 1 },
            RangeFloat { min: 3.0, max: 8.0, step: 0.5 },
        );
        // Chain claims a wider range; catalog bounds must win.
        let constraints = ChainConstraints {
            steps_min: 1,
            steps_max: 200,
            cfg_min: 0.5,
            cfg_max: 30.0,
            clip_skip: 0,
        };

        let effective = limits.intersect(constraints);
        let steps = effective.steps.unwrap();
        assert_eq!((steps.min, steps.max), (10, 30));
        let cfg = effective.cfg_scale.unwrap();
        assert_eq!((cfg.min, cfg.max), (3.0, 8.0));
    }

    #[test]
    fn inverted_intersection_keeps_catalog_bound() {
        let limits = limits_with(
            RangeInt { min: 20, max: 50, step: 1 },
            RangeFloat { min: 1.0, max: 20.0, step: 0.5 },
        );
        // steps_max below catalog min would invert the range.
        let constraints = ChainConstraints {
            steps_min: 0,
            steps_max: 10,
            ..ChainConstraints::default()
        };

        let effective = limits.intersect(constraints);
        let steps = effective.steps.unwrap();
        assert_eq!((steps.min, steps.max), (20, 50));
    }

    #[test]
    fn zero_chain_bound_means_absent() {
        let limits = limits_with(
            RangeInt { min: 1, max: 50, step: 1 },
            RangeFloat { min: 1.0, max: 20.0, step: 0.5 },
        );
        let effective = limits.intersect(ChainConstraints::default());
        assert_eq!(effective, limits);
    }

    #[test]
    fn catalog_skips_entries_without_id() {
        let raw = r#"[
            {"id": "flux.1-krea-dev", "displayName": "FLUX Krea", "type": "image"},
            {"id": "", "displayName": "broken", "type": "image"}
        ]"#;
        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("flux.1-krea-dev").is_some());
    }

    #[test]
    fn preset_defaults_deserialize_with_missing_fields() {
        let raw = r#"[{
            "id": "SDXL 1.0",
            "displayName": "SDXL 1.0",
            "type": "image",
            "defaults": {"width": 1024, "height": 1024, "steps": 30, "cfgScale": 7.0},
            "limits": {"steps": {"min": 1, "max": 50, "step": 1}}
        }]"#;
        let catalog = Catalog::from_json(raw).unwrap();
        let preset = catalog.get("SDXL 1.0").unwrap();
        assert_eq!(preset.kind, ModelKind::Image);
        assert_eq!(preset.defaults.steps, 30);
        assert_eq!(preset.limits.steps.unwrap().max, 50);
        assert!(preset.limits.width.is_none());
    }
}
