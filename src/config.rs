use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControllerConfig {
    /// Fade used when the state machine switches clips without a transition of its own.
    #[serde(default = "ControllerConfig::default_blend_time")]
    pub default_blend_time: f32,
    /// Forces every clip to loop regardless of the clip's own flag.
    #[serde(default)]
    pub looping_override: bool,
    #[serde(default = "ControllerConfig::default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub state_machine_enabled: bool,
    #[serde(default)]
    pub blend_tree_enabled: bool,
}

impl ControllerConfig {
    const fn default_blend_time() -> f32 {
        0.3
    }

    const fn default_speed() -> f32 {
        1.0
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read controller config {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse controller config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Controller config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_blend_time: Self::default_blend_time(),
            looping_override: false,
            speed: Self::default_speed(),
            state_machine_enabled: false,
            blend_tree_enabled: false,
        }
    }
}
