//! Renderer configuration
use crate::drag_drop::DragPreviewMask;
use crate::errors::BlocksError;
use crate::types::AnimationStyle;
use serde::{Deserialize, Serialize};

/// Height given to a flexible element when the blank space is too small to share.
pub const DEFAULT_MINIMUM_FLEXIBLE_HEIGHT: f64 = 0.3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub minimum_flexible_height: f64,
    /// Device pixels per point. When set, flexible heights are floored to the pixel grid.
    pub pixel_scale: Option<f64>,
    /// Schedule a flexible-height pass after every applied update.
    pub expand_flexible_after_update: bool,
    pub default_animation: AnimationStyle,
    pub drag_enabled: bool,
    pub drag_preview: DragPreviewMask,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            minimum_flexible_height: DEFAULT_MINIMUM_FLEXIBLE_HEIGHT,
            pixel_scale: None,
            expand_flexible_after_update: true,
            default_animation: AnimationStyle::Automatic,
            drag_enabled: false,
            drag_preview: DragPreviewMask::default(),
        }
    }
}

impl RendererConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BlocksError> {
        let config: RendererConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BlocksError> {
        if !(self.minimum_flexible_height.is_finite() && self.minimum_flexible_height > 0.0) {
            return Err(BlocksError::InvalidConfig {
                details: format!(
                    "minimum_flexible_height must be positive, got {}",
                    self.minimum_flexible_height
                ),
            });
        }
        if let Some(scale) = self.pixel_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(BlocksError::InvalidConfig {
                    details: format!("pixel_scale must be positive, got {}", scale),
                });
            }
        }
        self.drag_preview.validate()
    }
}
