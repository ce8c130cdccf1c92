//! Partial element updates.

use serde::{Deserialize, Serialize};

use crate::element::{finite, validate_font_size, validate_volume};
use crate::{Bounds, DisplayMode, ElementKind, MediaKind, Scene, Selector, ValidationError};

/// A partial update to one element. `None` fields are left untouched.
///
/// The z-index is deliberately absent: stacking order only changes through
/// the z-order engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// New X position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New Y position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New rotation in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f32>,
    /// Text content (text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Font size (text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Text color (text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Media source (image/video only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// End-of-clip behaviour (video only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    /// Playback volume (video only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    /// Avatar catalogue reference (avatar only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
}

impl ElementPatch {
    /// Patch that moves an element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that moves and resizes an element.
    #[must_use]
    pub fn bounds(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
            ..Self::default()
        }
    }

    /// Check if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate this patch against the element it will be applied to.
    ///
    /// # Errors
    ///
    /// Returns the first field that is malformed or does not apply to `kind`.
    pub fn validate_for(&self, kind: ElementKind) -> Result<(), ValidationError> {
        for (field, value) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotationDegrees", self.rotation_degrees),
        ] {
            if let Some(value) = value {
                finite(field, value)?;
            }
        }
        let width = self.width.unwrap_or(0.0);
        let height = self.height.unwrap_or(0.0);
        if width < 0.0 || height < 0.0 {
            return Err(ValidationError::NegativeSize { width, height });
        }

        let text_only = [
            ("content", self.content.is_some()),
            ("fontSize", self.font_size.is_some()),
            ("color", self.color.is_some()),
        ];
        let video_only = [
            ("displayMode", self.display_mode.is_some()),
            ("volume", self.volume.is_some()),
        ];
        let unsupported = |field| ValidationError::UnsupportedField {
            field,
            kind: kind.name(),
        };
        let reject_present = |fields: &[(&'static str, bool)]| {
            fields
                .iter()
                .find(|(_, present)| *present)
                .map_or(Ok(()), |(field, _)| Err(unsupported(*field)))
        };

        match kind {
            ElementKind::Text => {
                reject_present(&video_only)?;
                reject_present(&[
                    ("src", self.src.is_some()),
                    ("avatarId", self.avatar_id.is_some()),
                ])?;
                if let Some(font_size) = self.font_size {
                    validate_font_size(font_size)?;
                }
            }
            ElementKind::Image | ElementKind::Video => {
                reject_present(&text_only)?;
                reject_present(&[("avatarId", self.avatar_id.is_some())])?;
                if kind == ElementKind::Image {
                    reject_present(&video_only)?;
                }
                if self.src.as_deref().is_some_and(|src| src.trim().is_empty()) {
                    return Err(ValidationError::EmptySource);
                }
                if let Some(volume) = self.volume {
                    validate_volume(volume)?;
                }
            }
            ElementKind::Avatar => {
                reject_present(&text_only)?;
                reject_present(&video_only)?;
                reject_present(&[("src", self.src.is_some())])?;
            }
        }
        Ok(())
    }

    /// Apply this patch to the addressed element of `scene`.
    ///
    /// Returns `Ok(false)` if the selector does not resolve.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the patch does not fit the element; the
    /// scene is left untouched in that case.
    pub(crate) fn apply(
        &self,
        scene: &mut Scene,
        selector: &Selector,
    ) -> Result<bool, ValidationError> {
        let Some(kind) = scene.element(selector).map(|e| e.kind()) else {
            return Ok(false);
        };
        self.validate_for(kind)?;

        if let Some(frame) = scene.frame_mut(selector) {
            if let Some(x) = self.x {
                frame.x = x;
            }
            if let Some(y) = self.y {
                frame.y = y;
            }
            if let Some(width) = self.width {
                frame.width = width;
            }
            if let Some(height) = self.height {
                frame.height = height;
            }
            if let Some(rotation) = self.rotation_degrees {
                frame.rotation_degrees = rotation;
            }
        }

        match selector {
            Selector::Text(id) => {
                if let Some(text) = scene.texts.iter_mut().find(|t| t.id == *id) {
                    if let Some(content) = &self.content {
                        text.content.clone_from(content);
                    }
                    if let Some(font_size) = self.font_size {
                        text.font_size = font_size;
                    }
                    if let Some(color) = &self.color {
                        text.color.clone_from(color);
                    }
                }
            }
            Selector::Media(id) => {
                if let Some(item) = scene.media.iter_mut().find(|m| m.media_id == *id) {
                    match &mut item.kind {
                        MediaKind::Image { src } => {
                            if let Some(new_src) = &self.src {
                                src.clone_from(new_src);
                            }
                        }
                        MediaKind::Video {
                            src,
                            display_mode,
                            volume,
                        } => {
                            if let Some(new_src) = &self.src {
                                src.clone_from(new_src);
                            }
                            if let Some(mode) = self.display_mode {
                                *display_mode = mode;
                            }
                            if let Some(new_volume) = self.volume {
                                *volume = new_volume;
                            }
                        }
                    }
                }
            }
            Selector::Avatar => {
                if let (Some(avatar), Some(avatar_id)) = (scene.avatar.as_mut(), &self.avatar_id) {
                    avatar.avatar_id.clone_from(avatar_id);
                }
            }
        }
        Ok(true)
    }
}
