//! Persisted project representation.
//!
//! A [`ProjectDocument`] is the JSON form of a whole project: metadata plus
//! every scene, with camelCase keys and aspect ratios written as `"16:9"`.
//! Loading validates element geometry and normalizes each scene's layers,
//! so a document written by hand or by an older build comes back dense.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::element::validate_font_size;
use crate::{
    zorder, AspectRatio, ComposerError, ComposerResult, ElementId, Scene, SceneList,
    ValidationError,
};

/// Get the current timestamp in milliseconds since epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Where a project is in its render lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Being edited.
    #[default]
    Draft,
    /// Submitted for export.
    Rendering,
    /// Export finished.
    Completed,
    /// Export failed.
    Failed,
}

/// A project as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Project name.
    pub name: String,
    /// Creation time, ms since epoch.
    pub created_at: u64,
    /// Last modification time, ms since epoch.
    pub updated_at: u64,
    /// Render status.
    #[serde(default)]
    pub status: ProjectStatus,
    /// Aspect ratio new scenes inherit.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Scenes in timeline order.
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl ProjectDocument {
    /// Create an empty draft project.
    #[must_use]
    pub fn new(name: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        let now = current_timestamp_ms();
        Self {
            name: name.into(),
            created_at: now,
            updated_at: now,
            status: ProjectStatus::Draft,
            aspect_ratio,
            scenes: Vec::new(),
        }
    }

    /// The scenes as a shareable list.
    #[must_use]
    pub fn scene_list(&self) -> SceneList {
        SceneList::from(self.scenes.clone())
    }

    /// Replace the scenes and bump `updated_at`.
    pub fn set_scenes(&mut self, scenes: &SceneList) {
        self.scenes = scenes.to_vec();
        self.touch();
    }

    /// Bump `updated_at` to now. Never moves it backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(current_timestamp_ms());
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse, validate and normalize a project.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::Serialization`] for malformed JSON and
    /// [`ComposerError::InvalidDocument`] for duplicate ids or invalid
    /// element geometry.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        let mut document: Self = serde_json::from_str(json)?;
        document.validate()?;
        for scene in &mut document.scenes {
            zorder::normalize(scene);
        }
        Ok(document)
    }

    /// Check ids and element properties.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::InvalidDocument`] naming the offending scene.
    pub fn validate(&self) -> ComposerResult<()> {
        let mut scene_ids = HashSet::new();
        let mut element_ids: HashSet<ElementId> = HashSet::new();
        for scene in &self.scenes {
            if !scene_ids.insert(scene.id) {
                return Err(ComposerError::InvalidDocument(format!(
                    "duplicate scene id {}",
                    scene.id
                )));
            }
            validate_scene(scene).map_err(|e| {
                ComposerError::InvalidDocument(format!("scene {}: {e}", scene.id))
            })?;
            let ids = scene
                .texts
                .iter()
                .map(|t| t.id)
                .chain(scene.media.iter().map(|m| m.media_id))
                .chain(scene.avatar.iter().map(|a| a.id));
            for id in ids {
                if !element_ids.insert(id) {
                    return Err(ComposerError::InvalidDocument(format!(
                        "duplicate element id {id} in scene {}",
                        scene.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_scene(scene: &Scene) -> Result<(), ValidationError> {
    for text in &scene.texts {
        text.frame.validate()?;
        validate_font_size(text.font_size)?;
    }
    for item in &scene.media {
        item.frame.validate()?;
        item.kind.validate()?;
    }
    if let Some(avatar) = &scene.avatar {
        avatar.frame.validate()?;
    }
    Ok(())
}
