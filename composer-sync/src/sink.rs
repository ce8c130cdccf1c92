//! Write targets for scene patches.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use composer_core::{AspectRatio, Background, Scene, SceneId, ScenePatch};
use serde::{Deserialize, Serialize};

use crate::SinkError;

/// Destination for coalesced scene patches.
///
/// A write either fully succeeds or reports an error. The adapter never
/// calls `write` concurrently for the same scene.
#[async_trait]
pub trait SceneSink: Send + Sync + 'static {
    /// Persist one scene's patch.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the patch could not be stored.
    async fn write(&self, scene_id: SceneId, patch: &ScenePatch) -> Result<(), SinkError>;
}

/// One scene as stored by [`FileSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    /// Position in the scene list.
    pub position: usize,
    /// Scene contents.
    pub scene: Scene,
}

/// Stores each scene as `<scene_id>.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Create a sink writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory the records live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, scene_id: SceneId) -> PathBuf {
        self.dir.join(format!("{scene_id}.json"))
    }

    /// Read one stored scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unreadable. A missing record is
    /// `Ok(None)`.
    pub async fn read(&self, scene_id: SceneId) -> Result<Option<SceneRecord>, SinkError> {
        let path = self.record_path(scene_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load every stored scene in list order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any record cannot be read.
    pub async fn load_all(&self) -> Result<Vec<Scene>, SinkError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let contents = tokio::fs::read_to_string(&path).await?;
                let record: SceneRecord = serde_json::from_str(&contents)?;
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.position);
        Ok(records.into_iter().map(|r| r.scene).collect())
    }
}

#[async_trait]
impl SceneSink for FileSink {
    async fn write(&self, scene_id: SceneId, patch: &ScenePatch) -> Result<(), SinkError> {
        let path = self.record_path(scene_id);

        if patch.removed {
            return match tokio::fs::remove_file(&path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        let mut record = match self.read(scene_id).await? {
            Some(record) => record,
            None => SceneRecord {
                position: 0,
                scene: Scene {
                    id: scene_id,
                    ..Scene::new(AspectRatio::default(), Background::default())
                },
            },
        };
        patch.apply_to(&mut record.scene);
        if let Some(position) = patch.position {
            record.position = position;
        }

        let json = serde_json::to_string_pretty(&record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!("Wrote scene {scene_id} to {}", path.display());
        Ok(())
    }
}
