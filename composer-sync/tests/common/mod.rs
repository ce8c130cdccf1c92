//! In-memory sink for adapter tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use composer_core::{SceneChange, SceneId, ScenePatch};
use composer_sync::{SceneSink, SinkError};

/// Records every write attempt. Attempts fail while `failing` is set.
#[derive(Clone, Default)]
pub struct MemorySink {
    attempts: Arc<Mutex<Vec<(SceneId, ScenePatch)>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<(SceneId, ScenePatch)> {
        self.attempts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl SceneSink for MemorySink {
    async fn write(&self, scene_id: SceneId, patch: &ScenePatch) -> Result<(), SinkError> {
        self.attempts
            .lock()
            .expect("lock")
            .push((scene_id, patch.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected("sink offline".to_string()));
        }
        Ok(())
    }
}

/// A change that only sets the title.
pub fn title_change(scene_id: SceneId, title: &str, revision: u64) -> SceneChange {
    SceneChange {
        scene_id,
        patch: ScenePatch {
            title: Some(title.to_string()),
            ..ScenePatch::default()
        },
        revision,
    }
}
