//! Change events emitted to the persistence layer.
//!
//! Every commit, undo and redo produces one [`SceneChange`] per scene whose
//! content or position differs between the old and the new list. A change
//! carries a sparse [`ScenePatch`]; patches for the same scene can be merged,
//! so a writer that falls behind only ever needs to send one record per scene.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{AspectRatio, Avatar, Background, MediaItem, Scene, SceneId, SceneList, TextElement};

/// Sparse description of how one scene changed.
///
/// `None` fields are unchanged. `avatar` is doubly optional: `Some(None)`
/// means the avatar was removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePatch {
    /// The scene was deleted. Other fields are ignored.
    #[serde(default, skip_serializing_if = "is_false")]
    pub removed: bool,
    /// New position in the scene list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    /// Replacement text list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<TextElement>>,
    /// Replacement media list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaItem>>,
    /// Avatar slot; `Some(None)` clears it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub avatar: Option<Option<Avatar>>,
    /// New aspect ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    /// New narration script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !value
}

/// Distinguish an explicit `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ScenePatch {
    /// Patch describing a scene in full.
    #[must_use]
    pub fn full(scene: &Scene, position: usize) -> Self {
        Self {
            removed: false,
            position: Some(position),
            title: Some(scene.title.clone()),
            background: Some(scene.background.clone()),
            texts: Some(scene.texts.clone()),
            media: Some(scene.media.clone()),
            avatar: Some(scene.avatar.clone()),
            aspect_ratio: Some(scene.aspect_ratio),
            script: Some(scene.script.clone()),
        }
    }

    /// Patch that deletes a scene.
    #[must_use]
    pub fn removal() -> Self {
        Self {
            removed: true,
            ..Self::default()
        }
    }

    /// Patch with only the fields that differ between `old` and `new`.
    #[must_use]
    pub fn between(old: &Scene, new: &Scene) -> Self {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        Self {
            removed: false,
            position: None,
            title: changed(&old.title, &new.title),
            background: changed(&old.background, &new.background),
            texts: changed(&old.texts, &new.texts),
            media: changed(&old.media, &new.media),
            avatar: changed(&old.avatar, &new.avatar),
            aspect_ratio: changed(&old.aspect_ratio, &new.aspect_ratio),
            script: changed(&old.script, &new.script),
        }
    }

    /// Check if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if every scene field is present, i.e. the patch can create a
    /// scene record from nothing.
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.removed
            && self.title.is_some()
            && self.background.is_some()
            && self.texts.is_some()
            && self.media.is_some()
            && self.avatar.is_some()
            && self.aspect_ratio.is_some()
            && self.script.is_some()
    }

    /// Fold a newer patch for the same scene into this one.
    ///
    /// Newer fields override older ones. A removal supersedes everything
    /// before it, and anything after a removal starts a fresh record.
    #[must_use]
    pub fn merge(self, newer: Self) -> Self {
        if newer.removed || self.removed {
            return newer;
        }
        Self {
            removed: false,
            position: newer.position.or(self.position),
            title: newer.title.or(self.title),
            background: newer.background.or(self.background),
            texts: newer.texts.or(self.texts),
            media: newer.media.or(self.media),
            avatar: newer.avatar.or(self.avatar),
            aspect_ratio: newer.aspect_ratio.or(self.aspect_ratio),
            script: newer.script.or(self.script),
        }
    }

    /// Write the present fields into `scene`.
    pub fn apply_to(&self, scene: &mut Scene) {
        if let Some(title) = &self.title {
            scene.title.clone_from(title);
        }
        if let Some(background) = &self.background {
            scene.background = background.clone();
        }
        if let Some(texts) = &self.texts {
            scene.texts.clone_from(texts);
        }
        if let Some(media) = &self.media {
            scene.media.clone_from(media);
        }
        if let Some(avatar) = &self.avatar {
            scene.avatar.clone_from(avatar);
        }
        if let Some(aspect_ratio) = self.aspect_ratio {
            scene.aspect_ratio = aspect_ratio;
        }
        if let Some(script) = &self.script {
            scene.script.clone_from(script);
        }
    }
}

/// One committed change to one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneChange {
    /// The scene that changed.
    pub scene_id: SceneId,
    /// What changed.
    pub patch: ScenePatch,
    /// Editor revision that produced the change. Increases with every
    /// commit, undo and redo.
    pub revision: u64,
}

/// Compute the per-scene changes that turn `old` into `new`.
///
/// Scenes whose allocation is shared between the lists are skipped without
/// comparing their contents. Changes are ordered: upserts in `new` list
/// order, then removals in `old` list order.
#[must_use]
pub fn diff(old: &SceneList, new: &SceneList, revision: u64) -> Vec<SceneChange> {
    let old_positions: HashMap<SceneId, usize> = old
        .iter()
        .enumerate()
        .map(|(i, scene)| (scene.id, i))
        .collect();
    let mut changes = Vec::new();

    for (position, scene) in new.iter().enumerate() {
        let patch = match old_positions.get(&scene.id) {
            None => ScenePatch::full(scene, position),
            Some(&old_position) => {
                let mut patch = if new.shares_scene(position, old, old_position) {
                    ScenePatch::default()
                } else {
                    old.get(old_position)
                        .map(|before| ScenePatch::between(before, scene))
                        .unwrap_or_default()
                };
                if old_position != position {
                    patch.position = Some(position);
                }
                patch
            }
        };
        if !patch.is_empty() {
            changes.push(SceneChange {
                scene_id: scene.id,
                patch,
                revision,
            });
        }
    }

    for scene in old.iter() {
        if new.find(scene.id).is_none() {
            changes.push(SceneChange {
                scene_id: scene.id,
                patch: ScenePatch::removal(),
                revision,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementPatch, Frame, NewElement, SceneStore};

    fn two_scenes() -> (SceneStore, SceneList) {
        let store = SceneStore::default();
        let scenes = store.add_scene(&store.add_scene(&SceneList::new()));
        (store, scenes)
    }

    #[test]
    fn test_identical_lists_produce_no_changes() {
        let (_, scenes) = two_scenes();
        assert!(diff(&scenes, &scenes.clone(), 1).is_empty());
    }

    #[test]
    fn test_added_scene_is_full_upsert() {
        let (store, scenes) = two_scenes();
        let next = store.add_scene(&scenes);
        let changes = diff(&scenes, &next, 3);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].revision, 3);
        assert!(changes[0].patch.is_full());
        assert_eq!(changes[0].patch.position, Some(2));
    }

    #[test]
    fn test_element_edit_touches_only_that_scene() {
        let (store, scenes) = two_scenes();
        let (next, _) = store
            .add_element(&scenes, 1, NewElement::text("Hi", Frame::default()))
            .expect("add");
        let changes = diff(&scenes, &next, 1);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].scene_id, scenes.get(1).expect("scene").id);
        let patch = &changes[0].patch;
        assert!(patch.texts.is_some());
        assert!(patch.media.is_none());
        assert!(patch.title.is_none());
        assert!(patch.position.is_none());
    }

    #[test]
    fn test_removed_scene_and_shifted_positions() {
        let (store, scenes) = two_scenes();
        let first = scenes.get(0).expect("scene").id;
        let second = scenes.get(1).expect("scene").id;
        let next = store.remove_scene(&scenes, 0);
        let changes = diff(&scenes, &next, 1);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].scene_id, second);
        assert_eq!(changes[0].patch.position, Some(0));
        assert_eq!(changes[1].scene_id, first);
        assert!(changes[1].patch.removed);
    }

    #[test]
    fn test_merge_newer_fields_win() {
        let older = ScenePatch {
            title: Some("a".into()),
            script: Some("s".into()),
            ..ScenePatch::default()
        };
        let newer = ScenePatch {
            title: Some("b".into()),
            ..ScenePatch::default()
        };
        let merged = older.merge(newer);
        assert_eq!(merged.title.as_deref(), Some("b"));
        assert_eq!(merged.script.as_deref(), Some("s"));
    }

    #[test]
    fn test_merge_removal_supersedes() {
        let older = ScenePatch {
            title: Some("a".into()),
            ..ScenePatch::default()
        };
        let merged = older.merge(ScenePatch::removal());
        assert_eq!(merged, ScenePatch::removal());

        let restarted = ScenePatch::removal().merge(ScenePatch {
            title: Some("again".into()),
            ..ScenePatch::default()
        });
        assert!(!restarted.removed);
        assert_eq!(restarted.title.as_deref(), Some("again"));
    }

    #[test]
    fn test_avatar_clear_survives_json() {
        let patch = ScenePatch {
            avatar: Some(None),
            ..ScenePatch::default()
        };
        let json = serde_json::to_string(&patch).expect("serialize");
        assert_eq!(json, r#"{"avatar":null}"#);
        let parsed: ScenePatch = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.avatar, Some(None));

        let missing: ScenePatch = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(missing.avatar, None);
    }

    #[test]
    fn test_apply_to_rebuilds_scene() {
        let (store, scenes) = two_scenes();
        let (edited, selector) = store
            .add_element(&scenes, 0, NewElement::text("Hi", Frame::default()))
            .expect("add");
        let edited = store
            .update_element(
                &edited,
                0,
                &selector.expect("selector"),
                &ElementPatch::position(10.0, 20.0),
            )
            .expect("update");
        let mut replica = scenes.get(0).expect("scene").clone();
        for change in diff(&scenes, &edited, 1) {
            change.patch.apply_to(&mut replica);
        }
        assert_eq!(&replica, edited.get(0).expect("scene"));
    }
}
