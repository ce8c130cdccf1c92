//! Scene store: pure, copy-on-write operations over a [`SceneList`].
//!
//! Every operation takes the current list by reference and returns a new one.
//! The store never holds the authoritative list itself; the caller (normally
//! the [`History`](crate::History)) owns it.
//!
//! Two outcomes are not errors:
//! - a selector or scene index that no longer resolves logs a warning and
//!   returns the input list unchanged;
//! - moving an element that is already at the extreme of the stack.
//!
//! Malformed input (negative sizes, a field that does not apply to the
//! element kind) is rejected with a [`ValidationError`] and nothing changes.

use std::sync::Arc;

use crate::zorder::{self, ReorderOp};
use crate::{
    AspectRatio, Avatar, Background, ElementId, ElementPatch, ElementRef, Frame, MediaItem,
    MediaKind, NewElement, Scene, SceneList, Selector, TextElement, ValidationError,
};

/// Factory and mutation entry point for scene lists.
///
/// # Example
///
/// ```
/// use composer_core::{ElementPatch, Frame, NewElement, SceneList, SceneStore};
///
/// let store = SceneStore::default();
/// let scenes = store.add_scene(&SceneList::new());
/// let (scenes, selector) = store
///     .add_element(&scenes, 0, NewElement::text("Hello", Frame::default()))
///     .unwrap();
/// let selector = selector.unwrap();
/// let moved = store
///     .update_element(&scenes, 0, &selector, &ElementPatch::position(40.0, 60.0))
///     .unwrap();
/// assert_eq!(moved.get(0).unwrap().texts[0].frame.x, 40.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneStore {
    aspect_ratio: AspectRatio,
    background: Background,
}

impl SceneStore {
    /// Create a store that creates scenes with the given aspect ratio.
    #[must_use]
    pub fn new(aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            background: Background::default(),
        }
    }

    /// Set the background given to new scenes.
    #[must_use]
    pub fn with_default_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// The global aspect ratio new scenes inherit.
    #[must_use]
    pub const fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Change the global aspect ratio. Existing scenes keep theirs.
    pub fn set_global_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Append an empty scene.
    #[must_use]
    pub fn add_scene(&self, scenes: &SceneList) -> SceneList {
        let mut next = scenes.clone();
        next.push(Scene::new(self.aspect_ratio, self.background.clone()));
        next
    }

    /// Remove the scene at `index`.
    #[must_use]
    pub fn remove_scene(&self, scenes: &SceneList, index: usize) -> SceneList {
        let mut next = scenes.clone();
        if next.remove(index).is_none() {
            tracing::warn!("Remove scene ignored: no scene at index {index}");
            return scenes.clone();
        }
        next
    }

    /// Move the scene at `from` to position `to`.
    #[must_use]
    pub fn move_scene(&self, scenes: &SceneList, from: usize, to: usize) -> SceneList {
        let mut next = scenes.clone();
        let Some(scene) = next.remove(from) else {
            tracing::warn!("Move scene ignored: no scene at index {from}");
            return scenes.clone();
        };
        next.insert(to, scene);
        next
    }

    /// Add an element, assigning a fresh id and the next free z-index.
    ///
    /// Adding an avatar replaces the existing one. Returns the selector of
    /// the new element, or `None` if `scene_index` does not resolve.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed initial properties.
    pub fn add_element(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        element: NewElement,
    ) -> Result<(SceneList, Option<Selector>), ValidationError> {
        element.validate()?;
        let mut next = scenes.clone();
        let Some(scene) = next.scene_mut(scene_index) else {
            tracing::warn!("Add {} ignored: no scene at index {scene_index}", element.kind());
            return Ok((scenes.clone(), None));
        };
        let z_index = scene.next_z_index();
        let selector = match element {
            NewElement::Text {
                content,
                font_size,
                color,
                font_family,
                frame,
            } => {
                let id = ElementId::new();
                scene.texts.push(TextElement {
                    id,
                    content,
                    font_size,
                    color,
                    font_family,
                    frame,
                    z_index,
                });
                Selector::Text(id)
            }
            NewElement::Media { media, frame } => {
                let media_id = ElementId::new();
                scene.media.push(MediaItem {
                    media_id,
                    kind: media,
                    frame,
                    z_index,
                });
                Selector::Media(media_id)
            }
            NewElement::Avatar { avatar_id, frame } => {
                scene.avatar = Some(Avatar {
                    id: ElementId::new(),
                    avatar_id,
                    frame,
                    z_index,
                });
                Selector::Avatar
            }
        };
        tracing::debug!("Added {selector} at z-index {z_index} in scene {}", scene.id);
        Ok((next, Some(selector)))
    }

    /// Add an image or video and return its new media id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed initial properties.
    pub fn add_media(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        media: MediaKind,
        frame: Frame,
    ) -> Result<(SceneList, Option<ElementId>), ValidationError> {
        let (next, selector) =
            self.add_element(scenes, scene_index, NewElement::Media { media, frame })?;
        let media_id = match selector {
            Some(Selector::Media(id)) => Some(id),
            _ => None,
        };
        Ok((next, media_id))
    }

    /// Add a text element and return its selector.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed initial properties.
    pub fn add_text(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        content: impl Into<String>,
        frame: Frame,
    ) -> Result<(SceneList, Option<Selector>), ValidationError> {
        self.add_element(scenes, scene_index, NewElement::text(content, frame))
    }

    /// Place the scene's avatar, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed frame.
    pub fn set_avatar(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        avatar_id: impl Into<String>,
        frame: Frame,
    ) -> Result<SceneList, ValidationError> {
        let (next, _) = self.add_element(scenes, scene_index, NewElement::avatar(avatar_id, frame))?;
        Ok(next)
    }

    /// Apply a partial update to one element.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the patch is malformed or does not apply
    /// to the element's kind.
    pub fn update_element(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        selector: &Selector,
        patch: &ElementPatch,
    ) -> Result<SceneList, ValidationError> {
        let Some(kind) = resolve(scenes, scene_index, selector).map(|e| e.kind()) else {
            tracing::warn!("Update ignored: {selector} not found in scene {scene_index}");
            return Ok(scenes.clone());
        };
        patch.validate_for(kind)?;
        if patch.is_empty() {
            return Ok(scenes.clone());
        }
        let mut next = scenes.clone();
        if let Some(scene) = next.scene_mut(scene_index) {
            patch.apply(scene, selector)?;
        }
        Ok(next)
    }

    /// Remove one element. Remaining z-indices are left as they are.
    #[must_use]
    pub fn remove_element(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        selector: &Selector,
    ) -> SceneList {
        if resolve(scenes, scene_index, selector).is_none() {
            tracing::warn!("Remove ignored: {selector} not found in scene {scene_index}");
            return scenes.clone();
        }
        let mut next = scenes.clone();
        if let Some(scene) = next.scene_mut(scene_index) {
            match selector {
                Selector::Text(id) => scene.texts.retain(|t| t.id != *id),
                Selector::Media(id) => scene.media.retain(|m| m.media_id != *id),
                Selector::Avatar => scene.avatar = None,
            }
        }
        next
    }

    /// Change the stacking order of one element.
    #[must_use]
    pub fn reorder(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        selector: &Selector,
        op: ReorderOp,
    ) -> SceneList {
        let Some(scene) = scenes.get(scene_index) else {
            tracing::warn!("Reorder ignored: no scene at index {scene_index}");
            return scenes.clone();
        };
        let mut reordered = scene.clone();
        if !zorder::reorder(&mut reordered, selector, op) || reordered == *scene {
            return scenes.clone();
        }
        self.replace_scene(scenes, scene_index, reordered)
    }

    /// Normalize the z-order of one scene.
    #[must_use]
    pub fn normalize(&self, scenes: &SceneList, scene_index: usize) -> SceneList {
        self.edit_scene(scenes, scene_index, "normalize", zorder::normalize)
    }

    /// Replace a scene's background.
    #[must_use]
    pub fn set_background(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        background: Background,
    ) -> SceneList {
        self.edit_scene(scenes, scene_index, "set background", |scene| {
            scene.background = background;
        })
    }

    /// Override a scene's aspect ratio.
    #[must_use]
    pub fn set_aspect_ratio(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        aspect_ratio: AspectRatio,
    ) -> SceneList {
        self.edit_scene(scenes, scene_index, "set aspect ratio", |scene| {
            scene.aspect_ratio = aspect_ratio;
        })
    }

    /// Rename a scene.
    #[must_use]
    pub fn set_title(&self, scenes: &SceneList, scene_index: usize, title: String) -> SceneList {
        self.edit_scene(scenes, scene_index, "set title", |scene| scene.title = title)
    }

    /// Replace a scene's narration script.
    #[must_use]
    pub fn set_script(&self, scenes: &SceneList, scene_index: usize, script: String) -> SceneList {
        self.edit_scene(scenes, scene_index, "set script", |scene| scene.script = script)
    }

    /// Run `edit` on a copy of one scene; keeps the original allocation when
    /// the edit changed nothing.
    fn edit_scene<F>(
        &self,
        scenes: &SceneList,
        scene_index: usize,
        what: &str,
        edit: F,
    ) -> SceneList
    where
        F: FnOnce(&mut Scene),
    {
        let Some(scene) = scenes.get(scene_index) else {
            tracing::warn!("{what} ignored: no scene at index {scene_index}");
            return scenes.clone();
        };
        let mut edited = scene.clone();
        edit(&mut edited);
        if edited == *scene {
            return scenes.clone();
        }
        self.replace_scene(scenes, scene_index, edited)
    }

    fn replace_scene(&self, scenes: &SceneList, scene_index: usize, scene: Scene) -> SceneList {
        let mut next = scenes.clone();
        if next.remove(scene_index).is_some() {
            next.insert(scene_index, Arc::new(scene));
        }
        next
    }
}

fn resolve<'a>(
    scenes: &'a SceneList,
    scene_index: usize,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    scenes.get(scene_index).and_then(|scene| scene.element(selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FIRST_ELEMENT_LAYER;

    fn one_scene() -> (SceneStore, SceneList) {
        let store = SceneStore::default();
        let scenes = store.add_scene(&SceneList::new());
        (store, scenes)
    }

    #[test]
    fn test_add_scene_uses_global_aspect_ratio() {
        let store = SceneStore::new(AspectRatio::Portrait);
        let empty = SceneList::new();
        let scenes = store.add_scene(&empty);
        assert!(empty.is_empty());
        assert_eq!(scenes.len(), 1);
        let scene = scenes.get(0).expect("scene");
        assert_eq!(scene.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(scene.background, Background::default());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_add_media_assigns_next_layer_and_fresh_id() {
        let (store, scenes) = one_scene();
        let (scenes, first) = store
            .add_media(&scenes, 0, MediaKind::Image { src: "a.png".into() }, Frame::default())
            .expect("add");
        let (scenes, second) = store
            .add_media(&scenes, 0, MediaKind::Image { src: "b.png".into() }, Frame::default())
            .expect("add");
        let scene = scenes.get(0).expect("scene");
        assert_ne!(first, second);
        assert_eq!(scene.media[0].z_index, FIRST_ELEMENT_LAYER);
        assert_eq!(scene.media[1].z_index, FIRST_ELEMENT_LAYER + 1);
    }

    #[test]
    fn test_add_media_rejects_bad_volume() {
        let (store, scenes) = one_scene();
        let result = store.add_media(
            &scenes,
            0,
            MediaKind::Video {
                src: "v.mp4".into(),
                display_mode: crate::DisplayMode::Loop,
                volume: 2.0,
            },
            Frame::default(),
        );
        assert_eq!(result, Err(ValidationError::VolumeOutOfRange(2.0)));
    }

    #[test]
    fn test_update_does_not_touch_input() {
        let (store, scenes) = one_scene();
        let (scenes, sel) = store
            .add_element(&scenes, 0, NewElement::text("Hi", Frame::default()))
            .expect("add");
        let sel = sel.expect("selector");
        let moved = store
            .update_element(&scenes, 0, &sel, &ElementPatch::position(5.0, 6.0))
            .expect("update");
        assert!((scenes.get(0).expect("scene").texts[0].frame.x - 0.0).abs() < f32::EPSILON);
        assert!((moved.get(0).expect("scene").texts[0].frame.x - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_update_stale_selector_is_noop() {
        let (store, scenes) = one_scene();
        let result = store
            .update_element(&scenes, 0, &Selector::Avatar, &ElementPatch::position(1.0, 1.0))
            .expect("stale selectors are not errors");
        assert!(result.same_as(&scenes));
        let result = store
            .update_element(&scenes, 7, &Selector::Avatar, &ElementPatch::position(1.0, 1.0))
            .expect("missing scenes are not errors");
        assert!(result.same_as(&scenes));
    }

    #[test]
    fn test_update_invalid_patch_rejected() {
        let (store, scenes) = one_scene();
        let (scenes, sel) = store
            .add_element(&scenes, 0, NewElement::avatar("anna", Frame::default()))
            .expect("add");
        let patch = ElementPatch {
            height: Some(-1.0),
            ..ElementPatch::default()
        };
        let result = store.update_element(&scenes, 0, &sel.expect("selector"), &patch);
        assert!(matches!(result, Err(ValidationError::NegativeSize { .. })));
    }

    #[test]
    fn test_remove_avatar_clears_slot_and_keeps_layers() {
        let (store, scenes) = one_scene();
        let (scenes, _) = store
            .add_element(&scenes, 0, NewElement::avatar("anna", Frame::default()))
            .expect("add");
        let (scenes, _) = store
            .add_element(&scenes, 0, NewElement::text("Top", Frame::default()))
            .expect("add");
        let removed = store.remove_element(&scenes, 0, &Selector::Avatar);
        let scene = removed.get(0).expect("scene");
        assert!(scene.avatar.is_none());
        assert_eq!(scene.texts[0].z_index, 3);
    }

    #[test]
    fn test_reorder_at_top_keeps_allocation() {
        let (store, scenes) = one_scene();
        let (scenes, _) = store
            .add_element(&scenes, 0, NewElement::text("A", Frame::default()))
            .expect("add");
        let (scenes, top) = store
            .add_element(&scenes, 0, NewElement::text("B", Frame::default()))
            .expect("add");
        let same = store.reorder(&scenes, 0, &top.expect("selector"), ReorderOp::Front);
        assert!(same.same_as(&scenes));
    }

    #[test]
    fn test_move_and_remove_scene() {
        let store = SceneStore::default();
        let scenes = store.add_scene(&store.add_scene(&SceneList::new()));
        let first = scenes.get(0).expect("scene").id;
        let moved = store.move_scene(&scenes, 0, 1);
        assert_eq!(moved.get(1).expect("scene").id, first);
        let removed = store.remove_scene(&moved, 1);
        assert_eq!(removed.len(), 1);
        assert!(removed.find(first).is_none());
        assert!(store.remove_scene(&removed, 5).same_as(&removed));
    }

    #[test]
    fn test_edit_scene_noop_keeps_allocation() {
        let (store, scenes) = one_scene();
        let same = store.set_aspect_ratio(&scenes, 0, AspectRatio::Landscape);
        assert!(same.same_as(&scenes));
        let changed = store.set_aspect_ratio(&scenes, 0, AspectRatio::Square);
        assert!(!changed.same_as(&scenes));
    }
}
