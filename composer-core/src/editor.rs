//! Editing session.
//!
//! [`Editor`] is the single entry point a view layer talks to. It owns the
//! [`SceneStore`] and the [`History`], routes pointer gestures through the
//! [`AlignmentEngine`], and tells an optional listener about every committed
//! scene change.
//!
//! ## Commit rules
//!
//! - A mutation that produces a list equal to the current one commits
//!   nothing and notifies nobody (stale selectors, no-op reorders).
//! - Gesture previews are transient. Only [`Editor::end_gesture`] commits,
//!   and it commits once.
//! - Undo and redo notify the listener like any other commit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::diff;
use crate::{
    AlignmentEngine, AspectRatio, Background, Bounds, ComposerError, ComposerResult,
    EditorConfig, ElementPatch, Guide, History, HistoryPosition, NewElement, ReorderOp, Scene,
    SceneChange, SceneList, SceneStore, Selector, SnapResult, ValidationError,
};

/// Callback invoked for each committed scene change.
pub type ChangeCallback = Box<dyn Fn(&SceneChange) + Send + Sync>;

/// The selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Scene the element lives in.
    pub scene_index: usize,
    /// The element.
    pub selector: Selector,
}

/// What a gesture does to its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    /// Translate, keeping size.
    Move,
    /// Change position and size.
    Resize,
}

/// Pointer input for an active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GestureInput {
    /// Offset from where the gesture began.
    Move {
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
    },
    /// Proposed rectangle.
    Resize {
        /// New bounds before snapping.
        bounds: Bounds,
    },
}

/// Transient result of a gesture update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GesturePreview {
    /// Snapped bounds to draw.
    pub bounds: Bounds,
    /// Guides to draw.
    pub guides: Vec<Guide>,
}

#[derive(Debug, Clone)]
struct Gesture {
    scene_index: usize,
    selector: Selector,
    kind: GestureKind,
    origin: Bounds,
    preview: Option<GesturePreview>,
}

/// A serializable editor operation, for scripts and foreign view layers.
///
/// Element commands with `selector: None` act on the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorCommand {
    /// Select an element.
    Select {
        /// Scene index.
        scene_index: usize,
        /// Element to select.
        selector: Selector,
    },
    /// Select the topmost element under a point.
    SelectAt {
        /// Scene index.
        scene_index: usize,
        /// Canvas X.
        x: f32,
        /// Canvas Y.
        y: f32,
    },
    /// Clear the selection.
    Deselect,
    /// Make a scene active without selecting anything.
    SetActiveScene {
        /// Scene index.
        scene_index: usize,
    },
    /// Move an element by an offset, snapping, and commit.
    Drag {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
    },
    /// Resize an element, snapping, and commit.
    Resize {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
        /// Proposed bounds.
        bounds: Bounds,
    },
    /// Change stacking order.
    Reorder {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
        /// Stacking change.
        op: ReorderOp,
    },
    /// Add an element to a scene.
    AddElement {
        /// Scene index.
        scene_index: usize,
        /// Initial properties.
        element: NewElement,
    },
    /// Remove an element.
    RemoveElement {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
    },
    /// Partially update an element.
    UpdateElement {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
        /// Fields to change.
        patch: ElementPatch,
    },
    /// Append an empty scene.
    AddScene,
    /// Delete a scene.
    RemoveScene {
        /// Scene index.
        scene_index: usize,
    },
    /// Reorder scenes.
    MoveScene {
        /// Current index.
        from: usize,
        /// Target index.
        to: usize,
    },
    /// Replace a scene's background.
    SetBackground {
        /// Scene index.
        scene_index: usize,
        /// New background.
        background: Background,
    },
    /// Override a scene's aspect ratio.
    SetAspectRatio {
        /// Scene index.
        scene_index: usize,
        /// New aspect ratio.
        aspect_ratio: AspectRatio,
    },
    /// Rename a scene.
    SetTitle {
        /// Scene index.
        scene_index: usize,
        /// New title.
        title: String,
    },
    /// Replace a scene's script.
    SetScript {
        /// Scene index.
        scene_index: usize,
        /// New script.
        script: String,
    },
    /// Start a drag or resize.
    BeginGesture {
        /// Target element.
        #[serde(default)]
        selector: Option<Selector>,
        /// Move or resize.
        kind: GestureKind,
    },
    /// Feed pointer input to the active gesture.
    UpdateGesture {
        /// Pointer input.
        input: GestureInput,
    },
    /// Commit the active gesture.
    EndGesture,
    /// Abandon the active gesture.
    CancelGesture,
    /// Step back.
    Undo,
    /// Step forward.
    Redo,
}

/// An editing session over one project's scenes.
pub struct Editor {
    config: EditorConfig,
    store: SceneStore,
    history: History,
    active_scene: usize,
    selection: Option<Selection>,
    gesture: Option<Gesture>,
    revision: u64,
    on_change: Option<ChangeCallback>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("history", &self.history.position())
            .field("active_scene", &self.active_scene)
            .field("selection", &self.selection)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with no scenes.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_scenes(config, SceneList::new())
    }

    /// Create an editor whose history starts at `scenes`.
    #[must_use]
    pub fn with_scenes(config: EditorConfig, scenes: SceneList) -> Self {
        let history = History::new(scenes).with_limit(config.history_limit);
        Self {
            store: SceneStore::new(config.aspect_ratio),
            config,
            history,
            active_scene: 0,
            selection: None,
            gesture: None,
            revision: 0,
            on_change: None,
        }
    }

    /// Set the change notification callback.
    pub fn set_on_change<F>(&mut self, callback: F)
    where
        F: Fn(&SceneChange) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(callback));
    }

    /// Replace the scenes and clear history, selection and gestures.
    ///
    /// Listeners are not notified: the new list is the baseline.
    pub fn load(&mut self, scenes: SceneList) {
        tracing::info!("Loaded {} scenes", scenes.len());
        self.history.reset(scenes);
        self.active_scene = 0;
        self.selection = None;
        self.gesture = None;
    }

    /// Current snapshot.
    #[must_use]
    pub fn scenes(&self) -> &SceneList {
        self.history.current()
    }

    /// One scene of the current snapshot.
    #[must_use]
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes().get(index)
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Cursor state for undo/redo controls.
    #[must_use]
    pub fn history_position(&self) -> HistoryPosition {
        self.history.position()
    }

    /// Number of commits, undos and redos so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Index of the scene element operations act on.
    #[must_use]
    pub fn active_scene(&self) -> usize {
        self.active_scene
    }

    /// The selected element, if any.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Guides of the active gesture's latest preview.
    #[must_use]
    pub fn guides(&self) -> &[Guide] {
        self.preview()
            .map(|p| p.guides.as_slice())
            .unwrap_or_default()
    }

    /// Latest preview of the active gesture.
    #[must_use]
    pub fn preview(&self) -> Option<&GesturePreview> {
        self.gesture.as_ref().and_then(|g| g.preview.as_ref())
    }

    /// Check whether a gesture is in progress.
    #[must_use]
    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Make a scene active. Clears the selection if it was elsewhere.
    pub fn set_active_scene(&mut self, scene_index: usize) -> bool {
        if scene_index >= self.scenes().len() {
            tracing::warn!("Activate ignored: no scene at index {scene_index}");
            return false;
        }
        if self.selection.is_some_and(|s| s.scene_index != scene_index) {
            self.selection = None;
        }
        self.active_scene = scene_index;
        true
    }

    /// Select an element.
    pub fn select(&mut self, scene_index: usize, selector: Selector) -> bool {
        if !self.resolves(scene_index, &selector) {
            tracing::warn!("Select ignored: {selector} not found in scene {scene_index}");
            return false;
        }
        self.active_scene = scene_index;
        self.selection = Some(Selection {
            scene_index,
            selector,
        });
        true
    }

    /// Select the topmost element under a canvas point.
    pub fn select_at(&mut self, scene_index: usize, x: f32, y: f32) -> Option<Selector> {
        let hit = self.scene(scene_index).and_then(|s| s.element_at(x, y));
        match hit {
            Some(selector) => {
                self.select(scene_index, selector);
            }
            None => self.selection = None,
        }
        hit
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Move an element by an offset, snap it, and commit.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-finite offsets.
    pub fn drag(&mut self, selector: Selector, dx: f32, dy: f32) -> ComposerResult<bool> {
        self.one_shot(selector, GestureKind::Move, GestureInput::Move { dx, dy })
    }

    /// Resize an element, snap the edges that moved, and commit.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative or non-finite bounds.
    pub fn resize(&mut self, selector: Selector, bounds: Bounds) -> ComposerResult<bool> {
        self.one_shot(selector, GestureKind::Resize, GestureInput::Resize { bounds })
    }

    fn one_shot(
        &mut self,
        selector: Selector,
        kind: GestureKind,
        input: GestureInput,
    ) -> ComposerResult<bool> {
        if !self.begin_gesture(selector, kind) {
            return Ok(false);
        }
        if let Err(e) = self.update_gesture(input) {
            self.cancel_gesture();
            return Err(e);
        }
        self.end_gesture()
    }

    /// Change the stacking order of an element in the active scene.
    pub fn reorder(&mut self, selector: Selector, op: ReorderOp) -> bool {
        let next = self
            .store
            .reorder(self.scenes(), self.active_scene, &selector, op);
        self.commit(next)
    }

    /// Add an element to a scene and select it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed initial properties.
    pub fn add_element(
        &mut self,
        scene_index: usize,
        element: NewElement,
    ) -> ComposerResult<Option<Selector>> {
        let (next, selector) = self.store.add_element(self.scenes(), scene_index, element)?;
        self.commit(next);
        if let Some(selector) = selector {
            self.select(scene_index, selector);
        }
        Ok(selector)
    }

    /// Remove an element from the active scene.
    pub fn remove_element(&mut self, selector: Selector) -> bool {
        let next = self
            .store
            .remove_element(self.scenes(), self.active_scene, &selector);
        self.commit(next)
    }

    /// Partially update an element of the active scene.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the patch does not fit the element.
    pub fn update_element(
        &mut self,
        selector: Selector,
        patch: &ElementPatch,
    ) -> ComposerResult<bool> {
        let next = self
            .store
            .update_element(self.scenes(), self.active_scene, &selector, patch)?;
        Ok(self.commit(next))
    }

    /// Append an empty scene and return its index.
    pub fn add_scene(&mut self) -> usize {
        let next = self.store.add_scene(self.scenes());
        self.commit(next);
        self.scenes().len() - 1
    }

    /// Delete a scene.
    pub fn remove_scene(&mut self, scene_index: usize) -> bool {
        let next = self.store.remove_scene(self.scenes(), scene_index);
        self.commit(next)
    }

    /// Move a scene to another position.
    pub fn move_scene(&mut self, from: usize, to: usize) -> bool {
        let next = self.store.move_scene(self.scenes(), from, to);
        self.commit(next)
    }

    /// Replace a scene's background.
    pub fn set_background(&mut self, scene_index: usize, background: Background) -> bool {
        let next = self
            .store
            .set_background(self.scenes(), scene_index, background);
        self.commit(next)
    }

    /// Override a scene's aspect ratio.
    pub fn set_aspect_ratio(&mut self, scene_index: usize, aspect_ratio: AspectRatio) -> bool {
        let next = self
            .store
            .set_aspect_ratio(self.scenes(), scene_index, aspect_ratio);
        self.commit(next)
    }

    /// Change the aspect ratio future scenes are created with.
    pub fn set_global_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.config.aspect_ratio = aspect_ratio;
        self.store.set_global_aspect_ratio(aspect_ratio);
    }

    /// Rename a scene.
    pub fn set_title(&mut self, scene_index: usize, title: String) -> bool {
        let next = self.store.set_title(self.scenes(), scene_index, title);
        self.commit(next)
    }

    /// Replace a scene's narration script.
    pub fn set_script(&mut self, scene_index: usize, script: String) -> bool {
        let next = self.store.set_script(self.scenes(), scene_index, script);
        self.commit(next)
    }

    /// Start a gesture on an element of the active scene.
    ///
    /// An already active gesture is abandoned.
    pub fn begin_gesture(&mut self, selector: Selector, kind: GestureKind) -> bool {
        self.gesture = None;
        let scene_index = self.active_scene;
        let Some(origin) = self
            .scene(scene_index)
            .and_then(|scene| scene.element(&selector))
            .map(|e| e.frame().bounds())
        else {
            tracing::warn!("Gesture ignored: {selector} not found in scene {scene_index}");
            return false;
        };
        self.select(scene_index, selector);
        self.gesture = Some(Gesture {
            scene_index,
            selector,
            kind,
            origin,
            preview: None,
        });
        true
    }

    /// Compute a snapped preview for the active gesture.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::NoActiveGesture`] without a gesture, or a
    /// validation error for malformed input.
    pub fn update_gesture(&mut self, input: GestureInput) -> ComposerResult<GesturePreview> {
        let threshold = self.config.snap_threshold;
        let gesture = self.gesture.as_ref().ok_or(ComposerError::NoActiveGesture)?;
        let Some(scene) = self.history.current().get(gesture.scene_index) else {
            self.gesture = None;
            return Err(ComposerError::NoActiveGesture);
        };
        let engine = AlignmentEngine::for_scene(scene).with_threshold(threshold);

        let preview = match (gesture.kind, input) {
            (GestureKind::Move, GestureInput::Move { dx, dy }) => {
                if !dx.is_finite() || !dy.is_finite() {
                    return Err(ValidationError::NonFinite("offset").into());
                }
                let candidate = gesture.origin.translated(dx, dy);
                let snap = engine.snap_in_scene(scene, &gesture.selector, candidate);
                to_preview(&snap, snap.apply(candidate))
            }
            (GestureKind::Resize, GestureInput::Resize { bounds }) => {
                bounds.validate()?;
                let snap =
                    engine.snap_resize_in_scene(scene, &gesture.selector, gesture.origin, bounds);
                to_preview(&snap, snap.apply_resize(bounds))
            }
            (GestureKind::Move, GestureInput::Resize { .. }) => {
                return Err(ComposerError::GestureMismatch("resize input for a move gesture"));
            }
            (GestureKind::Resize, GestureInput::Move { .. }) => {
                return Err(ComposerError::GestureMismatch("move input for a resize gesture"));
            }
        };

        if let Some(gesture) = self.gesture.as_mut() {
            gesture.preview = Some(preview.clone());
        }
        Ok(preview)
    }

    /// Commit the active gesture's latest preview.
    ///
    /// Returns `false` if there was no preview or it changed nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::NoActiveGesture`] without a gesture.
    pub fn end_gesture(&mut self) -> ComposerResult<bool> {
        let gesture = self.gesture.take().ok_or(ComposerError::NoActiveGesture)?;
        let Some(preview) = gesture.preview else {
            return Ok(false);
        };
        let patch = match gesture.kind {
            GestureKind::Move => ElementPatch::position(preview.bounds.x, preview.bounds.y),
            GestureKind::Resize => ElementPatch::bounds(preview.bounds),
        };
        let next = self.store.update_element(
            self.scenes(),
            gesture.scene_index,
            &gesture.selector,
            &patch,
        )?;
        Ok(self.commit(next))
    }

    /// Abandon the active gesture. Nothing is committed.
    pub fn cancel_gesture(&mut self) -> bool {
        self.gesture.take().is_some()
    }

    /// Step back one snapshot.
    pub fn undo(&mut self) -> bool {
        let previous = self.scenes().clone();
        if self.history.undo().is_none() {
            return false;
        }
        self.after_move(&previous);
        true
    }

    /// Step forward one snapshot.
    pub fn redo(&mut self) -> bool {
        let previous = self.scenes().clone();
        if self.history.redo().is_none() {
            return false;
        }
        self.after_move(&previous);
        true
    }

    /// Run a serialized command.
    ///
    /// Returns whether the snapshot, selection or gesture state changed.
    ///
    /// # Errors
    ///
    /// Propagates validation and gesture errors.
    pub fn apply(&mut self, command: EditorCommand) -> ComposerResult<bool> {
        tracing::debug!("Apply {command:?}");
        Ok(match command {
            EditorCommand::Select {
                scene_index,
                selector,
            } => self.select(scene_index, selector),
            EditorCommand::SelectAt { scene_index, x, y } => {
                self.select_at(scene_index, x, y).is_some()
            }
            EditorCommand::Deselect => self.selection.take().is_some(),
            EditorCommand::SetActiveScene { scene_index } => self.set_active_scene(scene_index),
            EditorCommand::Drag { selector, dx, dy } => match self.target(selector) {
                Some(selector) => self.drag(selector, dx, dy)?,
                None => false,
            },
            EditorCommand::Resize { selector, bounds } => match self.target(selector) {
                Some(selector) => self.resize(selector, bounds)?,
                None => false,
            },
            EditorCommand::Reorder { selector, op } => self
                .target(selector)
                .is_some_and(|selector| self.reorder(selector, op)),
            EditorCommand::AddElement {
                scene_index,
                element,
            } => self.add_element(scene_index, element)?.is_some(),
            EditorCommand::RemoveElement { selector } => self
                .target(selector)
                .is_some_and(|selector| self.remove_element(selector)),
            EditorCommand::UpdateElement { selector, patch } => match self.target(selector) {
                Some(selector) => self.update_element(selector, &patch)?,
                None => false,
            },
            EditorCommand::AddScene => {
                self.add_scene();
                true
            }
            EditorCommand::RemoveScene { scene_index } => self.remove_scene(scene_index),
            EditorCommand::MoveScene { from, to } => self.move_scene(from, to),
            EditorCommand::SetBackground {
                scene_index,
                background,
            } => self.set_background(scene_index, background),
            EditorCommand::SetAspectRatio {
                scene_index,
                aspect_ratio,
            } => self.set_aspect_ratio(scene_index, aspect_ratio),
            EditorCommand::SetTitle { scene_index, title } => self.set_title(scene_index, title),
            EditorCommand::SetScript {
                scene_index,
                script,
            } => self.set_script(scene_index, script),
            EditorCommand::BeginGesture { selector, kind } => self
                .target(selector)
                .is_some_and(|selector| self.begin_gesture(selector, kind)),
            EditorCommand::UpdateGesture { input } => {
                self.update_gesture(input)?;
                true
            }
            EditorCommand::EndGesture => self.end_gesture()?,
            EditorCommand::CancelGesture => self.cancel_gesture(),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        })
    }

    fn target(&self, selector: Option<Selector>) -> Option<Selector> {
        let target = selector.or_else(|| self.selection.map(|s| s.selector));
        if target.is_none() {
            tracing::warn!("Command ignored: no element selected");
        }
        target
    }

    fn resolves(&self, scene_index: usize, selector: &Selector) -> bool {
        self.scene(scene_index)
            .is_some_and(|scene| scene.contains(selector))
    }

    /// Record `next` if it differs from the current snapshot.
    fn commit(&mut self, next: SceneList) -> bool {
        let current = self.scenes();
        if next.same_as(current) || next == *current {
            return false;
        }
        let previous = current.clone();
        self.history.commit(next);
        self.after_move(&previous);
        true
    }

    /// Bookkeeping after the history cursor moved away from `previous`.
    fn after_move(&mut self, previous: &SceneList) {
        self.gesture = None;
        self.revision += 1;
        let changes = diff(previous, self.history.current(), self.revision);
        tracing::debug!(
            "Revision {}: {} scene change(s)",
            self.revision,
            changes.len()
        );
        if let Some(callback) = &self.on_change {
            for change in &changes {
                callback(change);
            }
        }

        let len = self.scenes().len();
        if self.active_scene >= len {
            self.active_scene = len.saturating_sub(1);
        }
        if let Some(selection) = self.selection {
            if !self.resolves(selection.scene_index, &selection.selector) {
                self.selection = None;
            }
        }
    }
}

fn to_preview(snap: &SnapResult, bounds: Bounds) -> GesturePreview {
    GesturePreview {
        bounds,
        guides: snap.guides(),
    }
}
