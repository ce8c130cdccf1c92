//! Scenes and the ordered scene list.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AspectRatio, Avatar, Background, CanvasSize, ElementRef, Frame, MediaItem, Selector,
    TextElement, FIRST_ELEMENT_LAYER,
};

/// Unique identifier for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(Uuid);

impl SceneId {
    /// Create a new unique scene ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One composable unit of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Scene identifier.
    pub id: SceneId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// The bottom layer.
    #[serde(default)]
    pub background: Background,
    /// Text overlays in list order.
    #[serde(default)]
    pub texts: Vec<TextElement>,
    /// Images and videos in list order.
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Optional presenter avatar.
    #[serde(default)]
    pub avatar: Option<Avatar>,
    /// Canvas aspect ratio for this scene.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Free-form narration script.
    #[serde(default)]
    pub script: String,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new(aspect_ratio: AspectRatio, background: Background) -> Self {
        Self {
            id: SceneId::new(),
            title: String::new(),
            background,
            texts: Vec::new(),
            media: Vec::new(),
            avatar: None,
            aspect_ratio,
            script: String::new(),
        }
    }

    /// Canvas dimensions for this scene's aspect ratio.
    #[must_use]
    pub fn canvas_size(&self) -> CanvasSize {
        self.aspect_ratio.canvas_size()
    }

    /// Selector for the text at a list position.
    #[must_use]
    pub fn text_selector(&self, index: usize) -> Option<Selector> {
        self.texts.get(index).map(|text| Selector::Text(text.id))
    }

    /// Resolve a selector.
    #[must_use]
    pub fn element(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        match selector {
            Selector::Text(id) => self.texts.iter().find(|t| t.id == *id).map(ElementRef::Text),
            Selector::Media(id) => self
                .media
                .iter()
                .find(|m| m.media_id == *id)
                .map(ElementRef::Media),
            Selector::Avatar => self.avatar.as_ref().map(ElementRef::Avatar),
        }
    }

    /// Check whether a selector resolves.
    #[must_use]
    pub fn contains(&self, selector: &Selector) -> bool {
        self.element(selector).is_some()
    }

    /// All elements in discovery order: texts, then media, then the avatar.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.texts
            .iter()
            .map(ElementRef::Text)
            .chain(self.media.iter().map(ElementRef::Media))
            .chain(self.avatar.iter().map(ElementRef::Avatar))
    }

    /// Number of layered elements (the background is not counted).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.texts.len() + self.media.len() + usize::from(self.avatar.is_some())
    }

    /// Check if the scene has no layered elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Highest z-index in use, if any element exists.
    #[must_use]
    pub fn max_z_index(&self) -> Option<u32> {
        self.elements().map(|e| e.z_index()).max()
    }

    /// The z-index a newly added element receives.
    #[must_use]
    pub fn next_z_index(&self) -> u32 {
        self.max_z_index()
            .map_or(FIRST_ELEMENT_LAYER, |max| {
            max.max(FIRST_ELEMENT_LAYER - 1).saturating_add(1)
        })
    }

    /// Elements sorted bottom to top.
    #[must_use]
    pub fn elements_by_layer(&self) -> Vec<ElementRef<'_>> {
        let mut elements: Vec<_> = self.elements().collect();
        elements.sort_by_key(ElementRef::z_index);
        elements
    }

    /// Find the topmost element at the given canvas coordinates.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<Selector> {
        self.elements()
            .filter(|e| e.frame().bounds().contains_point(x, y))
            .max_by_key(ElementRef::z_index)
            .map(|e| e.selector())
    }

    /// Mutable access to an element's frame.
    pub fn frame_mut(&mut self, selector: &Selector) -> Option<&mut Frame> {
        match selector {
            Selector::Text(id) => self
                .texts
                .iter_mut()
                .find(|t| t.id == *id)
                .map(|t| &mut t.frame),
            Selector::Media(id) => self
                .media
                .iter_mut()
                .find(|m| m.media_id == *id)
                .map(|m| &mut m.frame),
            Selector::Avatar => self.avatar.as_mut().map(|a| &mut a.frame),
        }
    }
}

/// Ordered, immutable list of scenes.
///
/// Scenes are shared between snapshots; writing through
/// [`SceneList::scene_mut`] clones only the touched scene, so a list that was
/// handed to the history can never observe a later edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneList {
    scenes: Vec<Arc<Scene>>,
}

impl SceneList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scenes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Check if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Get a scene by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index).map(Arc::as_ref)
    }

    /// Find a scene by id, returning its position.
    #[must_use]
    pub fn find(&self, id: SceneId) -> Option<(usize, &Scene)> {
        self.iter().enumerate().find(|(_, scene)| scene.id == id)
    }

    /// Iterate scenes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().map(Arc::as_ref)
    }

    /// Whether both lists share every scene allocation.
    ///
    /// A `true` result means nothing changed between the two lists.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.scenes.len() == other.scenes.len()
            && self
                .scenes
                .iter()
                .zip(&other.scenes)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Whether the scene at `index` is the same allocation in `other` at `other_index`.
    pub(crate) fn shares_scene(&self, index: usize, other: &Self, other_index: usize) -> bool {
        match (self.scenes.get(index), other.scenes.get(other_index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn scene_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index).map(Arc::make_mut)
    }

    pub(crate) fn push(&mut self, scene: Scene) {
        self.scenes.push(Arc::new(scene));
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Arc<Scene>> {
        (index < self.scenes.len()).then(|| self.scenes.remove(index))
    }

    pub(crate) fn insert(&mut self, index: usize, scene: Arc<Scene>) {
        self.scenes.insert(index.min(self.scenes.len()), scene);
    }

    /// Deep copies of every scene.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Scene> {
        self.iter().cloned().collect()
    }
}

impl From<Vec<Scene>> for SceneList {
    fn from(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: scenes.into_iter().map(Arc::new).collect(),
        }
    }
}

impl FromIterator<Scene> for SceneList {
    fn from_iter<I: IntoIterator<Item = Scene>>(iter: I) -> Self {
        Self {
            scenes: iter.into_iter().map(Arc::new).collect(),
        }
    }
}
