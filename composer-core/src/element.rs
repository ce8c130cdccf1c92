//! Scene elements - the layered building blocks of a scene.
//!
//! Everything here is plain data: positions and sizes are canvas-space pixels
//! for the owning scene's aspect ratio, never preview pixels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ValidationError;

/// Layer index occupied by the scene background.
pub const BACKGROUND_LAYER: u32 = 1;

/// Lowest layer index an element can occupy.
pub const FIRST_ELEMENT_LAYER: u32 = 2;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
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

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported canvas aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Landscape widescreen.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Portrait, for short-form vertical video.
    #[serde(rename = "9:16")]
    Portrait,
    /// Square.
    #[serde(rename = "1:1")]
    Square,
    /// Classic 4:3.
    #[serde(rename = "4:3")]
    Classic,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [Self; 4] = [Self::Landscape, Self::Portrait, Self::Square, Self::Classic];

    /// Canvas dimensions for this ratio.
    #[must_use]
    pub const fn canvas_size(self) -> CanvasSize {
        match self {
            Self::Landscape => CanvasSize::new(1920.0, 1080.0),
            Self::Portrait => CanvasSize::new(1080.0, 1920.0),
            Self::Square => CanvasSize::new(1080.0, 1080.0),
            Self::Classic => CanvasSize::new(1440.0, 1080.0),
        }
    }

    /// The `W:H` label used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
            Self::Classic => "4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio `{s}` (expected 16:9, 9:16, 1:1 or 4:3)"))
    }
}

/// Canvas dimensions in canvas-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl CanvasSize {
    /// Create a canvas size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The whole canvas as a rectangle anchored at the origin.
    #[must_use]
    pub const fn bounds(self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }
}

/// Axis-aligned rectangle used for hit testing and alignment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Bounds {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal center.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical center.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Check if a point is within this rectangle.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    /// Reject non-finite values and negative sizes.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        finite("width", self.width)?;
        finite("height", self.height)?;
        if self.width < 0.0 || self.height < 0.0 {
            return Err(ValidationError::NegativeSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

pub(crate) fn finite(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

/// Position, size and rotation of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees. Unbounded; may be negative or exceed 360.
    #[serde(default)]
    pub rotation_degrees: f32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation_degrees: 0.0,
        }
    }
}

impl Frame {
    /// Create an unrotated frame.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation_degrees: 0.0,
        }
    }

    /// Set the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// The unrotated rectangle covered by this frame.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Rotation folded into `[0, 360)` for display.
    #[must_use]
    pub fn display_rotation(&self) -> f32 {
        self.rotation_degrees.rem_euclid(360.0)
    }

    /// Replace position and size, keeping rotation.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    /// Reject non-finite values and negative sizes.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.bounds().validate()?;
        finite("rotationDegrees", self.rotation_degrees)
    }
}

/// The four element kinds that live in the layer index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Text overlay.
    Text,
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Presenter avatar.
    Avatar,
}

impl ElementKind {
    /// Lowercase name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Avatar => "avatar",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Stable identifier.
    pub id: ElementId,
    /// Text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color as hex.
    pub color: String,
    /// Optional font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Position and size.
    #[serde(flatten)]
    pub frame: Frame,
    /// Stacking order.
    pub z_index: u32,
}

/// What a video does once it reaches its end before the scene does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Hold the last frame.
    #[default]
    Freeze,
    /// Hide the element.
    Hide,
    /// Restart from the beginning.
    Loop,
}

/// Content of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaKind {
    /// A still image.
    Image {
        /// Image source URI.
        src: String,
    },
    /// A video clip.
    #[serde(rename_all = "camelCase")]
    Video {
        /// Video source URI.
        src: String,
        /// End-of-clip behaviour.
        #[serde(default)]
        display_mode: DisplayMode,
        /// Playback volume in `[0, 1]`.
        volume: f32,
    },
}

impl MediaKind {
    /// The element kind of this media.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Image { .. } => ElementKind::Image,
            Self::Video { .. } => ElementKind::Video,
        }
    }

    /// Source reference.
    #[must_use]
    pub fn src(&self) -> &str {
        match self {
            Self::Image { src } | Self::Video { src, .. } => src,
        }
    }

    /// Reject empty sources and out-of-range volume.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.src().trim().is_empty() {
            return Err(ValidationError::EmptySource);
        }
        if let Self::Video { volume, .. } = self {
            validate_volume(*volume)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_volume(volume: f32) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&volume) {
        Ok(())
    } else {
        Err(ValidationError::VolumeOutOfRange(volume))
    }
}

/// An image or video placed on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Stable identifier used for lookup.
    pub media_id: ElementId,
    /// Image or video payload.
    #[serde(flatten)]
    pub kind: MediaKind,
    /// Position and size.
    #[serde(flatten)]
    pub frame: Frame,
    /// Stacking order.
    pub z_index: u32,
}

/// The presenter avatar. At most one per scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    /// Stable identifier.
    pub id: ElementId,
    /// Avatar catalogue reference; opaque to the engine.
    pub avatar_id: String,
    /// Position and size.
    #[serde(flatten)]
    pub frame: Frame,
    /// Stacking order.
    pub z_index: u32,
}

/// Scene background. Never part of the layer index space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    /// Solid fill.
    Color {
        /// Fill color as hex.
        color: String,
    },
    /// Full-canvas image.
    Image {
        /// Image source URI.
        src: String,
    },
    /// Full-canvas video.
    Video {
        /// Video source URI.
        src: String,
    },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color {
            color: "#000000".to_string(),
        }
    }
}

/// Initial properties for an element created by an add operation.
///
/// The z-index and identifier are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NewElement {
    /// A text overlay.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels.
        font_size: f32,
        /// Text color as hex.
        color: String,
        /// Optional font family.
        #[serde(default)]
        font_family: Option<String>,
        /// Position and size.
        #[serde(default)]
        frame: Frame,
    },
    /// An image or video.
    Media {
        /// Media payload.
        media: MediaKind,
        /// Position and size.
        #[serde(default)]
        frame: Frame,
    },
    /// The scene avatar (replaces any existing one).
    #[serde(rename_all = "camelCase")]
    Avatar {
        /// Avatar catalogue reference.
        avatar_id: String,
        /// Position and size.
        #[serde(default)]
        frame: Frame,
    },
}

impl NewElement {
    /// Text overlay with default styling.
    #[must_use]
    pub fn text(content: impl Into<String>, frame: Frame) -> Self {
        Self::Text {
            content: content.into(),
            font_size: 48.0,
            color: "#ffffff".to_string(),
            font_family: None,
            frame,
        }
    }

    /// Still image.
    #[must_use]
    pub fn image(src: impl Into<String>, frame: Frame) -> Self {
        Self::Media {
            media: MediaKind::Image { src: src.into() },
            frame,
        }
    }

    /// Video clip at full volume that freezes on its last frame.
    #[must_use]
    pub fn video(src: impl Into<String>, frame: Frame) -> Self {
        Self::Media {
            media: MediaKind::Video {
                src: src.into(),
                display_mode: DisplayMode::Freeze,
                volume: 1.0,
            },
            frame,
        }
    }

    /// Avatar.
    #[must_use]
    pub fn avatar(avatar_id: impl Into<String>, frame: Frame) -> Self {
        Self::Avatar {
            avatar_id: avatar_id.into(),
            frame,
        }
    }

    /// The kind of element this creates.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Text { .. } => ElementKind::Text,
            Self::Media { media, .. } => media.kind(),
            Self::Avatar { .. } => ElementKind::Avatar,
        }
    }

    /// The requested frame.
    #[must_use]
    pub const fn frame(&self) -> &Frame {
        match self {
            Self::Text { frame, .. } | Self::Media { frame, .. } | Self::Avatar { frame, .. } => {
                frame
            }
        }
    }

    /// Reject malformed initial properties.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.frame().validate()?;
        match self {
            Self::Text { font_size, .. } => validate_font_size(*font_size),
            Self::Media { media, .. } => media.validate(),
            Self::Avatar { .. } => Ok(()),
        }
    }
}

pub(crate) fn validate_font_size(font_size: f32) -> Result<(), ValidationError> {
    finite("fontSize", font_size)?;
    if font_size > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidFontSize(font_size))
    }
}
