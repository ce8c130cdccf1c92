//! Element addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Avatar, ElementId, ElementKind, Frame, MediaItem, TextElement};

/// Identifies one element of a scene.
///
/// Texts and media are addressed by their stable identifiers so a selection
/// survives reordering of the underlying lists. The avatar is a singleton slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Selector {
    /// A text element by id.
    Text(ElementId),
    /// An image or video by media id.
    Media(ElementId),
    /// The avatar slot.
    Avatar,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(id) => write!(f, "text:{id}"),
            Self::Media(id) => write!(f, "media:{id}"),
            Self::Avatar => f.write_str("avatar"),
        }
    }
}

/// Borrowed view of one element of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementRef<'a> {
    /// A text overlay.
    Text(&'a TextElement),
    /// An image or video.
    Media(&'a MediaItem),
    /// The avatar.
    Avatar(&'a Avatar),
}

impl<'a> ElementRef<'a> {
    /// Selector addressing this element.
    #[must_use]
    pub fn selector(&self) -> Selector {
        match self {
            Self::Text(text) => Selector::Text(text.id),
            Self::Media(media) => Selector::Media(media.media_id),
            Self::Avatar(_) => Selector::Avatar,
        }
    }

    /// Element kind.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Media(media) => media.kind.kind(),
            Self::Avatar(_) => ElementKind::Avatar,
        }
    }

    /// Position, size and rotation.
    #[must_use]
    pub fn frame(&self) -> &'a Frame {
        match self {
            Self::Text(text) => &text.frame,
            Self::Media(media) => &media.frame,
            Self::Avatar(avatar) => &avatar.frame,
        }
    }

    /// Stacking order.
    #[must_use]
    pub fn z_index(&self) -> u32 {
        match self {
            Self::Text(text) => text.z_index,
            Self::Media(media) => media.z_index,
            Self::Avatar(avatar) => avatar.z_index,
        }
    }
}
