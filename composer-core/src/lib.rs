//! # Composer Core
//!
//! Scene-graph editing engine for video composition.
//! Compiles to WASM so a browser view layer can drive it directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Editor                    │
//! │   selection · gestures · change listener    │
//! ├─────────────────────────────────────────────┤
//! │  Scene Store      │  History                │
//! │  - copy-on-write  │  - linear undo/redo     │
//! │  - validation     │  - snapshot log         │
//! ├─────────────────────────────────────────────┤
//! │  Z-Order Engine   │  Alignment Engine       │
//! │  - dense layers   │  - canvas/sibling guides│
//! │  - front/back     │  - edge-to-edge snaps   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Committed changes leave the core as [`SceneChange`]s; writing them
//! anywhere is the job of the persistence layer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod align;
pub mod config;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod history;
pub mod patch;
pub mod project;
pub mod scene;
pub mod selector;
pub mod store;
pub mod zorder;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use align::{
    AlignmentEngine, Anchor, Guide, GuideSource, Orientation, SnapMatch, SnapResult,
    SNAP_THRESHOLD,
};
pub use config::EditorConfig;
pub use editor::{
    ChangeCallback, Editor, EditorCommand, GestureInput, GestureKind, GesturePreview, Selection,
};
pub use element::{
    AspectRatio, Avatar, Background, Bounds, CanvasSize, DisplayMode, ElementId, ElementKind,
    Frame, MediaItem, MediaKind, NewElement, TextElement, BACKGROUND_LAYER, FIRST_ELEMENT_LAYER,
};
pub use error::{ComposerError, ComposerResult, ValidationError};
pub use event::{diff, SceneChange, ScenePatch};
pub use history::{History, HistoryPosition};
pub use patch::ElementPatch;
pub use project::{current_timestamp_ms, ProjectDocument, ProjectStatus};
pub use scene::{Scene, SceneId, SceneList};
pub use selector::{ElementRef, Selector};
pub use store::SceneStore;
pub use zorder::ReorderOp;

/// Composer core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
