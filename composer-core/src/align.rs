//! Alignment and snapping.
//!
//! Evaluated fresh on every pointer-move tick while an element is dragged or
//! resized. The engine is pure geometry: no state, no side effects, and the
//! work done is linear in the number of siblings.
//!
//! ## Evaluation order
//!
//! ```text
//! 1. canvas guides       (top, center, bottom / left, center, right)
//! 2. sibling guides      (same six lines per sibling, in scene order)
//! 3. edge-to-edge pairs  (top↔top, bottom↔bottom, top↔bottom, bottom↔top, per axis)
//! ```
//!
//! Within one axis the last match wins, so edge-to-edge adjacency overrides a
//! guide match found earlier. Matches are not ranked by distance.

use serde::{Deserialize, Serialize};

use crate::{Bounds, CanvasSize, Scene, Selector};

/// Snap distance in canvas-space pixels. A difference equal to the threshold
/// still snaps.
pub const SNAP_THRESHOLD: f32 = 3.0;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// A line of constant `y`; snaps the vertical position.
    Horizontal,
    /// A line of constant `x`; snaps the horizontal position.
    Vertical,
}

/// Which feature of a rectangle a guide or edge refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Top or left edge.
    Start,
    /// Vertical or horizontal center.
    Center,
    /// Bottom or right edge.
    End,
}

impl Anchor {
    const ALL: [Self; 3] = [Self::Start, Self::Center, Self::End];

    /// Offset of this anchor from the rectangle's origin along an extent.
    fn offset(self, extent: f32) -> f32 {
        match self {
            Self::Start => 0.0,
            Self::Center => extent / 2.0,
            Self::End => extent,
        }
    }
}

/// Where a guide comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "selector", rename_all = "lowercase")]
pub enum GuideSource {
    /// The canvas edges or center.
    Canvas,
    /// Another element of the scene.
    Sibling(Selector),
}

/// A reference line used for snap detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    /// Line orientation.
    pub orientation: Orientation,
    /// `y` for horizontal lines, `x` for vertical lines.
    pub position: f32,
    /// Feature of the source this line follows.
    pub anchor: Anchor,
    /// Canvas or sibling.
    pub source: GuideSource,
}

/// A guide that the moving element snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapMatch {
    /// The matched line.
    pub guide: Guide,
    /// Which edge of the moving element touched it.
    pub edge: Anchor,
    /// Distance before correction.
    pub distance: f32,
}

/// Result of one snap evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    /// Corrected `x`, if the horizontal position snapped.
    pub x: Option<f32>,
    /// Corrected `y`, if the vertical position snapped.
    pub y: Option<f32>,
    /// Every match found, in evaluation order, for drawing snap lines.
    pub matches: Vec<SnapMatch>,
}

impl SnapResult {
    /// Apply the corrections to a rectangle.
    #[must_use]
    pub fn apply(&self, bounds: Bounds) -> Bounds {
        Bounds::new(
            self.x.unwrap_or(bounds.x),
            self.y.unwrap_or(bounds.y),
            bounds.width,
            bounds.height,
        )
    }

    /// Apply the corrections to a rectangle being resized.
    ///
    /// The edge that produced the winning match on each axis is moved onto
    /// its guide and the opposite edge stays put. A center match translates
    /// the rectangle instead.
    #[must_use]
    pub fn apply_resize(&self, bounds: Bounds) -> Bounds {
        let mut out = bounds;
        if let (Some(x), Some(edge)) = (self.x, self.winning_edge(Orientation::Vertical)) {
            let delta = x - bounds.x;
            match edge {
                Anchor::Start => {
                    out.x = x;
                    out.width = (bounds.width - delta).max(0.0);
                }
                Anchor::End => out.width = (bounds.width + delta).max(0.0),
                Anchor::Center => out.x = x,
            }
        }
        if let (Some(y), Some(edge)) = (self.y, self.winning_edge(Orientation::Horizontal)) {
            let delta = y - bounds.y;
            match edge {
                Anchor::Start => {
                    out.y = y;
                    out.height = (bounds.height - delta).max(0.0);
                }
                Anchor::End => out.height = (bounds.height + delta).max(0.0),
                Anchor::Center => out.y = y,
            }
        }
        out
    }

    /// Drop matches on edges that did not move between `origin` and
    /// `current`, then recompute the corrections from what is left.
    /// Center matches are always dropped.
    fn retain_moved_edges(&mut self, origin: Bounds, current: Bounds) {
        self.matches.retain(|m| {
            let orientation = m.guide.orientation;
            m.edge != Anchor::Center
                && (anchor_position(origin, orientation, m.edge)
                    - anchor_position(current, orientation, m.edge))
                .abs()
                    > f32::EPSILON
        });
        self.x = self.correction(Orientation::Vertical, current.width);
        self.y = self.correction(Orientation::Horizontal, current.height);
    }

    fn correction(&self, orientation: Orientation, extent: f32) -> Option<f32> {
        self.matches
            .iter()
            .rev()
            .find(|m| m.guide.orientation == orientation)
            .map(|m| m.guide.position - m.edge.offset(extent))
    }

    fn winning_edge(&self, orientation: Orientation) -> Option<Anchor> {
        self.matches
            .iter()
            .rev()
            .find(|m| m.guide.orientation == orientation)
            .map(|m| m.edge)
    }

    /// Matched guides, for rendering.
    #[must_use]
    pub fn guides(&self) -> Vec<Guide> {
        self.matches.iter().map(|m| m.guide).collect()
    }

    /// Check whether either axis snapped.
    #[must_use]
    pub fn snapped(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// Snap engine bound to a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentEngine {
    canvas: CanvasSize,
    threshold: f32,
}

impl AlignmentEngine {
    /// Create an engine with the default 3px threshold.
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            threshold: SNAP_THRESHOLD,
        }
    }

    /// Override the snap threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Engine for a scene's canvas.
    #[must_use]
    pub fn for_scene(scene: &Scene) -> Self {
        Self::new(scene.canvas_size())
    }

    /// The snap threshold in pixels.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Guides for the canvas edges and center.
    #[must_use]
    pub fn canvas_guides(&self) -> Vec<Guide> {
        rect_guides(self.canvas.bounds(), GuideSource::Canvas)
    }

    /// Snap `current` against the canvas and the given siblings.
    ///
    /// The caller is responsible for excluding the moving element from
    /// `siblings`.
    #[must_use]
    pub fn snap(&self, current: Bounds, siblings: &[(Selector, Bounds)]) -> SnapResult {
        let mut result = SnapResult::default();

        let guides = self.canvas_guides().into_iter().chain(
            siblings
                .iter()
                .flat_map(|(selector, bounds)| rect_guides(*bounds, GuideSource::Sibling(*selector))),
        );
        for guide in guides {
            for edge in Anchor::ALL {
                self.try_snap(&mut result, current, guide, edge);
            }
        }

        for (selector, bounds) in siblings {
            let source = GuideSource::Sibling(*selector);
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                for (edge, target) in [
                    (Anchor::Start, Anchor::Start),
                    (Anchor::End, Anchor::End),
                    (Anchor::Start, Anchor::End),
                    (Anchor::End, Anchor::Start),
                ] {
                    let guide = Guide {
                        orientation,
                        position: anchor_position(*bounds, orientation, target),
                        anchor: target,
                        source,
                    };
                    self.try_snap(&mut result, current, guide, edge);
                }
            }
        }

        result
    }

    /// Snap an element of `scene` that is being moved to `current`.
    ///
    /// Every other element of the scene is a sibling.
    #[must_use]
    pub fn snap_in_scene(&self, scene: &Scene, moving: &Selector, current: Bounds) -> SnapResult {
        let siblings: Vec<(Selector, Bounds)> = scene
            .elements()
            .map(|e| (e.selector(), e.frame().bounds()))
            .filter(|(selector, _)| selector != moving)
            .collect();
        self.snap(current, &siblings)
    }

    /// Snap an element of `scene` that is being resized from `origin` to
    /// `current`.
    ///
    /// Only edges that moved are snapped; pair the result with
    /// [`SnapResult::apply_resize`].
    #[must_use]
    pub fn snap_resize_in_scene(
        &self,
        scene: &Scene,
        moving: &Selector,
        origin: Bounds,
        current: Bounds,
    ) -> SnapResult {
        let mut result = self.snap_in_scene(scene, moving, current);
        result.retain_moved_edges(origin, current);
        result
    }

    fn try_snap(&self, result: &mut SnapResult, current: Bounds, guide: Guide, edge: Anchor) {
        let distance = (anchor_position(current, guide.orientation, edge) - guide.position).abs();
        if distance > self.threshold {
            return;
        }
        match guide.orientation {
            Orientation::Horizontal => {
                result.y = Some(guide.position - edge.offset(current.height));
            }
            Orientation::Vertical => {
                result.x = Some(guide.position - edge.offset(current.width));
            }
        }
        result.matches.push(SnapMatch {
            guide,
            edge,
            distance,
        });
    }
}

fn anchor_position(bounds: Bounds, orientation: Orientation, anchor: Anchor) -> f32 {
    match orientation {
        Orientation::Horizontal => bounds.y + anchor.offset(bounds.height),
        Orientation::Vertical => bounds.x + anchor.offset(bounds.width),
    }
}

fn rect_guides(bounds: Bounds, source: GuideSource) -> Vec<Guide> {
    [Orientation::Horizontal, Orientation::Vertical]
        .into_iter()
        .flat_map(|orientation| {
            Anchor::ALL.into_iter().map(move |anchor| Guide {
                orientation,
                position: anchor_position(bounds, orientation, anchor),
                anchor,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementId;

    fn engine() -> AlignmentEngine {
        AlignmentEngine::new(CanvasSize::new(1920.0, 1080.0))
    }

    #[test]
    fn test_canvas_guides() {
        let guides = engine().canvas_guides();
        assert_eq!(guides.len(), 6);
        let positions: Vec<f32> = guides.iter().map(|g| g.position).collect();
        assert_eq!(positions, vec![0.0, 540.0, 1080.0, 0.0, 960.0, 1920.0]);
    }

    #[test]
    fn test_snap_to_canvas_left_edge_at_threshold() {
        let result = engine().snap(Bounds::new(3.0, 400.0, 100.0, 37.0), &[]);
        assert_eq!(result.x, Some(0.0));
        assert_eq!(result.y, None);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].guide.source, GuideSource::Canvas);
    }

    #[test]
    fn test_no_snap_beyond_threshold() {
        let result = engine().snap(Bounds::new(4.0, 400.0, 100.0, 37.0), &[]);
        assert!(!result.snapped());
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_center_snap() {
        // center_x = 939 + 20 = 959, one pixel off the canvas center.
        let result = engine().snap(Bounds::new(939.0, 200.0, 40.0, 10.0), &[]);
        assert_eq!(result.x, Some(940.0));
        assert_eq!(result.matches[0].edge, Anchor::Center);
    }

    #[test]
    fn test_edge_to_edge_right_to_left() {
        let sibling = Selector::Media(ElementId::new());
        let siblings = [(sibling, Bounds::new(500.0, 300.0, 200.0, 200.0))];
        // Right edge at 498: two pixels short of the sibling's left edge.
        let result = engine().snap(Bounds::new(398.0, 720.0, 100.0, 41.0), &siblings);
        let snapped = result.apply(Bounds::new(398.0, 720.0, 100.0, 41.0));
        assert!((snapped.right() - 500.0).abs() < f32::EPSILON);
        let last = result.matches.last().expect("match");
        assert_eq!(last.guide.source, GuideSource::Sibling(sibling));
        assert_eq!(last.edge, Anchor::End);
        assert_eq!(last.guide.anchor, Anchor::Start);
    }

    #[test]
    fn test_last_match_wins_on_axis() {
        // Left edge 1px from the canvas edge, right edge 1px from a sibling's left edge.
        let sibling = Selector::Avatar;
        let siblings = [(sibling, Bounds::new(102.0, 600.0, 50.0, 50.0))];
        let result = engine().snap(Bounds::new(1.0, 300.0, 100.0, 17.0), &siblings);
        assert_eq!(result.x, Some(2.0));
        assert!(result.matches.len() >= 2);
    }

    #[test]
    fn test_apply_resize_moves_only_the_snapped_edge() {
        // Right edge at 1918 snaps to the canvas right edge; left edge stays.
        let bounds = Bounds::new(1418.0, 200.0, 500.0, 47.0);
        let result = engine().snap(bounds, &[]);
        assert_eq!(result.x, Some(1420.0));
        let resized = result.apply_resize(bounds);
        assert!((resized.x - 1418.0).abs() < f32::EPSILON);
        assert!((resized.right() - 1920.0).abs() < f32::EPSILON);

        // Left edge at 2 snaps to 0; right edge stays at 202.
        let bounds = Bounds::new(2.0, 200.0, 200.0, 47.0);
        let resized = engine().snap(bounds, &[]).apply_resize(bounds);
        assert!((resized.x - 0.0).abs() < f32::EPSILON);
        assert!((resized.right() - 202.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resize_leaves_stationary_edge_alone() {
        use crate::{AspectRatio, Background};

        let scene = Scene::new(AspectRatio::Landscape, Background::default());
        let moving = Selector::Text(ElementId::new());
        let engine = AlignmentEngine::for_scene(&scene);
        let origin = Bounds::new(2.0, 400.0, 200.0, 47.0);

        // Right edge dragged to 602; the left edge sits 2px from the canvas
        // edge but did not move.
        let current = Bounds::new(2.0, 400.0, 600.0, 47.0);
        let result = engine.snap_resize_in_scene(&scene, &moving, origin, current);
        assert!(!result.snapped());
        assert_eq!(result.apply_resize(current), current);

        // Right edge dragged to 1918 snaps to the canvas edge.
        let current = Bounds::new(2.0, 400.0, 1916.0, 47.0);
        let resized = engine
            .snap_resize_in_scene(&scene, &moving, origin, current)
            .apply_resize(current);
        assert!((resized.x - 2.0).abs() < f32::EPSILON);
        assert!((resized.right() - 1920.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_snap_in_scene_excludes_moving_element() {
        use crate::{AspectRatio, Background, Frame, Scene, TextElement};

        let mut scene = Scene::new(AspectRatio::Landscape, Background::default());
        let id = ElementId::new();
        scene.texts.push(TextElement {
            id,
            content: "moving".to_string(),
            font_size: 20.0,
            color: "#fff".to_string(),
            font_family: None,
            frame: Frame::new(300.0, 300.0, 100.0, 50.0),
            z_index: 2,
        });
        let moving = Selector::Text(id);
        // Only 1px away from its own committed position; must not snap to itself.
        let result = AlignmentEngine::for_scene(&scene).snap_in_scene(
            &scene,
            &moving,
            Bounds::new(301.0, 301.0, 100.0, 50.0),
        );
        assert!(!result.snapped());
    }
}
