//! Z-order engine.
//!
//! Keeps every scene's element layers dense and unique: after any call the
//! z-indices of a scene with `n` elements are exactly `2..=n + 1`. The
//! background is never part of this index space.

use serde::{Deserialize, Serialize};

use crate::{Scene, Selector, FIRST_ELEMENT_LAYER};

/// A stacking change requested for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderOp {
    /// Move to the top of the stack.
    Front,
    /// Move to the bottom of the stack (still above the background).
    Back,
    /// Swap with the element directly above.
    Forward,
    /// Swap with the element directly below.
    Backward,
}

/// Position of an element inside the scene's lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Text(usize),
    Media(usize),
    Avatar,
}

impl Slot {
    fn matches(self, scene: &Scene, selector: &Selector) -> bool {
        match (self, selector) {
            (Self::Text(i), Selector::Text(id)) => scene.texts[i].id == *id,
            (Self::Media(i), Selector::Media(id)) => scene.media[i].media_id == *id,
            (Self::Avatar, Selector::Avatar) => true,
            _ => false,
        }
    }
}

/// Elements sorted bottom to top. Ties keep discovery order
/// (texts, then media, then avatar) because the sort is stable.
fn layer_order(scene: &Scene) -> Vec<Slot> {
    let mut slots: Vec<(Slot, u32)> = scene
        .texts
        .iter()
        .enumerate()
        .map(|(i, t)| (Slot::Text(i), t.z_index))
        .chain(
            scene
                .media
                .iter()
                .enumerate()
                .map(|(i, m)| (Slot::Media(i), m.z_index)),
        )
        .chain(scene.avatar.iter().map(|a| (Slot::Avatar, a.z_index)))
        .collect();
    slots.sort_by_key(|(_, z)| *z);
    slots.into_iter().map(|(slot, _)| slot).collect()
}

fn assign(scene: &mut Scene, order: &[Slot]) {
    for (layer, slot) in (FIRST_ELEMENT_LAYER..).zip(order) {
        match *slot {
            Slot::Text(i) => scene.texts[i].z_index = layer,
            Slot::Media(i) => scene.media[i].z_index = layer,
            Slot::Avatar => {
                if let Some(avatar) = scene.avatar.as_mut() {
                    avatar.z_index = layer;
                }
            }
        }
    }
}

/// Reassign z-indices `2, 3, 4, …` preserving the current relative order.
pub fn normalize(scene: &mut Scene) {
    let order = layer_order(scene);
    assign(scene, &order);
}

/// Check whether the scene's z-indices are exactly `2..=n + 1`.
#[must_use]
pub fn is_normalized(scene: &Scene) -> bool {
    let mut layers: Vec<u32> = scene.elements().map(|e| e.z_index()).collect();
    layers.sort_unstable();
    layers
        .iter()
        .zip(FIRST_ELEMENT_LAYER..)
        .all(|(actual, expected)| *actual == expected)
}

/// Apply a stacking change to the addressed element.
///
/// Returns `false` (leaving the scene untouched) if the selector does not
/// resolve. Otherwise the scene is normalized, even when the move itself is a
/// no-op because the element is already at the requested extreme.
pub fn reorder(scene: &mut Scene, selector: &Selector, op: ReorderOp) -> bool {
    let mut order = layer_order(scene);
    let Some(pos) = order.iter().position(|slot| slot.matches(scene, selector)) else {
        tracing::warn!("Reorder {op:?} ignored: {selector} not found in scene {}", scene.id);
        return false;
    };

    match op {
        ReorderOp::Front => {
            let slot = order.remove(pos);
            order.push(slot);
        }
        ReorderOp::Back => {
            let slot = order.remove(pos);
            order.insert(0, slot);
        }
        ReorderOp::Forward => {
            if pos + 1 < order.len() {
                order.swap(pos, pos + 1);
            }
        }
        ReorderOp::Backward => {
            if pos > 0 {
                order.swap(pos, pos - 1);
            }
        }
    }
    assign(scene, &order);
    true
}

/// Move an element to the top of the stack.
pub fn bring_to_front(scene: &mut Scene, selector: &Selector) -> bool {
    reorder(scene, selector, ReorderOp::Front)
}

/// Move an element to the bottom of the stack.
pub fn send_to_back(scene: &mut Scene, selector: &Selector) -> bool {
    reorder(scene, selector, ReorderOp::Back)
}

/// Swap an element with its upper neighbour.
pub fn bring_forward(scene: &mut Scene, selector: &Selector) -> bool {
    reorder(scene, selector, ReorderOp::Forward)
}

/// Swap an element with its lower neighbour.
pub fn send_backward(scene: &mut Scene, selector: &Selector) -> bool {
    reorder(scene, selector, ReorderOp::Backward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AspectRatio, Avatar, Background, ElementId, Frame, MediaItem, MediaKind, TextElement,
    };

    fn text(z_index: u32) -> TextElement {
        TextElement {
            id: ElementId::new(),
            content: format!("z{z_index}"),
            font_size: 24.0,
            color: "#ffffff".to_string(),
            font_family: None,
            frame: Frame::default(),
            z_index,
        }
    }

    fn image(z_index: u32) -> MediaItem {
        MediaItem {
            media_id: ElementId::new(),
            kind: MediaKind::Image {
                src: "a.png".to_string(),
            },
            frame: Frame::default(),
            z_index,
        }
    }

    fn scene_with(texts: Vec<TextElement>, media: Vec<MediaItem>, avatar: Option<u32>) -> Scene {
        let mut scene = Scene::new(AspectRatio::default(), Background::default());
        scene.texts = texts;
        scene.media = media;
        scene.avatar = avatar.map(|z_index| Avatar {
            id: ElementId::new(),
            avatar_id: "anna".to_string(),
            frame: Frame::default(),
            z_index,
        });
        scene
    }

    fn layers(scene: &Scene) -> Vec<Selector> {
        scene.elements_by_layer().iter().map(|e| e.selector()).collect()
    }

    #[test]
    fn test_normalize_closes_gaps() {
        let mut scene = scene_with(vec![text(10), text(4)], vec![image(7)], Some(20));
        normalize(&mut scene);
        assert_eq!(scene.texts[0].z_index, 4);
        assert_eq!(scene.texts[1].z_index, 2);
        assert_eq!(scene.media[0].z_index, 3);
        assert_eq!(scene.avatar.as_ref().map(|a| a.z_index), Some(5));
        assert!(is_normalized(&scene));
    }

    #[test]
    fn test_normalize_breaks_ties_by_discovery_order() {
        let mut scene = scene_with(vec![text(3)], vec![image(3)], Some(3));
        normalize(&mut scene);
        assert_eq!(scene.texts[0].z_index, 2);
        assert_eq!(scene.media[0].z_index, 3);
        assert_eq!(scene.avatar.as_ref().map(|a| a.z_index), Some(4));
    }

    #[test]
    fn test_normalize_lifts_zero_indices() {
        let mut scene = scene_with(vec![text(0), text(1)], vec![], None);
        normalize(&mut scene);
        assert_eq!(scene.texts[0].z_index, 2);
        assert_eq!(scene.texts[1].z_index, 3);
    }

    #[test]
    fn test_bring_to_front() {
        let mut scene = scene_with(vec![text(2), text(3), text(4)], vec![], None);
        let target = Selector::Text(scene.texts[1].id);
        assert!(bring_to_front(&mut scene, &target));
        assert_eq!(scene.texts[0].z_index, 2);
        assert_eq!(scene.texts[2].z_index, 3);
        assert_eq!(scene.texts[1].z_index, 4);
    }

    #[test]
    fn test_send_to_back() {
        let mut scene = scene_with(vec![text(2)], vec![image(3)], Some(4));
        assert!(send_to_back(&mut scene, &Selector::Avatar));
        assert_eq!(scene.avatar.as_ref().map(|a| a.z_index), Some(2));
        assert_eq!(scene.texts[0].z_index, 3);
        assert_eq!(scene.media[0].z_index, 4);
    }

    #[test]
    fn test_forward_and_backward_swap_neighbours() {
        let mut scene = scene_with(vec![text(2), text(3), text(4)], vec![], None);
        let bottom = Selector::Text(scene.texts[0].id);
        assert!(bring_forward(&mut scene, &bottom));
        assert_eq!(scene.texts[0].z_index, 3);
        assert_eq!(scene.texts[1].z_index, 2);

        assert!(send_backward(&mut scene, &bottom));
        assert_eq!(scene.texts[0].z_index, 2);
        assert_eq!(scene.texts[1].z_index, 3);
    }

    #[test]
    fn test_forward_at_top_is_noop() {
        let mut scene = scene_with(vec![text(2), text(3)], vec![], None);
        let before = layers(&scene);
        let top = Selector::Text(scene.texts[1].id);
        assert!(bring_forward(&mut scene, &top));
        assert_eq!(layers(&scene), before);

        let bottom = Selector::Text(scene.texts[0].id);
        assert!(send_backward(&mut scene, &bottom));
        assert_eq!(layers(&scene), before);
    }

    #[test]
    fn test_stale_selector_leaves_scene_untouched() {
        let mut scene = scene_with(vec![text(9), text(5)], vec![], None);
        let before = scene.clone();
        assert!(!bring_to_front(&mut scene, &Selector::Media(ElementId::new())));
        assert!(!send_to_back(&mut scene, &Selector::Avatar));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_reorder_normalizes_gapped_scene() {
        let mut scene = scene_with(vec![text(2), text(9)], vec![image(40)], None);
        let target = Selector::Text(scene.texts[0].id);
        assert!(bring_forward(&mut scene, &target));
        assert!(is_normalized(&scene));
        assert_eq!(scene.texts[1].z_index, 2);
        assert_eq!(scene.texts[0].z_index, 3);
        assert_eq!(scene.media[0].z_index, 4);
    }
}
