//! Integration tests for the editing session.
//!
//! Drives an [`Editor`] end to end: element lifecycle, layering, snapping,
//! history, and the change stream a persistence layer would consume.

use std::sync::{Arc, Mutex};

use composer_core::zorder::{is_normalized, normalize};
use composer_core::{
    AspectRatio, Avatar, Background, Bounds, Editor, EditorConfig, ElementId, Frame, MediaItem,
    MediaKind, NewElement, ProjectDocument, ReorderOp, Scene, SceneChange, SceneList, SceneStore,
    Selector, TextElement,
};

fn editor() -> Editor {
    let mut editor = Editor::new(EditorConfig::default());
    editor.add_scene();
    editor
}

fn changes(editor: &mut Editor) -> Arc<Mutex<Vec<SceneChange>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    editor.set_on_change(move |change| sink.lock().expect("lock").push(change.clone()));
    seen
}

// ===========================================================================
// Layering
// ===========================================================================

#[test]
fn test_bring_to_front_with_mixed_kinds() {
    let mut editor = editor();
    let text = editor
        .add_element(0, NewElement::text("Caption", Frame::default()))
        .expect("add")
        .expect("selector");
    let video = editor
        .add_element(0, NewElement::video("clip.mp4", Frame::default()))
        .expect("add")
        .expect("selector");
    editor
        .add_element(0, NewElement::avatar("anna", Frame::default()))
        .expect("add");

    assert!(editor.reorder(text, ReorderOp::Front));
    let scene = editor.scene(0).expect("scene");
    let order: Vec<Selector> = scene
        .elements_by_layer()
        .iter()
        .map(|e| e.selector())
        .collect();
    assert_eq!(order, vec![video, Selector::Avatar, text]);
    assert!(is_normalized(scene));
}

#[test]
fn test_removal_leaves_gap_until_reorder() {
    let mut editor = editor();
    let bottom = editor
        .add_element(0, NewElement::text("a", Frame::default()))
        .expect("add")
        .expect("selector");
    let middle = editor
        .add_element(0, NewElement::text("b", Frame::default()))
        .expect("add")
        .expect("selector");
    let top = editor
        .add_element(0, NewElement::text("c", Frame::default()))
        .expect("add")
        .expect("selector");

    assert!(editor.remove_element(middle));
    let scene = editor.scene(0).expect("scene");
    assert!(!is_normalized(scene));
    assert_eq!(scene.max_z_index(), Some(4));

    assert!(editor.reorder(bottom, ReorderOp::Forward));
    let scene = editor.scene(0).expect("scene");
    assert!(is_normalized(scene));
    assert_eq!(scene.element(&top).map(|e| e.z_index()), Some(2));
    assert_eq!(scene.element(&bottom).map(|e| e.z_index()), Some(3));
}

// ===========================================================================
// Stale selectors
// ===========================================================================

#[test]
fn test_stale_delete_after_undo() {
    let mut editor = editor();
    let selector = editor
        .add_element(0, NewElement::image("a.png", Frame::default()))
        .expect("add")
        .expect("selector");
    assert!(editor.undo());
    let seen = changes(&mut editor);
    let before = editor.history_position();

    assert!(!editor.remove_element(selector));
    assert!(!editor.drag(selector, 10.0, 10.0).expect("stale drag"));
    assert!(!editor.reorder(selector, ReorderOp::Back));

    assert_eq!(editor.history_position(), before);
    assert!(seen.lock().expect("lock").is_empty());
    assert!(editor.history_position().can_redo);
}

// ===========================================================================
// Snapping
// ===========================================================================

#[test]
fn test_drag_snaps_bottom_to_sibling_top() {
    let mut editor = editor();
    editor
        .add_element(0, NewElement::image("a.png", Frame::new(800.0, 600.0, 300.0, 200.0)))
        .expect("add");
    let moving = editor
        .add_element(0, NewElement::text("T", Frame::new(1300.0, 300.0, 110.0, 90.0)))
        .expect("add")
        .expect("selector");

    // Bottom edge lands at 602, two pixels below the image's top edge.
    assert!(editor.drag(moving, 0.0, 212.0).expect("drag"));
    let frame = editor.scene(0).expect("scene").texts[0].frame;
    assert!((frame.y - 510.0).abs() < f32::EPSILON);
    assert!((frame.x - 1300.0).abs() < f32::EPSILON);
}

#[test]
fn test_resize_snaps_right_edge_to_canvas() {
    let mut editor = editor();
    let selector = editor
        .add_element(0, NewElement::image("a.png", Frame::new(1418.0, 200.0, 400.0, 47.0)))
        .expect("add")
        .expect("selector");
    assert!(editor
        .resize(selector, Bounds::new(1418.0, 200.0, 500.0, 47.0))
        .expect("resize"));
    let frame = editor.scene(0).expect("scene").media[0].frame;
    assert!((frame.x - 1418.0).abs() < f32::EPSILON);
    assert!((frame.width - 502.0).abs() < f32::EPSILON);
}

#[test]
fn test_snap_uses_scene_aspect_ratio() {
    let mut editor = Editor::new(EditorConfig {
        aspect_ratio: AspectRatio::Portrait,
        ..EditorConfig::default()
    });
    editor.add_scene();
    let selector = editor
        .add_element(0, NewElement::text("T", Frame::new(100.0, 1700.0, 100.0, 100.0)))
        .expect("add")
        .expect("selector");
    // 1080x1920 canvas: bottom edge 1918 snaps to 1920.
    assert!(editor.drag(selector, 0.0, 118.0).expect("drag"));
    let frame = editor.scene(0).expect("scene").texts[0].frame;
    assert!((frame.y - 1820.0).abs() < f32::EPSILON);
}

// ===========================================================================
// History and change stream
// ===========================================================================

#[test]
fn test_branching_discards_redo_and_notifies() {
    let mut editor = editor();
    let seen = changes(&mut editor);
    editor.set_title(0, "one".into());
    editor.set_title(0, "two".into());
    assert!(editor.undo());
    editor.set_background(
        0,
        Background::Image {
            src: "bg.png".into(),
        },
    );
    assert!(!editor.redo());
    let scene = editor.scene(0).expect("scene");
    assert_eq!(scene.title, "one");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 4);
    assert!(seen[3].patch.background.is_some());
    assert!(seen[3].patch.title.is_none());
    let revisions: Vec<u64> = seen.iter().map(|c| c.revision).collect();
    assert!(revisions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_scene_removal_emits_removal_patch() {
    let mut editor = editor();
    editor.add_scene();
    let removed = editor.scene(0).expect("scene").id;
    let seen = changes(&mut editor);
    assert!(editor.remove_scene(0));
    let seen = seen.lock().expect("lock");
    assert!(seen
        .iter()
        .any(|c| c.scene_id == removed && c.patch.removed));
    assert!(seen
        .iter()
        .any(|c| c.scene_id != removed && c.patch.position == Some(0)));
}

#[test]
fn test_project_document_roundtrip_through_editor() {
    let mut editor = editor();
    editor
        .add_element(0, NewElement::text("Saved", Frame::new(5.0, 5.0, 50.0, 20.0)))
        .expect("add");
    let mut doc = ProjectDocument::new("demo", AspectRatio::Landscape);
    doc.set_scenes(editor.scenes());
    let json = doc.to_json().expect("serialize");

    let loaded = ProjectDocument::from_json(&json).expect("parse");
    let mut restored = Editor::default();
    restored.load(loaded.scene_list());
    assert_eq!(restored.scenes(), editor.scenes());
    assert!(!restored.history_position().can_undo);
}

// ===========================================================================
// Properties
// ===========================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn scene_with_layers(texts: &[u32], media: &[u32], avatar: Option<u32>) -> Scene {
        let mut scene = Scene::new(AspectRatio::default(), Background::default());
        scene.texts = texts
            .iter()
            .map(|&z_index| TextElement {
                id: ElementId::new(),
                content: "t".into(),
                font_size: 12.0,
                color: "#fff".into(),
                font_family: None,
                frame: Frame::default(),
                z_index,
            })
            .collect();
        scene.media = media
            .iter()
            .map(|&z_index| MediaItem {
                media_id: ElementId::new(),
                kind: MediaKind::Image { src: "i.png".into() },
                frame: Frame::default(),
                z_index,
            })
            .collect();
        scene.avatar = avatar.map(|z_index| Avatar {
            id: ElementId::new(),
            avatar_id: "anna".into(),
            frame: Frame::default(),
            z_index,
        });
        scene
    }

    #[derive(Debug, Clone)]
    enum Step {
        AddText(f32, f32),
        AddImage(f32, f32),
        AddAvatar,
        Reorder(usize, ReorderOp),
        Remove(usize),
        Drag(usize, f32, f32),
        Undo,
        Redo,
    }

    fn arb_op() -> impl Strategy<Value = ReorderOp> {
        prop_oneof![
            Just(ReorderOp::Front),
            Just(ReorderOp::Back),
            Just(ReorderOp::Forward),
            Just(ReorderOp::Backward),
        ]
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0.0f32..1800.0, 0.0f32..1000.0).prop_map(|(x, y)| Step::AddText(x, y)),
            (0.0f32..1800.0, 0.0f32..1000.0).prop_map(|(x, y)| Step::AddImage(x, y)),
            Just(Step::AddAvatar),
            (0usize..8, arb_op()).prop_map(|(i, op)| Step::Reorder(i, op)),
            (0usize..8).prop_map(Step::Remove),
            (0usize..8, -200.0f32..200.0, -200.0f32..200.0)
                .prop_map(|(i, dx, dy)| Step::Drag(i, dx, dy)),
            Just(Step::Undo),
            Just(Step::Redo),
        ]
    }

    fn nth_selector(editor: &Editor, index: usize) -> Option<Selector> {
        let scene = editor.scene(0)?;
        let count = scene.element_count();
        if count == 0 {
            return None;
        }
        scene.elements().nth(index % count).map(|e| e.selector())
    }

    fn run(editor: &mut Editor, step: &Step) {
        match *step {
            Step::AddText(x, y) => {
                editor
                    .add_element(0, NewElement::text("p", Frame::new(x, y, 80.0, 40.0)))
                    .expect("add");
            }
            Step::AddImage(x, y) => {
                editor
                    .add_element(0, NewElement::image("p.png", Frame::new(x, y, 120.0, 90.0)))
                    .expect("add");
            }
            Step::AddAvatar => {
                editor
                    .add_element(0, NewElement::avatar("anna", Frame::default()))
                    .expect("add");
            }
            Step::Reorder(i, op) => {
                if let Some(selector) = nth_selector(editor, i) {
                    editor.reorder(selector, op);
                }
            }
            Step::Remove(i) => {
                if let Some(selector) = nth_selector(editor, i) {
                    editor.remove_element(selector);
                }
            }
            Step::Drag(i, dx, dy) => {
                if let Some(selector) = nth_selector(editor, i) {
                    editor.drag(selector, dx, dy).expect("drag");
                }
            }
            Step::Undo => {
                editor.undo();
            }
            Step::Redo => {
                editor.redo();
            }
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            texts in prop::collection::vec(0u32..50, 0..6),
            media in prop::collection::vec(0u32..50, 0..6),
            avatar in prop::option::of(0u32..50),
        ) {
            let mut once = scene_with_layers(&texts, &media, avatar);
            normalize(&mut once);
            let mut twice = once.clone();
            normalize(&mut twice);
            prop_assert_eq!(&once, &twice);
            prop_assert!(is_normalized(&once));
        }

        #[test]
        fn prop_reorder_leaves_dense_layers(
            texts in prop::collection::vec(0u32..50, 1..6),
            media in prop::collection::vec(0u32..50, 0..6),
            pick in 0usize..12,
            ops in prop::collection::vec(arb_op(), 1..8),
        ) {
            let mut scene = scene_with_layers(&texts, &media, None);
            let selectors: Vec<Selector> = scene.elements().map(|e| e.selector()).collect();
            let target = selectors[pick % selectors.len()];
            for op in ops {
                prop_assert!(composer_core::zorder::reorder(&mut scene, &target, op));
                prop_assert!(is_normalized(&scene));
                let mut layers: Vec<u32> = scene.elements().map(|e| e.z_index()).collect();
                layers.sort_unstable();
                let expected: Vec<u32> = (2..).take(selectors.len()).collect();
                prop_assert_eq!(layers, expected);
            }
        }

        #[test]
        fn prop_undo_redo_inverse(steps in prop::collection::vec(arb_step(), 1..25)) {
            let mut editor = editor();
            for step in &steps {
                run(&mut editor, step);
            }
            let current = editor.scenes().clone();
            if editor.undo() {
                prop_assert!(editor.redo());
                prop_assert_eq!(editor.scenes(), &current);
            }
        }

        #[test]
        fn prop_snapshots_survive_later_edits(steps in prop::collection::vec(arb_step(), 1..25)) {
            // Start from a one-scene snapshot at cursor 0.
            let scenes = SceneStore::default().add_scene(&SceneList::new());
            let mut editor = Editor::with_scenes(EditorConfig::default(), scenes);
            // Deep copies taken at commit time, indexed by history cursor.
            let mut frozen: Vec<Vec<Scene>> = vec![editor.scenes().to_vec()];
            prop_assert_eq!(editor.history_position().cursor, 0);
            for step in &steps {
                run(&mut editor, step);
                if !editor.history_position().can_redo {
                    let cursor = editor.history_position().cursor;
                    frozen.truncate(cursor);
                    frozen.push(editor.scenes().to_vec());
                }
            }
            while editor.history_position().cursor + 1 < editor.history_position().len {
                editor.redo();
            }
            loop {
                let cursor = editor.history_position().cursor;
                if cursor < frozen.len() {
                    prop_assert_eq!(&editor.scenes().to_vec(), &frozen[cursor]);
                }
                if !editor.undo() {
                    break;
                }
            }
        }
    }
}
