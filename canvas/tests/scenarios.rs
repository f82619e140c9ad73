//! End-to-end editing sessions driven through the public engine API.
#![allow(clippy::float_cmp)]

use std::io::Cursor;

use canvas::engine::{Action, EngineCore, Notice};
use canvas::factory::ShapeKind;
use canvas::input::{Button, Key, Modifiers};
use canvas::object::ObjectKind;
use canvas::scene::Snapshot;
use canvas::tool::ToolMode;
use canvas::viewport::{ContainerSize, Point};

/// A session whose canvas comes out at `width` × `height`.
fn session(width: f64, height: f64) -> EngineCore {
    let mut engine = EngineCore::default();
    engine.container_ready(ContainerSize::new(width + 60.0, height + 180.0));
    engine
}

fn commits(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::HistoryChanged { .. })).count()
}

fn kinds(engine: &EngineCore) -> Vec<&'static str> {
    engine.scene().objects().iter().map(|o| o.kind.name()).collect()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

// =============================================================
// Scenarios
// =============================================================

#[test]
fn new_session_add_rectangle() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Rectangle, None);

    assert_eq!(engine.history().len(), 2);
    let active = engine.scene().active_object().unwrap();
    assert_eq!(active.kind, ObjectKind::Rectangle);
}

#[test]
fn undo_and_redo_two_shapes() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.add_shape(ShapeKind::Circle, None);
    let ids: Vec<_> = engine.scene().objects().iter().map(|o| o.id).collect();

    engine.undo();
    assert_eq!(kinds(&engine), vec!["rectangle"]);

    engine.redo();
    assert_eq!(kinds(&engine), vec!["rectangle", "circle"]);
    let restored: Vec<_> = engine.scene().objects().iter().map(|o| o.id).collect();
    assert_eq!(restored, ids);
}

#[test]
fn simulated_stroke_commits_once() {
    let mut engine = session(800.0, 600.0);
    engine.enter_draw();
    let before = engine.history().len();

    let mods = Modifiers::default();
    let mut actions = engine.on_pointer_down(Point::new(100.0, 100.0), Button::Primary, mods);
    for i in 1..=5 {
        actions.extend(engine.on_pointer_move(Point::new(100.0 + f64::from(i) * 10.0, 100.0), mods));
    }
    actions.extend(engine.on_pointer_up(Point::new(150.0, 100.0), Button::Primary, mods));

    assert_eq!(commits(&actions), 1);
    assert_eq!(engine.history().len(), before + 1);
    assert_eq!(kinds(&engine), vec!["path"]);
}

#[test]
fn delete_selected_circle() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.add_shape(ShapeKind::Circle, None);
    assert_eq!(engine.scene().active_object().unwrap().kind, ObjectKind::Circle);

    let actions = engine.on_key_down(&Key::new("Delete"), Modifiers::default());
    assert_eq!(commits(&actions), 1);
    assert_eq!(kinds(&engine), vec!["rectangle"]);
    assert_eq!(engine.scene().active(), None);
}

#[test]
fn upload_wide_image_on_large_canvas() {
    let mut engine = session(1200.0, 800.0);
    engine.on_file_selected(&png(2000, 500));

    let obj = engine.scene().objects().last().unwrap();
    assert_eq!((obj.width, obj.height), (400.0, 100.0));
    let c = obj.center();
    assert_eq!((c.x, c.y), (600.0, 400.0));
}

// =============================================================
// Properties
// =============================================================

#[test]
fn n_mutations_give_n_plus_one_snapshots() {
    let mut engine = session(800.0, 600.0);
    let shapes = [ShapeKind::Rectangle, ShapeKind::Circle, ShapeKind::Triangle];
    for (n, kind) in shapes.iter().cycle().take(9).enumerate() {
        engine.add_shape(*kind, None);
        assert_eq!(engine.history().len(), n + 2);
        assert_eq!(engine.history().cursor(), Some(n + 1));
    }
    engine.add_text("Awarded to");
    engine.on_key_down(&Key::new("Backspace"), Modifiers::default());
    engine.clear();
    assert_eq!(engine.history().len(), 13);
}

#[test]
fn undo_redo_round_trip_is_exact() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Triangle, None);
    engine.add_text("Certificate");
    engine.on_file_selected(&png(40, 30));
    let before = engine.scene().serialize().to_json().unwrap();

    engine.undo();
    engine.redo();
    assert_eq!(engine.scene().serialize().to_json().unwrap(), before);
}

#[test]
fn snapshot_json_restores_exactly() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Circle, None);
    engine.on_file_selected(&png(3, 2));
    engine.enter_erase();
    engine.on_pointer_down(Point::new(10.0, 10.0), Button::Primary, Modifiers::default());
    engine.on_pointer_up(Point::new(20.0, 20.0), Button::Primary, Modifiers::default());

    let snapshot = engine.scene().serialize();
    let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn draw_and_erase_never_both_active() {
    let mut engine = session(800.0, 600.0);
    engine.enter_draw();
    engine.enter_erase();
    assert!(engine.tool().is_erasing() && !engine.tool().is_drawing());
    engine.enter_draw();
    assert!(engine.tool().is_drawing() && !engine.tool().is_erasing());
    engine.enter_select();
    assert!(!engine.tool().is_drawing() && !engine.tool().is_erasing());
    assert_eq!(engine.mode(), ToolMode::Select);
}

#[test]
fn export_leaves_scene_settled() {
    let mut engine = session(1000.0, 600.0);
    engine.add_shape(ShapeKind::Rectangle, None);
    let before = engine.scene().serialize();
    let history = engine.history().len();

    let actions = engine.export_pdf();
    assert!(actions.iter().any(|a| matches!(a, Action::Save(_))));
    assert_eq!(engine.scene().serialize(), before);
    assert_eq!(engine.history().len(), history);
}

#[test]
fn session_before_ready_ignores_everything() {
    let mut engine = EngineCore::default();
    let not_ready = vec![Action::Ignored(Notice::SurfaceNotReady)];
    let responses = [
        engine.add_shape(ShapeKind::Circle, None),
        engine.add_text("Title"),
        engine.on_file_selected(&png(2, 2)),
        engine.enter_draw(),
        engine.enter_erase(),
        engine.toggle_draw(),
        engine.toggle_erase(),
        engine.enter_select(),
        engine.on_key_down(&Key::new("Delete"), Modifiers::default()),
        engine.on_key_down(&Key::new("z"), Modifiers { ctrl: true, ..Default::default() }),
        engine.undo(),
        engine.redo(),
        engine.clear(),
        engine.export_png(),
        engine.export_pdf(),
    ];
    for actions in responses {
        assert_eq!(actions, not_ready);
    }
    assert!(engine.scene().is_empty());
    assert!(engine.history().is_empty());
    assert_eq!(engine.mode(), ToolMode::Select);
}

#[test]
fn session_after_shutdown_is_frozen() {
    let mut engine = session(800.0, 600.0);
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.add_text("Awarded to");
    let before = engine.scene().serialize();
    engine.shutdown();

    let not_ready = vec![Action::Ignored(Notice::SurfaceNotReady)];
    assert_eq!(engine.on_key_down(&Key::new("Backspace"), Modifiers::default()), not_ready);
    assert_eq!(engine.undo(), not_ready);
    assert_eq!(engine.toggle_draw(), not_ready);
    assert_eq!(engine.export_pdf(), not_ready);
    assert_eq!(engine.scene().serialize(), before);
    assert_eq!(engine.history().len(), 3);
    assert_eq!(engine.mode(), ToolMode::Select);
}
