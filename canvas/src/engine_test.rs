#![allow(clippy::float_cmp)]

use std::io::Cursor;
use std::num::NonZeroUsize;

use super::*;
use crate::object::Compositing;

// =============================================================
// Helpers
// =============================================================

fn ready_engine() -> EngineCore {
    let mut engine = EngineCore::default();
    // 860 - 60 = 800 wide, 780 - 180 = 600 tall.
    engine.container_ready(ContainerSize::new(860.0, 780.0));
    engine
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn drag(engine: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    let mut actions = engine.on_pointer_down(from, Button::Primary, no_mods());
    let mid = pt((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
    actions.extend(engine.on_pointer_move(mid, no_mods()));
    actions.extend(engine.on_pointer_move(to, no_mods()));
    actions.extend(engine.on_pointer_up(to, Button::Primary, no_mods()));
    actions
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

fn commits(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::HistoryChanged { .. })).count()
}

fn added_id(actions: &[Action]) -> ObjectId {
    actions
        .iter()
        .find_map(|a| match a {
            Action::ObjectAdded(id) => Some(*id),
            _ => None,
        })
        .unwrap()
}

// =============================================================
// Surface lifecycle
// =============================================================

#[test]
fn not_ready_before_container() {
    let mut engine = EngineCore::default();
    assert!(!engine.is_ready());
    assert!(engine.surface().is_none());
    assert_eq!(engine.add_shape(ShapeKind::Rectangle, None), vec![Action::Ignored(Notice::SurfaceNotReady)]);
    assert!(engine.scene().is_empty());
    assert!(engine.history().is_empty());
}

#[test]
fn container_ready_sizes_canvas_and_commits_initial_snapshot() {
    let engine = ready_engine();
    assert!(engine.is_ready());
    assert_eq!(engine.viewport(), Viewport::new(800.0, 600.0));
    assert_eq!((engine.scene().width(), engine.scene().height()), (800.0, 600.0));
    let surface = engine.surface().unwrap();
    assert_eq!((surface.width(), surface.height()), (800, 600));
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().cursor(), Some(0));
}

#[test]
fn reinitialize_replaces_surface_and_keeps_content() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Circle, None);
    let first = engine.surface().unwrap().generation();
    engine.reinitialize();
    assert_eq!(engine.surface().unwrap().generation(), first + 1);
    assert_eq!(engine.scene().len(), 1);
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn reinitialize_without_container_is_ignored() {
    let mut engine = EngineCore::default();
    assert_eq!(engine.reinitialize(), vec![Action::Ignored(Notice::SurfaceNotReady)]);
}

#[test]
fn shutdown_releases_surface() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    engine.shutdown();
    assert!(engine.surface().is_none());
    assert!(!engine.is_ready());

    let not_ready = vec![Action::Ignored(Notice::SurfaceNotReady)];
    assert_eq!(engine.add_text(""), not_ready);
    assert_eq!(engine.on_key_down(&Key::new("Delete"), no_mods()), not_ready);
    assert_eq!(engine.delete_active(), not_ready);
    assert_eq!(engine.undo(), not_ready);
    assert_eq!(engine.redo(), not_ready);
    assert_eq!(engine.modify(&id, &ObjectPatch { x: Some(5.0), ..Default::default() }), not_ready);
    assert_eq!(engine.set_text(&id, "x"), not_ready);
    assert_eq!(engine.enter_draw(), not_ready);
    assert_eq!(engine.toggle_erase(), not_ready);
    assert_eq!(engine.set_background(Color::BLACK), not_ready);
    assert_eq!(engine.clear(), not_ready);
    assert_eq!(engine.export_png(), not_ready);

    assert_eq!(engine.scene().len(), 1);
    assert_eq!(engine.scene().get(&id).unwrap().x, 50.0);
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.mode(), ToolMode::Select);
}

#[test]
fn container_ready_after_shutdown_resumes_editing() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.shutdown();
    engine.container_ready(ContainerSize::new(860.0, 780.0));
    assert_eq!(engine.history().len(), 2);
    assert_eq!(commits(&engine.undo()), 1);
    assert!(engine.scene().is_empty());
}

#[test]
fn resize_never_commits() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    let actions = engine.on_resize(ContainerSize::new(2000.0, 2000.0));
    assert_eq!(commits(&actions), 0);
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.viewport(), Viewport::new(1200.0, 800.0));
    assert_eq!(engine.surface().unwrap().width(), 1200);
    assert_eq!(engine.scene().objects()[0].x, 50.0);
}

#[test]
fn resize_is_idempotent() {
    let mut engine = ready_engine();
    engine.on_resize(ContainerSize::new(500.0, 500.0));
    let once = engine.viewport();
    engine.on_resize(ContainerSize::new(500.0, 500.0));
    assert_eq!(engine.viewport(), once);
    assert_eq!(once, Viewport::new(440.0, 320.0));
}

// =============================================================
// Structural operations
// =============================================================

#[test]
fn add_shape_appends_activates_and_commits_once() {
    let mut engine = ready_engine();
    let actions = engine.add_shape(ShapeKind::Triangle, None);
    let id = added_id(&actions);
    assert_eq!(commits(&actions), 1);
    assert_eq!(engine.selection(), Some(id));
    assert_eq!(engine.scene().objects().last().unwrap().id, id);
}

#[test]
fn add_text_uses_default_content_when_empty() {
    let mut engine = ready_engine();
    engine.add_text("");
    let obj = engine.scene().objects().last().unwrap();
    assert!(matches!(&obj.kind, ObjectKind::Text { content, .. } if content == "Editable Text"));
    assert!((obj.center().x - 400.0).abs() < 1e-9);
    assert!((obj.center().y - 300.0).abs() < 1e-9);
}

#[test]
fn adding_while_drawing_returns_to_select() {
    let mut engine = ready_engine();
    engine.enter_draw();
    let actions = engine.add_shape(ShapeKind::Rectangle, None);
    assert!(actions.contains(&Action::ModeChanged(ToolMode::Select)));
    assert_eq!(engine.mode(), ToolMode::Select);
}

#[test]
fn delete_removes_active_object() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    let actions = engine.on_key_down(&Key::new("Delete"), no_mods());
    assert!(actions.contains(&Action::ObjectRemoved(id)));
    assert_eq!(commits(&actions), 1);
    assert!(engine.scene().is_empty());
    assert_eq!(engine.selection(), None);
}

#[test]
fn delete_without_selection_is_ignored() {
    let mut engine = ready_engine();
    engine.enter_draw();
    let actions = engine.on_key_down(&Key::new("Backspace"), no_mods());
    assert_eq!(actions, vec![Action::Ignored(Notice::NoActiveObject)]);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.mode(), ToolMode::Draw);
}

#[test]
fn modify_applies_patch_and_commits() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    let patch = ObjectPatch { fill: Some(Color::rgb(1, 2, 3)), ..Default::default() };
    let actions = engine.modify(&id, &patch);
    assert!(actions.contains(&Action::ObjectModified(id)));
    assert_eq!(commits(&actions), 1);
    assert_eq!(engine.scene().get(&id).unwrap().style.fill, Some(Color::rgb(1, 2, 3)));
}

#[test]
fn rejected_patch_does_not_commit() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    let bad = ObjectPatch { width: Some(f64::NAN), ..Default::default() };
    assert_eq!(engine.modify(&id, &bad), vec![Action::Ignored(Notice::UnsupportedInput)]);
    assert_eq!(engine.modify(&id, &ObjectPatch::default()), vec![Action::Ignored(Notice::UnsupportedInput)]);
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn set_text_replaces_content_and_refits() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_text("Hi"));
    let before = engine.scene().get(&id).unwrap().width;
    engine.set_text(&id, "Certificate of Achievement");
    let obj = engine.scene().get(&id).unwrap();
    assert!(matches!(&obj.kind, ObjectKind::Text { content, .. } if content == "Certificate of Achievement"));
    assert!(obj.width > before);
}

#[test]
fn set_text_on_shape_is_ignored() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    assert_eq!(engine.set_text(&id, "x"), vec![Action::Ignored(Notice::UnsupportedInput)]);
}

#[test]
fn clear_removes_everything_and_keeps_mode() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.set_background(Color::rgb(5, 5, 5));
    engine.enter_erase();
    let actions = engine.clear();
    assert!(actions.contains(&Action::Cleared));
    assert_eq!(commits(&actions), 1);
    assert!(engine.scene().is_empty());
    assert_eq!(engine.scene().background(), Color::WHITE);
    assert_eq!(engine.mode(), ToolMode::Erase);
}

// =============================================================
// Files
// =============================================================

#[test]
fn file_selected_inserts_fitted_image() {
    let mut engine = ready_engine();
    engine.enter_draw();
    let actions = engine.on_file_selected(&png_bytes(1000, 400));
    assert_eq!(commits(&actions), 1);
    assert_eq!(engine.mode(), ToolMode::Select);
    let obj = engine.scene().objects().last().unwrap();
    assert!((obj.width - 300.0).abs() < 1e-9);
    assert!((obj.height - 120.0).abs() < 1e-9);
    assert!((obj.center().x - 400.0).abs() < 1e-9);
    assert!((obj.center().y - 300.0).abs() < 1e-9);
}

#[test]
fn undecodable_file_is_ignored_without_mode_change() {
    let mut engine = ready_engine();
    engine.enter_draw();
    let actions = engine.on_file_selected(b"not an image");
    assert_eq!(actions, vec![Action::Ignored(Notice::UnsupportedInput)]);
    assert_eq!(engine.mode(), ToolMode::Draw);
    assert_eq!(engine.history().len(), 1);
}

// =============================================================
// Freehand strokes
// =============================================================

#[test]
fn stroke_commits_once_on_pointer_up() {
    let mut engine = ready_engine();
    engine.enter_draw();
    engine.set_brush_color(Color::rgb(255, 0, 0));
    engine.set_brush_width(5.0);

    let mut actions = engine.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_mods());
    for i in 1..20 {
        actions.extend(engine.on_pointer_move(pt(10.0 + f64::from(i), 10.0), no_mods()));
    }
    assert_eq!(commits(&actions), 0);
    assert!(engine.scene().is_empty());

    actions.extend(engine.on_pointer_up(pt(40.0, 10.0), Button::Primary, no_mods()));
    assert_eq!(commits(&actions), 1);
    assert_eq!(engine.history().len(), 2);

    let obj = engine.scene().objects().last().unwrap();
    assert_eq!(obj.style.stroke, Some(Color::rgb(255, 0, 0)));
    assert_eq!(obj.style.stroke_width, 5.0);
    assert_eq!(obj.style.fill, None);
    match &obj.kind {
        ObjectKind::Path { points, compositing } => {
            assert_eq!(points.len(), 21);
            assert_eq!(*compositing, Compositing::Normal);
        }
        other => panic!("expected path, got {other:?}"),
    }
}

#[test]
fn erase_stroke_is_background_colored_path() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.enter_erase();
    drag(&mut engine, pt(60.0, 60.0), pt(120.0, 60.0));
    assert_eq!(engine.scene().len(), 2);
    let obj = engine.scene().objects().last().unwrap();
    assert_eq!(obj.style.stroke, Some(Color::WHITE));
    assert!(matches!(obj.kind, ObjectKind::Path { compositing: Compositing::Subtractive, .. }));
}

#[test]
fn click_in_draw_mode_leaves_a_dot() {
    let mut engine = ready_engine();
    engine.enter_draw();
    engine.on_pointer_down(pt(30.0, 30.0), Button::Primary, no_mods());
    engine.on_pointer_up(pt(30.0, 30.0), Button::Primary, no_mods());
    assert!(matches!(&engine.scene().objects()[0].kind, ObjectKind::Path { points, .. } if points.len() == 1));
}

#[test]
fn secondary_button_is_ignored() {
    let mut engine = ready_engine();
    engine.enter_draw();
    assert!(engine.on_pointer_down(pt(1.0, 1.0), Button::Secondary, no_mods()).is_empty());
    assert!(engine.input().is_idle());
}

#[test]
fn mode_change_cancels_stroke() {
    let mut engine = ready_engine();
    engine.enter_draw();
    engine.on_pointer_down(pt(1.0, 1.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(5.0, 5.0), no_mods());
    engine.enter_select();
    let actions = engine.on_pointer_up(pt(9.0, 9.0), Button::Primary, no_mods());
    assert_eq!(commits(&actions), 0);
    assert!(engine.scene().is_empty());
}

// =============================================================
// Select mode
// =============================================================

#[test]
fn click_selects_topmost_and_empty_click_clears() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    let circle = added_id(&engine.add_shape(ShapeKind::Circle, None));
    engine.on_pointer_down(pt(5.0, 5.0), Button::Primary, no_mods());
    engine.on_pointer_up(pt(5.0, 5.0), Button::Primary, no_mods());
    assert_eq!(engine.selection(), None);

    let actions = engine.on_pointer_down(pt(130.0, 105.0), Button::Primary, no_mods());
    assert!(actions.contains(&Action::SelectionChanged(Some(circle))));
    let actions = engine.on_pointer_up(pt(130.0, 105.0), Button::Primary, no_mods());
    assert_eq!(commits(&actions), 0);
}

#[test]
fn drag_moves_object_and_commits_once() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    let actions = drag(&mut engine, pt(60.0, 60.0), pt(160.0, 110.0));
    assert_eq!(commits(&actions), 1);
    let obj = engine.scene().get(&id).unwrap();
    assert_eq!((obj.x, obj.y), (150.0, 100.0));

    engine.undo();
    let obj = engine.scene().get(&id).unwrap();
    assert_eq!((obj.x, obj.y), (50.0, 50.0));
}

#[test]
fn undo_mid_drag_rolls_back_live_move() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    engine.add_shape(ShapeKind::Triangle, None);
    engine.on_pointer_down(pt(60.0, 60.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(70.0, 70.0), no_mods());
    engine.on_key_down(&Key::new("z"), ctrl());
    assert!(engine.input().is_idle());
    assert_eq!(engine.scene().len(), 1);
    assert_eq!(engine.scene().get(&id).unwrap().x, 50.0);
}

#[test]
fn delete_mid_drag_commits_once() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    engine.on_pointer_down(pt(60.0, 60.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(90.0, 90.0), no_mods());

    let deleted = engine.on_key_down(&Key::new("Delete"), no_mods());
    assert_eq!(commits(&deleted), 1);
    assert!(engine.input().is_idle());
    assert!(engine.on_pointer_up(pt(90.0, 90.0), Button::Primary, no_mods()).is_empty());
    assert_eq!(engine.history().len(), 3);

    // One undo brings the object back where the drag started.
    engine.undo();
    let obj = engine.scene().get(&id).unwrap();
    assert_eq!((obj.x, obj.y), (50.0, 50.0));
}

#[test]
fn adding_mid_drag_rolls_back_the_drag() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    engine.on_pointer_down(pt(60.0, 60.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(100.0, 100.0), no_mods());
    engine.add_shape(ShapeKind::Circle, None);
    assert!(engine.input().is_idle());
    assert_eq!(engine.scene().get(&id).unwrap().x, 50.0);
    assert_eq!(commits(&engine.on_pointer_up(pt(100.0, 100.0), Button::Primary, no_mods())), 0);
    assert_eq!(engine.history().len(), 3);
}

#[test]
fn modify_mid_drag_commits_only_the_patch() {
    let mut engine = ready_engine();
    let id = added_id(&engine.add_shape(ShapeKind::Rectangle, None));
    engine.on_pointer_down(pt(60.0, 60.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(100.0, 100.0), no_mods());
    let patch = ObjectPatch { fill: Some(Color::BLACK), ..Default::default() };
    assert_eq!(commits(&engine.modify(&id, &patch)), 1);
    let obj = engine.scene().get(&id).unwrap();
    assert_eq!((obj.x, obj.y), (50.0, 50.0));
    assert_eq!(obj.style.fill, Some(Color::BLACK));
    assert!(engine.on_pointer_up(pt(100.0, 100.0), Button::Primary, no_mods()).is_empty());
}

#[test]
fn export_mid_drag_captures_settled_scene() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    let settled = engine.scene().serialize();
    engine.on_pointer_down(pt(60.0, 60.0), Button::Primary, no_mods());
    engine.on_pointer_move(pt(160.0, 160.0), no_mods());

    let actions = engine.export_png();
    assert!(actions.iter().any(|a| matches!(a, Action::Save(_))));
    assert!(engine.input().is_idle());
    assert_eq!(engine.scene().serialize(), settled);
    assert_eq!(engine.history().len(), 2);
}

// =============================================================
// History
// =============================================================

#[test]
fn keyboard_undo_and_redo() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.on_key_down(&Key::new("z"), ctrl());
    assert!(engine.scene().is_empty());
    let shift_ctrl = Modifiers { ctrl: true, shift: true, ..Default::default() };
    engine.on_key_down(&Key::new("Z"), shift_ctrl);
    assert_eq!(engine.scene().len(), 1);
    engine.on_key_down(&Key::new("z"), ctrl());
    engine.on_key_down(&Key::new("y"), ctrl());
    assert_eq!(engine.scene().len(), 1);
}

#[test]
fn undo_at_boundary_reports_notice() {
    let mut engine = ready_engine();
    assert_eq!(engine.undo(), vec![Action::Ignored(Notice::HistoryBoundary)]);
    assert_eq!(engine.redo(), vec![Action::Ignored(Notice::HistoryBoundary)]);
}

#[test]
fn undo_clears_selection() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.add_shape(ShapeKind::Circle, None);
    let actions = engine.undo();
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(engine.selection(), None);
}

#[test]
fn undo_keeps_live_viewport_dimensions() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.on_resize(ContainerSize::new(500.0, 500.0));
    engine.undo();
    assert_eq!((engine.scene().width(), engine.scene().height()), (440.0, 320.0));
}

#[test]
fn bounded_history_from_config() {
    let config = EditorConfig { history_capacity: NonZeroUsize::new(2), ..Default::default() };
    let mut engine = EngineCore::new(config);
    engine.container_ready(ContainerSize::new(860.0, 780.0));
    for _ in 0..4 {
        engine.add_shape(ShapeKind::Rectangle, None);
    }
    assert_eq!(engine.history().len(), 2);
    engine.undo();
    assert_eq!(engine.undo(), vec![Action::Ignored(Notice::HistoryBoundary)]);
    assert_eq!(engine.scene().len(), 3);
}

// =============================================================
// Export and render
// =============================================================

#[test]
fn export_png_saves_and_returns_to_select() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    engine.enter_draw();
    let before = engine.scene().serialize();
    let actions = engine.export_png();
    assert!(actions.contains(&Action::ModeChanged(ToolMode::Select)));
    let artifact = actions
        .iter()
        .find_map(|a| match a {
            Action::Save(artifact) => Some(artifact),
            _ => None,
        })
        .unwrap();
    assert_eq!(artifact.filename, "certificate.png");
    assert_eq!(engine.scene().serialize(), before);
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn export_pdf_saves_document() {
    let mut engine = ready_engine();
    let actions = engine.export_pdf();
    assert!(actions.iter().any(|a| matches!(a, Action::Save(artifact) if artifact.filename == "certificate.pdf")));
}

#[test]
fn export_before_ready_is_ignored() {
    let mut engine = EngineCore::default();
    assert_eq!(engine.export_png(), vec![Action::Ignored(Notice::SurfaceNotReady)]);
}

#[test]
fn to_bitmap_uses_multiplier() {
    let engine = ready_engine();
    let bitmap = engine.to_bitmap(2.0).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (1600, 1200));
}

#[test]
fn render_paints_surface() {
    let mut engine = ready_engine();
    engine.add_shape(ShapeKind::Rectangle, None);
    assert!(engine.render().unwrap());
    let surface = engine.surface().unwrap();
    let px = surface.pixmap().pixel(100, 80).unwrap();
    assert_eq!((px.red(), px.green(), px.blue()), (0x4c, 0xaf, 0x50));
}

#[test]
fn render_without_surface_is_noop() {
    let mut engine = EngineCore::default();
    assert!(!engine.render().unwrap());
}

// =============================================================
// Tool mode
// =============================================================

#[test]
fn mode_actions_only_on_change() {
    let mut engine = ready_engine();
    assert_eq!(engine.enter_draw(), vec![Action::ModeChanged(ToolMode::Draw), Action::RenderNeeded]);
    assert!(engine.enter_draw().is_empty());
    engine.toggle_erase();
    assert_eq!(engine.mode(), ToolMode::Erase);
    engine.toggle_erase();
    assert_eq!(engine.mode(), ToolMode::Select);
}
