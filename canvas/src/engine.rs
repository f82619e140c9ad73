//! Editing session: input handlers, structural operations, and the action stream.
//!
//! `EngineCore` owns everything one editing session needs: the scene, its
//! history, the tool controller, the in-flight gesture and the drawing
//! surface. Every handler runs synchronously through `&mut self` and returns
//! the [`Action`]s the host should carry out. Structural operations commit
//! exactly once; a freehand stroke commits once on pointer-up.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::consts::DEFAULT_TEXT;
use crate::export::{self, Artifact, Bitmap, ExportError};
use crate::factory::{self, Geometry, ShapeKind};
use crate::history::HistoryStack;
use crate::input::{Button, InputState, Key, KeyCommand, Modifiers, key_command};
use crate::object::{Color, ImageData, ObjectId, ObjectKind, ObjectPatch, SceneObject};
use crate::render::{self, Overlay};
use crate::scene::{Scene, SceneState, SnapshotError};
use crate::surface::{Surface, SurfaceError, pixel_size};
use crate::tool::{ToolController, ToolMode};
use crate::viewport::{ContainerSize, Point, Viewport};

/// A recoverable condition: the request was ignored, nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Notice {
    #[error("drawing surface is not ready")]
    SurfaceNotReady,
    #[error("nothing further to undo or redo")]
    HistoryBoundary,
    #[error("no object is selected")]
    NoActiveObject,
    #[error("input not understood")]
    UnsupportedInput,
}

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// An object was appended and is now the active object.
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    ObjectModified(ObjectId),
    SelectionChanged(Option<ObjectId>),
    ModeChanged(ToolMode),
    HistoryChanged { cursor: Option<usize>, len: usize },
    Cleared,
    /// An exported file to hand to the host's save mechanism.
    Save(Artifact),
    Ignored(Notice),
    /// An operation failed and was abandoned without partial effect.
    Failed(String),
    RenderNeeded,
}

/// Core engine state for one editing session.
#[derive(Debug)]
pub struct EngineCore {
    config: EditorConfig,
    scene: Scene,
    history: HistoryStack,
    tool: ToolController,
    input: InputState,
    surface: Option<Surface>,
    container: Option<ContainerSize>,
    viewport: Viewport,
    generation: u64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let viewport = Viewport::new(config.max_width, config.max_height);
        let history = config.history_capacity.map_or_else(HistoryStack::new, HistoryStack::bounded);
        Self {
            scene: Scene::new(viewport.width, viewport.height, config.background),
            history,
            tool: ToolController::new(),
            input: InputState::Idle,
            surface: None,
            container: None,
            viewport,
            generation: 0,
            config,
        }
    }

    // --- Surface lifecycle ---

    /// The host's container is laid out: size the canvas and acquire the surface.
    pub fn container_ready(&mut self, container: ContainerSize) -> Vec<Action> {
        self.container = Some(container);
        self.viewport = Viewport::fit(container, self.config.max_width, self.config.max_height);
        self.reinitialize()
    }

    /// Drop the current surface and acquire a fresh one at the current
    /// viewport size. Scene content and history are kept. The first
    /// successful initialization records the initial history snapshot.
    pub fn reinitialize(&mut self) -> Vec<Action> {
        if self.container.is_none() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        self.surface = None;
        self.generation += 1;

        let (width, height) = pixel_size(self.viewport);
        match Surface::acquire(self.generation, width, height) {
            Ok(surface) => self.surface = Some(surface),
            Err(e) => {
                self.scene.set_ready(false);
                return vec![failed("surface", &e)];
            }
        }
        self.scene.resize(self.viewport.width, self.viewport.height);
        self.scene.set_ready(true);

        let mut actions = Vec::new();
        if self.history.is_empty() {
            self.commit(&mut actions);
        } else {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Release the surface. Handlers report [`Notice::SurfaceNotReady`] until
    /// the next [`EngineCore::container_ready`].
    pub fn shutdown(&mut self) {
        self.cancel_gesture();
        self.scene.set_ready(false);
        if self.surface.take().is_some() {
            info!(generation = self.generation, "engine shut down");
        }
    }

    // --- Input events ---

    /// Recompute the viewport from the container. Never commits.
    pub fn on_resize(&mut self, container: ContainerSize) -> Vec<Action> {
        self.container = Some(container);
        self.viewport = Viewport::fit(container, self.config.max_width, self.config.max_height);
        self.scene.resize(self.viewport.width, self.viewport.height);
        let Some(surface) = self.surface.as_mut() else {
            return Vec::new();
        };
        let (width, height) = pixel_size(self.viewport);
        match surface.resize(width, height) {
            Ok(()) => vec![Action::RenderNeeded],
            Err(e) => vec![failed("resize", &e)],
        }
    }

    pub fn on_pointer_down(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        if !pt.is_finite() {
            return vec![ignored(Notice::UnsupportedInput)];
        }
        self.cancel_gesture();

        if self.tool.mode().is_freehand() {
            let brush = self.tool.brush(self.scene.background());
            self.input = InputState::Stroking { points: vec![pt], brush };
            return vec![Action::RenderNeeded];
        }

        let mut actions = Vec::new();
        let hit = self.scene.object_at(pt);
        self.select(hit, &mut actions);
        if let Some(id) = hit {
            self.input = InputState::DraggingObject { id, origin: pt, last: pt };
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if !pt.is_finite() {
            return Vec::new();
        }
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Stroking { points, .. } => {
                points.push(pt);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingObject { id, last, .. } => {
                self.scene.translate(id, pt.x - last.x, pt.y - last.y);
                *last = pt;
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::Stroking { mut points, brush } => {
                if pt.is_finite() && points.last() != Some(&pt) {
                    points.push(pt);
                }
                if let Some(stroke) = factory::stroke(points, brush) {
                    self.insert(stroke, &mut actions);
                }
            }
            InputState::DraggingObject { id, origin, last } => {
                let end = if pt.is_finite() { pt } else { last };
                let exists = self.scene.translate(&id, end.x - last.x, end.y - last.y);
                if exists && end != origin {
                    debug!(%id, dx = end.x - origin.x, dy = end.y - origin.y, "object moved");
                    actions.push(Action::ObjectModified(id));
                    self.commit(&mut actions);
                }
            }
        }
        actions
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        match key_command(key, modifiers) {
            Some(KeyCommand::DeleteActive) => self.delete_active(),
            Some(KeyCommand::Undo) => self.undo(),
            Some(KeyCommand::Redo) => self.redo(),
            None => Vec::new(),
        }
    }

    /// The user picked a file: decode it and insert it as an image.
    pub fn on_file_selected(&mut self, bytes: &[u8]) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        match ImageData::decode(bytes) {
            Ok(image) => self.add_image(image),
            Err(e) => {
                debug!(error = %e, bytes = bytes.len(), "file is not a usable image");
                vec![ignored(Notice::UnsupportedInput)]
            }
        }
    }

    // --- Structural operations ---

    /// Insert a shape at `geometry`, or at its default placement.
    pub fn add_shape(&mut self, kind: ShapeKind, geometry: Option<Geometry>) -> Vec<Action> {
        self.add_with(|_| factory::shape(kind, geometry))
    }

    /// Insert text centered on the canvas; empty content uses the default.
    pub fn add_text(&mut self, content: &str) -> Vec<Action> {
        let content = if content.is_empty() { DEFAULT_TEXT } else { content };
        self.add_with(|viewport| factory::text(content, viewport))
    }

    /// Insert a decoded image, fitted and centered on the canvas.
    pub fn add_image(&mut self, image: ImageData) -> Vec<Action> {
        self.add_with(|viewport| factory::image(image, viewport))
    }

    fn add_with(&mut self, build: impl FnOnce(Viewport) -> SceneObject) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        let mut actions = Vec::new();
        self.exit_to_select(&mut actions);
        let obj = build(Viewport::new(self.scene.width(), self.scene.height()));
        self.insert(obj, &mut actions);
        actions
    }

    /// Remove the active object.
    pub fn delete_active(&mut self) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        let Some(id) = self.scene.active() else {
            return vec![ignored(Notice::NoActiveObject)];
        };
        let mut actions = Vec::new();
        self.exit_to_select(&mut actions);
        if self.scene.remove(&id).is_some() {
            actions.push(Action::ObjectRemoved(id));
            actions.push(Action::SelectionChanged(None));
            self.commit(&mut actions);
        }
        actions
    }

    /// Apply a sparse update to an object.
    pub fn modify(&mut self, id: &ObjectId, patch: &ObjectPatch) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        if patch.is_empty() || !self.scene.modify(id, patch) {
            return vec![ignored(Notice::UnsupportedInput)];
        }
        let mut actions = vec![Action::ObjectModified(*id)];
        self.commit(&mut actions);
        actions
    }

    /// Replace a text object's content, refitting its box to the new text.
    pub fn set_text(&mut self, id: &ObjectId, content: &str) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        let Some(ObjectKind::Text { font_size, .. }) = self.scene.get(id).map(|obj| &obj.kind) else {
            return vec![ignored(Notice::UnsupportedInput)];
        };
        let (width, height) = factory::text_bounds(content, *font_size);
        let patch = ObjectPatch { width: Some(width), height: Some(height), text: Some(content.to_string()), ..Default::default() };
        self.modify(id, &patch)
    }

    /// Remove every object and reset the background. The tool mode is kept.
    pub fn clear(&mut self) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        self.scene.clear(self.config.background);
        let mut actions = vec![Action::Cleared, Action::SelectionChanged(None)];
        self.commit(&mut actions);
        actions
    }

    pub fn set_background(&mut self, background: Color) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        if self.scene.background() == background {
            return Vec::new();
        }
        self.cancel_gesture();
        self.scene.set_background(background);
        let mut actions = Vec::new();
        self.commit(&mut actions);
        actions
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        self.step_history(HistoryStack::undo)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.step_history(HistoryStack::redo)
    }

    fn step_history(
        &mut self,
        step: fn(&mut HistoryStack, &mut Scene) -> Result<bool, SnapshotError>,
    ) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        match step(&mut self.history, &mut self.scene) {
            Ok(true) => {
                // Snapshots carry the dimensions they were taken at; the live
                // viewport wins.
                self.scene.resize(self.viewport.width, self.viewport.height);
                vec![
                    Action::SelectionChanged(None),
                    self.history_changed(),
                    Action::RenderNeeded,
                ]
            }
            Ok(false) => vec![ignored(Notice::HistoryBoundary)],
            Err(e) => vec![failed("history", &e)],
        }
    }

    // --- Tool mode ---

    pub fn enter_draw(&mut self) -> Vec<Action> {
        self.change_mode(ToolController::enter_draw)
    }

    pub fn enter_erase(&mut self) -> Vec<Action> {
        self.change_mode(ToolController::enter_erase)
    }

    pub fn enter_select(&mut self) -> Vec<Action> {
        self.change_mode(ToolController::enter_select)
    }

    pub fn toggle_draw(&mut self) -> Vec<Action> {
        self.change_mode(ToolController::toggle_draw)
    }

    pub fn toggle_erase(&mut self) -> Vec<Action> {
        self.change_mode(ToolController::toggle_erase)
    }

    fn change_mode(&mut self, transition: fn(&mut ToolController) -> bool) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        if !transition(&mut self.tool) {
            return Vec::new();
        }
        self.cancel_gesture();
        vec![Action::ModeChanged(self.tool.mode()), Action::RenderNeeded]
    }

    /// Brush settings are preferences and apply before the surface exists.
    pub fn set_brush_color(&mut self, color: Color) {
        self.tool.set_brush_color(color);
    }

    pub fn set_brush_width(&mut self, width: f64) {
        self.tool.set_brush_width(width);
    }

    // --- Export ---

    /// Export the scene as `certificate.png`.
    pub fn export_png(&mut self) -> Vec<Action> {
        self.export_with(export::export_raster)
    }

    /// Export the scene as `certificate.pdf`.
    pub fn export_pdf(&mut self) -> Vec<Action> {
        self.export_with(export::export_document)
    }

    fn export_with(
        &mut self,
        export: fn(&SceneState, f64) -> Result<Artifact, ExportError>,
    ) -> Vec<Action> {
        if !self.scene.is_ready() {
            return vec![ignored(Notice::SurfaceNotReady)];
        }
        self.cancel_gesture();
        let mut actions = Vec::new();
        self.exit_to_select(&mut actions);
        match export(self.scene.state(), self.config.export_multiplier) {
            Ok(artifact) => actions.push(Action::Save(artifact)),
            Err(e) => actions.push(failed("export", &e)),
        }
        actions
    }

    /// Rasterize the scene at `multiplier` without saving anything.
    ///
    /// # Errors
    ///
    /// Propagates [`ExportError`] from the export pipeline.
    pub fn to_bitmap(&self, multiplier: f64) -> Result<Bitmap, ExportError> {
        export::to_bitmap(self.scene.state(), multiplier)
    }

    // --- Render ---

    /// Repaint the live surface, including the in-progress stroke and the
    /// selection outline. Returns false when there is no surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the object layer cannot be allocated.
    pub fn render(&mut self) -> Result<bool, SurfaceError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(false);
        };
        let stroke = match &self.input {
            InputState::Stroking { points, brush } => Some((points.as_slice(), *brush)),
            InputState::Idle | InputState::DraggingObject { .. } => None,
        };
        let overlay = Overlay { selected: self.scene.active_object(), stroke };
        render::draw_scene(surface.pixmap_mut(), self.scene.state(), 1.0, &overlay)?;
        Ok(true)
    }

    // --- Queries ---

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    #[must_use]
    pub fn tool(&self) -> &ToolController {
        &self.tool
    }

    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.tool.mode()
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.scene.active()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scene.is_ready()
    }

    // --- Internals ---

    fn insert(&mut self, obj: SceneObject, actions: &mut Vec<Action>) {
        let id = obj.id;
        self.scene.add(obj);
        actions.push(Action::ObjectAdded(id));
        self.commit(actions);
    }

    fn commit(&mut self, actions: &mut Vec<Action>) {
        self.history.commit(&self.scene);
        actions.push(self.history_changed());
        actions.push(Action::RenderNeeded);
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { cursor: self.history.cursor(), len: self.history.len() }
    }

    fn select(&mut self, id: Option<ObjectId>, actions: &mut Vec<Action>) {
        if self.scene.active() != id {
            self.scene.set_active(id);
            actions.push(Action::SelectionChanged(id));
        }
    }

    fn exit_to_select(&mut self, actions: &mut Vec<Action>) {
        if self.tool.enter_select() {
            self.cancel_gesture();
            actions.push(Action::ModeChanged(ToolMode::Select));
        }
    }

    /// Abandon the gesture in progress. A drag is rolled back so the scene
    /// matches the last commit.
    fn cancel_gesture(&mut self) {
        if let InputState::DraggingObject { id, origin, last } = std::mem::take(&mut self.input) {
            self.scene.translate(&id, origin.x - last.x, origin.y - last.y);
        }
    }
}

fn ignored(notice: Notice) -> Action {
    debug!(%notice, "request ignored");
    Action::Ignored(notice)
}

fn failed(operation: &str, error: &dyn std::error::Error) -> Action {
    warn!(operation, error = %error, "operation failed");
    Action::Failed(format!("{operation}: {error}"))
}
