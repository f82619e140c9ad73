//! JSON editing scripts replayed through the engine's input handlers.
//!
//! A script is an array of steps tagged by `op`, e.g.
//! `[{"op": "ready", "width": 860, "window_height": 780}, {"op": "add_shape", "shape": "circle"}]`.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use std::path::{Path, PathBuf};

use canvas::engine::{Action, EngineCore, Notice};
use canvas::export::ArtifactSink;
use canvas::factory::{Geometry, ShapeKind};
use canvas::input::{Button, Key, Modifiers};
use canvas::object::Color;
use canvas::viewport::{ContainerSize, Point};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {step} ({op}) failed: {message}")]
    Failed { step: usize, op: &'static str, message: String },
    #[error("saving {filename} failed: {source}")]
    Save { filename: String, source: std::io::Error },
}

/// One scripted editing step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// The container is laid out; acquires the surface.
    Ready { width: f64, window_height: f64 },
    Resize { width: f64, window_height: f64 },
    AddShape {
        shape: ShapeKind,
        #[serde(default)]
        geometry: Option<Geometry>,
    },
    AddText {
        #[serde(default)]
        content: String,
    },
    /// Image file, relative to the script's directory.
    AddImage { path: PathBuf },
    Draw,
    Erase,
    Select,
    BrushColor { color: Color },
    BrushWidth { width: f64 },
    Background { color: Color },
    /// Pointer-down on the first point, moves through the rest, pointer-up on the last.
    Stroke { points: Vec<Point> },
    Click { x: f64, y: f64 },
    Drag { from: Point, to: Point },
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        meta: bool,
    },
    /// Replace the content of the selected text object.
    SetText { content: String },
    Undo,
    Redo,
    Clear,
    ExportPng,
    ExportPdf,
}

impl Step {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Resize { .. } => "resize",
            Self::AddShape { .. } => "add_shape",
            Self::AddText { .. } => "add_text",
            Self::AddImage { .. } => "add_image",
            Self::Draw => "draw",
            Self::Erase => "erase",
            Self::Select => "select",
            Self::BrushColor { .. } => "brush_color",
            Self::BrushWidth { .. } => "brush_width",
            Self::Background { .. } => "background",
            Self::Stroke { .. } => "stroke",
            Self::Click { .. } => "click",
            Self::Drag { .. } => "drag",
            Self::Key { .. } => "key",
            Self::SetText { .. } => "set_text",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Clear => "clear",
            Self::ExportPng => "export_png",
            Self::ExportPdf => "export_pdf",
        }
    }
}

/// Parse a script from JSON text.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] for malformed JSON or unknown steps.
pub fn parse(json: &str) -> Result<Vec<Step>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

/// Counters reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub steps: usize,
    pub notices: usize,
    pub saved: usize,
}

/// Drives an engine through scripted steps, saving artifacts to a sink.
pub struct Replay<'a, S: ArtifactSink> {
    engine: &'a mut EngineCore,
    sink: &'a mut S,
    base_dir: PathBuf,
    summary: Summary,
}

impl<'a, S: ArtifactSink> Replay<'a, S> {
    pub fn new(engine: &'a mut EngineCore, sink: &'a mut S, base_dir: &Path) -> Self {
        Self { engine, sink, base_dir: base_dir.to_path_buf(), summary: Summary::default() }
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first step failure or artifact save error.
    pub fn run(mut self, steps: &[Step]) -> Result<Summary, ScriptError> {
        for (index, step) in steps.iter().enumerate() {
            let step_no = index + 1;
            debug!(step = step_no, op = step.name(), "replaying step");
            let actions = self.apply(step)?;
            self.handle(step_no, step.name(), actions)?;
            self.summary.steps += 1;
        }
        Ok(self.summary)
    }

    /// Export the final scene outside the script.
    ///
    /// # Errors
    ///
    /// Returns a failure or save error from the export.
    pub fn finish(mut self, png: bool, pdf: bool) -> Result<Summary, ScriptError> {
        if png {
            let actions = self.engine.export_png();
            self.handle(0, "export_png", actions)?;
        }
        if pdf {
            let actions = self.engine.export_pdf();
            self.handle(0, "export_pdf", actions)?;
        }
        Ok(self.summary)
    }

    fn apply(&mut self, step: &Step) -> Result<Vec<Action>, ScriptError> {
        let engine = &mut *self.engine;
        let mods = Modifiers::default();
        let actions = match step {
            Step::Ready { width, window_height } => engine.container_ready(ContainerSize::new(*width, *window_height)),
            Step::Resize { width, window_height } => engine.on_resize(ContainerSize::new(*width, *window_height)),
            Step::AddShape { shape, geometry } => engine.add_shape(*shape, *geometry),
            Step::AddText { content } => engine.add_text(content),
            Step::AddImage { path } => {
                let path = self.base_dir.join(path);
                let bytes = std::fs::read(&path).map_err(|source| ScriptError::Read { path, source })?;
                engine.on_file_selected(&bytes)
            }
            Step::Draw => engine.enter_draw(),
            Step::Erase => engine.enter_erase(),
            Step::Select => engine.enter_select(),
            Step::BrushColor { color } => {
                engine.set_brush_color(*color);
                Vec::new()
            }
            Step::BrushWidth { width } => {
                engine.set_brush_width(*width);
                Vec::new()
            }
            Step::Background { color } => engine.set_background(*color),
            Step::Stroke { points } => match points.as_slice() {
                [] => Vec::new(),
                [first, rest @ ..] => {
                    let mut actions = engine.on_pointer_down(*first, Button::Primary, mods);
                    for p in rest {
                        actions.extend(engine.on_pointer_move(*p, mods));
                    }
                    let last = rest.last().unwrap_or(first);
                    actions.extend(engine.on_pointer_up(*last, Button::Primary, mods));
                    actions
                }
            },
            Step::Click { x, y } => {
                let p = Point::new(*x, *y);
                let mut actions = engine.on_pointer_down(p, Button::Primary, mods);
                actions.extend(engine.on_pointer_up(p, Button::Primary, mods));
                actions
            }
            Step::Drag { from, to } => {
                let mut actions = engine.on_pointer_down(*from, Button::Primary, mods);
                actions.extend(engine.on_pointer_move(*to, mods));
                actions.extend(engine.on_pointer_up(*to, Button::Primary, mods));
                actions
            }
            Step::Key { key, ctrl, shift, meta } => {
                let mods = Modifiers { shift: *shift, ctrl: *ctrl, alt: false, meta: *meta };
                engine.on_key_down(&Key::new(key.as_str()), mods)
            }
            Step::SetText { content } => match engine.selection() {
                Some(id) => engine.set_text(&id, content),
                None => vec![Action::Ignored(Notice::NoActiveObject)],
            },
            Step::Undo => engine.undo(),
            Step::Redo => engine.redo(),
            Step::Clear => engine.clear(),
            Step::ExportPng => engine.export_png(),
            Step::ExportPdf => engine.export_pdf(),
        };
        Ok(actions)
    }

    fn handle(&mut self, step: usize, op: &'static str, actions: Vec<Action>) -> Result<(), ScriptError> {
        for action in actions {
            match action {
                Action::Save(artifact) => {
                    self.sink
                        .save(&artifact)
                        .map_err(|source| ScriptError::Save { filename: artifact.filename.clone(), source })?;
                    self.summary.saved += 1;
                }
                Action::Ignored(notice) => {
                    warn!(step, op, %notice, "step had no effect");
                    self.summary.notices += 1;
                }
                Action::Failed(message) => return Err(ScriptError::Failed { step, op, message }),
                Action::HistoryChanged { cursor, len } => debug!(step, ?cursor, len, "history"),
                _ => {}
            }
        }
        Ok(())
    }
}

/// A sample certificate exercising shapes, text, strokes and erasing.
#[must_use]
pub fn demo() -> Vec<Step> {
    let pts = |coords: &[(f64, f64)]| -> Vec<Point> { coords.iter().map(|&(x, y)| Point::new(x, y)).collect() };
    let steps = vec![
        Step::Ready { width: 1260.0, window_height: 980.0 },
        Step::Background { color: Color::rgb(0xff, 0xfb, 0xf0) },
        Step::AddShape { shape: ShapeKind::Rectangle, geometry: Some(Geometry::new(20.0, 20.0, 1160.0, 24.0)) },
        Step::AddShape { shape: ShapeKind::Rectangle, geometry: Some(Geometry::new(20.0, 756.0, 1160.0, 24.0)) },
        Step::AddShape { shape: ShapeKind::Circle, geometry: Some(Geometry::new(540.0, 520.0, 120.0, 120.0)) },
        Step::AddShape { shape: ShapeKind::Triangle, geometry: Some(Geometry::new(570.0, 545.0, 60.0, 60.0)) },
        Step::AddText { content: "Certificate of Completion".into() },
        Step::Drag { from: Point::new(600.0, 400.0), to: Point::new(600.0, 200.0) },
        Step::AddText { content: String::new() },
        Step::SetText { content: "Awarded to Jordan Example".into() },
        Step::Draw,
        Step::BrushColor { color: Color::rgb(0x1a, 0x23, 0x7e) },
        Step::BrushWidth { width: 3.0 },
        Step::Stroke { points: pts(&[(820.0, 680.0), (850.0, 660.0), (880.0, 690.0), (910.0, 665.0), (950.0, 685.0)]) },
        Step::Erase,
        Step::BrushWidth { width: 12.0 },
        Step::Stroke { points: pts(&[(600.0, 760.0), (600.0, 776.0)]) },
        Step::Select,
    ];
    info!(steps = steps.len(), "demo script built");
    steps
}
