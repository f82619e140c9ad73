//! Scene-state engine for the certificate layout editor.
//!
//! This crate owns everything between raw input and exported pixels: the
//! ordered scene of drawable objects, the snapshot history behind undo/redo,
//! the exclusive tool-mode state machine, and the export pipeline that turns
//! scene state into PNG and PDF artifacts. The host layer is responsible only
//! for capturing events, forwarding them to [`engine::EngineCore`], and
//! carrying out the [`engine::Action`]s it returns (repaint, save a file,
//! show a notice).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editing session: input handlers and the [`engine::Action`] stream |
//! | [`object`] | Scene object types, colors, styles and sparse patches |
//! | [`scene`] | Ordered object store, active selection, snapshots |
//! | [`history`] | Snapshot stack driving undo/redo |
//! | [`tool`] | Select / Draw / Erase mode machine and brush state |
//! | [`factory`] | Canonical object builders and image fitting |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against scene objects |
//! | [`surface`] | Owned drawing-surface resource |
//! | [`render`] | Rasterization with `tiny-skia` |
//! | [`glyph`] | Text shaping and glyph outlines with `rustybuzz` |
//! | [`export`] | Bitmap, PNG and PDF export |
//! | [`viewport`] | Points and viewport sizing |
//! | [`config`] | Editor configuration from the environment |
//! | [`consts`] | Shared numeric constants and defaults |

pub mod config;
pub mod consts;
pub mod engine;
pub mod export;
pub mod factory;
pub mod glyph;
pub mod hit;
pub mod history;
pub mod input;
pub mod object;
pub mod render;
pub mod scene;
pub mod surface;
pub mod tool;
pub mod viewport;
