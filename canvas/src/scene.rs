//! Scene graph: the ordered object store, active selection, and snapshots.
//!
//! `Scene` owns every object on the canvas. Sequence order is paint order:
//! index 0 is painted first. The active object is held by id, so it can never
//! dangle; removing the object clears it.
//!
//! `Snapshot` is an immutable capture of the full [`SceneState`]. Restoring is
//! all-or-nothing: the captured state is validated before anything in the
//! live scene changes.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hit;
use crate::object::{Color, ObjectId, ObjectPatch, SceneObject};
use crate::viewport::Point;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("snapshot has unusable dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("snapshot object {0} has malformed geometry")]
    MalformedObject(ObjectId),
    #[error("snapshot contains object {0} more than once")]
    DuplicateId(ObjectId),
}

/// Everything needed to reproduce a scene exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub background: Color,
    pub width: f64,
    pub height: f64,
    pub objects: Vec<SceneObject>,
}

impl SceneState {
    /// Check the invariants a live scene relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let dims_ok = self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0;
        if !dims_ok {
            return Err(SnapshotError::InvalidDimensions { width: self.width, height: self.height });
        }
        let mut seen = HashSet::with_capacity(self.objects.len());
        for obj in &self.objects {
            if !obj.is_well_formed() {
                return Err(SnapshotError::MalformedObject(obj.id));
            }
            if !seen.insert(obj.id) {
                return Err(SnapshotError::DuplicateId(obj.id));
            }
        }
        Ok(())
    }
}

/// Immutable capture of a [`SceneState`]. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Arc<SceneState>);

impl Snapshot {
    fn capture(state: &SceneState) -> Self {
        Self(Arc::new(state.clone()))
    }

    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.0
    }

    /// Encode as JSON, e.g. to keep a session on disk.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self.state()).map_err(SnapshotError::Encode)
    }

    /// Decode and validate a snapshot produced by [`Snapshot::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Decode`] for malformed JSON and a validation
    /// error for states that could not be restored.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let state: SceneState = serde_json::from_str(json).map_err(SnapshotError::Decode)?;
        state.validate()?;
        Ok(Self(Arc::new(state)))
    }
}

/// The live scene for one editing session.
#[derive(Debug)]
pub struct Scene {
    state: SceneState,
    active: Option<ObjectId>,
    ready: bool,
}

impl Scene {
    /// Create an empty scene. It rejects additions until [`Scene::set_ready`].
    #[must_use]
    pub fn new(width: f64, height: f64, background: Color) -> Self {
        Self {
            state: SceneState { background, width, height, objects: Vec::new() },
            active: None,
            ready: false,
        }
    }

    /// Whether a drawing surface backs this scene.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    // --- Mutation ---

    /// Append `obj` on top of the paint order and make it active.
    /// Ignored until the scene is ready.
    pub fn add(&mut self, obj: SceneObject) {
        if !self.ready {
            debug!(kind = obj.kind.name(), "scene not ready; add ignored");
            return;
        }
        debug!(id = %obj.id, kind = obj.kind.name(), "object added");
        self.active = Some(obj.id);
        self.state.objects.push(obj);
    }

    /// Remove an object by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        debug!(%id, "object removed");
        Some(self.state.objects.remove(index))
    }

    /// Apply a sparse update. Returns false if the object doesn't exist or
    /// the patch was rejected.
    pub fn modify(&mut self, id: &ObjectId, patch: &ObjectPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        patch.apply(&mut self.state.objects[index])
    }

    /// Move an object by a delta. Returns false if it doesn't exist.
    pub fn translate(&mut self, id: &ObjectId, dx: f64, dy: f64) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.state.objects[index].translate(dx, dy);
        true
    }

    /// Remove every object and reset the background.
    pub fn clear(&mut self, background: Color) {
        self.state.objects.clear();
        self.state.background = background;
        self.active = None;
    }

    pub fn set_background(&mut self, background: Color) {
        self.state.background = background;
    }

    /// Update canvas dimensions. Object content is untouched.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.state.width = width;
        self.state.height = height;
    }

    // --- Selection ---

    /// Set the active object. An id not in the scene is ignored.
    pub fn set_active(&mut self, id: Option<ObjectId>) {
        match id {
            Some(id) if self.index_of(&id).is_none() => {
                debug!(%id, "set_active for unknown object ignored");
            }
            other => self.active = other,
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    #[must_use]
    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    // --- Snapshots ---

    /// Capture the full state.
    #[must_use]
    pub fn serialize(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Replace the full state with `snapshot` and clear the selection.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the captured state is invalid; the scene
    /// is left exactly as it was.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        snapshot.state().validate()?;
        self.state = snapshot.state().clone();
        self.active = None;
        Ok(())
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.state.objects
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.state.objects.iter().find(|o| &o.id == id)
    }

    /// Topmost selectable object under `pt`.
    #[must_use]
    pub fn object_at(&self, pt: Point) -> Option<ObjectId> {
        hit::hit_test(pt, &self.state.objects)
    }

    #[must_use]
    pub fn background(&self) -> Color {
        self.state.background
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.state.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.state.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.objects.is_empty()
    }

    fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.state.objects.iter().position(|o| &o.id == id)
    }
}
