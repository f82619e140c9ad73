//! Writes exported artifacts into a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use canvas::export::{Artifact, ArtifactSink};
use tracing::info;

#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirSink {
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf(), written: Vec::new() }
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirSink {
    fn save(&mut self, artifact: &Artifact) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        info!(path = %path.display(), bytes = artifact.bytes.len(), mime = artifact.mime, "artifact saved");
        self.written.push(path);
        Ok(())
    }
}
