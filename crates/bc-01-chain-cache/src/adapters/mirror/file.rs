use super::{decode, encode};
use crate::domain::errors::MirrorError;
use crate::ports::outbound::MirrorStore;
use shared_types::ChainSnapshot;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// JSON mirror file on local disk.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the
/// mirror, so a crash leaves either the old or the new content.
#[derive(Debug, Clone)]
pub struct JsonFileMirror {
    path: PathBuf,
}

impl JsonFileMirror {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: &std::io::Error) -> MirrorError {
        MirrorError::Io {
            location: self.location(),
            message: e.to_string(),
        }
    }
}

impl MirrorStore for JsonFileMirror {
    fn load(&self) -> Result<Option<ChainSnapshot>, MirrorError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&e)),
        };
        decode(&text, &self.location()).map(Some)
    }

    fn store(&mut self, snapshot: &ChainSnapshot) -> Result<(), MirrorError> {
        let text = encode(snapshot)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(&e))?;
        }

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(|e| self.io_error(&e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| self.io_error(&e))?;
        file.sync_all().map_err(|e| self.io_error(&e))?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&e))
    }

    fn remove(&mut self) -> Result<bool, MirrorError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(&e)),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
