use crate::core::command::store::{sanitize_command_name, CaptureContent, CaptureStore, Destination};
use crate::domain::error::{SerialShError, SerialShResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores captures as files under `<root>/<command>/<timestamp>/`.
#[derive(Debug, Clone)]
pub struct FsCaptureStore {
    root: PathBuf,
}

impl FsCaptureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CaptureStore for FsCaptureStore {
    /// Claims `<root>/<command>/<timestamp>`, falling back to
    /// `<timestamp>_1`, `<timestamp>_2`, ... while the name is taken.
    fn destination_for(&self, command: &str) -> Destination {
        let parent = self.root.join(sanitize_command_name(command));
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut folder = parent.join(&timestamp);

        if let Err(e) = fs::create_dir_all(&parent) {
            // save() reports the failure against the same path
            debug!("Cannot create {}: {}", parent.display(), e);
            return Destination::new(folder.to_string_lossy());
        }

        for n in 1u32.. {
            match fs::create_dir(&folder) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    folder = parent.join(format!("{}_{}", timestamp, n));
                }
                Err(e) => {
                    debug!("Cannot claim {}: {}", folder.display(), e);
                    break;
                }
            }
        }

        Destination::new(folder.to_string_lossy())
    }

    fn save(
        &self,
        destination: &Destination,
        name: &str,
        content: &CaptureContent,
    ) -> SerialShResult<PathBuf> {
        let folder = PathBuf::from(destination.as_str());
        fs::create_dir_all(&folder).map_err(|e| SerialShError::persistence(&folder, e))?;

        let path = folder.join(name);
        fs::write(&path, content.render()).map_err(|e| SerialShError::persistence(&path, e))?;

        debug!("Persisted {} ({} bytes)", path.display(), content.render().len());
        Ok(path)
    }
}
