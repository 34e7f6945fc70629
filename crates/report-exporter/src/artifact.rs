//! Generated files and where they are delivered

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::constants;
use crate::error::{ExportError, Result};

/// Turn user-supplied text (an invoice number, a stem) into one file name
/// component. Separators and characters Windows reserves become `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// True when `name` joins onto a directory as exactly one plain entry
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// A finished export, held in memory until a sink delivers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Destination for finished artifacts (the "download")
pub trait ArtifactSink {
    /// Deliver the artifact and return where it ended up
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Writes artifacts into a directory.
///
/// Bytes go to `<name>.part` first and are renamed into place, so a failed
/// write never leaves a partial file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf> {
        if !is_single_component(&artifact.file_name) {
            return Err(ExportError::InvalidFileName(artifact.file_name.clone()));
        }
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(&artifact.file_name);
        let partial = self
            .dir
            .join(format!("{}{}", artifact.file_name, constants::PARTIAL_FILE_SUFFIX));

        let written = fs::write(&partial, &artifact.bytes).and_then(|()| fs::rename(&partial, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = artifact.bytes.len(), "Delivered artifact");
        Ok(path)
    }
}
