//! Media resolution.
//!
//! Every track names its audio loop by a bare media reference. The library
//! resolves the reference inside one media directory, preferring `.mp3` and
//! falling back to `.wav`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::error::SoundError;

/// Extensions tried in order when resolving a media reference.
pub const MEDIA_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Directory of bundled audio loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a media reference to an existing file.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if no file with a supported
    /// extension exists for the reference.
    pub fn resolve(&self, media_ref: &str) -> Result<PathBuf, SoundError> {
        if media_ref.is_empty() || media_ref.contains(['/', '\\']) || media_ref.starts_with('.') {
            return Err(SoundError::FileNotFound(format!(
                "invalid media reference '{}'",
                media_ref
            )));
        }

        for ext in MEDIA_EXTENSIONS {
            let candidate = self.root.join(format!("{}.{}", media_ref, ext));
            if candidate.is_file() {
                debug!("Resolved media '{}' to {}", media_ref, candidate.display());
                return Ok(candidate);
            }
        }

        Err(SoundError::FileNotFound(format!(
            "{} ({})",
            self.root.join(media_ref).display(),
            MEDIA_EXTENSIONS.join("|")
        )))
    }

    /// Resolves a media reference and reads the whole file.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the reference cannot be resolved
    /// or the file cannot be read.
    pub fn load(&self, media_ref: &str) -> Result<Arc<[u8]>, SoundError> {
        let path = self.resolve(media_ref)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        Ok(Arc::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, MediaLibrary) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"data").unwrap();
        }
        let library = MediaLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn test_resolve_mp3() {
        let (dir, library) = library_with(&["rain.mp3"]);
        assert_eq!(library.resolve("rain").unwrap(), dir.path().join("rain.mp3"));
    }

    #[test]
    fn test_resolve_falls_back_to_wav() {
        let (dir, library) = library_with(&["wind.wav"]);
        assert_eq!(library.resolve("wind").unwrap(), dir.path().join("wind.wav"));
    }

    #[test]
    fn test_resolve_prefers_mp3_over_wav() {
        let (dir, library) = library_with(&["city.wav", "city.mp3"]);
        assert_eq!(library.resolve("city").unwrap(), dir.path().join("city.mp3"));
    }

    #[test]
    fn test_resolve_missing() {
        let (_dir, library) = library_with(&["rain.mp3"]);
        let err = library.resolve("storm").unwrap_err();
        assert!(matches!(err, SoundError::FileNotFound(_)));
        assert!(err.to_string().contains("storm"));
    }

    #[test]
    fn test_resolve_rejects_path_traversal() {
        let (_dir, library) = library_with(&[]);
        assert!(library.resolve("../etc/passwd").is_err());
        assert!(library.resolve(".hidden").is_err());
        assert!(library.resolve("").is_err());
    }

    #[test]
    fn test_resolve_ignores_directories() {
        let (dir, library) = library_with(&[]);
        std::fs::create_dir(dir.path().join("birds.mp3")).unwrap();
        assert!(library.resolve("birds").is_err());
    }

    #[test]
    fn test_load_reads_bytes() {
        let (_dir, library) = library_with(&["boat.wav"]);
        let bytes = library.load("boat").unwrap();
        assert_eq!(&bytes[..], b"data");
        assert_eq!(library.root(), _dir.path());
    }
}
