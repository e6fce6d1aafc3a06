//! Uploaded-media storage
//!
//! Files live under `<root>/media/` and are addressed by paths relative to
//! that folder, which is also what the `/media` static route serves. Each
//! upload slot has one canonical location, so re-uploading replaces the
//! previous file.

use std::path::{Path, PathBuf};

/// Media kinds with their canonical file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Thumbnail,
    LectureVideo,
    LectureNotes,
    Recording,
    LiveNotes,
    ProfilePhoto,
}

impl MediaKind {
    fn folder(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnails",
            MediaKind::LectureVideo | MediaKind::LectureNotes => "lectures",
            MediaKind::Recording | MediaKind::LiveNotes => "live",
            MediaKind::ProfilePhoto => "profiles",
        }
    }

    fn base_name(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::LectureVideo => "video",
            MediaKind::LectureNotes => "notes",
            MediaKind::Recording => "recording",
            MediaKind::LiveNotes => "notes",
            MediaKind::ProfilePhoto => "photo",
        }
    }
}

/// Storage for uploaded files under the media folder
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Store a file, returning its media-relative path.
    ///
    /// `owner` scopes the slot (lecture guid, meeting id, user guid). The
    /// extension is taken from the uploaded filename, sanitized. Overwrites
    /// any file already in the slot with the same extension; callers remove
    /// the previously recorded path first so a changed extension cannot
    /// leave an orphan behind.
    pub fn save(
        &self,
        kind: MediaKind,
        owner: &str,
        uploaded_name: &str,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        let ext = sanitize_extension(uploaded_name);
        let rel = format!("{}/{}/{}.{}", kind.folder(), owner, kind.base_name(), ext);
        let abs = self.root.join(&rel);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&abs, bytes)?;
        Ok(rel)
    }

    /// Remove a previously stored file; missing files are not an error.
    pub fn remove(&self, rel: &str) -> std::io::Result<()> {
        let abs = self.root.join(rel);
        match std::fs::remove_file(&abs) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Absolute path of a stored file
    pub fn absolute(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

/// Keep only a safe alphanumeric extension; unknown or missing becomes `bin`
fn sanitize_extension(uploaded_name: &str) -> String {
    Path::new(uploaded_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}
