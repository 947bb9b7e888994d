use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// Directory layout for one course. Each stage reads from one directory and
/// writes to the next; section identity is the shared base filename.
#[derive(Debug, Clone)]
pub struct CourseLayout {
    pub name: String,
    pub course_dir: PathBuf,
    pub playback_dir: PathBuf,
    pub soundtrack_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub note_dir: PathBuf,
}

impl CourseLayout {
    pub fn new(root: &Path, name: &str) -> Self {
        let course_dir = root.join(name);
        Self {
            name: name.to_string(),
            playback_dir: course_dir.join("Playback"),
            soundtrack_dir: course_dir.join("SoundTrack"),
            transcript_dir: course_dir.join("Transcript"),
            note_dir: course_dir.join("Note"),
            course_dir,
        }
    }

    /// Create all stage directories. Directories are never deleted.
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.course_dir,
            &self.playback_dir,
            &self.soundtrack_dir,
            &self.transcript_dir,
            &self.note_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

/// Stable base name (file stem) identifying a section across stages.
pub fn section_base_name(path: &Path) -> Result<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| anyhow!("Invalid section filename: {}", path.display()))?
        .to_string_lossy()
        .to_string())
}

/// List the files of a directory sorted lexicographically by file name.
/// Directory iteration order is not portable, so ordering is always made
/// explicit here.
pub async fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Like [`sorted_files`], but keeps only files with one of the given
/// extensions (case-insensitive).
pub async fn sorted_files_with_extensions(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>> {
    let files = sorted_files(dir).await?;
    Ok(files
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false)
        })
        .collect())
}

/// Write a file atomically: write to a sibling `.tmp` file, then rename.
/// Keeps the resumability invariant intact under interrupted runs, since a
/// half-written note never appears under its final name.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid output path: {}", path.display()))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name));

    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
