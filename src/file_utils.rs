use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::session::TranslatedDownload;
use crate::subtitle_processor::SubtitleFormat;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @checks: Extension is .srt or .vtt
    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_name()
            .map(|name| SubtitleFormat::from_file_name(&name.to_string_lossy()).is_ok())
            .unwrap_or(false)
    }

    /// Expand the given paths into subtitle files; directories are walked recursively
    pub fn collect_subtitle_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                    let entry = entry.context("Failed to read directory entry")?;
                    if entry.path().is_file() && Self::is_subtitle_file(entry.path()) {
                        result.push(entry.path().to_path_buf());
                    }
                }
            } else if Self::file_exists(path) {
                result.push(path.to_path_buf());
            } else {
                return Err(anyhow::anyhow!("Input path does not exist: {}", path.display()));
            }
        }

        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Save a translated download into `output_dir` under its own file name
    pub fn write_download<P: AsRef<Path>>(download: &TranslatedDownload, output_dir: P) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        Self::ensure_dir(output_dir)?;

        let output_path = output_dir.join(&download.file_name);
        fs::write(&output_path, &download.bytes)
            .with_context(|| format!("Failed to write file: {}", output_path.display()))?;
        Ok(output_path)
    }
}
