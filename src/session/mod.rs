/*!
 * Translation session state.
 *
 * This module provides:
 * - Uploaded files and their per-language translation tasks
 * - Language selection with an explicit reset policy
 * - Progress and result tracking keyed by (file, language)
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::SessionManager;
pub use models::{
    FileId, SessionState, TaskStatus, TranslatedDownload, TranslationOutcome, TranslationTask, UploadedFile,
    DOWNLOAD_MIME_TYPE,
};
