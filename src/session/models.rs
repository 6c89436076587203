/*!
 * Session state models.
 *
 * Every value here is immutable from the observer's point of view: the
 * manager clones the state, mutates the clone and publishes it as a new
 * snapshot.
 */

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::TranslationError;
use crate::subtitle_processor::SubtitleFormat;

/// MIME type of every translated download
pub const DOWNLOAD_MIME_TYPE: &str = "text/plain;charset=utf-8";

/// Stable identity of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Coarse task state for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
}

/// Per-(file, language) translation record
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationTask {
    /// Target language
    pub language: String,
    /// Percentage of cues done, 0 to 100
    pub progress: u8,
    /// True while a run is in flight
    pub loading: bool,
    /// Serialized translation, set once a run succeeds
    pub translated_content: Option<Arc<str>>,
    /// Run currently allowed to write into this task
    pub(crate) run_id: Option<Uuid>,
}

impl TranslationTask {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            progress: 0,
            loading: false,
            translated_content: None,
            run_id: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        if self.loading {
            TaskStatus::Running
        } else if self.translated_content.is_some() {
            TaskStatus::Completed
        } else {
            TaskStatus::Idle
        }
    }
}

/// A subtitle file owned by the session
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub id: FileId,
    pub file_name: String,
    pub format: SubtitleFormat,
    /// Raw file text
    pub content: Arc<str>,
    /// Selected languages, in selection order
    pub languages: Vec<String>,
    /// One task per selected language
    pub tasks: BTreeMap<String, TranslationTask>,
}

impl UploadedFile {
    pub fn task(&self, language: &str) -> Option<&TranslationTask> {
        self.tasks.get(language)
    }

    pub(crate) fn task_mut(&mut self, language: &str) -> Option<&mut TranslationTask> {
        self.tasks.get_mut(language)
    }

    /// Tasks in selection order
    pub fn ordered_tasks(&self) -> impl Iterator<Item = &TranslationTask> {
        self.languages.iter().filter_map(|language| self.tasks.get(language))
    }

    /// Name of the translated file, `translated_<language>_<original>`
    pub fn output_file_name(&self, language: &str) -> String {
        format!("translated_{}_{}", language, self.file_name)
    }
}

/// Snapshot of every file in the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    files: Vec<UploadedFile>,
}

impl SessionState {
    /// Files in upload order
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn task(&self, id: FileId, language: &str) -> Option<&TranslationTask> {
        self.file(id).and_then(|file| file.task(language))
    }

    /// Number of runs in flight across all files
    pub fn running_count(&self) -> usize {
        self.files
            .iter()
            .flat_map(|file| file.tasks.values())
            .filter(|task| task.loading)
            .count()
    }

    pub(crate) fn file_mut(&mut self, id: FileId) -> Option<&mut UploadedFile> {
        self.files.iter_mut().find(|file| file.id == id)
    }

    pub(crate) fn task_mut(&mut self, id: FileId, language: &str) -> Option<&mut TranslationTask> {
        self.file_mut(id).and_then(|file| file.task_mut(language))
    }

    pub(crate) fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub(crate) fn remove_file(&mut self, id: FileId) -> bool {
        let before = self.files.len();
        self.files.retain(|file| file.id != id);
        self.files.len() != before
    }
}

/// Finished translation ready to be handed to a download sink
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDownload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}

/// Result of asking the session to translate one (file, language) pair
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// File missing, language not selected, or a run already in flight
    Skipped,
    /// Translation stored in the task
    Completed,
    /// Run failed; the task was reset
    Failed(TranslationError),
    /// Run finished but its task was removed or re-armed meanwhile
    Discarded,
}
