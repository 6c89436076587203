/*!
 * Session manager for uploaded files and their translation tasks.
 *
 * This module handles:
 * - Adding and removing files
 * - Selecting target languages per file
 * - Running translations and recording progress and results
 * - Serving finished translations for download
 *
 * State is published copy-on-write: each mutation clones the current
 * snapshot, edits the clone and swaps it in, so readers holding a snapshot
 * never observe a half-applied change.
 */

use bytes::Bytes;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::{Config, LanguageChangePolicy};
use crate::errors::SessionError;
use crate::language_utils;
use crate::providers::Provider;
use crate::subtitle_processor::{SubtitleCollection, SubtitleFormat};
use crate::translation::{BatchOptions, BatchTranslator};

use super::models::{
    FileId, SessionState, TranslatedDownload, TranslationOutcome, TranslationTask, UploadedFile,
    DOWNLOAD_MIME_TYPE,
};

/// Session manager owning every uploaded file and translation task
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Current published snapshot
    state: Arc<RwLock<Arc<SessionState>>>,
    translator: BatchTranslator,
    /// Language selected for new files
    default_language: String,
    policy: LanguageChangePolicy,
}

impl SessionManager {
    /// Create a session manager around an existing translator
    pub fn new(translator: BatchTranslator, default_language: impl Into<String>, policy: LanguageChangePolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(SessionState::default()))),
            translator,
            default_language: default_language.into(),
            policy,
        }
    }

    /// Create a session manager from the application configuration
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Self {
        let translator = BatchTranslator::new(provider, BatchOptions::from(config));
        Self::new(translator, config.default_language.clone(), config.language_change_policy)
    }

    /// Current state; cheap to clone and never mutated in place
    pub fn snapshot(&self) -> Arc<SessionState> {
        Arc::clone(&self.state.read())
    }

    fn update<R>(&self, mutate: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.state.write();
        let mut next = SessionState::clone(&guard);
        let result = mutate(&mut next);
        *guard = Arc::new(next);
        result
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Add a file; its format comes from the extension and the default
    /// language is pre-selected
    pub fn add_file(&self, file_name: impl Into<String>, content: impl Into<Arc<str>>) -> Result<FileId, SessionError> {
        let file_name = file_name.into();
        let format = SubtitleFormat::from_file_name(&file_name)?;
        let id = FileId::new();

        let mut tasks = BTreeMap::new();
        tasks.insert(self.default_language.clone(), TranslationTask::new(self.default_language.clone()));

        let file = UploadedFile {
            id,
            file_name,
            format,
            content: content.into(),
            languages: vec![self.default_language.clone()],
            tasks,
        };

        info!("Added {} ({}) as {}", file.file_name, format, id);
        self.update(|state| state.push_file(file));
        Ok(id)
    }

    /// Remove a file and all of its tasks. Runs still in flight for it will
    /// find nothing to write into when they finish.
    pub fn remove_file(&self, id: FileId) -> bool {
        let removed = self.update(|state| state.remove_file(id));
        if removed {
            debug!("Removed file {}", id);
        }
        removed
    }

    // =========================================================================
    // Languages
    // =========================================================================

    /// Replace the selected languages of a file.
    ///
    /// Names are trimmed and must be known English language names; names
    /// that refer to the same language are kept once, in first-seen
    /// spelling. Removed languages lose their task and added ones get a
    /// fresh task. Under `ResetAll` every remaining task is re-created too;
    /// under `PreserveExisting` languages that stay selected keep theirs.
    pub fn set_languages(&self, id: FileId, languages: Vec<String>) -> Result<(), SessionError> {
        let selected = normalize_languages(languages)?;
        let policy = self.policy;

        self.update(|state: &mut SessionState| -> Result<(), SessionError> {
            let file = state.file_mut(id).ok_or(SessionError::FileNotFound(id))?;
            apply_languages(file, selected, policy);
            Ok(())
        })
    }

    /// Select one more language for a file (checkbox on)
    pub fn add_language(&self, id: FileId, language: &str) -> Result<(), SessionError> {
        let language = normalize_language(language)?;
        let policy = self.policy;

        self.update(|state: &mut SessionState| -> Result<(), SessionError> {
            let file = state.file_mut(id).ok_or(SessionError::FileNotFound(id))?;
            if file.languages.iter().any(|l| language_utils::language_names_match(l, &language)) {
                return Ok(());
            }

            let mut languages = file.languages.clone();
            languages.push(language);
            apply_languages(file, languages, policy);
            Ok(())
        })
    }

    /// Deselect a language for a file (checkbox off)
    pub fn remove_language(&self, id: FileId, language: &str) -> Result<(), SessionError> {
        let policy = self.policy;

        self.update(|state: &mut SessionState| -> Result<(), SessionError> {
            let file = state.file_mut(id).ok_or(SessionError::FileNotFound(id))?;
            if !file.languages.iter().any(|l| l == language) {
                return Err(SessionError::LanguageNotSelected { file: id, language: language.to_string() });
            }

            let languages = file.languages.iter().filter(|l| *l != language).cloned().collect();
            apply_languages(file, languages, policy);
            Ok(())
        })
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translate a file into one of its selected languages.
    ///
    /// Does nothing when the file is gone, the language is not selected or a
    /// run for the same task is already in flight. Progress and the final
    /// result are written back by task key and run id, so a run whose task
    /// was removed or re-armed meanwhile leaves the state untouched.
    pub async fn start_translation(&self, id: FileId, language: &str) -> TranslationOutcome {
        let run_id = Uuid::new_v4();

        let armed = self.update(|state: &mut SessionState| -> Option<(String, SubtitleFormat, Arc<str>)> {
            let file = state.file_mut(id)?;
            let format = file.format;
            let content = Arc::clone(&file.content);
            let file_name = file.file_name.clone();
            let task = file.task_mut(language)?;
            if task.loading {
                return None;
            }
            task.loading = true;
            task.progress = 0;
            task.translated_content = None;
            task.run_id = Some(run_id);
            Some((file_name, format, content))
        });

        let Some((file_name, format, content)) = armed else {
            debug!("Skipping translation of {} to {}: no idle task", id, language);
            return TranslationOutcome::Skipped;
        };

        let entries = SubtitleCollection::parse_entries(&content, format);
        info!("Translating {} ({} cues) to {}", file_name, entries.len(), language);

        let progress_session = self.clone();
        let progress_language = language.to_string();
        let on_progress = move |percent: u8| {
            progress_session.update_task(id, &progress_language, run_id, |task| task.progress = percent);
        };

        match self.translator.translate_entries(&entries, language, on_progress).await {
            Ok(translated) => {
                let output: Arc<str> = Arc::from(SubtitleCollection::serialize_entries(&translated, format));
                let stored = self.update_task(id, language, run_id, move |task| {
                    task.translated_content = Some(output);
                    task.progress = 100;
                    task.loading = false;
                    task.run_id = None;
                });
                if stored {
                    info!("Translation of {} to {} completed", file_name, language);
                    TranslationOutcome::Completed
                } else {
                    TranslationOutcome::Discarded
                }
            }
            Err(e) => {
                error!("Translation failed for {} ({}): {}", file_name, language, e);
                let reset = self.update_task(id, language, run_id, |task| {
                    task.progress = 0;
                    task.loading = false;
                    task.run_id = None;
                });
                if reset {
                    TranslationOutcome::Failed(e)
                } else {
                    TranslationOutcome::Discarded
                }
            }
        }
    }

    /// Apply `mutate` to the task only if it still belongs to `run_id`
    fn update_task(&self, id: FileId, language: &str, run_id: Uuid, mutate: impl FnOnce(&mut TranslationTask)) -> bool {
        let applied = self.update(|state| match state.task_mut(id, language) {
            Some(task) if task.run_id == Some(run_id) => {
                mutate(task);
                true
            }
            _ => false,
        });

        if !applied {
            warn!("Dropping update for {} ({}): task was removed or restarted", id, language);
        }
        applied
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Copy of a task's current record
    pub fn task(&self, id: FileId, language: &str) -> Option<TranslationTask> {
        self.snapshot().task(id, language).cloned()
    }

    /// Translated text for a task, once a run has succeeded
    pub fn read_content(&self, id: FileId, language: &str) -> Option<Arc<str>> {
        self.snapshot()
            .task(id, language)
            .and_then(|task| task.translated_content.clone())
    }

    /// Translated file ready to be saved, named `translated_<language>_<original>`
    pub fn download(&self, id: FileId, language: &str) -> Option<TranslatedDownload> {
        let snapshot = self.snapshot();
        let file = snapshot.file(id)?;
        let content = file.task(language)?.translated_content.as_ref()?;

        Some(TranslatedDownload {
            file_name: file.output_file_name(language),
            mime_type: DOWNLOAD_MIME_TYPE,
            bytes: Bytes::copy_from_slice(content.as_bytes()),
        })
    }
}

fn normalize_language(language: &str) -> Result<String, SessionError> {
    let language = language.trim();
    if language_utils::find_language(language).is_none() {
        return Err(SessionError::UnknownLanguage(language.to_string()));
    }
    Ok(language.to_string())
}

/// Validate, trim and dedupe a language selection; blank entries are ignored
fn normalize_languages(languages: Vec<String>) -> Result<Vec<String>, SessionError> {
    let mut selected: Vec<String> = Vec::with_capacity(languages.len());
    for language in languages.iter().filter(|l| !l.trim().is_empty()) {
        let language = normalize_language(language)?;
        if !selected.iter().any(|l| language_utils::language_names_match(l, &language)) {
            selected.push(language);
        }
    }
    Ok(selected)
}

/// Rebuild the task map of `file` for a new selection
fn apply_languages(file: &mut UploadedFile, selected: Vec<String>, policy: LanguageChangePolicy) {
    let mut previous = std::mem::take(&mut file.tasks);
    file.tasks = selected
        .iter()
        .map(|language| {
            let task = match policy {
                LanguageChangePolicy::PreserveExisting => previous.remove(language),
                LanguageChangePolicy::ResetAll => None,
            };
            (language.clone(), task.unwrap_or_else(|| TranslationTask::new(language.clone())))
        })
        .collect();

    debug!("File {} languages now [{}]", file.id, selected.join(", "));
    file.languages = selected;
}
