/*!
 * Tests for the translation session: files, language selection, runs and downloads
 */

use std::sync::Arc;
use std::time::Duration;

use srt_translator::app_config::LanguageChangePolicy;
use srt_translator::errors::{ProviderError, SessionError, SubtitleError, TranslationError};
use srt_translator::providers::MockProvider;
use srt_translator::session::{FileId, TaskStatus, TranslationOutcome, DOWNLOAD_MIME_TYPE};
use srt_translator::subtitle_processor::SubtitleFormat;
use crate::common;

const TRANSLATED_SAMPLE: &str = "00:00:01,000 --> 00:00:02,000\nHELLO\n\n00:00:03,000 --> 00:00:04,000\nWORLD\n";

fn languages(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// New files start with the default language selected and an idle task
#[test]
fn test_addFile_shouldPreselectDefaultLanguage() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);

    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    let snapshot = session.snapshot();
    let file = snapshot.file(id).unwrap();
    assert_eq!(file.file_name, "movie.srt");
    assert_eq!(file.format, SubtitleFormat::Srt);
    assert_eq!(&*file.content, common::SAMPLE_SRT);
    assert_eq!(file.languages, languages(&["Spanish"]));

    let task = file.task("Spanish").unwrap();
    assert_eq!(task.progress, 0);
    assert!(!task.loading);
    assert!(task.translated_content.is_none());
    assert_eq!(task.status(), TaskStatus::Idle);
}

/// Files keep upload order
#[test]
fn test_addFile_withSeveralFiles_shouldKeepUploadOrder() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);

    session.add_file("b.vtt", common::SAMPLE_VTT).unwrap();
    session.add_file("a.srt", common::SAMPLE_SRT).unwrap();

    let names: Vec<String> = session.snapshot().files().iter().map(|f| f.file_name.clone()).collect();
    assert_eq!(names, vec!["b.vtt", "a.srt"]);
}

#[test]
fn test_addFile_withUnsupportedExtension_shouldFail() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);

    let result = session.add_file("movie.txt", "hello");

    assert_eq!(
        result,
        Err(SessionError::Subtitle(SubtitleError::UnsupportedFormat("movie.txt".to_string())))
    );
    assert!(session.snapshot().files().is_empty());
}

#[test]
fn test_removeFile_shouldDropFileAndTasks() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    assert!(session.remove_file(id));
    assert!(!session.remove_file(id));
    assert!(session.task(id, "Spanish").is_none());
}

/// Selection is trimmed and deduplicated, and tasks follow it
#[test]
fn test_setLanguages_shouldKeepOneTaskPerSelectedLanguage() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    session
        .set_languages(id, languages(&["French", " German ", "French", ""]))
        .unwrap();

    let snapshot = session.snapshot();
    let file = snapshot.file(id).unwrap();
    assert_eq!(file.languages, languages(&["French", "German"]));
    assert_eq!(file.tasks.len(), 2);
    assert!(file.task("Spanish").is_none());
    let ordered: Vec<&str> = file.ordered_tasks().map(|t| t.language.as_str()).collect();
    assert_eq!(ordered, vec!["French", "German"]);
}

#[test]
fn test_setLanguages_withUnknownFile_shouldFail() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = FileId::new();

    assert_eq!(
        session.set_languages(id, languages(&["French"])),
        Err(SessionError::FileNotFound(id))
    );
}

/// Under the reset policy any change to the selection discards finished work
#[tokio::test]
async fn test_addLanguage_withResetAll_shouldResetExistingTasks() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    assert_eq!(session.start_translation(id, "Spanish").await, TranslationOutcome::Completed);

    session.add_language(id, "French").unwrap();

    let spanish = session.task(id, "Spanish").unwrap();
    assert_eq!(spanish.progress, 0);
    assert!(spanish.translated_content.is_none());
    assert!(session.task(id, "French").is_some());
}

/// Under the preserve policy languages that stay selected keep their result
#[tokio::test]
async fn test_addLanguage_withPreserveExisting_shouldKeepFinishedTask() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::PreserveExisting);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    assert_eq!(session.start_translation(id, "Spanish").await, TranslationOutcome::Completed);

    session.add_language(id, "French").unwrap();

    let spanish = session.task(id, "Spanish").unwrap();
    assert_eq!(spanish.progress, 100);
    assert_eq!(spanish.translated_content.as_deref(), Some(TRANSLATED_SAMPLE));
    assert_eq!(session.task(id, "French").unwrap().status(), TaskStatus::Idle);
}

/// Adding an already selected language changes nothing
#[test]
fn test_addLanguage_withSelectedLanguage_shouldBeNoop() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let outcome = tokio_test::block_on(session.start_translation(id, "Spanish"));
    assert_eq!(outcome, TranslationOutcome::Completed);

    session.add_language(id, "Spanish").unwrap();

    assert_eq!(session.read_content(id, "Spanish").as_deref(), Some(TRANSLATED_SAMPLE));
}

#[test]
fn test_removeLanguage_shouldDropItsTask() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::PreserveExisting);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    session.add_language(id, "French").unwrap();

    session.remove_language(id, "Spanish").unwrap();

    let snapshot = session.snapshot();
    let file = snapshot.file(id).unwrap();
    assert_eq!(file.languages, languages(&["French"]));
    assert!(file.task("Spanish").is_none());

    assert_eq!(
        session.remove_language(id, "Spanish"),
        Err(SessionError::LanguageNotSelected { file: id, language: "Spanish".to_string() })
    );
}

/// A successful run stores the serialized translation and exposes a download
#[tokio::test]
async fn test_startTranslation_withWorkingProvider_shouldStoreResult() {
    common::init_logging();
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    let outcome = session.start_translation(id, "Spanish").await;

    assert_eq!(outcome, TranslationOutcome::Completed);
    let task = session.task(id, "Spanish").unwrap();
    assert_eq!(task.progress, 100);
    assert!(!task.loading);
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(session.read_content(id, "Spanish").as_deref(), Some(TRANSLATED_SAMPLE));

    let download = session.download(id, "Spanish").unwrap();
    assert_eq!(download.file_name, "translated_Spanish_movie.srt");
    assert_eq!(download.mime_type, DOWNLOAD_MIME_TYPE);
    assert_eq!(&download.bytes[..], TRANSLATED_SAMPLE.as_bytes());
}

/// VTT input produces VTT output with its header
#[tokio::test]
async fn test_startTranslation_withVttFile_shouldKeepVttFormat() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("clip.vtt", common::SAMPLE_VTT).unwrap();

    session.start_translation(id, "Spanish").await;

    let content = session.read_content(id, "Spanish").unwrap();
    assert_eq!(
        &*content,
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHELLO\n\n00:00:03.000 --> 00:00:04.000\nWORLD\n"
    );
    assert_eq!(session.download(id, "Spanish").unwrap().file_name, "translated_Spanish_clip.vtt");
}

/// A file without cues completes immediately
#[tokio::test]
async fn test_startTranslation_withEmptyFile_shouldCompleteWithoutRequests() {
    let provider = MockProvider::uppercase();
    let session = common::session(Arc::new(provider.clone()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("empty.srt", "").unwrap();

    assert_eq!(session.start_translation(id, "Spanish").await, TranslationOutcome::Completed);

    assert_eq!(provider.request_count(), 0);
    assert_eq!(session.task(id, "Spanish").unwrap().progress, 100);
    assert_eq!(session.read_content(id, "Spanish").as_deref(), Some(""));
}

/// A failing run resets its own task and leaves every other task alone
#[tokio::test]
async fn test_startTranslation_withFailingCue_shouldOnlyResetThatTask() {
    let session = common::session(Arc::new(MockProvider::fail_on_text("World")), 100, LanguageChangePolicy::ResetAll);
    let failing = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let healthy = session.add_file("other.srt", &*common::numbered_srt(3)).unwrap();

    let (failed, completed) = tokio::join!(
        session.start_translation(failing, "Spanish"),
        session.start_translation(healthy, "Spanish"),
    );

    match failed {
        TranslationOutcome::Failed(TranslationError::EntryFailed { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(source, ProviderError::ApiError { .. }));
        }
        other => panic!("expected a failed run, got {:?}", other),
    }
    assert_eq!(completed, TranslationOutcome::Completed);

    let failed_task = session.task(failing, "Spanish").unwrap();
    assert_eq!(failed_task.progress, 0);
    assert!(!failed_task.loading);
    assert!(failed_task.translated_content.is_none());
    assert!(session.download(failing, "Spanish").is_none());

    assert_eq!(session.task(healthy, "Spanish").unwrap().progress, 100);
    assert!(session.download(healthy, "Spanish").is_some());
}

#[tokio::test]
async fn test_startTranslation_withUnknownFileOrLanguage_shouldSkip() {
    let provider = MockProvider::uppercase();
    let session = common::session(Arc::new(provider.clone()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    assert_eq!(session.start_translation(FileId::new(), "Spanish").await, TranslationOutcome::Skipped);
    assert_eq!(session.start_translation(id, "Italian").await, TranslationOutcome::Skipped);
    assert_eq!(provider.request_count(), 0);
}

/// A second start while the first run is in flight is ignored
#[tokio::test(start_paused = true)]
async fn test_startTranslation_whileRunning_shouldSkipSecondRun() {
    let provider = MockProvider::slow(50);
    let session = common::session(Arc::new(provider.clone()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    let (first, second) = tokio::join!(
        session.start_translation(id, "Spanish"),
        session.start_translation(id, "Spanish"),
    );

    assert_eq!(first, TranslationOutcome::Completed);
    assert_eq!(second, TranslationOutcome::Skipped);
    assert_eq!(provider.request_count(), 2);
}

/// Loading is visible to observers while the run is in flight
#[tokio::test(start_paused = true)]
async fn test_startTranslation_whileRunning_shouldExposeLoadingState() {
    let session = common::session(Arc::new(MockProvider::slow(50)), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let observer = session.clone();

    let (outcome, observed) = tokio::join!(session.start_translation(id, "Spanish"), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let snapshot = observer.snapshot();
        (snapshot.running_count(), snapshot.task(id, "Spanish").cloned())
    });

    assert_eq!(outcome, TranslationOutcome::Completed);
    let (running, task) = observed;
    assert_eq!(running, 1);
    let task = task.unwrap();
    assert!(task.loading);
    assert_eq!(task.progress, 0);
    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(session.snapshot().running_count(), 0);
}

/// Removing the file mid-run makes the late result a no-op
#[tokio::test(start_paused = true)]
async fn test_startTranslation_withFileRemovedMidRun_shouldDiscardResult() {
    let session = common::session(Arc::new(MockProvider::slow(50)), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let other = session.add_file("other.srt", common::SAMPLE_SRT).unwrap();
    let remover = session.clone();

    let (outcome, _) = tokio::join!(session.start_translation(id, "Spanish"), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        remover.remove_file(id);
    });

    assert_eq!(outcome, TranslationOutcome::Discarded);
    let snapshot = session.snapshot();
    assert!(snapshot.file(id).is_none());
    assert_eq!(snapshot.task(other, "Spanish").unwrap().status(), TaskStatus::Idle);
}

/// Re-creating the task mid-run leaves the fresh task untouched
#[tokio::test(start_paused = true)]
async fn test_startTranslation_withLanguagesResetMidRun_shouldDiscardResult() {
    let session = common::session(Arc::new(MockProvider::slow(50)), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let editor = session.clone();

    let (outcome, _) = tokio::join!(session.start_translation(id, "Spanish"), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        editor.add_language(id, "French").unwrap();
    });

    assert_eq!(outcome, TranslationOutcome::Discarded);
    let task = session.task(id, "Spanish").unwrap();
    assert_eq!(task.status(), TaskStatus::Idle);
    assert_eq!(task.progress, 0);
}

/// Starting again clears the previous result until the new run finishes
#[tokio::test(start_paused = true)]
async fn test_startTranslation_rerun_shouldClearPreviousContent() {
    let session = common::session(Arc::new(MockProvider::slow(50)), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    session.start_translation(id, "Spanish").await;
    assert!(session.read_content(id, "Spanish").is_some());
    let observer = session.clone();

    let (outcome, mid_run) = tokio::join!(session.start_translation(id, "Spanish"), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        observer.read_content(id, "Spanish")
    });

    assert_eq!(outcome, TranslationOutcome::Completed);
    assert!(mid_run.is_none());
    assert_eq!(session.read_content(id, "Spanish").as_deref(), Some(TRANSLATED_SAMPLE));
}

/// Progress moves batch by batch while a long file is translated
#[tokio::test(start_paused = true)]
async fn test_startTranslation_withSeveralBatches_shouldPublishProgress() {
    let session = common::session(Arc::new(MockProvider::slow(50)), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("long.srt", &*common::numbered_srt(250)).unwrap();
    let observer = session.clone();

    let (outcome, seen) = tokio::join!(session.start_translation(id, "Spanish"), async move {
        // First batch lands at 50ms; the second starts after the 600ms pause
        tokio::time::sleep(Duration::from_millis(100)).await;
        observer.task(id, "Spanish").map(|task| task.progress)
    });

    assert_eq!(outcome, TranslationOutcome::Completed);
    assert_eq!(seen, Some(40));
    assert_eq!(session.task(id, "Spanish").unwrap().progress, 100);
}

/// Snapshots taken earlier never change
#[test]
fn test_snapshot_shouldNotObserveLaterMutations() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let before = session.snapshot();

    session.add_language(id, "French").unwrap();
    session.add_file("other.vtt", common::SAMPLE_VTT).unwrap();

    assert_eq!(before.files().len(), 1);
    assert_eq!(before.file(id).unwrap().languages, languages(&["Spanish"]));
    assert_eq!(session.snapshot().files().len(), 2);
}

/// Names that are not languages never reach task keys or output file names
#[test]
fn test_setLanguages_withPathLikeName_shouldRejectSelection() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    assert_eq!(
        session.set_languages(id, languages(&["French", "pt/BR"])),
        Err(SessionError::UnknownLanguage("pt/BR".to_string()))
    );
    assert_eq!(
        session.add_language(id, "../German"),
        Err(SessionError::UnknownLanguage("../German".to_string()))
    );
    assert_eq!(session.snapshot().file(id).unwrap().languages, languages(&["Spanish"]));
}

/// Spellings of the same language collapse into one task
#[test]
fn test_setLanguages_withCaseVariants_shouldKeepFirstSpelling() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::ResetAll);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();

    session.set_languages(id, languages(&["French", "french", " FRENCH "])).unwrap();
    session.add_language(id, "FRENCH").unwrap();

    let snapshot = session.snapshot();
    let file = snapshot.file(id).unwrap();
    assert_eq!(file.languages, languages(&["French"]));
    assert_eq!(file.tasks.len(), 1);
}

/// Toggles from several threads are all applied
#[test]
fn test_addLanguage_fromManyThreads_shouldKeepEverySelection() {
    let session = common::session(Arc::new(MockProvider::uppercase()), 100, LanguageChangePolicy::PreserveExisting);
    let id = session.add_file("movie.srt", common::SAMPLE_SRT).unwrap();
    let added = ["French", "German", "Italian", "Portuguese", "Dutch", "Polish", "Swedish", "Danish"];

    for _ in 0..20 {
        session.set_languages(id, languages(&["Spanish"])).unwrap();
        std::thread::scope(|scope| {
            for language in added {
                let session = &session;
                scope.spawn(move || session.add_language(id, language).unwrap());
            }
        });

        let snapshot = session.snapshot();
        let file = snapshot.file(id).unwrap();
        assert_eq!(file.languages.len(), added.len() + 1);
        assert_eq!(file.tasks.len(), added.len() + 1);
        assert!(added.iter().all(|language| file.task(language).is_some()));
    }
}
