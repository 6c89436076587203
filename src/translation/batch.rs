/*!
 * Batch translation processing.
 *
 * Cues are split into fixed-size batches. Every cue of a batch is sent to the
 * provider concurrently and the batch completes only once all of its calls
 * have returned; batches run strictly one after another. A single throttling
 * pause is taken before the second batch, and progress is reported after
 * every completed batch.
 */

use futures::future::try_join_all;
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::providers::{Provider, TranslationRequest};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

/// Tuning knobs for a translation run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Cues per batch
    pub batch_size: usize,
    /// Pause taken once, before the second batch
    pub throttle_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            throttle_delay: Duration::from_millis(600),
        }
    }
}

impl From<&Config> for BatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            throttle_delay: Duration::from_millis(config.throttle_delay_ms),
        }
    }
}

/// Percentage of cues processed, rounded down
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) * 100) / total) as u8
}

/// Batch translator for processing subtitle entries in batches
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The service client to use
    provider: Arc<dyn Provider>,

    options: BatchOptions,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(provider: Arc<dyn Provider>, options: BatchOptions) -> Self {
        Self { provider, options }
    }

    /// Translate every cue into `target_language`.
    ///
    /// `progress_callback` receives the rounded-down percentage of cues done
    /// after each batch. The first failing call aborts the run; cues already
    /// translated are dropped along with it.
    pub async fn translate_entries<F>(
        &self,
        entries: &[SubtitleEntry],
        target_language: &str,
        progress_callback: F,
    ) -> Result<Vec<SubtitleEntry>, TranslationError>
    where
        F: Fn(u8) + Send + Sync,
    {
        let start_time = Instant::now();
        let total = entries.len();
        let batch_size = self.options.batch_size.max(1);
        let total_batches = total.div_ceil(batch_size);

        info!("Translating {} cues to {} in {} batch(es)", total, target_language, total_batches);

        let mut translated = Vec::with_capacity(total);
        let mut delay_executed = false;

        for (batch_index, batch) in entries.chunks(batch_size).enumerate() {
            if batch_index > 0 && !delay_executed {
                debug!("Throttling for {:?} before batch {}", self.options.throttle_delay, batch_index + 1);
                tokio::time::sleep(self.options.throttle_delay).await;
                delay_executed = true;
            }

            let offset = batch_index * batch_size;
            let results = self.translate_batch(batch, offset, target_language).await?;
            translated.extend(results);

            let percent = progress_percent(translated.len(), total);
            debug!("Batch {} of {} done ({}%)", batch_index + 1, total_batches, percent);
            progress_callback(percent);
        }

        info!("Translated {} cues to {} in {:?}", translated.len(), target_language, start_time.elapsed());
        Ok(translated)
    }

    /// Translate a whole collection, keeping its file name and format
    pub async fn translate_collection<F>(
        &self,
        collection: &SubtitleCollection,
        target_language: &str,
        progress_callback: F,
    ) -> Result<SubtitleCollection, TranslationError>
    where
        F: Fn(u8) + Send + Sync,
    {
        let entries = self.translate_entries(&collection.entries, target_language, progress_callback).await?;
        Ok(collection.with_entries(entries))
    }

    /// Fan out one call per cue and wait for all of them
    async fn translate_batch(
        &self,
        batch: &[SubtitleEntry],
        offset: usize,
        target_language: &str,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        let provider = &self.provider;

        let calls = batch.iter().enumerate().map(|(idx, entry)| async move {
            let request = TranslationRequest::new(entry.text.as_str(), target_language);
            match provider.complete(request).await {
                Ok(response) => Ok(entry.with_text(response.text_or(&entry.text))),
                Err(source) => Err(TranslationError::EntryFailed { index: offset + idx, source }),
            }
        });

        try_join_all(calls).await
    }
}
