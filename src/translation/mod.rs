/*!
 * Translation of subtitle cues through a remote service.
 *
 * - `batch`: ordered, batched fan-out of per-cue requests with progress reporting
 */

// Re-export main types for easier usage
pub use self::batch::{progress_percent, BatchOptions, BatchTranslator};

// Submodules
pub mod batch;
