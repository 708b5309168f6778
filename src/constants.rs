// SPDX-License-Identifier: Apache-2.0

//! Application-wide constants.

/// Default byte ceiling above which AST parsing is skipped in favor of the
/// line-window fallback (§4.4 item 3).
pub const DEFAULT_OVERSIZE_CEILING_BYTES: usize = 100 * 1024;

/// Default window size, in lines, for the fallback chunker.
pub const DEFAULT_WINDOW_LINES: usize = 500;

/// Default cap on the number of windows a single oversized file may produce.
pub const DEFAULT_MAX_WINDOW_CHUNKS: usize = 20;

/// Progress is emitted at least this often during discovery/processing,
/// whichever of the file-count or time thresholds is reached first.
pub const DEFAULT_PROGRESS_EVERY_FILES: usize = 25;
pub const DEFAULT_PROGRESS_EVERY_MILLIS: u64 = 250;

/// Debounce window for file-watcher create/modify coalescing (§4.9).
pub const DEFAULT_DEBOUNCE_MILLIS: u64 = 500;

/// Maximum points per upsert batch sent to the Vector Store Client.
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 256;

/// Maximum approximate tokens (cl100k_base) per embedding batch.
pub const DEFAULT_MAX_TOKENS_PER_EMBED_BATCH: usize = 100_000;

/// Default top-k for Query Service searches.
pub const DEFAULT_SEARCH_TOP_K: usize = 10;

/// Throttling delay (ms) applied between worker dispatch decisions, keyed by
/// the `Intensity` setting (§4.8).
pub const THROTTLE_HIGH_MS: u64 = 0;
pub const THROTTLE_MEDIUM_MS: u64 = 100;
pub const THROTTLE_LOW_MS: u64 = 500;

/// Prefix for the per-workspace collection name (§4.12).
pub const COLLECTION_PREFIX: &str = "code_context_";
