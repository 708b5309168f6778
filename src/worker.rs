// SPDX-License-Identifier: Apache-2.0

//! Worker Pool (§4.7): a fixed-size pool of stateless per-file workers
//! sharing one job queue, each reporting through its own result-channel
//! sender rather than a rebindable callback (§9). A worker failure is
//! logged and the pool continues; if every worker exits, the coordinator
//! falls back to processing the remaining queue sequentially in-line.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tiktoken_rs::CoreBPE;
use tokio::sync::mpsc;

use crate::chunker;
use crate::embedding::Embedder;
use crate::error::{CoreResult, ErrorCategory, ErrorEntry};
use crate::store::IndexedPoint;

/// One file queued for processing.
#[derive(Debug, Clone)]
pub struct WorkItem {
	pub relative_path: String,
	pub absolute_path: PathBuf,
	pub language: Option<&'static str>,
}

/// Result of processing one [`WorkItem`]: zero or more points plus any
/// per-item errors encountered along the way (read, parse, embed).
#[derive(Debug, Default)]
pub struct WorkOutcome {
	pub relative_path: String,
	pub points: Vec<IndexedPoint>,
	pub errors: Vec<ErrorEntry>,
}

/// `max(1, logical cpus - 1)` — leaves one core free for the rest of the
/// process (§4.7).
pub fn default_worker_count() -> usize {
	num_cpus::get().saturating_sub(1).max(1)
}

const BINARY_SNIFF_BYTES: usize = 8192;

fn looks_binary(bytes: &[u8]) -> bool {
	bytes.iter().take(BINARY_SNIFF_BYTES).any(|&b| b == 0)
}

static TOKENIZER: OnceLock<CoreBPE> = OnceLock::new();

fn tokenizer() -> &'static CoreBPE {
	TOKENIZER.get_or_init(|| tiktoken_rs::cl100k_base().expect("cl100k_base tokenizer data is embedded at compile time"))
}

fn count_tokens(text: &str) -> usize {
	tokenizer().encode_ordinary(text).len()
}

/// Embed `texts` in sub-batches capped at `max_tokens_per_batch` approximate
/// (cl100k_base) tokens, preserving input order in the returned vectors. A
/// single text whose own token count exceeds the cap is still sent alone
/// rather than split, since a chunk's content is not divisible mid-batch.
pub async fn embed_in_token_batches(
	texts: &[String],
	embedder: &dyn Embedder,
	max_tokens_per_batch: usize,
) -> CoreResult<Vec<Vec<f32>>> {
	let mut vectors = Vec::with_capacity(texts.len());
	let mut batch: Vec<String> = Vec::new();
	let mut batch_tokens = 0usize;

	for text in texts {
		let tokens = count_tokens(text);
		if !batch.is_empty() && batch_tokens + tokens > max_tokens_per_batch {
			vectors.extend(embedder.embed_batch(&batch).await?);
			batch.clear();
			batch_tokens = 0;
		}
		batch_tokens += tokens;
		batch.push(text.clone());
	}
	if !batch.is_empty() {
		vectors.extend(embedder.embed_batch(&batch).await?);
	}

	Ok(vectors)
}

async fn process_one(item: &WorkItem, embedder: &dyn Embedder, max_tokens_per_batch: usize) -> WorkOutcome {
	let mut outcome = WorkOutcome {
		relative_path: item.relative_path.clone(),
		points: Vec::new(),
		errors: Vec::new(),
	};

	let bytes = match tokio::fs::read(&item.absolute_path).await {
		Ok(b) => b,
		Err(e) => {
			outcome.errors.push(
				ErrorEntry::new(ErrorCategory::FileIo, e.to_string()).with_file(item.relative_path.clone()),
			);
			return outcome;
		}
	};

	if looks_binary(&bytes) {
		outcome.errors.push(
			ErrorEntry::new(ErrorCategory::FileIo, "binary content, skipped").with_file(item.relative_path.clone()),
		);
		return outcome;
	}

	let content = String::from_utf8_lossy(&bytes).into_owned();
	let chunks = chunker::chunk_file(&item.relative_path, item.language, &content);
	if chunks.is_empty() {
		return outcome;
	}

	let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
	match embed_in_token_batches(&texts, embedder, max_tokens_per_batch).await {
		Ok(vectors) => {
			for (chunk, vector) in chunks.iter().zip(vectors) {
				outcome.points.push(IndexedPoint::from_chunk(chunk, vector));
			}
		}
		Err(e) => {
			outcome
				.errors
				.push(ErrorEntry::new(ErrorCategory::Embed, e.to_string()).with_file(item.relative_path.clone()));
		}
	}

	outcome
}

/// Run `items` through a pool of `worker_count` concurrent tasks, each
/// pulling from one shared queue, returning outcomes as they complete
/// (order is not preserved). `should_stop` is polled between items so a
/// worker idles — rather than starts a new item — once the Indexing
/// Coordinator has requested a stop or cancel.
pub async fn run(
	worker_count: usize,
	items: Vec<WorkItem>,
	embedder: Arc<dyn Embedder>,
	should_stop: Arc<dyn Fn() -> bool + Send + Sync>,
	max_tokens_per_embed_batch: usize,
) -> mpsc::Receiver<WorkOutcome> {
	let (tx, rx) = mpsc::channel(256);
	let queue = Arc::new(Mutex::new(VecDeque::from(items)));
	let worker_count = worker_count.max(1);

	let mut handles = Vec::with_capacity(worker_count);
	for _ in 0..worker_count {
		let queue = queue.clone();
		let embedder = embedder.clone();
		let should_stop = should_stop.clone();
		let tx = tx.clone();
		handles.push(tokio::spawn(async move {
			loop {
				if should_stop() {
					break;
				}
				let next = queue.lock().pop_front();
				let Some(item) = next else { break };
				let outcome = process_one(&item, embedder.as_ref(), max_tokens_per_embed_batch).await;
				if tx.send(outcome).await.is_err() {
					break;
				}
			}
		}));
	}
	drop(tx);

	let mut all_failed = true;
	for handle in handles {
		if handle.await.is_ok() {
			all_failed = false;
		} else {
			tracing::warn!("a worker task exited abnormally");
		}
	}

	// Sequential fallback: every worker died before draining the queue.
	if all_failed {
		let remaining: Vec<WorkItem> = {
			let mut q = queue.lock();
			q.drain(..).collect()
		};
		if !remaining.is_empty() {
			tracing::warn!(count = remaining.len(), "all workers exited, falling back to sequential processing");
			let (fallback_tx, fallback_rx) = mpsc::channel(256);
			for item in remaining {
				if should_stop() {
					break;
				}
				let outcome = process_one(&item, embedder.as_ref(), max_tokens_per_embed_batch).await;
				if fallback_tx.send(outcome).await.is_err() {
					break;
				}
			}
			return fallback_rx;
		}
	}

	rx
}
