// SPDX-License-Identifier: Apache-2.0

//! Indexing Coordinator (§4.8): orchestrates one Run — discovery, worker
//! dispatch, and store upserts — while the State Manager tracks lifecycle
//! and cooperative cancellation checkpoints gate dispatch, embed, and store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{
	DEFAULT_MAX_TOKENS_PER_EMBED_BATCH, DEFAULT_UPSERT_BATCH_SIZE, THROTTLE_HIGH_MS, THROTTLE_LOW_MS, THROTTLE_MEDIUM_MS,
};
use crate::discovery::{FileDiscovery, NullSink};
use crate::embedding::Embedder;
use crate::error::{CoreError, CoreResult, ErrorEntry};
use crate::ignore_matcher::IgnoreMatcher;
use crate::parsing::languages::detect_language;
use crate::state::{Phase, ProgressEvent, StateManager};
use crate::store::{IndexedPoint, VectorStoreClient};
use crate::worker::{self, WorkItem};

/// How aggressively the coordinator paces worker dispatch against other
/// load on the host (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
	High,
	Medium,
	Low,
}

impl Intensity {
	fn throttle(self) -> Duration {
		Duration::from_millis(match self {
			Intensity::High => THROTTLE_HIGH_MS,
			Intensity::Medium => THROTTLE_MEDIUM_MS,
			Intensity::Low => THROTTLE_LOW_MS,
		})
	}
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
	pub files_discovered: usize,
	pub files_processed: usize,
	pub chunks_indexed: usize,
	pub errors: Vec<ErrorEntry>,
	pub cancelled: bool,
}

/// Files are dispatched to the Worker Pool in batches of this size so
/// pause/cancel checkpoints and progress events land at a reasonable
/// cadence on large workspaces.
const DISPATCH_BATCH_SIZE: usize = 64;

pub struct Coordinator {
	root: PathBuf,
	collection: String,
	state: Arc<StateManager>,
	embedder: Arc<dyn Embedder>,
	store: Arc<dyn VectorStoreClient>,
	worker_count: usize,
	intensity: Intensity,
	max_tokens_per_embed_batch: usize,
}

impl Coordinator {
	pub fn new(
		root: PathBuf,
		collection: String,
		embedder: Arc<dyn Embedder>,
		store: Arc<dyn VectorStoreClient>,
		state: Arc<StateManager>,
	) -> Self {
		Self {
			root,
			collection,
			state,
			embedder,
			store,
			worker_count: worker::default_worker_count(),
			intensity: Intensity::Medium,
			max_tokens_per_embed_batch: DEFAULT_MAX_TOKENS_PER_EMBED_BATCH,
		}
	}

	pub fn with_worker_count(mut self, count: usize) -> Self {
		self.worker_count = count.max(1);
		self
	}

	pub fn with_intensity(mut self, intensity: Intensity) -> Self {
		self.intensity = intensity;
		self
	}

	pub fn with_max_tokens_per_embed_batch(mut self, max_tokens: usize) -> Self {
		self.max_tokens_per_embed_batch = max_tokens.max(1);
		self
	}

	pub fn state(&self) -> &Arc<StateManager> {
		&self.state
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn pause(&self) -> CoreResult<()> {
		self.state.set_paused(true)
	}

	pub fn resume(&self) -> CoreResult<()> {
		self.state.set_paused(false)
	}

	pub fn stop(&self) -> CoreResult<()> {
		self.state.request_stop()
	}

	pub fn cancel(&self) -> CoreResult<()> {
		self.state.request_cancel()
	}

	pub async fn clear_index(&self) -> CoreResult<()> {
		self.store.delete_collection(&self.collection).await
	}

	/// Run discovery, then process every discovered file through the
	/// worker pool, upserting embedded points in batches (§4.8, the
	/// indexing algorithm).
	pub async fn run_full_index(&self) -> CoreResult<RunSummary> {
		if !self.embedder.available().await {
			return Err(CoreError::Embed("embedder is not available".to_string()));
		}
		if self.store.health().await != crate::store::StoreHealth::Ready {
			return Err(CoreError::Store("vector store is not reachable".to_string()));
		}

		self.state.try_start()?;
		let mut summary = RunSummary::default();

		let matcher = IgnoreMatcher::build(&self.root);
		let discovery = FileDiscovery::new(&self.root, &matcher);
		let (files, stats) = match discovery.scan(&mut NullSink) {
			Ok(v) => v,
			Err(e) => {
				self.state.set_error(e.category(), e.to_string());
				return Err(e);
			}
		};
		summary.files_discovered = files.len();

		self.state.emit_progress(ProgressEvent {
			phase: Phase::Discovering,
			files_processed: 0,
			files_total: stats.files_indexable,
			chunks_processed: 0,
			message: None,
		});

		if files.is_empty() {
			self.state.finish_complete();
			return Ok(summary);
		}

		if let Err(e) = self.store.ensure_collection(&self.collection, self.embedder.dimension()).await {
			self.state.set_error(e.category(), e.to_string());
			return Err(e);
		}

		let items: Vec<WorkItem> = files
			.into_iter()
			.map(|f| WorkItem {
				relative_path: f.relative_path,
				absolute_path: f.absolute_path,
				language: f.language,
			})
			.collect();

		let state_for_stop = self.state.clone();
		let should_stop: Arc<dyn Fn() -> bool + Send + Sync> = Arc::new(move || state_for_stop.stop_requested());

		self.state.emit_progress(ProgressEvent {
			phase: Phase::Parsing,
			files_processed: 0,
			files_total: stats.files_indexable,
			chunks_processed: 0,
			message: None,
		});

		for batch in items.chunks(DISPATCH_BATCH_SIZE) {
			self.wait_while_paused().await;

			if self.state.cancellation_requested() {
				summary.cancelled = true;
				break;
			}
			if self.state.stop_requested() {
				break;
			}

			self.state.emit_progress(ProgressEvent {
				phase: Phase::Embedding,
				files_processed: summary.files_processed,
				files_total: stats.files_indexable,
				chunks_processed: summary.chunks_indexed,
				message: None,
			});

			let mut rx = worker::run(
				self.worker_count,
				batch.to_vec(),
				self.embedder.clone(),
				should_stop.clone(),
				self.max_tokens_per_embed_batch,
			)
			.await;

			let mut pending_points: Vec<IndexedPoint> = Vec::new();
			while let Some(outcome) = rx.recv().await {
				summary.files_processed += 1;
				summary.chunks_indexed += outcome.points.len();
				for err in outcome.errors {
					self.state.record_error(err.clone());
					summary.errors.push(err);
				}
				pending_points.extend(outcome.points);

				if pending_points.len() >= DEFAULT_UPSERT_BATCH_SIZE {
					if self.state.cancellation_requested() {
						summary.cancelled = true;
						break;
					}
					self.flush(&mut pending_points, &mut summary).await;
				}
			}
			self.flush(&mut pending_points, &mut summary).await;

			self.state.emit_progress(ProgressEvent {
				phase: Phase::Storing,
				files_processed: summary.files_processed,
				files_total: stats.files_indexable,
				chunks_processed: summary.chunks_indexed,
				message: None,
			});

			if self.intensity.throttle() > Duration::ZERO {
				tokio::time::sleep(self.intensity.throttle()).await;
			}

			if summary.cancelled {
				break;
			}
		}

		if summary.cancelled {
			self.state.finish_cancelled();
		} else {
			self.state.finish_complete();
		}

		Ok(summary)
	}

	async fn flush(&self, pending: &mut Vec<IndexedPoint>, summary: &mut RunSummary) {
		if pending.is_empty() {
			return;
		}
		let batch = std::mem::take(pending);
		if let Err(e) = self.store.upsert(&self.collection, batch).await {
			let entry = ErrorEntry::new(crate::error::ErrorCategory::Store, e.to_string());
			self.state.record_error(entry.clone());
			summary.errors.push(entry);
		}
	}

	async fn wait_while_paused(&self) {
		while self.state.is_paused() {
			tokio::time::sleep(Duration::from_millis(50)).await;
		}
	}

	/// Incremental update for one file (§4.9: the File Watcher's create/
	/// modify handler calls this).
	pub async fn update_file(&self, absolute_path: &Path) -> CoreResult<()> {
		let relative_path = crate::discovery::relative_path_string(absolute_path, &self.root);
		self.store.delete_by_file(&self.collection, &relative_path).await?;

		let language = detect_language(absolute_path);
		let bytes = tokio::fs::read(absolute_path)
			.await
			.map_err(|e| CoreError::FileIo { path: relative_path.clone(), source: e })?;
		let content = String::from_utf8_lossy(&bytes).into_owned();
		let chunks = crate::chunker::chunk_file(&relative_path, language, &content);
		if chunks.is_empty() {
			return Ok(());
		}

		let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
		let vectors = worker::embed_in_token_batches(&texts, self.embedder.as_ref(), self.max_tokens_per_embed_batch).await?;
		self.store.ensure_collection(&self.collection, self.embedder.dimension()).await?;
		let points: Vec<IndexedPoint> = chunks.iter().zip(vectors).map(|(c, v)| IndexedPoint::from_chunk(c, v)).collect();
		self.store.upsert(&self.collection, points).await
	}

	/// Incremental removal for one file (§4.9: the File Watcher's delete
	/// handler calls this, bypassing debounce entirely).
	pub async fn remove_file(&self, absolute_path: &Path) -> CoreResult<usize> {
		let relative_path = crate::discovery::relative_path_string(absolute_path, &self.root);
		self.store.delete_by_file(&self.collection, &relative_path).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::embedding::HashEmbedder;
	use crate::store::MemoryStore;
	use std::fs;
	use tempfile::tempdir;

	fn new_coordinator(root: &Path) -> Coordinator {
		let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(16));
		let store: Arc<dyn VectorStoreClient> = Arc::new(MemoryStore::new());
		let state = Arc::new(StateManager::new());
		Coordinator::new(root.to_path_buf(), "test_collection".to_string(), embedder, store, state)
	}

	#[tokio::test]
	async fn empty_workspace_completes_without_error() {
		let dir = tempdir().unwrap();
		let coordinator = new_coordinator(dir.path());
		let summary = coordinator.run_full_index().await.unwrap();
		assert_eq!(summary.files_discovered, 0);
		assert_eq!(coordinator.state().current_state(), crate::state::RunState::Complete);
	}

	#[tokio::test]
	async fn indexes_a_small_file_and_is_queryable() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("a.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();

		let coordinator = new_coordinator(dir.path());
		let summary = coordinator.run_full_index().await.unwrap();
		assert_eq!(summary.files_processed, 1);
		assert_eq!(summary.chunks_indexed, 2);
	}

	#[tokio::test]
	async fn cannot_run_two_indexing_passes_concurrently() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("a.rs"), "fn alpha() {}\n").unwrap();
		let coordinator = new_coordinator(dir.path());

		coordinator.state().try_start().unwrap();
		let err = coordinator.run_full_index().await.unwrap_err();
		assert!(matches!(err, CoreError::RunAlreadyActive));
	}

	#[tokio::test]
	async fn progress_visits_every_phase_in_order() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("a.rs"), "fn alpha() {}\n").unwrap();

		let coordinator = new_coordinator(dir.path());
		let mut progress = coordinator.state().subscribe();
		coordinator.run_full_index().await.unwrap();

		let mut phases = Vec::new();
		while let Ok(event) = progress.try_recv() {
			phases.push(event.phase);
		}

		assert_eq!(
			phases,
			vec![
				crate::state::Phase::Discovering,
				crate::state::Phase::Parsing,
				crate::state::Phase::Embedding,
				crate::state::Phase::Storing,
				crate::state::Phase::Complete,
			]
		);
	}

	#[tokio::test]
	async fn update_file_then_remove_file_round_trips() {
		let dir = tempdir().unwrap();
		let file_path = dir.path().join("a.rs");
		fs::write(&file_path, "fn alpha() {}\n").unwrap();

		let coordinator = new_coordinator(dir.path());
		coordinator.update_file(&file_path).await.unwrap();

		let removed = coordinator.remove_file(&file_path).await.unwrap();
		assert_eq!(removed, 1);
	}
}
