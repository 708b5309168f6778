// SPDX-License-Identifier: Apache-2.0

//! Message Surface (§4.13/§6): the transport-agnostic request/response
//! contract external collaborators call in through. `bin/ccserver.rs` maps
//! this onto newline-delimited JSON over stdio; a different binding could
//! map it onto anything else without touching this module.

use serde::{Deserialize, Serialize};

use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::query::QueryService;
use crate::state::ProgressEvent;
use crate::store::SearchHit;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
	StartIndexing,
	Pause,
	Resume,
	Stop,
	Cancel,
	ClearIndex,
	IndexInfo,
	WorkspaceStats,
	Search {
		query: String,
		#[serde(default)]
		top_k: Option<usize>,
		#[serde(default)]
		path_prefix: Option<String>,
	},
	FileContext {
		relative_path: String,
	},
	RelatedFiles {
		relative_path: String,
		#[serde(default)]
		top_k: Option<usize>,
	},
	UpdateFile {
		relative_path: String,
	},
	RemoveFile {
		relative_path: String,
	},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePayload {
	None,
	Search { hits: Vec<SearchHit> },
	IndexInfo { collection: Option<crate::store::CollectionInfo> },
	WorkspaceStats { is_indexing: bool, run_state: String },
	FileRemoved { count: usize },
}

/// A command's outcome, discriminated between accepted, rejected (a
/// precondition the caller could have checked, e.g. "a run is already
/// active"), and failed (an error surfaced from deeper in the pipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandResult {
	Accepted { payload: ResponsePayload },
	Rejected { reason: String },
	Failed { kind: String, message: String },
}

impl CommandResult {
	fn accepted(payload: ResponsePayload) -> Self {
		CommandResult::Accepted { payload }
	}

	fn from_error(error: CoreError) -> Self {
		match error {
			CoreError::RunAlreadyActive | CoreError::NoActiveRun => CommandResult::Rejected { reason: error.to_string() },
			other => CommandResult::Failed {
				kind: error_kind(&other).to_string(),
				message: other.to_string(),
			},
		}
	}
}

fn error_kind(error: &CoreError) -> &'static str {
	match error {
		CoreError::Configuration(_) => "configuration",
		CoreError::Discovery { .. } => "discovery",
		CoreError::FileIo { .. } => "file_io",
		CoreError::BinaryFile { .. } => "file_io",
		CoreError::ParseFatal { .. } => "parse_fatal",
		CoreError::Embed(_) => "embed",
		CoreError::Store(_) => "store",
		CoreError::DimensionMismatch { .. } => "dimension_mismatch",
		CoreError::InvalidQuery(_) => "invalid_query",
		CoreError::RunAlreadyActive => "run_already_active",
		CoreError::NoActiveRun => "no_active_run",
		CoreError::Cancelled => "cancelled",
	}
}

/// Binds the Message Surface contract to one workspace's [`Coordinator`]
/// and [`QueryService`]. Holds no state of its own beyond those two.
pub struct MessageSurface {
	coordinator: std::sync::Arc<Coordinator>,
	query: std::sync::Arc<QueryService>,
}

impl MessageSurface {
	pub fn new(coordinator: std::sync::Arc<Coordinator>, query: std::sync::Arc<QueryService>) -> Self {
		Self { coordinator, query }
	}

	pub async fn handle(&self, command: Command) -> CommandResult {
		match command {
			Command::StartIndexing => {
				let coordinator = self.coordinator.clone();
				tokio::spawn(async move {
					let _ = coordinator.run_full_index().await;
				});
				CommandResult::accepted(ResponsePayload::None)
			}
			Command::Pause => self.simple(self.coordinator.pause()),
			Command::Resume => self.simple(self.coordinator.resume()),
			Command::Stop => self.simple(self.coordinator.stop()),
			Command::Cancel => self.simple(self.coordinator.cancel()),
			Command::ClearIndex => match self.coordinator.clear_index().await {
				Ok(()) => CommandResult::accepted(ResponsePayload::None),
				Err(e) => CommandResult::from_error(e),
			},
			Command::IndexInfo => {
				let info = self.query.collection_info().await;
				match info {
					Ok(collection) => CommandResult::accepted(ResponsePayload::IndexInfo { collection }),
					Err(e) => CommandResult::from_error(e),
				}
			}
			Command::WorkspaceStats => {
				let state = self.coordinator.state();
				CommandResult::accepted(ResponsePayload::WorkspaceStats {
					is_indexing: state.is_indexing(),
					run_state: format!("{:?}", state.current_state()),
				})
			}
			Command::Search { query, top_k, path_prefix } => {
				match self.query.search(&query, top_k, path_prefix.as_deref()).await {
					Ok(hits) => CommandResult::accepted(ResponsePayload::Search { hits }),
					Err(e) => CommandResult::from_error(e),
				}
			}
			Command::FileContext { relative_path } => match self.query.file_context(&relative_path).await {
				Ok(points) => {
					let hits: Vec<SearchHit> = points.into_iter().map(|point| SearchHit { point, distance: 0.0 }).collect();
					CommandResult::accepted(ResponsePayload::Search { hits })
				}
				Err(e) => CommandResult::from_error(e),
			},
			Command::RelatedFiles { relative_path, top_k } => match self.query.related_files(&relative_path, top_k).await {
				Ok(hits) => CommandResult::accepted(ResponsePayload::Search { hits }),
				Err(e) => CommandResult::from_error(e),
			},
			Command::UpdateFile { relative_path } => {
				let absolute = self.coordinator.root().join(&relative_path);
				match self.coordinator.update_file(&absolute).await {
					Ok(()) => CommandResult::accepted(ResponsePayload::None),
					Err(e) => CommandResult::from_error(e),
				}
			}
			Command::RemoveFile { relative_path } => {
				let absolute = self.coordinator.root().join(&relative_path);
				match self.coordinator.remove_file(&absolute).await {
					Ok(count) => CommandResult::accepted(ResponsePayload::FileRemoved { count }),
					Err(e) => CommandResult::from_error(e),
				}
			}
		}
	}

	fn simple(&self, result: Result<(), CoreError>) -> CommandResult {
		match result {
			Ok(()) => CommandResult::accepted(ResponsePayload::None),
			Err(e) => CommandResult::from_error(e),
		}
	}

	/// A stream of Progress Events for the "subscribe progress" command
	/// (§6) — kept as a separate subscription rather than a `Command`
	/// variant since it returns a stream, not a single result.
	pub fn subscribe_progress(&self) -> tokio::sync::broadcast::Receiver<ProgressEvent> {
		self.coordinator.state().subscribe()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::embedding::{Embedder, HashEmbedder};
	use crate::state::StateManager;
	use crate::store::{MemoryStore, VectorStoreClient};
	use std::fs;
	use std::sync::Arc;
	use tempfile::tempdir;

	fn new_surface(root: &std::path::Path) -> MessageSurface {
		let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(16));
		let store: Arc<dyn VectorStoreClient> = Arc::new(MemoryStore::new());
		let state = Arc::new(StateManager::new());
		let coordinator = Arc::new(Coordinator::new(
			root.to_path_buf(),
			"test_collection".to_string(),
			embedder.clone(),
			store.clone(),
			state,
		));
		let query = Arc::new(QueryService::new("test_collection".to_string(), embedder, store));
		MessageSurface::new(coordinator, query)
	}

	#[tokio::test]
	async fn search_with_blank_query_is_rejected_as_a_failure() {
		let dir = tempdir().unwrap();
		let surface = new_surface(dir.path());
		let result = surface
			.handle(Command::Search {
				query: String::new(),
				top_k: None,
				path_prefix: None,
			})
			.await;
		assert!(matches!(result, CommandResult::Failed { .. }));
	}

	#[tokio::test]
	async fn update_then_remove_file_round_trips_through_commands() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
		let surface = new_surface(dir.path());

		let updated = surface
			.handle(Command::UpdateFile {
				relative_path: "a.rs".to_string(),
			})
			.await;
		assert!(matches!(updated, CommandResult::Accepted { .. }));

		let removed = surface
			.handle(Command::RemoveFile {
				relative_path: "a.rs".to_string(),
			})
			.await;
		match removed {
			CommandResult::Accepted {
				payload: ResponsePayload::FileRemoved { count },
			} => assert_eq!(count, 1),
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[tokio::test]
	async fn pause_without_an_active_run_is_rejected_not_failed() {
		let dir = tempdir().unwrap();
		let surface = new_surface(dir.path());
		let result = surface.handle(Command::Pause).await;
		assert!(matches!(result, CommandResult::Rejected { .. }));
	}
}
