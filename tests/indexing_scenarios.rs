// SPDX-License-Identifier: Apache-2.0

//! Black-box scenarios from the testable-properties list: run the
//! Coordinator end to end against an in-memory store and a deterministic
//! embedder, using throwaway `tempfile` workspaces.

use std::fs;
use std::sync::Arc;

use codectx::config::Config;
use codectx::coordinator::Coordinator;
use codectx::embedding::{Embedder, HashEmbedder};
use codectx::error::CoreError;
use codectx::query::QueryService;
use codectx::state::{RunState, StateManager};
use codectx::store::{MemoryStore, VectorStoreClient};
use tempfile::tempdir;

fn new_stack(root: &std::path::Path) -> (Coordinator, QueryService) {
	let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(24));
	let store: Arc<dyn VectorStoreClient> = Arc::new(MemoryStore::new());
	let state = Arc::new(StateManager::new());
	let coordinator = Coordinator::new(root.to_path_buf(), "scenario".to_string(), embedder.clone(), store.clone(), state);
	let query = QueryService::new("scenario".to_string(), embedder, store);
	(coordinator, query)
}

#[tokio::test]
async fn scenario_1_empty_workspace() {
	let dir = tempdir().unwrap();
	fs::create_dir_all(dir.path().join("node_modules")).unwrap();
	fs::write(dir.path().join("node_modules/dep.js"), "module.exports = {}").unwrap();
	fs::write(dir.path().join(".hidden"), "secret").unwrap();

	let (coordinator, _query) = new_stack(dir.path());

	let mut progress = coordinator.state().subscribe();
	let summary = coordinator.run_full_index().await.unwrap();

	assert_eq!(summary.files_discovered, 0);
	assert_eq!(summary.chunks_indexed, 0);
	assert_eq!(coordinator.state().current_state(), RunState::Complete);

	let event = progress.recv().await.unwrap();
	assert_eq!(event.files_processed, 0);
	assert_eq!(event.files_total, 0);
}

#[tokio::test]
async fn scenario_2_small_typescript_file() {
	let dir = tempdir().unwrap();
	fs::write(
		dir.path().join("widgets.ts"),
		"export function alpha() {\n  return 1;\n}\n\nexport function beta() {\n  return 2;\n}\n",
	)
	.unwrap();

	let (coordinator, query) = new_stack(dir.path());
	let summary = coordinator.run_full_index().await.unwrap();

	assert_eq!(summary.chunks_indexed, 2);

	let info = query.collection_info().await.unwrap().unwrap();
	assert_eq!(info.point_count, 2);

	let hits = query.search("alpha", Some(1), None).await.unwrap();
	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].point.symbol.as_deref(), Some("alpha"));
}

#[tokio::test]
async fn scenario_3_oversized_file_falls_back_to_windows() {
	let dir = tempdir().unwrap();
	let line = "x".repeat(60);
	let mut content = String::new();
	for _ in 0..6000 {
		content.push_str(&line);
		content.push('\n');
	}
	assert!(content.len() > 100 * 1024);
	fs::write(dir.path().join("huge.rs"), &content).unwrap();

	let (coordinator, _query) = new_stack(dir.path());
	let summary = coordinator.run_full_index().await.unwrap();

	assert!(summary.chunks_indexed > 0);
	assert!(summary.chunks_indexed <= 20);
}

#[tokio::test]
async fn scenario_4_rename_moves_points_to_the_new_path() {
	let dir = tempdir().unwrap();
	let original = dir.path().join("a.ts");
	fs::write(&original, "export function alpha() { return 1; }\n").unwrap();

	let (coordinator, query) = new_stack(dir.path());
	coordinator.run_full_index().await.unwrap();
	let before = query.file_context("a.ts").await.unwrap();
	assert!(!before.is_empty());

	let renamed = dir.path().join("b.ts");
	fs::rename(&original, &renamed).unwrap();
	coordinator.remove_file(&original).await.unwrap();
	coordinator.update_file(&renamed).await.unwrap();

	let after_old = query.file_context("a.ts").await.unwrap();
	let after_new = query.file_context("b.ts").await.unwrap();
	assert!(after_old.is_empty());
	assert_eq!(after_new.len(), before.len());
}

#[tokio::test]
async fn scenario_6_dimension_mismatch_fails_the_run_and_preserves_existing_points() {
	let dir = tempdir().unwrap();
	fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();

	let store: Arc<dyn VectorStoreClient> = Arc::new(MemoryStore::new());
	let small_embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(8));
	let state = Arc::new(StateManager::new());
	let coordinator = Coordinator::new(dir.path().to_path_buf(), "scenario".to_string(), small_embedder, store.clone(), state.clone());
	coordinator.run_full_index().await.unwrap();
	let before = store.info("scenario").await.unwrap().unwrap();
	assert_eq!(before.point_count, 1);

	let big_embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(16));
	let mismatched = Coordinator::new(dir.path().to_path_buf(), "scenario".to_string(), big_embedder, store.clone(), state.clone());
	let err = mismatched.run_full_index().await.unwrap_err();
	assert!(matches!(err, CoreError::DimensionMismatch { .. }));
	assert_eq!(state.current_state(), RunState::Failed);

	let after = store.info("scenario").await.unwrap().unwrap();
	assert_eq!(after.point_count, before.point_count);

	mismatched.clear_index().await.unwrap();
	state.clear_error();
	mismatched.run_full_index().await.unwrap();
	let final_info = store.info("scenario").await.unwrap().unwrap();
	assert_eq!(final_info.dimension, 16);
}

#[tokio::test]
async fn second_start_indexing_is_rejected_while_a_run_is_active() {
	let dir = tempdir().unwrap();
	fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
	let (coordinator, _query) = new_stack(dir.path());

	coordinator.state().try_start().unwrap();
	let err = coordinator.run_full_index().await.unwrap_err();
	assert!(matches!(err, CoreError::RunAlreadyActive));
}

#[tokio::test]
async fn pause_resume_stop_cancel_are_rejected_without_an_active_run() {
	let dir = tempdir().unwrap();
	let (coordinator, _query) = new_stack(dir.path());

	assert!(matches!(coordinator.pause(), Err(CoreError::NoActiveRun)));
	assert!(matches!(coordinator.resume(), Err(CoreError::NoActiveRun)));
	assert!(matches!(coordinator.stop(), Err(CoreError::NoActiveRun)));
	assert!(matches!(coordinator.cancel(), Err(CoreError::NoActiveRun)));
}

#[tokio::test]
async fn reindexing_the_same_file_twice_does_not_grow_the_point_count() {
	let dir = tempdir().unwrap();
	fs::write(dir.path().join("a.rs"), "fn a() {}\nfn b() {}\n").unwrap();
	let (coordinator, query) = new_stack(dir.path());

	coordinator.run_full_index().await.unwrap();
	let first = query.collection_info().await.unwrap().unwrap().point_count;

	coordinator.run_full_index().await.unwrap();
	let second = query.collection_info().await.unwrap().unwrap().point_count;

	assert_eq!(first, second);
}

#[tokio::test]
async fn config_defaults_round_trip_through_a_workspace_file() {
	let dir = tempdir().unwrap();
	let config = Config::default();
	config.save(dir.path()).unwrap();
	let loaded = Config::load(dir.path()).unwrap();
	assert_eq!(loaded.chunker.oversize_ceiling_bytes, config.chunker.oversize_ceiling_bytes);
}
