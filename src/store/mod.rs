// SPDX-License-Identifier: Apache-2.0

//! Vector Store Client (§4.6): the capability interface for persisting and
//! querying [`IndexedPoint`]s, plus the two implementations chosen at
//! process start — an in-memory store for tests and light consumers, and a
//! lancedb-backed store (feature `lancedb-store`, default-on) for real
//! workspaces.

#[cfg(feature = "lancedb-store")]
mod lancedb_store;
mod memory_store;

#[cfg(feature = "lancedb-store")]
pub use lancedb_store::LanceDbStore;
pub use memory_store::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkKind, CodeChunk};
use crate::error::CoreResult;

/// One embedded chunk as persisted in the vector store (§3: "Indexed
/// Point").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPoint {
	pub id: String,
	pub relative_path: String,
	pub kind: ChunkKind,
	pub symbol: Option<String>,
	pub language: Option<String>,
	pub start_line: usize,
	pub end_line: usize,
	pub content: String,
	pub content_hash: String,
	pub vector: Vec<f32>,
}

impl IndexedPoint {
	pub fn from_chunk(chunk: &CodeChunk, vector: Vec<f32>) -> Self {
		Self {
			id: chunk.stable_id(),
			relative_path: chunk.relative_path.clone(),
			kind: chunk.kind,
			symbol: chunk.symbol.clone(),
			language: chunk.language.map(|l| l.to_string()),
			start_line: chunk.start_line,
			end_line: chunk.end_line,
			content: chunk.content.clone(),
			content_hash: chunk.content_hash(),
			vector,
		}
	}
}

/// One result of a similarity search: a point plus its distance from the
/// query (lower is closer, under cosine distance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
	pub point: IndexedPoint,
	pub distance: f32,
}

/// Metadata describing a collection's fixed shape (§3: "Collection").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
	pub name: String,
	pub dimension: usize,
	pub point_count: usize,
}

/// Health status of the backing store, used by the readiness probe before
/// starting a run (§4.8 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreHealth {
	Ready,
	Unavailable,
}

/// Capability interface chosen once at process start (§9: "capability
/// interfaces, not hot-swappable").
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
	/// Ensure `collection` exists with the given `dimension`. If it already
	/// exists with a different dimension, returns
	/// [`CoreError::DimensionMismatch`](crate::error::CoreError::DimensionMismatch).
	async fn ensure_collection(&self, collection: &str, dimension: usize) -> CoreResult<()>;

	/// Insert or overwrite points, keyed by [`IndexedPoint::id`]. A point
	/// whose id already exists is replaced in place.
	async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> CoreResult<()>;

	/// Remove every point belonging to `relative_path`. Returns the number
	/// removed.
	async fn delete_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<usize>;

	/// Every point belonging to `relative_path`, ordered by start line. Used
	/// by the Query Service's file-context lookup rather than a similarity
	/// search (§4.10).
	async fn list_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<Vec<IndexedPoint>>;

	/// Drop the entire collection (§4.8: `clear_index`).
	async fn delete_collection(&self, collection: &str) -> CoreResult<()>;

	/// Top-k nearest neighbors by cosine distance, optionally restricted to
	/// a file path prefix.
	async fn search(
		&self,
		collection: &str,
		query_vector: &[f32],
		top_k: usize,
		path_prefix: Option<&str>,
	) -> CoreResult<Vec<SearchHit>>;

	async fn info(&self, collection: &str) -> CoreResult<Option<CollectionInfo>>;

	async fn health(&self) -> StoreHealth;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_point(id: &str, path: &str, vector: Vec<f32>) -> IndexedPoint {
		IndexedPoint {
			id: id.to_string(),
			relative_path: path.to_string(),
			kind: ChunkKind::Function,
			symbol: Some("f".to_string()),
			language: Some("rust".to_string()),
			start_line: 1,
			end_line: 2,
			content: "fn f() {}".to_string(),
			content_hash: "deadbeef".to_string(),
			vector,
		}
	}

	#[tokio::test]
	async fn ensure_collection_rejects_dimension_change() {
		let store = MemoryStore::new();
		store.ensure_collection("c", 4).await.unwrap();
		let err = store.ensure_collection("c", 8).await.unwrap_err();
		assert!(matches!(err, crate::error::CoreError::DimensionMismatch { .. }));
	}

	#[tokio::test]
	async fn upsert_then_search_finds_the_closest_point() {
		let store = MemoryStore::new();
		store.ensure_collection("c", 2).await.unwrap();
		store
			.upsert(
				"c",
				vec![
					sample_point("a", "a.rs", vec![1.0, 0.0]),
					sample_point("b", "b.rs", vec![0.0, 1.0]),
				],
			)
			.await
			.unwrap();

		let hits = store.search("c", &[1.0, 0.0], 1, None).await.unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].point.id, "a");
	}

	#[tokio::test]
	async fn delete_by_file_removes_only_that_files_points() {
		let store = MemoryStore::new();
		store.ensure_collection("c", 2).await.unwrap();
		store
			.upsert(
				"c",
				vec![
					sample_point("a", "a.rs", vec![1.0, 0.0]),
					sample_point("b", "b.rs", vec![0.0, 1.0]),
				],
			)
			.await
			.unwrap();

		let removed = store.delete_by_file("c", "a.rs").await.unwrap();
		assert_eq!(removed, 1);

		let info = store.info("c").await.unwrap().unwrap();
		assert_eq!(info.point_count, 1);
	}

	#[tokio::test]
	async fn list_by_file_returns_only_that_files_points_in_line_order() {
		let store = MemoryStore::new();
		store.ensure_collection("c", 2).await.unwrap();
		let mut second = sample_point("b", "a.rs", vec![0.0, 1.0]);
		second.start_line = 1;
		let mut first = sample_point("a", "a.rs", vec![1.0, 0.0]);
		first.start_line = 10;
		store
			.upsert("c", vec![first, second, sample_point("c", "other.rs", vec![1.0, 1.0])])
			.await
			.unwrap();

		let points = store.list_by_file("c", "a.rs").await.unwrap();
		assert_eq!(points.len(), 2);
		assert_eq!(points[0].id, "b");
		assert_eq!(points[1].id, "a");
	}

	#[tokio::test]
	async fn upsert_with_same_id_replaces_in_place() {
		let store = MemoryStore::new();
		store.ensure_collection("c", 2).await.unwrap();
		store.upsert("c", vec![sample_point("a", "a.rs", vec![1.0, 0.0])]).await.unwrap();
		store.upsert("c", vec![sample_point("a", "a.rs", vec![0.0, 1.0])]).await.unwrap();

		let info = store.info("c").await.unwrap().unwrap();
		assert_eq!(info.point_count, 1);
	}
}
