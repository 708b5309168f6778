// SPDX-License-Identifier: Apache-2.0

//! Query Service (§4.10): embeds a query string and asks the Vector Store
//! Client for the nearest points, plus two path-anchored lookups that
//! sidestep similarity search entirely.

use std::sync::Arc;

use crate::constants::DEFAULT_SEARCH_TOP_K;
use crate::embedding::Embedder;
use crate::error::{CoreError, CoreResult};
use crate::store::{IndexedPoint, SearchHit, VectorStoreClient};

pub struct QueryService {
	collection: String,
	embedder: Arc<dyn Embedder>,
	store: Arc<dyn VectorStoreClient>,
}

impl QueryService {
	pub fn new(collection: String, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStoreClient>) -> Self {
		Self { collection, embedder, store }
	}

	/// Top-k nearest chunks to `query`, optionally restricted to files whose
	/// relative path starts with `path_prefix`.
	pub async fn search(&self, query: &str, top_k: Option<usize>, path_prefix: Option<&str>) -> CoreResult<Vec<SearchHit>> {
		if query.trim().is_empty() {
			return Err(CoreError::InvalidQuery("query text is empty".to_string()));
		}
		let top_k = top_k.unwrap_or(DEFAULT_SEARCH_TOP_K).max(1);

		let mut vectors = self.embedder.embed_batch(std::slice::from_ref(&query.to_string())).await?;
		let vector = vectors.pop().ok_or_else(|| CoreError::Embed("embedder returned no vector for the query".to_string()))?;

		self.store.search(&self.collection, &vector, top_k, path_prefix).await
	}

	/// Metadata for this workspace's collection, or `None` if indexing has
	/// never run (§6: "index info").
	pub async fn collection_info(&self) -> CoreResult<Option<crate::store::CollectionInfo>> {
		self.store.info(&self.collection).await
	}

	/// Every indexed chunk belonging to `relative_path`, in source order —
	/// the whole-file view a caller gets after a search hit (§4.10).
	pub async fn file_context(&self, relative_path: &str) -> CoreResult<Vec<IndexedPoint>> {
		self.store.list_by_file(&self.collection, relative_path).await
	}

	/// Files most semantically related to `relative_path`: every chunk of
	/// that file is used as a query and the resulting hits are merged,
	/// excluding the file itself, keeping each other file's closest match.
	pub async fn related_files(&self, relative_path: &str, top_k: Option<usize>) -> CoreResult<Vec<SearchHit>> {
		let top_k = top_k.unwrap_or(DEFAULT_SEARCH_TOP_K).max(1);
		let anchor_points = self.store.list_by_file(&self.collection, relative_path).await?;
		if anchor_points.is_empty() {
			return Ok(Vec::new());
		}

		let mut best_by_file: std::collections::HashMap<String, SearchHit> = std::collections::HashMap::new();
		for anchor in &anchor_points {
			if anchor.vector.is_empty() {
				continue;
			}
			let hits = self.store.search(&self.collection, &anchor.vector, top_k + anchor_points.len(), None).await?;
			for hit in hits {
				if hit.point.relative_path == relative_path {
					continue;
				}
				best_by_file
					.entry(hit.point.relative_path.clone())
					.and_modify(|existing| {
						if hit.distance < existing.distance {
							*existing = hit.clone();
						}
					})
					.or_insert(hit);
			}
		}

		let mut hits: Vec<SearchHit> = best_by_file.into_values().collect();
		hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(top_k);
		Ok(hits)
	}
}
