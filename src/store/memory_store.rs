// SPDX-License-Identifier: Apache-2.0

//! In-memory [`VectorStoreClient`] implementation: a brute-force cosine
//! scan per collection. Used for tests and for workspaces that prefer not
//! to run the lancedb backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};

use super::{CollectionInfo, IndexedPoint, SearchHit, StoreHealth, VectorStoreClient};

struct Collection {
	dimension: usize,
	points: HashMap<String, IndexedPoint>,
}

#[derive(Default)]
pub struct MemoryStore {
	collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
		return 1.0;
	}
	1.0 - (dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStoreClient for MemoryStore {
	async fn ensure_collection(&self, collection: &str, dimension: usize) -> CoreResult<()> {
		let mut collections = self.collections.write();
		if let Some(existing) = collections.get(collection) {
			if existing.dimension != dimension {
				return Err(CoreError::DimensionMismatch {
					collection: collection.to_string(),
					existing: existing.dimension,
					requested: dimension,
				});
			}
			return Ok(());
		}
		collections.insert(
			collection.to_string(),
			Collection {
				dimension,
				points: HashMap::new(),
			},
		);
		Ok(())
	}

	async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> CoreResult<()> {
		let mut collections = self.collections.write();
		let entry = collections
			.get_mut(collection)
			.ok_or_else(|| CoreError::Store(format!("collection {collection} does not exist")))?;

		for point in points {
			if point.vector.len() != entry.dimension {
				return Err(CoreError::DimensionMismatch {
					collection: collection.to_string(),
					existing: entry.dimension,
					requested: point.vector.len(),
				});
			}
			entry.points.insert(point.id.clone(), point);
		}
		Ok(())
	}

	async fn delete_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<usize> {
		let mut collections = self.collections.write();
		let Some(entry) = collections.get_mut(collection) else {
			return Ok(0);
		};
		let before = entry.points.len();
		entry.points.retain(|_, p| p.relative_path != relative_path);
		Ok(before - entry.points.len())
	}

	async fn list_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<Vec<IndexedPoint>> {
		let collections = self.collections.read();
		let Some(entry) = collections.get(collection) else {
			return Ok(Vec::new());
		};
		let mut points: Vec<IndexedPoint> = entry.points.values().filter(|p| p.relative_path == relative_path).cloned().collect();
		points.sort_by_key(|p| p.start_line);
		Ok(points)
	}

	async fn delete_collection(&self, collection: &str) -> CoreResult<()> {
		self.collections.write().remove(collection);
		Ok(())
	}

	async fn search(
		&self,
		collection: &str,
		query_vector: &[f32],
		top_k: usize,
		path_prefix: Option<&str>,
	) -> CoreResult<Vec<SearchHit>> {
		let collections = self.collections.read();
		let Some(entry) = collections.get(collection) else {
			return Ok(Vec::new());
		};

		let mut hits: Vec<SearchHit> = entry
			.points
			.values()
			.filter(|p| path_prefix.is_none_or(|prefix| p.relative_path.starts_with(prefix)))
			.map(|p| SearchHit {
				point: p.clone(),
				distance: cosine_distance(query_vector, &p.vector),
			})
			.collect();

		hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(top_k);
		Ok(hits)
	}

	async fn info(&self, collection: &str) -> CoreResult<Option<CollectionInfo>> {
		let collections = self.collections.read();
		Ok(collections.get(collection).map(|entry| CollectionInfo {
			name: collection.to_string(),
			dimension: entry.dimension,
			point_count: entry.points.len(),
		}))
	}

	async fn health(&self) -> StoreHealth {
		StoreHealth::Ready
	}
}
