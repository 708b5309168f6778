// SPDX-License-Identifier: Apache-2.0

//! lancedb-backed [`VectorStoreClient`] implementation. One lancedb table
//! per collection, with a fixed-size-list `vector` column and cosine
//! distance search.

use std::sync::Arc;

use arrow::array::{Array, FixedSizeListArray, Float32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};

use crate::chunk::ChunkKind;
use crate::error::{CoreError, CoreResult};

use super::{CollectionInfo, IndexedPoint, SearchHit, StoreHealth, VectorStoreClient};

pub struct LanceDbStore {
	db: Connection,
}

impl LanceDbStore {
	pub async fn open(database_path: &std::path::Path) -> CoreResult<Self> {
		let db = connect(&database_path.to_string_lossy())
			.execute()
			.await
			.map_err(|e| CoreError::Store(format!("failed to open lancedb at {}: {e}", database_path.display())))?;
		Ok(Self { db })
	}

	fn schema(dimension: usize) -> Arc<Schema> {
		Arc::new(Schema::new(vec![
			Field::new("id", DataType::Utf8, false),
			Field::new("path", DataType::Utf8, false),
			Field::new("kind", DataType::Utf8, false),
			Field::new("symbol", DataType::Utf8, true),
			Field::new("language", DataType::Utf8, true),
			Field::new("start_line", DataType::UInt32, false),
			Field::new("end_line", DataType::UInt32, false),
			Field::new("content", DataType::Utf8, false),
			Field::new("content_hash", DataType::Utf8, false),
			Field::new(
				"vector",
				DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
				true,
			),
		]))
	}

	fn points_to_batch(points: &[IndexedPoint], dimension: usize) -> CoreResult<RecordBatch> {
		let schema = Self::schema(dimension);

		let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
		let paths: Vec<&str> = points.iter().map(|p| p.relative_path.as_str()).collect();
		let kinds: Vec<&str> = points.iter().map(|p| p.kind.as_str()).collect();
		let symbols: Vec<Option<&str>> = points.iter().map(|p| p.symbol.as_deref()).collect();
		let languages: Vec<Option<&str>> = points.iter().map(|p| p.language.as_deref()).collect();
		let start_lines: Vec<u32> = points.iter().map(|p| p.start_line as u32).collect();
		let end_lines: Vec<u32> = points.iter().map(|p| p.end_line as u32).collect();
		let contents: Vec<&str> = points.iter().map(|p| p.content.as_str()).collect();
		let hashes: Vec<&str> = points.iter().map(|p| p.content_hash.as_str()).collect();

		let mut flattened = Vec::with_capacity(points.len() * dimension);
		for point in points {
			flattened.extend_from_slice(&point.vector);
		}
		let vector_values = Float32Array::from(flattened);
		let vector_array = FixedSizeListArray::new(
			Arc::new(Field::new("item", DataType::Float32, true)),
			dimension as i32,
			Arc::new(vector_values),
			None,
		);

		RecordBatch::try_new(
			schema,
			vec![
				Arc::new(StringArray::from(ids)),
				Arc::new(StringArray::from(paths)),
				Arc::new(StringArray::from(kinds)),
				Arc::new(StringArray::from(symbols)),
				Arc::new(StringArray::from(languages)),
				Arc::new(UInt32Array::from(start_lines)),
				Arc::new(UInt32Array::from(end_lines)),
				Arc::new(StringArray::from(contents)),
				Arc::new(StringArray::from(hashes)),
				Arc::new(vector_array),
			],
		)
		.map_err(|e| CoreError::Store(format!("failed to build record batch: {e}")))
	}

	fn row_to_point(batch: &RecordBatch, row: usize) -> Option<IndexedPoint> {
		let col = |name: &str| batch.column_by_name(name);
		let id = col("id")?.as_any().downcast_ref::<StringArray>()?.value(row).to_string();
		let path = col("path")?.as_any().downcast_ref::<StringArray>()?.value(row).to_string();
		let kind_str = col("kind")?.as_any().downcast_ref::<StringArray>()?.value(row).to_string();
		let symbol_arr = col("symbol")?.as_any().downcast_ref::<StringArray>()?;
		let symbol = (!symbol_arr.is_null(row)).then(|| symbol_arr.value(row).to_string());
		let language_arr = col("language")?.as_any().downcast_ref::<StringArray>()?;
		let language = (!language_arr.is_null(row)).then(|| language_arr.value(row).to_string());
		let start_line = col("start_line")?.as_any().downcast_ref::<UInt32Array>()?.value(row) as usize;
		let end_line = col("end_line")?.as_any().downcast_ref::<UInt32Array>()?.value(row) as usize;
		let content = col("content")?.as_any().downcast_ref::<StringArray>()?.value(row).to_string();
		let content_hash = col("content_hash")?.as_any().downcast_ref::<StringArray>()?.value(row).to_string();

		let kind = match kind_str.as_str() {
			"function" => ChunkKind::Function,
			"method" => ChunkKind::Method,
			"class" => ChunkKind::Class,
			"interface" => ChunkKind::Interface,
			"struct" => ChunkKind::Struct,
			"enum" => ChunkKind::Enum,
			"namespace" => ChunkKind::Namespace,
			"module" => ChunkKind::Module,
			_ => ChunkKind::TextWindow,
		};

		Some(IndexedPoint {
			id,
			relative_path: path,
			kind,
			symbol,
			language,
			start_line,
			end_line,
			content,
			content_hash,
			vector: Vec::new(),
		})
	}
}

#[async_trait]
impl VectorStoreClient for LanceDbStore {
	async fn ensure_collection(&self, collection: &str, dimension: usize) -> CoreResult<()> {
		let existing = self
			.db
			.table_names()
			.execute()
			.await
			.map_err(|e| CoreError::Store(e.to_string()))?;

		if existing.contains(&collection.to_string()) {
			let table = self
				.db
				.open_table(collection)
				.execute()
				.await
				.map_err(|e| CoreError::Store(e.to_string()))?;
			let actual_dim = table
				.schema()
				.await
				.map_err(|e| CoreError::Store(e.to_string()))?
				.field_with_name("vector")
				.ok()
				.and_then(|f| match f.data_type() {
					DataType::FixedSizeList(_, n) => Some(*n as usize),
					_ => None,
				})
				.unwrap_or(dimension);
			if actual_dim != dimension {
				return Err(CoreError::DimensionMismatch {
					collection: collection.to_string(),
					existing: actual_dim,
					requested: dimension,
				});
			}
			return Ok(());
		}

		self.db
			.create_empty_table(collection, Self::schema(dimension))
			.execute()
			.await
			.map_err(|e| CoreError::Store(format!("failed to create collection {collection}: {e}")))?;
		Ok(())
	}

	async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> CoreResult<()> {
		if points.is_empty() {
			return Ok(());
		}

		let dimension = points[0].vector.len();
		let ids: Vec<String> = points.iter().map(|p| p.id.clone()).collect();
		let batch = Self::points_to_batch(&points, dimension)?;

		let table = self
			.db
			.open_table(collection)
			.execute()
			.await
			.map_err(|e| CoreError::Store(format!("collection {collection} not found: {e}")))?;

		// Replace-in-place semantics: drop any existing rows sharing an id
		// before adding the fresh batch.
		let id_filter = ids.iter().map(|id| format!("id = '{id}'")).collect::<Vec<_>>().join(" OR ");
		if !id_filter.is_empty() {
			let _ = table.delete(&id_filter).await;
		}

		use std::iter::once;
		let schema = batch.schema();
		let reader = arrow::record_batch::RecordBatchIterator::new(once(Ok(batch)), schema);
		table
			.add(reader)
			.execute()
			.await
			.map_err(|e| CoreError::Store(format!("failed to add rows to {collection}: {e}")))?;

		Ok(())
	}

	async fn delete_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<usize> {
		let table = match self.db.open_table(collection).execute().await {
			Ok(t) => t,
			Err(_) => return Ok(0),
		};

		let before = table.count_rows(None).await.map_err(|e| CoreError::Store(e.to_string()))?;
		table
			.delete(&format!("path = '{relative_path}'"))
			.await
			.map_err(|e| CoreError::Store(format!("failed to delete from {collection}: {e}")))?;
		let after = table.count_rows(None).await.map_err(|e| CoreError::Store(e.to_string()))?;
		Ok(before.saturating_sub(after))
	}

	async fn list_by_file(&self, collection: &str, relative_path: &str) -> CoreResult<Vec<IndexedPoint>> {
		let table = match self.db.open_table(collection).execute().await {
			Ok(t) => t,
			Err(_) => return Ok(Vec::new()),
		};

		let mut stream = table
			.query()
			.only_if(format!("path = '{relative_path}'"))
			.execute()
			.await
			.map_err(|e| CoreError::Store(e.to_string()))?;

		let mut points = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(|e| CoreError::Store(e.to_string()))? {
			for row in 0..batch.num_rows() {
				if let Some(point) = Self::row_to_point(&batch, row) {
					points.push(point);
				}
			}
		}
		points.sort_by_key(|p| p.start_line);
		Ok(points)
	}

	async fn delete_collection(&self, collection: &str) -> CoreResult<()> {
		let existing = self
			.db
			.table_names()
			.execute()
			.await
			.map_err(|e| CoreError::Store(e.to_string()))?;
		if existing.contains(&collection.to_string()) {
			self.db
				.drop_table(collection)
				.await
				.map_err(|e| CoreError::Store(format!("failed to drop {collection}: {e}")))?;
		}
		Ok(())
	}

	async fn search(
		&self,
		collection: &str,
		query_vector: &[f32],
		top_k: usize,
		path_prefix: Option<&str>,
	) -> CoreResult<Vec<SearchHit>> {
		let table = match self.db.open_table(collection).execute().await {
			Ok(t) => t,
			Err(_) => return Ok(Vec::new()),
		};

		let mut query = table
			.vector_search(query_vector.to_vec())
			.map_err(|e| CoreError::Store(format!("failed to build vector search: {e}")))?
			.distance_type(DistanceType::Cosine)
			.limit(top_k);

		if let Some(prefix) = path_prefix {
			query = query.only_if(format!("path LIKE '{prefix}%'"));
		}

		let mut stream = query.execute().await.map_err(|e| CoreError::Store(e.to_string()))?;

		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(|e| CoreError::Store(e.to_string()))? {
			let distances = batch
				.column_by_name("_distance")
				.and_then(|c| c.as_any().downcast_ref::<Float32Array>().cloned());

			for row in 0..batch.num_rows() {
				if let Some(mut point) = Self::row_to_point(&batch, row) {
					let distance = distances.as_ref().map(|d| d.value(row)).unwrap_or(0.0);
					point.vector = Vec::new();
					hits.push(SearchHit { point, distance });
				}
			}
		}

		Ok(hits)
	}

	async fn info(&self, collection: &str) -> CoreResult<Option<CollectionInfo>> {
		let table = match self.db.open_table(collection).execute().await {
			Ok(t) => t,
			Err(_) => return Ok(None),
		};

		let dimension = table
			.schema()
			.await
			.map_err(|e| CoreError::Store(e.to_string()))?
			.field_with_name("vector")
			.ok()
			.and_then(|f| match f.data_type() {
				DataType::FixedSizeList(_, n) => Some(*n as usize),
				_ => None,
			})
			.unwrap_or(0);
		let point_count = table.count_rows(None).await.map_err(|e| CoreError::Store(e.to_string()))?;

		Ok(Some(CollectionInfo {
			name: collection.to_string(),
			dimension,
			point_count,
		}))
	}

	async fn health(&self) -> StoreHealth {
		match self.db.table_names().execute().await {
			Ok(_) => StoreHealth::Ready,
			Err(_) => StoreHealth::Unavailable,
		}
	}
}
