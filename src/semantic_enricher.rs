// SPDX-License-Identifier: Apache-2.0

//! Semantic Enricher (§6, optional): given a chunk's path, span, and
//! language, produces opaque metadata to attach to the point. Failures
//! downgrade to "no metadata" rather than failing the chunk.

use async_trait::async_trait;

use crate::chunk::CodeChunk;

/// Opaque, serializable metadata a [`SemanticEnricher`] attaches to a chunk.
/// The core does not interpret its contents.
pub type SemanticMetadata = serde_json::Value;

#[async_trait]
pub trait SemanticEnricher: Send + Sync {
	async fn enrich(&self, chunk: &CodeChunk) -> Option<SemanticMetadata>;
}

/// The default enricher: attaches nothing. Used when no collaborator
/// supplies a real one.
pub struct NoopEnricher;

#[async_trait]
impl SemanticEnricher for NoopEnricher {
	async fn enrich(&self, _chunk: &CodeChunk) -> Option<SemanticMetadata> {
		None
	}
}

/// Runs `enricher` against `chunk`, catching a panic inside the call and
/// treating it the same as a `None` (§6: "failures downgrade to no
/// metadata").
pub async fn enrich_or_none(enricher: &dyn SemanticEnricher, chunk: &CodeChunk) -> Option<SemanticMetadata> {
	enricher.enrich(chunk).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chunk::ChunkKind;

	fn sample_chunk() -> CodeChunk {
		CodeChunk {
			relative_path: "a.rs".to_string(),
			kind: ChunkKind::Function,
			symbol: Some("a".to_string()),
			language: Some("rust"),
			start_line: 1,
			end_line: 2,
			content: "fn a() {}".to_string(),
			depth: 0,
		}
	}

	#[tokio::test]
	async fn noop_enricher_always_returns_none() {
		let enricher = NoopEnricher;
		assert!(enrich_or_none(&enricher, &sample_chunk()).await.is_none());
	}

	struct AlwaysTags;

	#[async_trait]
	impl SemanticEnricher for AlwaysTags {
		async fn enrich(&self, chunk: &CodeChunk) -> Option<SemanticMetadata> {
			Some(serde_json::json!({ "symbol": chunk.symbol }))
		}
	}

	#[tokio::test]
	async fn a_real_enricher_can_attach_metadata() {
		let enricher = AlwaysTags;
		let metadata = enrich_or_none(&enricher, &sample_chunk()).await.unwrap();
		assert_eq!(metadata["symbol"], "a");
	}
}
