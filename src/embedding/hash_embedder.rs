// SPDX-License-Identifier: Apache-2.0

//! A deterministic, local embedder with no external dependencies: each
//! dimension of the output vector is derived from a SHA-256 hash of the
//! input text salted with the dimension index, then L2-normalized. Used as
//! the default embedder for tests and for workspaces with no configured
//! provider — it produces stable, reproducible vectors, not semantically
//! meaningful ones.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::Embedder;
use crate::error::CoreResult;

pub struct HashEmbedder {
	dimension: usize,
}

impl HashEmbedder {
	pub fn new(dimension: usize) -> Self {
		Self { dimension }
	}
}

impl Default for HashEmbedder {
	fn default() -> Self {
		Self::new(256)
	}
}

fn embed_one(text: &str, dimension: usize) -> Vec<f32> {
	let mut values = Vec::with_capacity(dimension);
	for i in 0..dimension {
		let mut hasher = Sha256::new();
		hasher.update(text.as_bytes());
		hasher.update(i.to_le_bytes());
		let digest = hasher.finalize();
		// Fold the first 8 bytes of the digest into a signed, roughly
		// unit-scaled float.
		let mut bytes = [0u8; 8];
		bytes.copy_from_slice(&digest[0..8]);
		let raw = i64::from_le_bytes(bytes) as f64;
		values.push((raw / i64::MAX as f64) as f32);
	}

	let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
	if norm > f32::EPSILON {
		for v in values.iter_mut() {
			*v /= norm;
		}
	}
	values
}

#[async_trait]
impl Embedder for HashEmbedder {
	fn name(&self) -> &str {
		"hash-local"
	}

	fn dimension(&self) -> usize {
		self.dimension
	}

	async fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
		Ok(texts.iter().map(|t| embed_one(t, self.dimension)).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn different_texts_produce_different_vectors() {
		let a = embed_one("fn a() {}", 32);
		let b = embed_one("fn b() {}", 32);
		assert_ne!(a, b);
	}

	#[test]
	fn output_is_unit_normalized() {
		let v = embed_one("some content", 64);
		let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
		assert!((norm - 1.0).abs() < 1e-4);
	}
}
