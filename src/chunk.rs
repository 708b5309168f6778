// SPDX-License-Identifier: Apache-2.0

//! Code Chunk (§3): the unit produced by the Chunker and embedded by the
//! Embedding Client.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What kind of syntactic unit a chunk represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
	Function,
	Method,
	Class,
	Interface,
	Struct,
	Enum,
	Namespace,
	Module,
	/// A fixed-size line window, used when a grammar has no meaningful kinds
	/// or the file exceeded the oversize ceiling (§4.4 item 3).
	TextWindow,
}

impl ChunkKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ChunkKind::Function => "function",
			ChunkKind::Method => "method",
			ChunkKind::Class => "class",
			ChunkKind::Interface => "interface",
			ChunkKind::Struct => "struct",
			ChunkKind::Enum => "enum",
			ChunkKind::Namespace => "namespace",
			ChunkKind::Module => "module",
			ChunkKind::TextWindow => "text_window",
		}
	}
}

/// A single syntactic (or windowed) slice of a file, ready for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
	pub relative_path: String,
	pub kind: ChunkKind,
	/// Name of the enclosing symbol, when the grammar exposes one (e.g. a
	/// function name). `None` for text windows and anonymous nodes.
	pub symbol: Option<String>,
	pub language: Option<&'static str>,
	/// 1-indexed, inclusive.
	pub start_line: usize,
	/// 1-indexed, inclusive.
	pub end_line: usize,
	pub content: String,
	/// Nesting depth from the file root (0 = top level), preserved so
	/// callers can reconstruct containment without re-parsing (§4.4:
	/// "explicit nesting").
	pub depth: usize,
}

impl CodeChunk {
	/// Lowercase hex SHA-256 of `content`, used both for the stable point id
	/// and for change detection between runs.
	pub fn content_hash(&self) -> String {
		hex_sha256(self.content.as_bytes())
	}

	/// Stable identifier (§3: "File Record" point id — derived from relative
	/// path + chunk start line + kind + content hash, so an unrelated edit
	/// elsewhere in the file does not change this chunk's id, but a content
	/// edit in place does).
	pub fn stable_id(&self) -> String {
		let mut hasher = Sha256::new();
		hasher.update(self.relative_path.as_bytes());
		hasher.update(b"\0");
		hasher.update(self.start_line.to_string().as_bytes());
		hasher.update(b"\0");
		hasher.update(self.kind.as_str().as_bytes());
		hasher.update(b"\0");
		hasher.update(self.content_hash().as_bytes());
		hex_digest(hasher)
	}
}

fn hex_sha256(bytes: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(bytes);
	hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
	let digest = hasher.finalize();
	digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample(start_line: usize, content: &str) -> CodeChunk {
		CodeChunk {
			relative_path: "src/lib.rs".to_string(),
			kind: ChunkKind::Function,
			symbol: Some("do_thing".to_string()),
			language: Some("rust"),
			start_line,
			end_line: start_line + 3,
			content: content.to_string(),
			depth: 1,
		}
	}

	#[test]
	fn stable_id_is_deterministic() {
		let a = sample(10, "fn do_thing() {}");
		let b = sample(10, "fn do_thing() {}");
		assert_eq!(a.stable_id(), b.stable_id());
	}

	#[test]
	fn content_edit_changes_stable_id() {
		let a = sample(10, "fn do_thing() {}");
		let b = sample(10, "fn do_thing() { todo!() }");
		assert_ne!(a.stable_id(), b.stable_id());
	}

	#[test]
	fn unrelated_shift_of_other_chunks_does_not_change_this_one() {
		// Changing only this chunk's own start_line changes its id (by
		// design — the id is anchored to position) but two chunks with
		// identical path/kind/content/start_line always collide, which is
		// exactly the point: the id is a pure function of these four
		// fields, nothing else in the file matters.
		let a = sample(10, "fn do_thing() {}");
		let b = sample(20, "fn do_thing() {}");
		assert_ne!(a.stable_id(), b.stable_id());
	}
}
