// SPDX-License-Identifier: Apache-2.0

//! Per-language grammar bindings: each supported language implements
//! [`Language`], declaring which tree-sitter node kinds are meaningful chunk
//! boundaries and how to recover a human-readable name for one.

use std::path::Path;

use tree_sitter::Node;

use crate::chunk::ChunkKind;

mod bash;
mod cpp;
mod go;
mod javascript;
mod python;
mod ruby;
mod rust;
mod typescript;

pub use bash::Bash;
pub use cpp::Cpp;
pub use go::Go;
pub use javascript::JavaScript;
pub use python::Python;
pub use ruby::Ruby;
pub use rust::Rust;
pub use typescript::TypeScript;

/// Capability interface for one language grammar, chosen once at process
/// start via [`get_language`] (§4.3: "capability-gated", not hot-swappable).
pub trait Language: Send + Sync {
	fn name(&self) -> &'static str;
	fn get_ts_language(&self) -> tree_sitter::Language;

	/// Classify a node as a chunk boundary, or `None` if it is not one (its
	/// children may still be). Takes the node itself, rather than just its
	/// kind string, so implementations can inspect the parent to tell a
	/// free function from a method defined inside a class/impl body.
	fn classify(&self, node: Node) -> Option<ChunkKind>;

	/// Best-effort symbol name for a node already identified as a chunk
	/// boundary. Falls back to `None` when the grammar shape is unexpected.
	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			let kind = child.kind();
			if kind.contains("identifier") || kind.contains("name") {
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}

/// Returns a language implementation by name, or `None` if unsupported.
pub fn get_language(name: &str) -> Option<Box<dyn Language>> {
	match name {
		"rust" => Some(Box::new(Rust {})),
		"python" => Some(Box::new(Python {})),
		"javascript" => Some(Box::new(JavaScript {})),
		"typescript" => Some(Box::new(TypeScript {})),
		"go" => Some(Box::new(Go {})),
		"cpp" | "c" => Some(Box::new(Cpp {})),
		"ruby" => Some(Box::new(Ruby {})),
		"bash" => Some(Box::new(Bash {})),
		_ => None,
	}
}

/// Detect a supported language from a file's extension (§4.2/§4.3).
pub fn detect_language(path: &Path) -> Option<&'static str> {
	match path.extension()?.to_str()? {
		"rs" => Some("rust"),
		"py" | "pyi" => Some("python"),
		"js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
		"ts" | "mts" | "cts" | "tsx" => Some("typescript"),
		"go" => Some("go"),
		"c" | "h" => Some("c"),
		"cpp" | "cc" | "cxx" | "hpp" | "hh" => Some("cpp"),
		"rb" => Some("ruby"),
		"sh" | "bash" => Some("bash"),
		_ => None,
	}
}
