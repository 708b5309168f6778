// SPDX-License-Identifier: Apache-2.0

use tree_sitter::Node;

use crate::chunk::ChunkKind;
use crate::parsing::languages::Language;

pub struct Ruby {}

impl Language for Ruby {
	fn name(&self) -> &'static str {
		"ruby"
	}

	fn get_ts_language(&self) -> tree_sitter::Language {
		tree_sitter_ruby::LANGUAGE.into()
	}

	fn classify(&self, node: Node) -> Option<ChunkKind> {
		match node.kind() {
			"method" => Some(ChunkKind::Method),
			"class" => Some(ChunkKind::Class),
			"module" => Some(ChunkKind::Module),
			_ => None,
		}
	}

	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			if child.kind() == "identifier" || child.kind() == "constant" {
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}
