// SPDX-License-Identifier: Apache-2.0

use tree_sitter::Node;

use crate::chunk::ChunkKind;
use crate::parsing::languages::Language;

pub struct Python {}

impl Language for Python {
	fn name(&self) -> &'static str {
		"python"
	}

	fn get_ts_language(&self) -> tree_sitter::Language {
		tree_sitter_python::LANGUAGE.into()
	}

	fn classify(&self, node: Node) -> Option<ChunkKind> {
		match node.kind() {
			"function_definition" => {
				let in_class = node
					.parent()
					.map(|p| p.kind() == "block" && p.parent().map(|gp| gp.kind() == "class_definition").unwrap_or(false))
					.unwrap_or(false);
				Some(if in_class { ChunkKind::Method } else { ChunkKind::Function })
			}
			"class_definition" => Some(ChunkKind::Class),
			_ => None,
		}
	}

	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			if child.kind() == "identifier" {
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}
