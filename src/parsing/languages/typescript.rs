// SPDX-License-Identifier: Apache-2.0

use tree_sitter::Node;

use crate::chunk::ChunkKind;
use crate::parsing::languages::Language;

pub struct TypeScript {}

impl Language for TypeScript {
	fn name(&self) -> &'static str {
		"typescript"
	}

	fn get_ts_language(&self) -> tree_sitter::Language {
		tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
	}

	fn classify(&self, node: Node) -> Option<ChunkKind> {
		match node.kind() {
			"function_declaration" => Some(ChunkKind::Function),
			"method_definition" => Some(ChunkKind::Method),
			"class_declaration" => Some(ChunkKind::Class),
			"interface_declaration" => Some(ChunkKind::Interface),
			_ => None,
		}
	}

	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			if child.kind() == "identifier"
				|| child.kind() == "property_identifier"
				|| child.kind() == "type_identifier"
			{
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}
