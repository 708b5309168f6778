// SPDX-License-Identifier: Apache-2.0

use tree_sitter::Node;

use crate::chunk::ChunkKind;
use crate::parsing::languages::Language;

pub struct Cpp {}

impl Language for Cpp {
	fn name(&self) -> &'static str {
		"cpp"
	}

	fn get_ts_language(&self) -> tree_sitter::Language {
		tree_sitter_cpp::LANGUAGE.into()
	}

	fn classify(&self, node: Node) -> Option<ChunkKind> {
		match node.kind() {
			"function_definition" => Some(ChunkKind::Function),
			"class_specifier" => Some(ChunkKind::Class),
			"struct_specifier" => Some(ChunkKind::Struct),
			"enum_specifier" => Some(ChunkKind::Enum),
			"namespace_definition" => Some(ChunkKind::Namespace),
			_ => None,
		}
	}

	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		if node.kind() == "function_definition" {
			let mut cursor = node.walk();
			for child in node.children(&mut cursor) {
				if child.kind() == "function_declarator" {
					let mut inner = child.walk();
					for decl_child in child.children(&mut inner) {
						if decl_child.kind() == "identifier" || decl_child.kind() == "field_identifier" {
							if let Ok(text) = decl_child.utf8_text(source.as_bytes()) {
								return Some(text.to_string());
							}
						}
					}
				}
			}
			return None;
		}

		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			if child.kind() == "type_identifier" || child.kind() == "identifier" || child.kind() == "namespace_identifier" {
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}
