// SPDX-License-Identifier: Apache-2.0

use tree_sitter::Node;

use crate::chunk::ChunkKind;
use crate::parsing::languages::Language;

pub struct Rust {}

impl Language for Rust {
	fn name(&self) -> &'static str {
		"rust"
	}

	fn get_ts_language(&self) -> tree_sitter::Language {
		tree_sitter_rust::LANGUAGE.into()
	}

	fn classify(&self, node: Node) -> Option<ChunkKind> {
		match node.kind() {
			"function_item" => {
				let in_impl = node
					.parent()
					.map(|p| p.kind() == "declaration_list" && p.parent().map(|gp| gp.kind() == "impl_item").unwrap_or(false))
					.unwrap_or(false);
				Some(if in_impl { ChunkKind::Method } else { ChunkKind::Function })
			}
			"struct_item" => Some(ChunkKind::Struct),
			"enum_item" => Some(ChunkKind::Enum),
			"trait_item" => Some(ChunkKind::Interface),
			"mod_item" => Some(ChunkKind::Module),
			_ => None,
		}
	}

	fn extract_name(&self, node: Node, source: &str) -> Option<String> {
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			if child.kind() == "identifier" || child.kind() == "type_identifier" {
				if let Ok(text) = child.utf8_text(source.as_bytes()) {
					return Some(text.to_string());
				}
			}
		}
		None
	}
}
