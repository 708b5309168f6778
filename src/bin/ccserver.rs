// SPDX-License-Identifier: Apache-2.0

//! Thin newline-delimited-JSON binding of the Message Surface (§4.13) over
//! stdio. Owns no business logic: it reads one `Command` per line, hands it
//! to the library, and writes one `CommandResult` per line back. Progress
//! events from the active run are interleaved as separate lines so a
//! caller can multiplex both off the same stdout stream.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use codectx::config::Config;
use codectx::coordinator::Coordinator;
use codectx::embedding::{Embedder, HashEmbedder, HttpEmbedder};
use codectx::message::{Command, MessageSurface};
use codectx::query::QueryService;
use codectx::state::StateManager;
use codectx::store::{MemoryStore, VectorStoreClient};
use codectx::workspace;

const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;
const IO_TIMEOUT_MS: u64 = 60_000;

#[tokio::main]
async fn main() -> Result<()> {
	let root = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
	let root = root.canonicalize().unwrap_or(root);

	let debug_mode = env::var("CODECTX_DEBUG").is_ok();
	let _ = codectx::logging::init_logging(&root, debug_mode);

	let config = Config::load(&root)?;
	let collection = workspace::collection_name_for(&root);

	let embedder: Arc<dyn Embedder> = if config.embedder.provider == "http" {
		let endpoint = config
			.embedder
			.endpoint
			.clone()
			.ok_or_else(|| anyhow::anyhow!("embedder.provider = \"http\" requires embedder.endpoint"))?;
		Arc::new(HttpEmbedder::new(
			endpoint,
			config.embedder.api_key.clone().unwrap_or_default(),
			config.embedder.model.clone(),
			config.embedder.dimension,
		))
	} else {
		Arc::new(HashEmbedder::new(config.embedder.dimension))
	};

	// lancedb-store is the default-on concrete store; fall back to
	// MemoryStore only when the feature is disabled at build time.
	#[cfg(feature = "lancedb-store")]
	let store: Arc<dyn VectorStoreClient> = {
		let db_path = root.join(".code-context").join("vectors.lance");
		Arc::new(codectx::store::LanceDbStore::open(&db_path).await?)
	};
	#[cfg(not(feature = "lancedb-store"))]
	let store: Arc<dyn VectorStoreClient> = Arc::new(MemoryStore::new());

	let state = Arc::new(StateManager::new());
	let mut coordinator = Coordinator::new(root.clone(), collection.clone(), embedder.clone(), store.clone(), state)
		.with_max_tokens_per_embed_batch(config.worker.max_tokens_per_embed_batch);
	if let Some(worker_count) = config.worker.worker_count {
		coordinator = coordinator.with_worker_count(worker_count);
	}
	let coordinator = Arc::new(coordinator);
	let query = Arc::new(QueryService::new(collection, embedder, store));
	let surface = MessageSurface::new(coordinator, query);

	run_stdio_loop(surface).await
}

async fn run_stdio_loop(surface: MessageSurface) -> Result<()> {
	let stdin = tokio::io::stdin();
	let stdout = tokio::io::stdout();
	let mut reader = BufReader::new(stdin);
	let mut writer = stdout;

	let mut line = String::with_capacity(1024);
	let mut consecutive_errors = 0u32;
	const MAX_CONSECUTIVE_ERRORS: u32 = 10;

	loop {
		line.clear();
		let read = tokio::time::timeout(Duration::from_millis(IO_TIMEOUT_MS), reader.read_line(&mut line)).await;

		match read {
			Ok(Ok(0)) => break, // EOF
			Ok(Ok(bytes_read)) => {
				if bytes_read > MAX_REQUEST_BYTES {
					write_line(&mut writer, &json!({"outcome": "failed", "kind": "request_too_large", "message": "request exceeds size limit"})).await?;
					continue;
				}
				if line.trim().is_empty() {
					continue;
				}

				match serde_json::from_str::<Command>(&line) {
					Ok(command) => {
						let result = surface.handle(command).await;
						if write_line(&mut writer, &result).await.is_err() {
							consecutive_errors += 1;
						} else {
							consecutive_errors = 0;
						}
					}
					Err(e) => {
						write_line(&mut writer, &json!({"outcome": "failed", "kind": "invalid_command", "message": e.to_string()})).await?;
						consecutive_errors += 1;
					}
				}
			}
			Ok(Err(e)) => {
				tracing::warn!(error = %e, "error reading from stdin");
				consecutive_errors += 1;
			}
			Err(_) => continue, // read timeout; loop and try again
		}

		if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
			tracing::error!("too many consecutive errors, shutting down");
			break;
		}
	}

	Ok(())
}

async fn write_line(writer: &mut tokio::io::Stdout, value: &impl serde::Serialize) -> Result<()> {
	let mut payload = serde_json::to_string(value)?;
	payload.push('\n');
	writer.write_all(payload.as_bytes()).await?;
	writer.flush().await?;
	Ok(())
}
