// SPDX-License-Identifier: Apache-2.0

//! Semantic code indexing and retrieval over a source workspace: file
//! discovery with ignore rules, language-aware syntactic chunking,
//! embedding generation, vector-store persistence, incremental updates via
//! file watching, and top-k semantic query.

pub mod chunk;
pub mod chunker;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod discovery;
pub mod embedding;
pub mod error;
pub mod ignore_matcher;
pub mod logging;
pub mod message;
pub mod parsing;
pub mod query;
pub mod semantic_enricher;
pub mod state;
pub mod store;
pub mod watcher;
pub mod worker;
pub mod workspace;

pub use config::Config;
pub use coordinator::Coordinator;
pub use error::{CoreError, CoreResult};
pub use query::QueryService;
pub use state::StateManager;
