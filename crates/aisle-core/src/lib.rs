//! Retrieval core for the shopping assistant, independent of how it is driven (CLI or a
//! dialogue orchestrator).
//!
//! Two pre-built collections (FAQ and products) are loaded once into an [`IndexStore`]. A
//! query is embedded, searched with the [`Retriever`] (optionally post-filtered on product
//! fields) and shaped into the tool responses in [`tools`]. Aisle stores only config and the
//! indices in its own app data directory (see [app_data]).

pub mod app_data;
pub mod config;
pub mod embedder;
pub mod filters;
pub mod index;
pub mod metadata;
pub mod ollama;
pub mod retriever;
pub mod store;
pub mod suggest;
pub mod tools;

pub use app_data::{app_data_dir, default_indices_dir};
pub use config::{get_indices_dir, load_config, set_indices_dir, Config, ConfigError, IndexPaths};
pub use embedder::{EmbedError, Embedder};
pub use filters::{FilterField, FilterSet};
pub use index::{FlatIndex, IndexError, Neighbor, VectorIndex};
pub use metadata::{MetadataError, MetadataTable, Record};
pub use ollama::{OllamaClient, OllamaError};
pub use retriever::{Hits, RetrieveError, Retriever, WIDEN_FACTOR};
pub use store::{shared, Collection, IndexStore, SearchSettings, StoreError, StoreSummary};
pub use suggest::{available_filters, AvailableFilters};
pub use tools::{FaqHit, ProductHit, ProductQuery, ProductSearchResponse, SearchError};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "aisle-core ready"
}
