//! The index store: the FAQ and product collections plus the query embedder.
//!
//! Loaded once at startup and read-only afterwards, so a single instance can serve any number
//! of concurrent searches. Callers either build one and pass it around, or use [`shared`] for
//! a process-wide instance.

use std::path::Path;

use once_cell::sync::OnceCell;

use crate::config::{Config, IndexPaths};
use crate::embedder::{EmbedError, Embedder};
use crate::index::{FlatIndex, IndexError, VectorIndex};
use crate::metadata::{MetadataError, MetadataTable};
use crate::ollama::{OllamaClient, OllamaError};
use crate::retriever::Retriever;

const PROBE_TEXT: &str = "dimension probe";

/// A vector index and the metadata for its ids.
#[derive(Debug, Clone)]
pub struct Collection {
    pub index: FlatIndex,
    pub metadata: MetadataTable,
}

impl Collection {
    pub fn new(index: FlatIndex, metadata: MetadataTable) -> Self {
        Self { index, metadata }
    }

    /// Load `index_path` (FAISS flat L2) and `metadata_path` (JSON).
    pub fn load(index_path: &Path, metadata_path: &Path) -> Result<Self, StoreError> {
        let index = FlatIndex::load(index_path)?;
        let metadata = MetadataTable::load(metadata_path)?;
        if metadata.len() < index.total_count() {
            log::warn!(
                "{}: {} vectors but only {} metadata records; unmatched ids will be skipped",
                index_path.display(),
                index.total_count(),
                metadata.len()
            );
        }
        Ok(Self { index, metadata })
    }

    pub fn len(&self) -> usize {
        self.index.total_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Search sizes taken from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub faq_k: usize,
    pub product_k: usize,
    pub retriever: Retriever,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            faq_k: config.faq_search_k(),
            product_k: config.product_search_k(),
            retriever: Retriever::new().with_widen_factor(config.widen_factor()),
        }
    }
}

pub struct IndexStore<E = OllamaClient> {
    embedder: E,
    faq: Collection,
    products: Collection,
    settings: SearchSettings,
}

impl IndexStore<OllamaClient> {
    /// Build the Ollama embedder and load both collections from the configured directory.
    /// Any missing or malformed file is an error; there is no partial store.
    pub fn initialize(config: &Config) -> Result<Self, StoreError> {
        let paths = config.index_paths().ok_or(StoreError::NoIndicesDir)?;
        let embedder =
            OllamaClient::from_url(config.ollama_url())?.with_embed_model(config.embed_model());
        Self::load(embedder, &paths, SearchSettings::from_config(config))
    }
}

impl<E: Embedder> IndexStore<E> {
    pub fn load(embedder: E, paths: &IndexPaths, settings: SearchSettings) -> Result<Self, StoreError> {
        log::info!("Loading index store (model {})", embedder.model_name());
        let faq = Collection::load(&paths.faq_index, &paths.faq_metadata)?;
        log::info!("FAQ store loaded: {} vectors", faq.len());
        let products = Collection::load(&paths.product_index, &paths.product_metadata)?;
        log::info!("Product store loaded: {} vectors", products.len());
        Ok(Self::from_parts(embedder, faq, products, settings))
    }

    pub fn from_parts(
        embedder: E,
        faq: Collection,
        products: Collection,
        settings: SearchSettings,
    ) -> Self {
        Self {
            embedder,
            faq,
            products,
            settings,
        }
    }

    /// Embed a query text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embedder.embed(text).await
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn faq(&self) -> &Collection {
        &self.faq
    }

    pub fn products(&self) -> &Collection {
        &self.products
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Embed a probe text and check the model's dimension against both indices.
    pub async fn check_embedder(&self) -> Result<usize, StoreError> {
        let dimension = self.embed(PROBE_TEXT).await?.len();
        for (name, collection) in [("faq", &self.faq), ("products", &self.products)] {
            if collection.index.dimension() != dimension {
                return Err(StoreError::ModelDimension {
                    collection: name,
                    index: collection.index.dimension(),
                    model: dimension,
                });
            }
        }
        Ok(dimension)
    }

    pub fn describe(&self) -> StoreSummary {
        StoreSummary {
            model: self.embedder.model_name().to_string(),
            faq_vectors: self.faq.len(),
            faq_dimension: self.faq.index.dimension(),
            product_vectors: self.products.len(),
            product_dimension: self.products.index.dimension(),
        }
    }
}

/// What `aisle status` prints.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreSummary {
    pub model: String,
    pub faq_vectors: usize,
    pub faq_dimension: usize,
    pub product_vectors: usize,
    pub product_dimension: usize,
}

static SHARED: OnceCell<IndexStore> = OnceCell::new();

/// Process-wide store. The first call loads it from `config`; later calls return the same
/// instance and ignore their `config`. Concurrent first calls block until the one
/// initialization finishes. A failed load leaves nothing behind, so a later call retries.
pub fn shared(config: &Config) -> Result<&'static IndexStore, StoreError> {
    SHARED.get_or_try_init(|| IndexStore::initialize(config))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not determine the indices directory; set one with `aisle set-indices-dir`")]
    NoIndicesDir,
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),
    #[error("{collection} index has {index} dimensions but model produces {model}")]
    ModelDimension {
        collection: &'static str,
        index: usize,
        model: usize,
    },
}
