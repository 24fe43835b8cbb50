//! The two search tools the dialogue orchestrator calls: FAQ lookup and product search.
//!
//! Response shapes are what the orchestrator hands to the language model, so field names
//! follow the catalog (`productDisplayName`, `baseColour`, …). `similarity_score` is the raw
//! index distance: lower is closer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedder::{EmbedError, Embedder};
use crate::filters::{FilterField, FilterSet};
use crate::metadata::Record;
use crate::retriever::RetrieveError;
use crate::store::IndexStore;
use crate::suggest::{available_filters, AvailableFilters};

pub const DEFAULT_PRODUCT_QUERY: &str = "general product search";

/// Arguments of `search_products`, as the orchestrator sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub article_type: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub base_colour: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    /// Result count; the store's default (8) when absent.
    #[serde(default)]
    pub k: Option<usize>,
}

impl ProductQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Query text to embed; absent falls back to a generic query. An empty string is passed
    /// through as is.
    pub fn text(&self) -> &str {
        self.query.as_deref().unwrap_or(DEFAULT_PRODUCT_QUERY)
    }

    /// Filters from the non-blank fields.
    pub fn filters(&self) -> FilterSet {
        FilterSet::new()
            .with_opt(FilterField::ArticleType, self.article_type.as_deref())
            .with_opt(FilterField::Gender, self.gender.as_deref())
            .with_opt(FilterField::BaseColour, self.base_colour.as_deref())
            .with_opt(FilterField::Usage, self.usage.as_deref())
            .with_opt(FilterField::Season, self.season.as_deref())
    }
}

/// One product in a `search_products` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductHit {
    #[serde(rename = "productDisplayName")]
    pub product_display_name: Option<String>,
    pub price: Option<f64>,
    pub product_id: Option<Value>,
    pub gender: Option<String>,
    #[serde(rename = "articleType")]
    pub article_type: Option<String>,
    #[serde(rename = "baseColour")]
    pub base_colour: Option<String>,
    pub usage: Option<String>,
    pub similarity_score: f32,
}

impl ProductHit {
    /// Catalogs exported straight from the styles table call the id `id`.
    pub fn from_record(record: &Record, distance: f32) -> Self {
        let text = |field: &str| record.text(field).map(|s| s.into_owned());
        Self {
            product_display_name: text("productDisplayName"),
            price: record.price(),
            product_id: record
                .get("product_id")
                .or_else(|| record.get("id"))
                .filter(|v| !v.is_null())
                .cloned(),
            gender: text("gender"),
            article_type: text("articleType"),
            base_colour: text("baseColour"),
            usage: text("usage"),
            similarity_score: distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSearchResponse {
    pub count: usize,
    pub results: Vec<ProductHit>,
    pub available_filters: Option<AvailableFilters>,
}

/// One FAQ entry: every metadata field (question, answer, …) plus the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqHit {
    #[serde(flatten)]
    pub record: Record,
    pub similarity_score: f32,
}

impl FaqHit {
    pub fn question(&self) -> Option<&str> {
        self.record.get("question").and_then(Value::as_str)
    }

    pub fn answer(&self) -> Option<&str> {
        self.record.get("answer").and_then(Value::as_str)
    }
}

impl<E: Embedder> IndexStore<E> {
    /// Nearest FAQ entries for `query`, closest first.
    pub async fn search_faq(&self, query: &str) -> Result<Vec<FaqHit>, SearchError> {
        log::debug!("search_faq: {:?}", query);
        let vector = self.embed(query).await?;
        let faq = self.faq();
        let settings = self.settings();
        let hits = settings
            .retriever
            .search(&faq.index, &faq.metadata, &vector, settings.faq_k, None)?;
        Ok(hits
            .iter()
            .map(|(distance, record)| FaqHit {
                record: record.clone(),
                similarity_score: distance,
            })
            .collect())
    }

    /// Filtered product search with suggestions for further narrowing.
    pub async fn search_products(
        &self,
        request: &ProductQuery,
    ) -> Result<ProductSearchResponse, SearchError> {
        let filters = request.filters();
        let k = request.k.unwrap_or(self.settings().product_k);
        log::debug!(
            "search_products: {:?} [{}] k={}",
            request.text(),
            filters,
            k
        );
        let vector = self.embed(request.text()).await?;
        let products = self.products();
        let hits = self.settings().retriever.search(
            &products.index,
            &products.metadata,
            &vector,
            k,
            Some(&filters),
        )?;

        let results: Vec<ProductHit> = hits
            .iter()
            .map(|(distance, record)| ProductHit::from_record(record, distance))
            .collect();
        Ok(ProductSearchResponse {
            count: results.len(),
            available_filters: available_filters(&hits.records, &filters),
            results,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}
