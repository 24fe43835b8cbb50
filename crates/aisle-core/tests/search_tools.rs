//! End-to-end runs of the two search tools over small in-memory collections.

use std::collections::HashMap;

use aisle_core::{
    Collection, EmbedError, Embedder, FlatIndex, IndexStore, MetadataTable, ProductQuery,
    SearchSettings, VectorIndex,
};
use serde_json::json;

/// Embeds only the texts it was given vectors for.
struct LookupEmbedder(HashMap<String, Vec<f32>>);

impl LookupEmbedder {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
        )
    }
}

impl Embedder for LookupEmbedder {
    fn model_name(&self) -> &str {
        "lookup"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.0
            .get(text)
            .cloned()
            .ok_or_else(|| EmbedError::Empty(text.to_string()))
    }
}

fn faq_collection() -> Collection {
    let index = FlatIndex::from_vectors(
        3,
        &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
    )
    .unwrap();
    let metadata = MetadataTable::from_json(
        &json!([
            {"question": "How long does shipping take?", "answer": "3-5 business days."},
            {"question": "How do I return an item?", "answer": "Within 30 days from your orders page."},
            {"question": "Which payment methods do you accept?", "answer": "Cards and UPI."}
        ])
        .to_string(),
    )
    .unwrap();
    Collection::new(index, metadata)
}

const COLOURS: [&str; 6] = ["Black", "White", "Blue", "Grey", "Red", "Green"];

/// 50 shirts on a line; product `i` sits at distance `i^2` from the "black shirt" query.
/// Only products 4 and 31 are for men. Metadata is stored in the sparse layout.
fn product_collection() -> Collection {
    let rows: Vec<Vec<f32>> = (0..50).map(|i| vec![i as f32, 0.0]).collect();
    let index = FlatIndex::from_vectors(2, &rows).unwrap();
    let records: serde_json::Map<String, serde_json::Value> = (0..50)
        .map(|i| {
            let gender = if i == 4 || i == 31 { "Men" } else { "Women" };
            (
                i.to_string(),
                json!({
                    "product_id": 1000 + i,
                    "productDisplayName": format!("Shirt {}", i),
                    "price": 499 + i,
                    "gender": gender,
                    "articleType": "Shirts",
                    "baseColour": COLOURS[i % COLOURS.len()],
                    "usage": if i % 2 == 0 { "Casual" } else { "Formal" },
                    "season": "Summer"
                }),
            )
        })
        .collect();
    let metadata =
        MetadataTable::from_json(&json!({ "id_to_metadata": records }).to_string()).unwrap();
    Collection::new(index, metadata)
}

fn store() -> IndexStore<LookupEmbedder> {
    let embedder = LookupEmbedder::new(&[
        ("shipping time", vec![0.9, 0.1, 0.0]),
        ("black shirt", vec![0.0, 0.0]),
        ("", vec![0.0, 0.0, 0.0]),
    ]);
    IndexStore::from_parts(
        embedder,
        faq_collection(),
        product_collection(),
        SearchSettings::default(),
    )
}

#[tokio::test]
async fn faq_returns_closest_entry_with_raw_distance() {
    let store = store();
    let hits = store.search_faq("shipping time").await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].question(), Some("How long does shipping take?"));

    let raw = store
        .faq()
        .index
        .search(&[0.9, 0.1, 0.0], 3)
        .unwrap();
    assert_eq!(raw[0].id, 0);
    let scores: Vec<f32> = hits.iter().map(|h| h.similarity_score).collect();
    let distances: Vec<f32> = raw.iter().map(|n| n.distance).collect();
    assert_eq!(scores, distances);
}

#[tokio::test]
async fn faq_accepts_empty_query() {
    let hits = store().search_faq("").await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn faq_embedding_failure_is_an_error() {
    assert!(store().search_faq("unknown text").await.is_err());
}

#[tokio::test]
async fn gender_filter_returns_only_the_two_matches() {
    let store = store();
    let mut request = ProductQuery::new("black shirt");
    request.gender = Some("men".into());
    let response = store.search_products(&request).await.unwrap();

    assert_eq!(response.count, 2);
    let genders: Vec<_> = response
        .results
        .iter()
        .map(|r| r.gender.as_deref().unwrap().to_lowercase())
        .collect();
    assert_eq!(genders, vec!["men", "men"]);
    assert_eq!(response.results[0].product_id, Some(json!(1004)));
    assert_eq!(response.results[1].product_id, Some(json!(1031)));
    assert_eq!(response.results[0].similarity_score, 16.0);
    assert_eq!(response.results[1].similarity_score, 961.0);
    assert_eq!(response.available_filters, None);
}

#[tokio::test]
async fn default_k_is_eight_without_suggestions() {
    let response = store()
        .search_products(&ProductQuery::new("black shirt"))
        .await
        .unwrap();
    assert_eq!(response.count, 8);
    assert!(response
        .results
        .windows(2)
        .all(|w| w[0].similarity_score <= w[1].similarity_score));
    // Fewer than ten results never carry suggestions.
    assert_eq!(response.available_filters, None);
}

#[tokio::test]
async fn broad_search_suggests_filters() {
    let mut request = ProductQuery::new("black shirt");
    request.k = Some(12);
    request.article_type = Some("shirts".into());
    let response = store().search_products(&request).await.unwrap();
    assert_eq!(response.count, 12);

    let value = serde_json::to_value(&response).unwrap();
    let available = &value["available_filters"];
    assert_eq!(available["gender"], json!(["Women", "Men"]));
    assert_eq!(
        available["baseColour"],
        json!(["Black", "White", "Blue", "Grey", "Red"])
    );
    assert_eq!(available["usage"], json!(["Casual", "Formal"]));
}

#[tokio::test]
async fn constrained_fields_are_left_out_of_suggestions() {
    let mut request = ProductQuery::new("black shirt");
    request.k = Some(12);
    request.usage = Some("Casual".into());
    let response = store().search_products(&request).await.unwrap();
    assert_eq!(response.count, 12);
    let available = response.available_filters.unwrap();
    assert_eq!(available.usage, None);
    // Even ids only cycle through three colours, which is not enough to suggest.
    assert_eq!(available.base_colour, None);
    assert_eq!(
        available.gender,
        Some(vec!["Women".to_string(), "Men".to_string()])
    );
}

#[tokio::test]
async fn response_shape_matches_tool_contract() {
    let mut request = ProductQuery::new("black shirt");
    request.k = Some(1);
    let value = serde_json::to_value(store().search_products(&request).await.unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "count": 1,
            "results": [{
                "productDisplayName": "Shirt 0",
                "price": 499.0,
                "product_id": 1000,
                "gender": "Women",
                "articleType": "Shirts",
                "baseColour": "Black",
                "usage": "Casual",
                "similarity_score": 0.0
            }],
            "available_filters": null
        })
    );
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let mut request = ProductQuery::new("black shirt");
    request.k = Some(0);
    assert!(store().search_products(&request).await.is_err());
}
