//! "Available filters": a few values the caller could narrow a broad product search by.
//!
//! Computed from the first [`SAMPLE_SIZE`] results only, and only once a search returns at
//! least [`MIN_RESULTS`]. Value order is first-seen order in the sample.

use std::collections::HashSet;

use serde::Serialize;

use crate::filters::{FilterField, FilterSet};
use crate::metadata::Record;

/// Below this many results no suggestions are made.
pub const MIN_RESULTS: usize = 10;
/// Only this many leading results are inspected.
pub const SAMPLE_SIZE: usize = 20;
/// At most this many colours are suggested.
pub const MAX_COLOURS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Vec<String>>,
    #[serde(rename = "baseColour", skip_serializing_if = "Option::is_none")]
    pub base_colour: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Vec<String>>,
}

impl AvailableFilters {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.base_colour.is_none() && self.usage.is_none()
    }
}

/// Suggest unconstrained fields that split `results` into several groups.
pub fn available_filters(results: &[&Record], filters: &FilterSet) -> Option<AvailableFilters> {
    if results.len() < MIN_RESULTS {
        return None;
    }
    let sample = &results[..results.len().min(SAMPLE_SIZE)];
    let suggest = |field: FilterField, more_than: usize, limit: Option<usize>| {
        if filters.contains(field) {
            return None;
        }
        let mut values = distinct_values(sample, field);
        if values.len() <= more_than {
            return None;
        }
        if let Some(limit) = limit {
            values.truncate(limit);
        }
        Some(values)
    };

    let available = AvailableFilters {
        gender: suggest(FilterField::Gender, 1, None),
        base_colour: suggest(FilterField::BaseColour, 3, Some(MAX_COLOURS)),
        usage: suggest(FilterField::Usage, 1, None),
    };
    (!available.is_empty()).then_some(available)
}

/// Distinct non-empty values of `field`, in first-seen order. Values compare exactly.
fn distinct_values(records: &[&Record], field: FilterField) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let Some(value) = record.text(field.as_str()) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.clone().into_owned()) {
            values.push(value.into_owned());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products(rows: &[(&str, &str, &str)]) -> Vec<Record> {
        rows.iter()
            .map(|(gender, colour, usage)| {
                serde_json::from_value(json!({
                    "gender": gender,
                    "baseColour": colour,
                    "usage": usage,
                }))
                .unwrap()
            })
            .collect()
    }

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    const COLOURS: [&str; 7] = ["Black", "White", "Blue", "Red", "Green", "Grey", "Navy Blue"];

    fn varied(n: usize) -> Vec<Record> {
        let rows: Vec<(&str, &str, &str)> = (0..n)
            .map(|i| {
                (
                    if i % 2 == 0 { "Men" } else { "Women" },
                    COLOURS[i % COLOURS.len()],
                    if i % 3 == 0 { "Casual" } else { "Formal" },
                )
            })
            .collect();
        products(&rows)
    }

    #[test]
    fn nine_results_never_suggest() {
        let records = varied(9);
        assert_eq!(available_filters(&refs(&records), &FilterSet::new()), None);
    }

    #[test]
    fn ten_results_suggest_all_fields() {
        let records = varied(10);
        let available = available_filters(&refs(&records), &FilterSet::new()).unwrap();
        assert_eq!(available.gender, Some(vec!["Men".to_string(), "Women".to_string()]));
        assert_eq!(
            available.base_colour,
            Some(COLOURS[..MAX_COLOURS].iter().map(|c| c.to_string()).collect())
        );
        assert_eq!(available.usage, Some(vec!["Casual".to_string(), "Formal".to_string()]));
    }

    #[test]
    fn constrained_fields_are_not_suggested() {
        let records = varied(12);
        let filters = FilterSet::new()
            .with(FilterField::Gender, "Men")
            .with(FilterField::Usage, "Casual");
        let available = available_filters(&refs(&records), &filters).unwrap();
        assert_eq!(available.gender, None);
        assert_eq!(available.usage, None);
        assert!(available.base_colour.is_some());
    }

    #[test]
    fn colours_need_more_than_three() {
        let rows: Vec<(&str, &str, &str)> = (0..12)
            .map(|i| ("Men", ["Black", "White", "Blue"][i % 3], "Casual"))
            .collect();
        let records = products(&rows);
        assert_eq!(available_filters(&refs(&records), &FilterSet::new()), None);
    }

    #[test]
    fn only_first_twenty_are_sampled() {
        let mut rows: Vec<(&str, &str, &str)> = vec![("Men", "Black", "Casual"); 20];
        rows.extend(vec![("Women", "Red", "Formal"); 10]);
        let records = products(&rows);
        assert_eq!(available_filters(&refs(&records), &FilterSet::new()), None);
    }

    #[test]
    fn empty_and_missing_values_are_ignored() {
        let mut records = products(&vec![("Men", "", "Casual"); 10]);
        records.push(serde_json::from_value(json!({"gender": "Women"})).unwrap());
        let available = available_filters(&refs(&records), &FilterSet::new()).unwrap();
        assert_eq!(available.gender, Some(vec!["Men".to_string(), "Women".to_string()]));
        assert_eq!(available.base_colour, None);
        assert_eq!(available.usage, None);
    }

    #[test]
    fn serializes_only_present_fields() {
        let available = AvailableFilters {
            base_colour: Some(vec!["Black".into()]),
            ..AvailableFilters::default()
        };
        assert_eq!(
            serde_json::to_value(&available).unwrap(),
            json!({"baseColour": ["Black"]})
        );
    }
}
