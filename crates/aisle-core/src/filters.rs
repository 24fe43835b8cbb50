//! Exact-match product filters, compared case-insensitively.

use std::fmt;
use std::str::FromStr;

use crate::metadata::Record;

/// Metadata fields a product search can be constrained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    ArticleType,
    Gender,
    BaseColour,
    Usage,
    Season,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::ArticleType,
        FilterField::Gender,
        FilterField::BaseColour,
        FilterField::Usage,
        FilterField::Season,
    ];

    /// Field name as it appears in product metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::ArticleType => "articleType",
            FilterField::Gender => "gender",
            FilterField::BaseColour => "baseColour",
            FilterField::Usage => "usage",
            FilterField::Season => "season",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter field: {}", s))
    }
}

/// Normalization applied to both sides of every comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// At most one desired value per field. Blank values are never stored, so an empty set means
/// "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    // (field, value as given, normalized value), sorted by field
    entries: Vec<(FilterField, String, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `field` to `value`, replacing any earlier value. Blank values remove the
    /// constraint.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        self.entries.retain(|(f, _, _)| *f != field);
        let normalized = normalize(&value);
        if normalized.is_empty() {
            return;
        }
        let pos = self.entries.partition_point(|(f, _, _)| *f < field);
        self.entries.insert(pos, (field, value, normalized));
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Like [`with`](Self::with) but skips `None`.
    pub fn with_opt(mut self, field: FilterField, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.set(field, value);
        }
        self
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _, _)| *f == field)
            .map(|(_, value, _)| value.as_str())
    }

    pub fn contains(&self, field: FilterField) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.entries.iter().map(|(f, value, _)| (*f, value.as_str()))
    }

    /// True when `record` has every constrained field and each one matches. A field missing
    /// from the record never matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.entries.iter().all(|(field, _, wanted)| {
            record
                .text(field.as_str())
                .is_some_and(|have| normalize(&have) == *wanted)
        })
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field, value)?;
            first = false;
        }
        Ok(())
    }
}
