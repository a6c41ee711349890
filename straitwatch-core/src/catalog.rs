//! Indicator catalog - the static definition of what we watch for
//!
//! The catalog is loaded once per run from a JSON array of indicator
//! records and treated as read-only afterwards. Malformed records are
//! rejected here, at the load boundary, so the engine never sees them.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from catalog loading and validation
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("indicator with empty id")]
    EmptyId,

    #[error("indicator {id}: weight must be positive and finite, got {weight}")]
    InvalidWeight { id: String, weight: f64 },

    #[error("duplicate indicator id: {0}")]
    DuplicateId(String),
}

/// Grouping tag bucketing indicators and text sources for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Economic,
    Military,
    Political,
    LocalSentiment,
}

impl Category {
    /// All categories, in the fixed order the pipeline processes them
    pub const ALL: [Category; 4] = [
        Category::Economic,
        Category::Military,
        Category::Political,
        Category::LocalSentiment,
    ];

    /// Short key used in the run artifact (`category_reasoning`, `news_sources`)
    pub fn key(&self) -> &'static str {
        match self {
            Category::Economic => "econ",
            Category::Military => "mil",
            Category::Political => "pol",
            Category::LocalSentiment => "local",
        }
    }

    /// Human-readable label used in prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            Category::Economic => "economic & financial",
            Category::Military => "military & logistics",
            Category::Political => "political & rhetoric",
            Category::LocalSentiment => "local sentiment (Xiamen)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named, weighted signal of interest defined statically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    /// Unique id, e.g. "MIL-1"
    pub id: String,

    /// Category bucket for classification
    pub category: Category,

    /// Maximum contribution to the score
    pub weight: f64,

    /// Optional free-text definition, fed to the classifier prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validated, read-only mapping from indicator id to definition
#[derive(Debug, Clone)]
pub struct Catalog {
    indicators: BTreeMap<String, Indicator>,
}

impl Catalog {
    /// Build a catalog from raw records, rejecting malformed ones
    pub fn from_records(records: Vec<Indicator>) -> Result<Self, CatalogError> {
        let mut indicators = BTreeMap::new();

        for record in records {
            if record.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !record.weight.is_finite() || record.weight <= 0.0 {
                return Err(CatalogError::InvalidWeight {
                    id: record.id,
                    weight: record.weight,
                });
            }
            if indicators.insert(record.id.clone(), record.clone()).is_some() {
                return Err(CatalogError::DuplicateId(record.id));
            }
        }

        Ok(Self { indicators })
    }

    /// Load a catalog from a JSON file containing an array of indicators
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<Indicator> = serde_json::from_str(&raw)?;
        Self::from_records(records)
    }

    pub fn get(&self, id: &str) -> Option<&Indicator> {
        self.indicators.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indicators.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Iterate indicators in id order
    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.values()
    }

    /// Indicators belonging to one category, in id order
    pub fn in_category(&self, category: Category) -> Vec<&Indicator> {
        self.indicators
            .values()
            .filter(|ind| ind.category == category)
            .collect()
    }

    /// Sum of all catalog weights (the score denominator)
    pub fn total_weight(&self) -> f64 {
        self.indicators.values().map(|ind| ind.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(id: &str, category: Category, weight: f64) -> Indicator {
        Indicator {
            id: id.to_string(),
            category,
            weight,
            description: None,
        }
    }

    #[test]
    fn test_valid_catalog() {
        let catalog = Catalog::from_records(vec![
            indicator("ECON-1", Category::Economic, 10.0),
            indicator("MIL-1", Category::Military, 20.0),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.total_weight(), 30.0);
        assert!(catalog.contains("MIL-1"));
        assert_eq!(catalog.in_category(Category::Military).len(), 1);
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let result = Catalog::from_records(vec![
            indicator("MIL-1", Category::Military, 20.0),
            indicator("MIL-1", Category::Military, 5.0),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "MIL-1"));
    }

    #[test]
    fn test_rejects_bad_weight() {
        for weight in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let result = Catalog::from_records(vec![indicator("X", Category::Economic, weight)]);
            assert!(matches!(result, Err(CatalogError::InvalidWeight { .. })));
        }
    }

    #[test]
    fn test_rejects_empty_id() {
        let result = Catalog::from_records(vec![indicator("  ", Category::Economic, 1.0)]);
        assert!(matches!(result, Err(CatalogError::EmptyId)));
    }

    #[test]
    fn test_category_serde_keys() {
        let json = serde_json::to_string(&Category::LocalSentiment).unwrap();
        assert_eq!(json, "\"local_sentiment\"");
        assert_eq!(Category::LocalSentiment.key(), "local");
    }
}
