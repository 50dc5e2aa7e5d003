//! Stoppage categories ("tipos de parada") and the catalog of accepted ones.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Categories used when `STOPPAGE_CATEGORIES` is not configured.
///
/// Order is significant: earlier entries win when several stoppages are open
/// at once and a single label must be shown first.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Manutenção",
    "Falta de Material",
    "Setup",
    "Qualidade",
    "Falta de Operador",
];

/// A validated stoppage category label, in its canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoppageCategory(String);

impl StoppageCategory {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a label read back from the store without re-validating it.
    pub fn from_stored(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl std::fmt::Display for StoppageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The known set of stoppage categories, in label priority order.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    labels: Vec<String>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CategoryCatalog {
    /// Build a catalog from configured labels. Blank entries are dropped and
    /// duplicates (case-insensitive) keep their first position.
    pub fn new<I, S>(labels: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for raw in labels {
            let label = raw.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if !out.iter().any(|l| l.to_lowercase() == label.to_lowercase()) {
                out.push(label.to_string());
            }
        }
        if out.is_empty() {
            return Err(CoreError::Validation(
                "At least one stoppage category must be configured".into(),
            ));
        }
        Ok(Self { labels: out })
    }

    /// Parse a comma-separated list, e.g. the `STOPPAGE_CATEGORIES` env var.
    pub fn from_csv(csv: &str) -> Result<Self, CoreError> {
        Self::new(csv.split(','))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Resolve user input to a known category (trimmed, case-insensitive).
    pub fn parse(&self, raw: &str) -> Result<StoppageCategory, CoreError> {
        let wanted = raw.trim();
        if wanted.is_empty() {
            return Err(CoreError::Validation(
                "Stoppage category must not be empty".into(),
            ));
        }
        let lowered = wanted.to_lowercase();
        self.labels
            .iter()
            .find(|l| l.to_lowercase() == lowered)
            .map(|l| StoppageCategory(l.clone()))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown stoppage category '{wanted}'. Valid categories: {}",
                    self.labels.join(", ")
                ))
            })
    }

    /// Position used to order simultaneous stoppages. Categories no longer in
    /// the catalog (e.g. imported history) sort after all known ones.
    pub fn priority(&self, category: &StoppageCategory) -> usize {
        self.labels
            .iter()
            .position(|l| l == category.as_str())
            .unwrap_or(self.labels.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_canonical() {
        let catalog = CategoryCatalog::default();
        let cat = catalog.parse("  manutenção ").unwrap();
        assert_eq!(cat.as_str(), "Manutenção");
    }

    #[test]
    fn empty_category_rejected() {
        let err = CategoryCatalog::default().parse("   ").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn unknown_category_lists_valid_ones() {
        let err = CategoryCatalog::default().parse("Café").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown stoppage category 'Café'"));
        assert!(msg.contains("Falta de Material"));
    }

    #[test]
    fn csv_drops_blanks_and_duplicates() {
        let catalog = CategoryCatalog::from_csv("Setup, ,setup,Qualidade").unwrap();
        assert_eq!(catalog.labels(), ["Setup", "Qualidade"]);
    }

    #[test]
    fn empty_catalog_rejected() {
        assert!(CategoryCatalog::from_csv(" , ").is_err());
    }

    #[test]
    fn priority_follows_configured_order() {
        let catalog = CategoryCatalog::default();
        let maint = catalog.parse("Manutenção").unwrap();
        let setup = catalog.parse("Setup").unwrap();
        let legacy = StoppageCategory::from_stored("Energia");
        assert!(catalog.priority(&maint) < catalog.priority(&setup));
        assert_eq!(catalog.priority(&legacy), catalog.labels().len());
    }
}
