//! Query options for list fetches.

use serde::{Deserialize, Serialize};

/// Options for a list fetch against one table.
///
/// Equality is structural: the data-bound handles compare options deeply
/// to decide whether a re-bind is a genuine identity change, so two
/// independently built but identical values count as the same query.
///
/// # Examples
///
/// ```rust
/// use folio_link::{OrderBy, QueryOptions};
///
/// let options = QueryOptions::new()
///     .with_select("id, title, created_at")
///     .with_order(OrderBy::new("created_at"))
///     .with_limit(10);
///
/// assert_eq!(options, options.clone());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Column projection; every column when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    /// Sort specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderBy>,
    /// Maximum number of rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column projection.
    pub fn with_select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Set the sort specification.
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Cap the number of rows returned.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Sort specification for a list fetch.
///
/// A direction left unset sorts newest-first (descending), the feed-style
/// default the content tables rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    /// `Some(true)` oldest-first, `Some(false)` newest-first, `None` for
    /// the descending default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
}

impl OrderBy {
    /// Order by `column`, direction left to the default (descending).
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: None,
        }
    }

    /// Order by `column`, oldest-first.
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: Some(true),
        }
    }

    /// Order by `column`, newest-first.
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: Some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = QueryOptions::new()
            .with_order(OrderBy::new("created_at"))
            .with_limit(5);
        let b = QueryOptions::new()
            .with_order(OrderBy::new("created_at"))
            .with_limit(5);
        assert_eq!(a, b);

        let c = QueryOptions::new()
            .with_order(OrderBy::ascending("created_at"))
            .with_limit(5);
        assert_ne!(a, c, "direction is part of the identity");
    }

    #[test]
    fn test_default_is_empty() {
        let options = QueryOptions::default();
        assert!(options.select.is_none());
        assert!(options.order.is_none());
        assert!(options.limit.is_none());
    }

    #[test]
    fn test_unset_direction_survives_serialization() {
        let options = QueryOptions::new().with_order(OrderBy::new("created_at"));
        let json = serde_json::to_string(&options).expect("serialize");
        assert!(
            !json.contains("ascending"),
            "unset direction should not be written: {json}"
        );
        let back: QueryOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(options, back);
    }
}
