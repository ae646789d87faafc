//! Shared list query types

use serde::Deserialize;

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Search and ordering for a list endpoint, with `S` the sortable columns
#[derive(Debug, Clone, Default)]
pub struct ListQuery<S> {
    /// Substring filter; blank means no filter
    pub search: Option<String>,
    pub sort: S,
    pub order: SortOrder,
}

impl<S> ListQuery<S> {
    /// The search term, or `None` when absent or blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ListQuery {
            search: Some("   ".to_string()),
            sort: (),
            order: SortOrder::Desc,
        };
        assert_eq!(query.search_term(), None);
        assert_eq!(query.order.as_sql(), "DESC");

        let query = ListQuery {
            search: Some(" web ".to_string()),
            ..ListQuery::<()>::default()
        };
        assert_eq!(query.search_term(), Some("web"));
    }
}
