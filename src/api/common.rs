//! Common API utilities and shared types

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::{ListQuery, SortOrder};

/// Query string of the searchable, sortable list endpoints.
///
/// Unknown `sort` columns fall back to the endpoint's default column and any
/// `order` other than `desc` means ascending.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl ListParams {
    pub fn into_query<S>(self) -> ListQuery<S>
    where
        S: DeserializeOwned + Default,
    {
        let sort = self
            .sort
            .and_then(|s| serde_json::from_value(serde_json::Value::String(s.trim().to_string())).ok())
            .unwrap_or_default();
        let order = match self.order.as_deref().map(str::trim) {
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };
        ListQuery {
            search: self.search,
            sort,
            order,
        }
    }
}

/// Query string of endpoints that only search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudentSort, WeekSort};

    #[test]
    fn test_known_sort_and_order() {
        let params = ListParams {
            search: Some("ann".to_string()),
            sort: Some("email".to_string()),
            order: Some("DESC".to_string()),
        };
        let query: ListQuery<StudentSort> = params.into_query();
        assert_eq!(query.sort, StudentSort::Email);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.search_term(), Some("ann"));
    }

    #[test]
    fn test_unknown_sort_falls_back() {
        let params = ListParams {
            search: None,
            sort: Some("id; DROP TABLE weeks".to_string()),
            order: Some("sideways".to_string()),
        };
        let query: ListQuery<WeekSort> = params.into_query();
        assert_eq!(query.sort, WeekSort::StartDate);
        assert_eq!(query.order, SortOrder::Asc);
    }
}
