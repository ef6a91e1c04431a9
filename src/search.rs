use anyhow::{Context, Result};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, fmt};

use crate::codes::FilterCategory;
use crate::constants::AUTH_SENTINEL;
use crate::error::FetchError;

/// One entry from `/api/v1/account/saved-searches/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedSearch {
    pub search_name: String,
    pub id: SearchId,
    #[serde(default)]
    pub filters: HashMap<String, Vec<FilterEntry>>,
}

/// Saved-search identifiers arrive as numbers or strings depending on the
/// account; rendered verbatim into the payer-mix query string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SearchId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchId::Number(number) => write!(f, "{number}"),
            SearchId::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterEntry {
    pub title: String,
}

impl SavedSearch {
    /// Code titles for one filter category, in stored order; empty when the
    /// category is absent.
    fn code_titles(&self, category: FilterCategory) -> Vec<String> {
        self.filters
            .get(category.segment())
            .map(|entries| entries.iter().map(|entry| entry.title.clone()).collect())
            .unwrap_or_default()
    }
}

/// Ordered code lists per filter category, extracted once from the resolved
/// saved search.
#[derive(Debug, Clone, Default)]
pub struct CodeLists {
    pub cpt: Vec<String>,
    pub hcpcs: Vec<String>,
    pub icd: Vec<String>,
    pub drug: Vec<String>,
}

impl CodeLists {
    pub fn from_search(search: &SavedSearch) -> Self {
        Self {
            cpt: search.code_titles(FilterCategory::Cpt),
            hcpcs: search.code_titles(FilterCategory::Hcpcs),
            icd: search.code_titles(FilterCategory::Icd),
            drug: search.code_titles(FilterCategory::Drug),
        }
    }

    pub fn for_category(&self, category: FilterCategory) -> &[String] {
        match category {
            FilterCategory::Cpt => &self.cpt,
            FilterCategory::Hcpcs => &self.hcpcs,
            FilterCategory::Icd => &self.icd,
            FilterCategory::Drug => &self.drug,
        }
    }

    /// Categories that will actually be queried; an empty list means the
    /// category is skipped entirely (no request, no columns).
    pub fn non_empty_categories(&self) -> Vec<FilterCategory> {
        FilterCategory::ALL
            .into_iter()
            .filter(|category| !self.for_category(*category).is_empty())
            .collect()
    }
}

pub async fn resolve_saved_search(
    client: &Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Result<SavedSearch> {
    let url = format!("{base_url}/api/v1/account/saved-searches/");
    let body: Value = client
        .get(&url)
        .header(AUTHORIZATION, token)
        .send()
        .await
        .with_context(|| format!("Saved-search listing request failed for {url}"))?
        .json()
        .await
        .context("Invalid saved-search listing JSON")?;

    let searches = parse_listing(body)?;
    Ok(find_saved_search(searches, name)?)
}

/// The listing is a JSON array on success. An object carrying the exact
/// credentials sentinel in `detail` means the token was rejected; any other
/// non-array body is malformed.
fn parse_listing(body: Value) -> Result<Vec<SavedSearch>, FetchError> {
    if let Some(detail) = body.get("detail").and_then(Value::as_str) {
        if detail == AUTH_SENTINEL {
            return Err(FetchError::Auth);
        }
        return Err(FetchError::UnexpectedListing {
            reason: format!("listing refused: {detail}"),
        });
    }

    match body {
        Value::Array(_) => serde_json::from_value(body).map_err(|err| {
            FetchError::UnexpectedListing {
                reason: err.to_string(),
            }
        }),
        _ => Err(FetchError::UnexpectedListing {
            reason: "expected an array of saved searches".to_string(),
        }),
    }
}

/// Exact, case-sensitive match on `search_name`; no trimming.
fn find_saved_search(
    searches: Vec<SavedSearch>,
    name: &str,
) -> Result<SavedSearch, FetchError> {
    searches
        .into_iter()
        .find(|search| search.search_name == name)
        .ok_or_else(|| FetchError::SearchNotFound {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keratoconus_listing() -> Value {
        json!([
            {
                "search_name": "Keratoconus All",
                "id": 28679,
                "filters": {
                    "cpt": [{"title": "92025"}, {"title": "92071"}],
                    "icd": [{"title": "H18.609"}]
                }
            },
            {
                "search_name": "Dry Eye",
                "id": "ss-104",
                "filters": {}
            }
        ])
    }

    #[test]
    fn resolves_search_by_exact_name() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        let search = find_saved_search(searches, "Keratoconus All").expect("match");
        assert_eq!(search.id, SearchId::Number(28679));
        assert_eq!(search.id.to_string(), "28679");
    }

    #[test]
    fn unknown_name_is_not_found() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        let err = find_saved_search(searches, "Other").unwrap_err();
        assert!(matches!(err, FetchError::SearchNotFound { name } if name == "Other"));
    }

    #[test]
    fn name_match_is_case_sensitive_and_untrimmed() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        assert!(find_saved_search(searches.clone(), "keratoconus all").is_err());
        assert!(find_saved_search(searches, "Keratoconus All ").is_err());
    }

    #[test]
    fn auth_sentinel_maps_to_auth_error() {
        let body = json!({"detail": "Authentication credentials were not provided."});
        assert!(matches!(parse_listing(body), Err(FetchError::Auth)));
    }

    #[test]
    fn other_detail_is_not_an_auth_error() {
        let body = json!({"detail": "Throttled."});
        assert!(matches!(
            parse_listing(body),
            Err(FetchError::UnexpectedListing { .. })
        ));
    }

    #[test]
    fn non_array_listing_is_rejected() {
        assert!(matches!(
            parse_listing(json!({"searches": []})),
            Err(FetchError::UnexpectedListing { .. })
        ));
    }

    #[test]
    fn string_search_ids_render_verbatim() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        let search = find_saved_search(searches, "Dry Eye").expect("match");
        assert_eq!(search.id.to_string(), "ss-104");
    }

    #[test]
    fn code_lists_preserve_order_and_default_empty() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        let search = find_saved_search(searches, "Keratoconus All").expect("match");
        let lists = CodeLists::from_search(&search);
        assert_eq!(lists.cpt, vec!["92025", "92071"]);
        assert_eq!(lists.icd, vec!["H18.609"]);
        assert!(lists.hcpcs.is_empty());
        assert!(lists.drug.is_empty());
    }

    #[test]
    fn empty_categories_are_never_queried() {
        let searches = parse_listing(keratoconus_listing()).expect("listing parses");
        let search = find_saved_search(searches, "Keratoconus All").expect("match");
        let lists = CodeLists::from_search(&search);
        assert_eq!(
            lists.non_empty_categories(),
            vec![FilterCategory::Cpt, FilterCategory::Icd]
        );
        assert!(CodeLists::default().non_empty_categories().is_empty());
    }
}
