use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::search::SearchId;
use crate::table::Row;

pub const NO_TYPE_DATA_FLAG: &str = "No Payer Type Data Available";
pub const NO_NAME_DATA_FLAG: &str = "No Payer Name Data Available";

#[derive(Debug, Clone, Copy)]
enum GroupBy {
    PayerType,
    PayerName,
}

impl GroupBy {
    fn query_value(self) -> &'static str {
        match self {
            Self::PayerType => "payer_type",
            Self::PayerName => "payer_name",
        }
    }

    fn flag_column(self) -> &'static str {
        match self {
            Self::PayerType => NO_TYPE_DATA_FLAG,
            Self::PayerName => NO_NAME_DATA_FLAG,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PayerMixResponse {
    results: Vec<PayerMixEntry>,
}

#[derive(Debug, Deserialize)]
struct PayerMixEntry {
    #[serde(default)]
    payer_type: Option<String>,
    #[serde(default)]
    payer_name: Option<String>,
    percentage: Value,
}

enum PayerFetch {
    /// Empty body or empty JSON document: the API knows nothing about this
    /// provider, and the provider is skipped for both tables.
    Empty,
    Entries(Vec<PayerMixEntry>),
}

/// Two rows per provider (payer-type and payer-name breakdowns), each with a
/// no-data flag; providers whose responses are empty are skipped with a log
/// line. Each table is stable-sorted so rows with data come first.
pub async fn fetch_payer_insights(
    client: &Client,
    base_url: &str,
    token: &str,
    npis: &[String],
    search_id: &SearchId,
) -> Result<(Vec<Row>, Vec<Row>)> {
    let progress = ProgressBar::new(npis.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [payer-mix {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_message("Getting payer insights...");

    let mut type_rows = Vec::new();
    let mut name_rows = Vec::new();

    for npi in npis {
        let type_fetch =
            fetch_group(client, base_url, token, npi, search_id, GroupBy::PayerType).await?;
        let name_fetch =
            fetch_group(client, base_url, token, npi, search_id, GroupBy::PayerName).await?;
        progress.inc(1);

        let (PayerFetch::Entries(type_entries), PayerFetch::Entries(name_entries)) =
            (type_fetch, name_fetch)
        else {
            eprintln!("No response for {npi}; skipping payer mix");
            continue;
        };

        type_rows.push(build_row(npi, GroupBy::PayerType, type_entries)?);
        name_rows.push(build_row(npi, GroupBy::PayerName, name_entries)?);
    }

    progress.finish_with_message("payer insights complete");

    sort_by_no_data_flag(&mut type_rows, NO_TYPE_DATA_FLAG);
    sort_by_no_data_flag(&mut name_rows, NO_NAME_DATA_FLAG);
    Ok((type_rows, name_rows))
}

async fn fetch_group(
    client: &Client,
    base_url: &str,
    token: &str,
    npi: &str,
    search_id: &SearchId,
    group_by: GroupBy,
) -> Result<PayerFetch, FetchError> {
    let url = format!(
        "{base_url}/api/v1/entities/entity/{npi}/payer-mix/?group_by={}&saved_search={search_id}",
        group_by.query_value()
    );

    let response = client
        .get(&url)
        .header(AUTHORIZATION, token)
        .send()
        .await
        .map_err(|err| malformed(npi, group_by, format!("request failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(malformed(npi, group_by, format!("HTTP status {status}")));
    }

    let text = response
        .text()
        .await
        .map_err(|err| malformed(npi, group_by, format!("failed reading body: {err}")))?;
    parse_group_body(&text, npi, group_by)
}

fn parse_group_body(text: &str, npi: &str, group_by: GroupBy) -> Result<PayerFetch, FetchError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(PayerFetch::Empty);
    }

    let body: Value = serde_json::from_str(trimmed)
        .map_err(|err| malformed(npi, group_by, format!("invalid JSON: {err}")))?;
    let empty = match &body {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(value) => value.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(PayerFetch::Empty);
    }

    let parsed: PayerMixResponse = serde_json::from_value(body)
        .map_err(|err| malformed(npi, group_by, format!("invalid payer-mix shape: {err}")))?;
    Ok(PayerFetch::Entries(parsed.results))
}

/// NPI first, then the no-data flag (true iff `results` was empty), then one
/// percentage column per returned entry.
fn build_row(npi: &str, group_by: GroupBy, entries: Vec<PayerMixEntry>) -> Result<Row, FetchError> {
    let mut row = Row::new();
    row.insert("NPI", Value::String(npi.to_string()));
    row.insert(group_by.flag_column(), Value::Bool(entries.is_empty()));

    for entry in entries {
        let PayerMixEntry {
            payer_type,
            payer_name,
            percentage,
        } = entry;
        let key = match group_by {
            GroupBy::PayerType => payer_type,
            GroupBy::PayerName => payer_name,
        }
        .ok_or_else(|| {
            malformed(
                npi,
                group_by,
                format!("entry missing {}", group_by.query_value()),
            )
        })?;
        row.insert(key, percentage);
    }
    Ok(row)
}

/// Stable: providers with data come first, fetch order preserved within each
/// group.
fn sort_by_no_data_flag(rows: &mut [Row], flag_column: &str) {
    rows.sort_by_key(|row| row.flag(flag_column));
}

fn malformed(npi: &str, group_by: GroupBy, reason: String) -> FetchError {
    FetchError::MalformedResponse {
        npi: npi.to_string(),
        category: format!("payer-mix ({})", group_by.query_value()),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(body: Value, npi: &str, group_by: GroupBy) -> Vec<PayerMixEntry> {
        match parse_group_body(&body.to_string(), npi, group_by).expect("parses") {
            PayerFetch::Entries(entries) => entries,
            PayerFetch::Empty => panic!("expected entries"),
        }
    }

    #[test]
    fn populated_results_become_percentage_columns() {
        let entries = entries(
            json!({"results": [
                {"payer_type": "Medicare", "percentage": 61.5},
                {"payer_type": "Commercial", "percentage": 38.5}
            ]}),
            "123",
            GroupBy::PayerType,
        );
        let row = build_row("123", GroupBy::PayerType, entries).expect("row");

        assert_eq!(row.get("NPI"), Some(&json!("123")));
        assert_eq!(row.get(NO_TYPE_DATA_FLAG), Some(&json!(false)));
        assert_eq!(row.get("Medicare"), Some(&json!(61.5)));
        assert_eq!(row.get("Commercial"), Some(&json!(38.5)));
    }

    #[test]
    fn empty_results_set_the_no_data_flag() {
        let entries = entries(json!({"results": []}), "A", GroupBy::PayerName);
        let row = build_row("A", GroupBy::PayerName, entries).expect("row");
        assert_eq!(row.get(NO_NAME_DATA_FLAG), Some(&json!(true)));
        assert_eq!(row.get("NPI"), Some(&json!("A")));
    }

    #[test]
    fn empty_bodies_skip_the_provider() {
        assert!(matches!(
            parse_group_body("", "123", GroupBy::PayerType),
            Ok(PayerFetch::Empty)
        ));
        assert!(matches!(
            parse_group_body("{}", "123", GroupBy::PayerType),
            Ok(PayerFetch::Empty)
        ));
        assert!(matches!(
            parse_group_body("[]", "123", GroupBy::PayerName),
            Ok(PayerFetch::Empty)
        ));
        assert!(matches!(
            parse_group_body("null", "123", GroupBy::PayerName),
            Ok(PayerFetch::Empty)
        ));
    }

    #[test]
    fn populated_body_without_results_is_malformed() {
        assert!(matches!(
            parse_group_body(r#"{"next": null}"#, "123", GroupBy::PayerType),
            Err(FetchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn rows_with_data_sort_before_rows_without() {
        // Provider A has no results, provider B has one entry.
        let a = build_row("A", GroupBy::PayerType, Vec::new()).expect("row");
        let b = build_row(
            "B",
            GroupBy::PayerType,
            entries(
                json!({"results": [{"payer_type": "Medicaid", "percentage": 12.0}]}),
                "B",
                GroupBy::PayerType,
            ),
        )
        .expect("row");

        let mut rows = vec![a, b];
        sort_by_no_data_flag(&mut rows, NO_TYPE_DATA_FLAG);

        assert_eq!(rows[0].get("NPI"), Some(&json!("B")));
        assert_eq!(rows[1].get("NPI"), Some(&json!("A")));
        assert_eq!(rows[1].get(NO_TYPE_DATA_FLAG), Some(&json!(true)));
    }

    #[test]
    fn sort_is_stable_within_equal_flags() {
        let mut rows = vec![
            build_row("n1", GroupBy::PayerName, Vec::new()).expect("row"),
            build_row(
                "n2",
                GroupBy::PayerName,
                entries(
                    json!({"results": [{"payer_name": "Aetna", "percentage": 90.0}]}),
                    "n2",
                    GroupBy::PayerName,
                ),
            )
            .expect("row"),
            build_row("n3", GroupBy::PayerName, Vec::new()).expect("row"),
            build_row(
                "n4",
                GroupBy::PayerName,
                entries(
                    json!({"results": [{"payer_name": "Cigna", "percentage": 10.0}]}),
                    "n4",
                    GroupBy::PayerName,
                ),
            )
            .expect("row"),
        ];
        sort_by_no_data_flag(&mut rows, NO_NAME_DATA_FLAG);

        let order: Vec<_> = rows
            .iter()
            .map(|row| row.get("NPI").and_then(Value::as_str).unwrap().to_string())
            .collect();
        assert_eq!(order, vec!["n2", "n4", "n1", "n3"]);
    }

    #[test]
    fn entry_missing_group_key_is_malformed() {
        let entries = entries(
            json!({"results": [{"payer_name": "Aetna", "percentage": 90.0}]}),
            "123",
            GroupBy::PayerType,
        );
        assert!(build_row("123", GroupBy::PayerType, entries).is_err());
    }
}
