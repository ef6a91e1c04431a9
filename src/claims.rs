use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;

use crate::codes::{FilterCategory, codes_query_value};
use crate::error::FetchError;
use crate::search::CodeLists;
use crate::table::Row;

#[derive(Debug, Deserialize)]
struct ClaimsResponse {
    result: ClaimsResult,
}

#[derive(Debug, Deserialize)]
struct ClaimsResult {
    charts: ClaimsCharts,
}

#[derive(Debug, Deserialize)]
struct ClaimsCharts {
    pie1: ClaimsPie,
}

#[derive(Debug, Deserialize)]
struct ClaimsPie {
    series: Vec<Value>,
    labels: Vec<String>,
}

/// One row per provider, in input order. Each non-empty filter category
/// costs one request; its chart labels/values merge into the same row, and
/// `NPI` is set last. Any malformed response fails the run naming the
/// provider and category.
pub async fn fetch_claims(
    client: &Client,
    base_url: &str,
    token: &str,
    npis: &[String],
    code_lists: &CodeLists,
) -> Result<Vec<Row>> {
    let progress = ProgressBar::new(npis.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [claims {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_message("Getting claims data...");

    let mut rows = Vec::with_capacity(npis.len());
    for npi in npis {
        let mut row = Row::new();
        for category in code_lists.non_empty_categories() {
            let codes = code_lists.for_category(category);
            let pie = fetch_category(client, base_url, token, npi, category, codes).await?;
            merge_pie_into_row(pie, &mut row).map_err(|reason| malformed(npi, category, reason))?;
        }
        row.insert("NPI", Value::String(npi.clone()));
        rows.push(row);
        progress.inc(1);
    }

    progress.finish_with_message("claims data complete");
    Ok(rows)
}

async fn fetch_category(
    client: &Client,
    base_url: &str,
    token: &str,
    npi: &str,
    category: FilterCategory,
    codes: &[String],
) -> Result<ClaimsPie, FetchError> {
    let url = format!(
        "{base_url}/api/v1/center/{npi}/{}?{}={}",
        category.segment(),
        category.query_param(),
        codes_query_value(codes, category),
    );

    let response = client
        .get(&url)
        .header(AUTHORIZATION, token)
        .send()
        .await
        .map_err(|err| malformed(npi, category, format!("request failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(malformed(npi, category, format!("HTTP status {status}")));
    }

    let body: ClaimsResponse = response
        .json()
        .await
        .map_err(|err| malformed(npi, category, format!("invalid response shape: {err}")))?;
    Ok(body.result.charts.pie1)
}

/// Zips `labels[i] -> series[i]` into the accumulating row. A label already
/// present (collision across categories) keeps its column position and takes
/// the newer value.
fn merge_pie_into_row(pie: ClaimsPie, row: &mut Row) -> Result<(), String> {
    if pie.series.len() != pie.labels.len() {
        return Err(format!(
            "chart has {} series values but {} labels",
            pie.series.len(),
            pie.labels.len()
        ));
    }
    for (label, value) in pie.labels.into_iter().zip(pie.series) {
        row.insert(label, value);
    }
    Ok(())
}

fn malformed(npi: &str, category: FilterCategory, reason: String) -> FetchError {
    FetchError::MalformedResponse {
        npi: npi.to_string(),
        category: category.segment().to_string(),
        reason,
    }
}
