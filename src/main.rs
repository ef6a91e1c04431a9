mod args;
mod claims;
mod codes;
mod constants;
mod error;
mod input;
mod payer;
mod search;
mod table;

use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::Client;
use std::fs;

use args::Args;
use claims::fetch_claims;
use payer::fetch_payer_insights;
use search::{CodeLists, resolve_saved_search};
use table::write_csv;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.auth_token.trim().is_empty() {
        bail!("Enter an authorization token (--auth-token)");
    }
    if args.search_name.trim().is_empty() {
        bail!("Enter a saved-search name (--search-name)");
    }

    let npis = input::read_npis(&args.input_path, &args.npi_column)?;
    println!(
        "Read {} provider identifiers from {}",
        npis.len(),
        args.input_path.display()
    );

    let client = Client::builder()
        .user_agent("insights-fetcher/0.1")
        .build()
        .context("Failed creating HTTP client")?;

    let base_url = args.api_base_url.trim_end_matches('/');

    let search =
        resolve_saved_search(&client, base_url, &args.auth_token, &args.search_name).await?;
    println!(
        "Resolved saved search {:?} (id {})",
        search.search_name, search.id
    );
    let code_lists = CodeLists::from_search(&search);

    let (type_rows, name_rows) =
        fetch_payer_insights(&client, base_url, &args.auth_token, &npis, &search.id).await?;
    let claims_rows = fetch_claims(&client, base_url, &args.auth_token, &npis, &code_lists).await?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed creating output dir {}", args.output_dir.display()))?;

    let payer_type_path = args.output_dir.join(&args.payer_type_file);
    write_csv(&type_rows, &payer_type_path)?;
    println!("Wrote payer-type mix {}", payer_type_path.display());

    let payer_name_path = args.output_dir.join(&args.payer_name_file);
    write_csv(&name_rows, &payer_name_path)?;
    println!("Wrote payer-name mix {}", payer_name_path.display());

    let claims_path = args.output_dir.join(&args.claims_file);
    write_csv(&claims_rows, &claims_path)?;
    println!("Wrote claims-by-code {}", claims_path.display());

    Ok(())
}
