use clap::Parser;
use std::path::PathBuf;

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_NPI_COLUMN};

#[derive(Debug, Parser)]
#[command(name = "insights_fetcher")]
#[command(
    about = "Fetch per-provider payer-mix and claims-by-code tables from MedScout and export them as CSV"
)]
pub struct Args {
    /// Authorization header value for the MedScout API.
    #[arg(long)]
    pub auth_token: String,

    /// Saved-search name to resolve (exact, case-sensitive match).
    #[arg(long)]
    pub search_name: String,

    /// CSV file containing the provider identifiers.
    #[arg(long)]
    pub input_path: PathBuf,

    /// Header of the identifier column in the input file.
    #[arg(long, default_value = DEFAULT_NPI_COLUMN)]
    pub npi_column: String,

    /// Directory the three output tables are written into.
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// File name for the payer-type mix table.
    #[arg(long, default_value = "payer_type_mix.csv")]
    pub payer_type_file: String,

    /// File name for the payer-name mix table.
    #[arg(long, default_value = "payer_name_mix.csv")]
    pub payer_name_file: String,

    /// File name for the claims-by-code table.
    #[arg(long, default_value = "claims_by_code.csv")]
    pub claims_file: String,

    /// API base URL.
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,
}
