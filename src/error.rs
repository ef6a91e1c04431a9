use thiserror::Error;

/// Terminal failures for a run. The only locally-recovered condition (a
/// provider whose payer-mix responses are empty) never becomes an error
/// value; it is logged and the provider is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Authorization token is incorrect")]
    Auth,

    #[error("Invalid search name: no saved search named {name:?}")]
    SearchNotFound { name: String },

    #[error("Invalid input file {path}: {reason}")]
    InvalidInput { path: String, reason: String },

    #[error("Malformed {category} response for provider {npi}: {reason}")]
    MalformedResponse {
        npi: String,
        category: String,
        reason: String,
    },

    #[error("Unexpected saved-search listing: {reason}")]
    UnexpectedListing { reason: String },
}
