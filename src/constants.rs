pub const DEFAULT_API_BASE_URL: &str = "https://api.medscout.io";

/// Exact `detail` message the saved-search listing returns when the
/// Authorization header is missing or rejected.
pub const AUTH_SENTINEL: &str = "Authentication credentials were not provided.";

pub const DEFAULT_NPI_COLUMN: &str = "NPI / CCN";
