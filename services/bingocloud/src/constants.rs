// Query protocol constants.
pub const API_VERSION: &str = "2009-08-15";
pub const SIGNATURE_VERSION: &str = "2";
pub const SIGNATURE_METHOD: &str = "HmacSHA256";

// Env keys picked up by `Config::from_env`.
pub const BINGO_ENDPOINT: &str = "BINGO_ENDPOINT";
pub const BINGO_ACCESS_KEY_ID: &str = "BINGO_ACCESS_KEY_ID";
pub const BINGO_SECRET_ACCESS_KEY: &str = "BINGO_SECRET_ACCESS_KEY";

// Page size for paginated Describe calls.
pub const MAX_RESULTS: usize = 20;

// The provider stamps request timestamps in its own wall clock (UTC+8),
// with a literal `Z` suffix the backend expects verbatim.
pub const PROVIDER_UTC_OFFSET_SECS: i32 = 8 * 3600;
