/// Onboarding engine constants

/// Retry ceiling recorded on every integration record
pub const INTEGRATION_MAX_RETRIES: u32 = 3;

/// Template used when a requested template name is unknown
pub const DEFAULT_TEMPLATE: &str = "generic";

/// Default deadline for a single adapter call
pub const DEFAULT_INTEGRATION_TIMEOUT_SECS: u64 = 30;

/// Default page size for document searches
pub const DEFAULT_DOC_SEARCH_LIMIT: u32 = 20;
