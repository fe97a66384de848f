//! Shared constants for end-to-end tests
//!
//! When test data changes (password, CSV fixtures, ids), update only this
//! file.

// ============================================================================
// Authorization
// ============================================================================

/// Admin password configured on every test server
pub const ADMIN_PASSWORD: &str = "test-admin-password";

// ============================================================================
// CSV Fixtures
// ============================================================================

/// Two discs of one box set, each with its own external id
pub const BTTF_CSV: &str = "title,physical_item_name,formats,external_id,disc_number
\"Back to the Future\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",105,1
\"Back to the Future Part II\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",165,2
";

/// Physical item name used by `BTTF_CSV`
pub const BTTF_ITEM_NAME: &str = "BTTF Trilogy";

/// One row carrying external id 603
pub const MATRIX_CSV: &str = "title,physical_item_name,formats,external_id
The Matrix,Matrix Box,\"[\"\"DVD\"\",\"\"Blu-ray\"\"]\",603
";

/// Mix of a valid row, a row with an unknown format and a row with a
/// missing title
pub const MIXED_CSV: &str = "title,physical_item_name,formats,release_date
Alien,Alien Box,\"[\"\"4K UHD\"\"]\",1979-05-25
Aliens,Alien Box,\"[\"\"Betamax\"\"]\",1986-07-18
,Orphan Box,\"[\"\"DVD\"\"]\",
";

/// Header lacking the required `formats` column
pub const MISSING_COLUMN_CSV: &str = "title,physical_item_name
Alien,Alien Box
";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between server readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// HTTP request timeout (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
