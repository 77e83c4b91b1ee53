//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Zone used by every integration scenario.
pub const TEST_ZONE: &str = "fr-par-1";

/// Secret key handed to clients under test.
pub const TEST_SECRET_KEY: &str = "SCWSECRETKEYEXAMPLE";

/// Project owning volumes created by the scenarios.
pub const TEST_PROJECT_ID: &str = "11111111-2222-3333-4444-555555555555";

/// Byte count for a single gigabyte as the Instance API counts it.
pub const BYTES_PER_GB: u64 = 1 << 30;
