//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (device ids, fixture calibration rows, etc.),
//! update only this file.

// ============================================================================
// Test Devices
// ============================================================================

/// Device that owns the blend profiles created by the tests
pub const DEVICE_1_ID: &str = "esp32-roastery-01";

/// A second device, used to check that profiles are scoped per device
pub const DEVICE_2_ID: &str = "esp32-cupping-02";

// ============================================================================
// Fixture Calibration Rows
// ============================================================================

/// Coffee type code of the fixture row (roasted)
pub const FIXTURE_COFFEE_TYPE: i64 = 1;

/// Coffee origin code of the fixture row (ethiopia)
pub const FIXTURE_COFFEE_ORIGIN: i64 = 12;

/// Variety of the fixture row
pub const FIXTURE_VARIETY: &str = "Heirloom";

/// CO2 coefficient of the fixture row
pub const FIXTURE_CO2_COEFF: f64 = 0.2;

/// Protein offset of the fixture row
pub const FIXTURE_PROTEIN_OFFSET: f64 = 0.5;

// ============================================================================
// Reference Calibration Values
// ============================================================================

/// Origin code of Uganda in the reference table
pub const UGANDA_ORIGIN: i64 = 11;

/// CO2 coefficient of the Uganda reference row
pub const UGANDA_CO2_COEFF: f64 = 0.128;

// ============================================================================
// Timeouts and Limits
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// HTTP request timeout for tests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server readiness (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
