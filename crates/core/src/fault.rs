//! Per-room synthetic failure injection.
//!
//! A room's [`FaultState`] decides whether an inbound request is accepted or
//! answered with a caller-chosen status code, so webhook senders can exercise
//! their retry logic against a room.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status returned when a fault is enabled without an explicit code.
pub const DEFAULT_FAULT_STATUS: u16 = 500;

/// Lowest status code a fault may simulate.
pub const MIN_FAULT_STATUS: u16 = 100;

/// Highest status code a fault may simulate.
pub const MAX_FAULT_STATUS: u16 = 599;

/// Fault configuration of one room.
///
/// Invariant: `enabled` implies `status_code.is_some()`, and `!enabled`
/// implies `status_code.is_none() && !force`. Build values through
/// [`FaultState::configure`] to keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaultState {
    pub enabled: bool,
    pub status_code: Option<u16>,
    pub force: bool,
}

impl FaultState {
    /// The state of a room nobody has configured.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Normalize an admin request into a consistent state.
    ///
    /// Enabling without a status defaults to 500. Disabling clears the status
    /// and `force` whatever the input said; the status is not validated then.
    pub fn configure(
        enabled: bool,
        status_code: Option<u16>,
        force: Option<bool>,
    ) -> Result<Self, CoreError> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let status_code = status_code.unwrap_or(DEFAULT_FAULT_STATUS);
        if !(MIN_FAULT_STATUS..=MAX_FAULT_STATUS).contains(&status_code) {
            return Err(CoreError::Validation(format!(
                "status_code must be between {MIN_FAULT_STATUS} and {MAX_FAULT_STATUS}, got {status_code}"
            )));
        }

        Ok(Self {
            enabled: true,
            status_code: Some(status_code),
            force: force.unwrap_or(false),
        })
    }
}

/// Deployment-wide knobs for fault evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPolicy {
    /// Whether a forced fault also applies to `OPTIONS` and `HEAD`.
    pub force_applies_to_preflight_methods: bool,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            force_applies_to_preflight_methods: true,
        }
    }
}

/// Result of evaluating a room's fault state against a request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    Accept,
    Reject { status_code: u16 },
}

/// Decide whether a request with `method` is accepted or faulted.
///
/// | enabled | force | method  | outcome |
/// |---------|-------|---------|---------|
/// | false   | -     | any     | accept  |
/// | true    | false | GET     | accept  |
/// | true    | false | non-GET | reject  |
/// | true    | true  | any     | reject  |
///
/// With `force_applies_to_preflight_methods = false`, a forced fault lets
/// `OPTIONS` and `HEAD` through.
pub fn decide_outcome(method: &str, state: &FaultState, policy: &FaultPolicy) -> FaultOutcome {
    if !state.enabled {
        return FaultOutcome::Accept;
    }
    let status_code = state.status_code.unwrap_or(DEFAULT_FAULT_STATUS);
    let reject = FaultOutcome::Reject { status_code };

    if state.force {
        if is_preflight(method) && !policy.force_applies_to_preflight_methods {
            return FaultOutcome::Accept;
        }
        return reject;
    }

    if method.eq_ignore_ascii_case("GET") {
        FaultOutcome::Accept
    } else {
        reject
    }
}

fn is_preflight(method: &str) -> bool {
    method.eq_ignore_ascii_case("OPTIONS") || method.eq_ignore_ascii_case("HEAD")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn enabled(status: u16, force: bool) -> FaultState {
        FaultState::configure(true, Some(status), Some(force)).unwrap()
    }

    // -- configure -----------------------------------------------------------

    #[test]
    fn enabling_without_status_defaults_to_500() {
        let state = FaultState::configure(true, None, None).unwrap();
        assert_eq!(
            state,
            FaultState {
                enabled: true,
                status_code: Some(500),
                force: false
            }
        );
    }

    #[test]
    fn disabling_clears_status_and_force() {
        let state = FaultState::configure(false, Some(503), Some(true)).unwrap();
        assert_eq!(state, FaultState::disabled());
    }

    #[test]
    fn disabling_ignores_out_of_range_status() {
        assert!(FaultState::configure(false, Some(42), None).is_ok());
    }

    #[test]
    fn enabling_rejects_out_of_range_status() {
        assert_matches!(
            FaultState::configure(true, Some(99), None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            FaultState::configure(true, Some(600), None),
            Err(CoreError::Validation(_))
        );
    }

    // -- decide_outcome ------------------------------------------------------

    #[test]
    fn disabled_accepts_everything() {
        let policy = FaultPolicy::default();
        for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert_eq!(
                decide_outcome(method, &FaultState::disabled(), &policy),
                FaultOutcome::Accept
            );
        }
    }

    #[test]
    fn unforced_fault_spares_get_only() {
        let policy = FaultPolicy::default();
        let state = enabled(503, false);
        assert_eq!(decide_outcome("GET", &state, &policy), FaultOutcome::Accept);
        assert_eq!(decide_outcome("get", &state, &policy), FaultOutcome::Accept);
    }

    #[test]
    fn unforced_fault_rejects_writes() {
        let policy = FaultPolicy::default();
        let state = enabled(503, false);
        for method in ["POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD", "head"] {
            assert_eq!(
                decide_outcome(method, &state, &policy),
                FaultOutcome::Reject { status_code: 503 },
                "{method} should be rejected"
            );
        }
    }

    #[test]
    fn forced_fault_rejects_reads() {
        let policy = FaultPolicy::default();
        let state = enabled(429, true);
        assert_eq!(
            decide_outcome("GET", &state, &policy),
            FaultOutcome::Reject { status_code: 429 }
        );
    }

    #[test]
    fn forced_fault_can_exempt_preflight_methods() {
        let policy = FaultPolicy {
            force_applies_to_preflight_methods: false,
        };
        let state = enabled(502, true);
        assert_eq!(decide_outcome("OPTIONS", &state, &policy), FaultOutcome::Accept);
        assert_eq!(decide_outcome("HEAD", &state, &policy), FaultOutcome::Accept);
        assert_eq!(
            decide_outcome("GET", &state, &policy),
            FaultOutcome::Reject { status_code: 502 }
        );
    }
}
