//! Property-based tests for the pure domain rules.
//!
//! These use proptest to verify invariants across a wide range of inputs,
//! helping to catch edge cases that unit tests might miss.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use opsdesk_api::services::orders::{is_completed_status, normalize_opt_in, resolve_completion};
use opsdesk_api::services::promotional_items::apply_return;

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Pending".to_string()),
        Just("Completed".to_string()),
        Just("completed (manual)".to_string()),
        Just("On Hold".to_string()),
        "[A-Za-z ]{0,20}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // All six flags set always yields a completed status with a timestamp.
    #[test]
    fn all_flags_set_always_completes(
        status in status_strategy(),
        prior in proptest::option::of(timestamp_strategy()),
        now in timestamp_strategy(),
    ) {
        let (new_status, completed_at) = resolve_completion(&status, true, prior, now);
        prop_assert!(is_completed_status(&new_status));
        prop_assert!(completed_at.is_some());
        // An existing stamp is never overwritten.
        if let Some(prior) = prior {
            prop_assert_eq!(completed_at, Some(prior));
        }
    }

    // Any cleared flag always yields a non-completed status with no timestamp.
    #[test]
    fn incomplete_flags_never_complete(
        status in status_strategy(),
        prior in proptest::option::of(timestamp_strategy()),
        now in timestamp_strategy(),
    ) {
        let (new_status, completed_at) = resolve_completion(&status, false, prior, now);
        prop_assert!(!is_completed_status(&new_status));
        prop_assert_eq!(completed_at, None);
    }

    // Resolution is idempotent: applying it twice changes nothing.
    #[test]
    fn completion_resolution_is_idempotent(
        status in status_strategy(),
        all_set in any::<bool>(),
        prior in proptest::option::of(timestamp_strategy()),
        now in timestamp_strategy(),
    ) {
        let (s1, c1) = resolve_completion(&status, all_set, prior, now);
        let (s2, c2) = resolve_completion(&s1, all_set, c1, now);
        prop_assert_eq!(s1, s2);
        prop_assert_eq!(c1, c2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // The counter invariant holds for any return amount.
    #[test]
    fn returned_availability_stays_in_bounds(
        total in 0i32..10_000,
        available in 0i32..10_000,
        returned in 0i32..10_000,
    ) {
        let available = available.min(total);
        let new_available = apply_return(total, available, returned);
        prop_assert!(new_available >= 0);
        prop_assert!(new_available <= total);
        prop_assert!(new_available >= available);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Normalization never yields an empty or pending-literal value.
    #[test]
    fn normalized_opt_in_is_never_blank_or_pending(value in proptest::option::of("[A-Za-z ]{0,15}")) {
        if let Some(out) = normalize_opt_in(value) {
            prop_assert!(!out.trim().is_empty());
            prop_assert!(!out.eq_ignore_ascii_case("pending"));
            // Output is always trimmed.
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
