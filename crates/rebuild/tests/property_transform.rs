// Property-based tests for ZIP and date transforms.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use bbb_rebuild::transform::{date_from_offset, months_between, zero_pad, zip3, ZIP_WIDTH};
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// Dates between 1900 and 2100.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (-25_567i64..47_482).prop_map(|offset| date_from_offset(epoch(), offset).unwrap())
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn padded_zip_keeps_digits_and_width(zip in r"[0-9]{0,7}") {
        let padded = zero_pad(&zip, ZIP_WIDTH);
        prop_assert!(padded.len() >= ZIP_WIDTH);
        prop_assert!(padded.ends_with(&zip));
        prop_assert_eq!(padded.trim_start_matches('0'), zip.trim_start_matches('0'));
    }

    #[test]
    fn zip3_is_prefix_of_padded(zip in r"[0-9]{1,5}") {
        let padded = zero_pad(&zip, ZIP_WIDTH);
        let prefix = zip3(&padded);
        prop_assert_eq!(prefix.len(), 3);
        prop_assert!(padded.starts_with(&prefix));
    }

    #[test]
    fn offsets_round_trip(offset in -100_000i64..100_000) {
        let date = date_from_offset(epoch(), offset).unwrap();
        prop_assert_eq!((date - epoch()).num_days(), offset);
    }

    #[test]
    fn months_between_is_additive(a in arb_date(), b in arb_date(), c in arb_date()) {
        prop_assert_eq!(months_between(a, b) + months_between(b, c), months_between(a, c));
        prop_assert_eq!(months_between(a, b), -months_between(b, a));
    }

    #[test]
    fn months_between_ignores_day(a in arb_date(), b in arb_date()) {
        let start_of = |d: NaiveDate| d.with_day0(0).unwrap();
        prop_assert_eq!(months_between(a, b), months_between(start_of(a), start_of(b)));
    }
}
