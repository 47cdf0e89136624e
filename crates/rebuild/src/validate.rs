// Checks of a rebuilt table against the reference.

use bbb_frame::{compare, Frame};
use tracing::{debug, warn};

use crate::error::{DescriptionIssue, MismatchReport, RebuildError};

/// Run the frame check, then the description check. The first failure is
/// returned; the description is not looked at when the frame check fails.
pub fn verify(rebuilt: &Frame, reference: &Frame) -> Result<(), RebuildError> {
    check_frame(rebuilt, reference)?;
    check_description(rebuilt, reference)
}

/// Shape, column order, dtypes, categories and every value must agree.
pub fn check_frame(rebuilt: &Frame, reference: &Frame) -> Result<(), RebuildError> {
    let comparison = compare(rebuilt, reference);
    if comparison.is_equal() {
        debug!(rows = rebuilt.nrows(), cols = rebuilt.ncols(), "frame check passed");
        return Ok(());
    }
    warn!(
        mismatched = comparison.mismatched_columns().count(),
        same_order = comparison.same_order,
        "frame check failed"
    );
    Err(RebuildError::FrameMismatch(Box::new(MismatchReport { comparison })))
}

/// The rebuilt table must carry exactly the reference's description.
pub fn check_description(rebuilt: &Frame, reference: &Frame) -> Result<(), RebuildError> {
    match (&rebuilt.description, &reference.description) {
        (None, _) => Err(RebuildError::DescriptionMismatch(DescriptionIssue::Missing)),
        (Some(ours), Some(theirs)) if ours == theirs => {
            debug!("description check passed");
            Ok(())
        }
        _ => Err(RebuildError::DescriptionMismatch(DescriptionIssue::Differs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbb_frame::{Column, DType};

    fn table(book: i32) -> Frame {
        Frame::new(vec![
            Column::str("acctnum", vec![Some("10001".into())]),
            Column::int32("book", vec![Some(book)]),
        ])
        .unwrap()
        .with_description("Bookbinders")
    }

    #[test]
    fn identical_tables_pass() {
        verify(&table(10), &table(10)).unwrap();
    }

    #[test]
    fn value_difference_fails_frame_check() {
        let err = verify(&table(10), &table(11)).unwrap_err();
        let report = err.mismatch_report().unwrap();
        assert_eq!(report.comparison.mismatched_columns().count(), 1);
        assert!(report.to_string().contains("book: 1 value mismatch(es)"));
    }

    #[test]
    fn dtype_difference_fails_frame_check() {
        let mut rebuilt = table(10);
        rebuilt.cast("book", DType::Int64).unwrap();
        let err = verify(&rebuilt, &table(10)).unwrap_err();
        let report = err.mismatch_report().unwrap();
        assert!(report.to_string().contains("int64"));
    }

    #[test]
    fn frame_failure_wins_over_description_failure() {
        let mut rebuilt = table(10);
        rebuilt.description = None;
        let err = verify(&rebuilt, &table(99)).unwrap_err();
        assert!(matches!(err, RebuildError::FrameMismatch(_)));
    }

    #[test]
    fn missing_description_fails() {
        let mut rebuilt = table(10);
        rebuilt.description = None;
        let err = verify(&rebuilt, &table(10)).unwrap_err();
        assert!(matches!(err, RebuildError::DescriptionMismatch(DescriptionIssue::Missing)));
    }

    #[test]
    fn different_description_fails() {
        let rebuilt = table(10).with_description("Bookbinders\n");
        let err = verify(&rebuilt, &table(10)).unwrap_err();
        assert!(matches!(err, RebuildError::DescriptionMismatch(DescriptionIssue::Differs)));
    }
}
