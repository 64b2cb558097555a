//! Time-window validation.

use crate::error::{NotaryError, NotaryResult};
use shared_types::{Timestamp, WireTransaction};

/// Checks the transaction's time window against the notary clock.
///
/// A transaction without a time window is valid. Bounds are inclusive and
/// widened by `tolerance_ms` on both sides.
pub fn check_time_window(
    tx: &WireTransaction,
    now: Timestamp,
    tolerance_ms: u64,
) -> NotaryResult<()> {
    let windows = tx.time_windows();
    match windows.as_slice() {
        [] => Ok(()),
        [window] if window.contains(now, tolerance_ms) => Ok(()),
        [window] => Err(NotaryError::TimestampInvalid {
            current_time: now,
            time_window: **window,
        }),
        _ => Err(NotaryError::MoreThanOneTimestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Command, TimeWindow};

    fn tx_with(windows: &[TimeWindow]) -> WireTransaction {
        let commands = windows
            .iter()
            .map(|w| Command::new("cash.Move").with_time_window(*w))
            .chain(std::iter::once(Command::new("cash.Issue")))
            .collect();
        WireTransaction::new(vec![], vec![], vec![], commands, None).unwrap()
    }

    #[test]
    fn test_no_window_is_valid() {
        assert!(check_time_window(&tx_with(&[]), 0, 0).is_ok());
    }

    #[test]
    fn test_bounds_inclusive() {
        let tx = tx_with(&[TimeWindow::between(100, 200).unwrap()]);
        assert!(check_time_window(&tx, 100, 0).is_ok());
        assert!(check_time_window(&tx, 200, 0).is_ok());
        assert!(matches!(
            check_time_window(&tx, 201, 0),
            Err(NotaryError::TimestampInvalid { current_time: 201, .. })
        ));
    }

    #[test]
    fn test_tolerance_widens() {
        let tx = tx_with(&[TimeWindow::until_only(200)]);
        assert!(check_time_window(&tx, 250, 50).is_ok());
        assert!(check_time_window(&tx, 251, 50).is_err());
    }

    #[test]
    fn test_two_windows_rejected() {
        let tx = tx_with(&[TimeWindow::from_only(1), TimeWindow::from_only(2)]);
        assert_eq!(
            check_time_window(&tx, 10, 0),
            Err(NotaryError::MoreThanOneTimestamp)
        );
    }
}
