use std::time::{Duration, Instant};

use olpaka_core::progress::aggregator::{
    estimate, DownloadRate, Estimate, ProgressSample, ProgressTracker, RemainingTime,
};

fn sample(downloaded: i64, total: i64, at: Instant) -> ProgressSample {
    ProgressSample {
        downloaded_bytes: downloaded,
        total_bytes: total,
        timestamp: at,
    }
}

// ---------------------------------------------------------------
// estimate
// ---------------------------------------------------------------

#[test]
fn test_estimate_one_second_interval() {
    let t0 = Instant::now();
    let result = estimate(100, 20, 10, t0, t0 + Duration::from_millis(1000));
    assert_eq!(result.rate, DownloadRate(Some(10)));
    assert_eq!(result.remaining, RemainingTime(Some(8)));
    assert!(result.is_known());
}

#[test]
fn test_estimate_unknown_without_byte_delta() {
    let t0 = Instant::now();
    for elapsed_ms in [1, 500, 1000, 60_000] {
        let result = estimate(100, 10, 10, t0, t0 + Duration::from_millis(elapsed_ms));
        assert_eq!(result, Estimate::UNKNOWN, "elapsed={}ms", elapsed_ms);
    }
}

#[test]
fn test_estimate_unknown_without_elapsed_time() {
    let t0 = Instant::now();
    for downloaded in [11, 50, 100] {
        let result = estimate(100, downloaded, 10, t0, t0);
        assert_eq!(result, Estimate::UNKNOWN, "downloaded={}", downloaded);
    }
}

#[test]
fn test_estimate_sub_millisecond_counts_as_zero_elapsed() {
    let t0 = Instant::now();
    let result = estimate(100, 20, 10, t0, t0 + Duration::from_micros(900));
    assert_eq!(result, Estimate::UNKNOWN);
}

#[test]
fn test_estimate_truncates_rate() {
    // 1000 bytes in 3 s → 333.33 B/s, truncated.
    let t0 = Instant::now();
    let result = estimate(10_000, 1_000, 0, t0, t0 + Duration::from_millis(3000));
    assert_eq!(result.rate, DownloadRate(Some(333)));
    assert_eq!(result.remaining, RemainingTime(Some(9_000 / 333)));
}

#[test]
fn test_estimate_rate_truncated_to_zero_leaves_remaining_unknown() {
    // 1 byte over 2 s is 0 B/s after truncation.
    let t0 = Instant::now();
    let result = estimate(100, 11, 10, t0, t0 + Duration::from_millis(2000));
    assert_eq!(result.rate, DownloadRate(Some(0)));
    assert_eq!(result.remaining, RemainingTime(None));
    assert!(!result.is_known());
}

#[test]
fn test_estimate_finished_layer_has_zero_remaining() {
    let t0 = Instant::now();
    let result = estimate(100, 100, 50, t0, t0 + Duration::from_millis(500));
    assert_eq!(result.rate, DownloadRate(Some(100)));
    assert_eq!(result.remaining, RemainingTime(Some(0)));
}

#[test]
fn test_estimate_unknown_when_counter_goes_backwards() {
    let t0 = Instant::now();
    let result = estimate(1000, 200, 300, t0, t0 + Duration::from_millis(1000));
    assert_eq!(result, Estimate::UNKNOWN);
}

#[test]
fn test_estimate_overshoot_clamps_remaining_to_zero() {
    // completed > total: the server reported more bytes than announced.
    let t0 = Instant::now();
    let result = estimate(100, 150, 50, t0, t0 + Duration::from_millis(1000));
    assert_eq!(result.rate, DownloadRate(Some(100)));
    assert_eq!(result.remaining, RemainingTime(Some(0)));
}

// ---------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------

#[test]
fn test_tracker_first_sample_is_unknown() {
    let mut tracker = ProgressTracker::new();
    let result = tracker.update(Some("sha256:a"), sample(10, 100, Instant::now()));
    assert_eq!(result, Estimate::UNKNOWN);
}

#[test]
fn test_tracker_uses_only_previous_sample() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new();
    tracker.update(Some("sha256:a"), sample(0, 1000, t0));
    tracker.update(Some("sha256:a"), sample(100, 1000, t0 + Duration::from_millis(1000)));

    // Only the last interval counts: 400 bytes in 1 s, not 500 in 2 s.
    let result = tracker.update(Some("sha256:a"), sample(500, 1000, t0 + Duration::from_millis(2000)));
    assert_eq!(result.rate, DownloadRate(Some(400)));
    assert_eq!(result.remaining, RemainingTime(Some(1)));
}

#[test]
fn test_tracker_digest_change_discards_previous_sample() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new();
    tracker.update(Some("sha256:a"), sample(900, 1000, t0));

    let result = tracker.update(Some("sha256:b"), sample(10, 500, t0 + Duration::from_millis(1000)));
    assert_eq!(result, Estimate::UNKNOWN);

    let result = tracker.update(Some("sha256:b"), sample(60, 500, t0 + Duration::from_millis(2000)));
    assert_eq!(result.rate, DownloadRate(Some(50)));
    assert_eq!(result.remaining, RemainingTime(Some(8)));
}

#[test]
fn test_tracker_reset() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new();
    tracker.update(None, sample(10, 100, t0));
    tracker.reset();
    let result = tracker.update(None, sample(20, 100, t0 + Duration::from_millis(1000)));
    assert_eq!(result, Estimate::UNKNOWN);
}
