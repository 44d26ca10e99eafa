use olpaka_core::download::state::{DownloadState, DownloadStateCell, TransitionError};

#[test]
fn test_starts_inactive() {
    let cell = DownloadStateCell::new();
    assert_eq!(cell.get(), DownloadState::Inactive);
    assert_eq!(*cell.subscribe().borrow(), DownloadState::Inactive);
}

#[test]
fn test_full_cycle() {
    let cell = DownloadStateCell::new();
    cell.begin().unwrap();
    assert_eq!(cell.get(), DownloadState::Downloading);
    cell.complete().unwrap();
    assert_eq!(cell.get(), DownloadState::Completed);
    cell.reset().unwrap();
    assert_eq!(cell.get(), DownloadState::Inactive);
}

#[test]
fn test_subscriber_sees_every_transition_once() {
    let cell = DownloadStateCell::new();
    let mut rx = cell.subscribe();
    let mut seen = vec![*rx.borrow_and_update()];

    let steps: [fn(&DownloadStateCell) -> Result<(), TransitionError>; 3] = [
        DownloadStateCell::begin,
        DownloadStateCell::complete,
        DownloadStateCell::reset,
    ];
    for step in steps {
        step(&cell).unwrap();
        assert!(rx.has_changed().unwrap());
        seen.push(*rx.borrow_and_update());
        assert!(!rx.has_changed().unwrap());
    }

    assert_eq!(
        seen,
        vec![
            DownloadState::Inactive,
            DownloadState::Downloading,
            DownloadState::Completed,
            DownloadState::Inactive,
        ]
    );
}

#[test]
fn test_begin_twice_does_not_double_fire() {
    let cell = DownloadStateCell::new();
    let mut rx = cell.subscribe();
    cell.begin().unwrap();
    rx.borrow_and_update();

    let err = cell.begin().unwrap_err();
    assert_eq!(
        err,
        TransitionError {
            from: DownloadState::Downloading,
            to: DownloadState::Downloading,
        }
    );
    assert!(!rx.has_changed().unwrap(), "rejected transition must not publish");
}

#[test]
fn test_cannot_skip_states() {
    let cell = DownloadStateCell::new();
    // INACTIVE → COMPLETED skips DOWNLOADING
    assert!(cell.complete().is_err());
    // INACTIVE → INACTIVE via reset
    assert!(cell.reset().is_err());

    cell.begin().unwrap();
    // DOWNLOADING → INACTIVE via reset (only abort may do that)
    assert!(cell.reset().is_err());

    cell.complete().unwrap();
    // COMPLETED → DOWNLOADING skips INACTIVE
    assert!(cell.begin().is_err());
    assert!(cell.complete().is_err());
    assert!(cell.abort().is_err());
    assert_eq!(cell.get(), DownloadState::Completed);
}

#[test]
fn test_abort_returns_to_inactive() {
    let cell = DownloadStateCell::new();
    cell.begin().unwrap();
    cell.abort().unwrap();
    assert_eq!(cell.get(), DownloadState::Inactive);
    assert!(cell.abort().is_err());
}

#[test]
fn test_late_subscriber_sees_current_value() {
    let cell = DownloadStateCell::new();
    cell.begin().unwrap();
    cell.complete().unwrap();

    let rx = cell.subscribe();
    assert_eq!(*rx.borrow(), DownloadState::Completed);
}

#[test]
fn test_clones_share_state() {
    let cell = DownloadStateCell::new();
    let other = cell.clone();
    cell.begin().unwrap();
    assert_eq!(other.get(), DownloadState::Downloading);
}

#[test]
fn test_state_serializes_upper_case() {
    let json = serde_json::to_string(&DownloadState::Downloading).unwrap();
    assert_eq!(json, "\"DOWNLOADING\"");
}
