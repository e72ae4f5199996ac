use shared::domain::{UserId, ID_LEN};

use super::*;

fn window(n: u8) -> Arc<ChatWindow> {
    Arc::new(ChatWindow::new(
        WindowTarget::User(UserId([n; ID_LEN])),
        format!("user{n}"),
        "me",
    ))
}

fn registry_with(n: u8) -> (WindowRegistry, Vec<Arc<ChatWindow>>) {
    let mut reg = WindowRegistry::new();
    let windows: Vec<_> = (0..n).map(window).collect();
    for w in &windows {
        reg.insert(w.clone());
    }
    for i in 0..n as usize {
        reg.mark_seen(WindowSlot::Chat(i));
    }
    (reg, windows)
}

#[test]
fn slot_indices_round_trip_and_sort_by_index() {
    for i in -4..3 {
        let slot = WindowSlot::from_index(i).expect("valid");
        assert_eq!(slot.index(), i);
    }
    assert_eq!(WindowSlot::from_index(-5), None);
    assert!(WindowSlot::Feed < WindowSlot::Diagnostic);
    assert!(WindowSlot::Diagnostic < WindowSlot::Chat(0));
}

#[test]
fn new_windows_start_flagged_without_mention() {
    let mut reg = WindowRegistry::new();
    let idx = reg.insert(window(1));
    assert_eq!(idx, 0);
    assert_eq!(reg.updated(WindowSlot::Chat(0)), Some(false));
}

#[test]
fn mark_updated_skips_the_active_window() {
    let (mut reg, windows) = registry_with(2);
    reg.set_active(WindowSlot::Chat(0)).expect("valid");

    assert!(reg.mark_updated(&windows[0], true));
    assert_eq!(reg.updated(WindowSlot::Chat(0)), None);

    assert!(!reg.mark_updated(&windows[1], false));
    assert_eq!(reg.updated(WindowSlot::Chat(1)), Some(false));
}

#[test]
fn mention_flag_only_upgrades() {
    let (mut reg, windows) = registry_with(1);

    reg.mark_updated(&windows[0], true);
    reg.mark_updated(&windows[0], false);
    assert_eq!(reg.updated(WindowSlot::Chat(0)), Some(true));
}

#[test]
fn set_active_tracks_previous_and_clears_flag() {
    let (mut reg, windows) = registry_with(2);
    reg.mark_updated(&windows[1], false);

    assert!(reg.set_active(WindowSlot::Chat(1)).expect("valid"));
    assert_eq!(reg.prev_active(), WindowSlot::Diagnostic);
    assert_eq!(reg.updated(WindowSlot::Chat(1)), None);

    assert!(!reg.set_active(WindowSlot::Chat(1)).expect("valid"));
    assert_eq!(reg.prev_active(), WindowSlot::Diagnostic);
}

#[test]
fn set_active_rejects_out_of_range() {
    let (mut reg, _) = registry_with(2);
    let err = reg.set_active(WindowSlot::Chat(2)).expect_err("invalid");
    assert!(matches!(err, SessionError::InvalidWindow(WindowSlot::Chat(2))));
    let err = reg.set_active_index(-5).expect_err("below the special windows");
    assert!(matches!(err, SessionError::InvalidWindowIndex(-5)));
    let err = reg.set_active_index(2).expect_err("past the last chat");
    assert!(matches!(err, SessionError::InvalidWindow(WindowSlot::Chat(2))));
    assert_eq!(
        reg.set_active_index(-2).expect("feed"),
        (WindowSlot::Feed, true)
    );
    reg.set_active(WindowSlot::Diagnostic).expect("diag");
    assert_eq!(reg.active(), WindowSlot::Diagnostic);
}

#[test]
fn closing_shifts_later_flags_down_in_order() {
    let (mut reg, windows) = registry_with(5);
    reg.mark_updated(&windows[1], false);
    reg.mark_updated(&windows[2], true);
    reg.mark_updated(&windows[3], false);
    reg.mark_updated(&windows[4], true);
    reg.mark_special_updated(WindowSlot::Feed);

    let removed = reg.close(2).expect("closed");
    assert!(Arc::ptr_eq(&removed, &windows[2]));
    assert_eq!(reg.len(), 4);

    assert_eq!(reg.updated(WindowSlot::Chat(1)), Some(false));
    assert_eq!(reg.updated(WindowSlot::Chat(2)), Some(false));
    assert_eq!(reg.updated(WindowSlot::Chat(3)), Some(true));
    assert_eq!(reg.updated(WindowSlot::Chat(4)), None);
    assert_eq!(reg.updated(WindowSlot::Feed), Some(false));
    assert!(Arc::ptr_eq(&reg.get(2).expect("window"), &windows[3]));
}

#[test]
fn close_active_rejects_special_windows() {
    let (mut reg, _) = registry_with(1);
    reg.set_active(WindowSlot::Feed).expect("valid");
    assert!(matches!(
        reg.close_active(),
        Err(SessionError::InvalidWindow(WindowSlot::Feed))
    ));

    reg.set_active(WindowSlot::Chat(0)).expect("valid");
    assert_eq!(reg.close_active().expect("closed"), 0);
    assert!(reg.is_empty());
}

#[test]
fn relative_slot_stays_in_range() {
    let (mut reg, _) = registry_with(2);
    reg.set_active(WindowSlot::Chat(1)).expect("valid");
    assert_eq!(reg.relative_slot(1), None);
    assert_eq!(reg.relative_slot(-1), Some(WindowSlot::Chat(0)));

    reg.set_active(WindowSlot::BackendLog).expect("valid");
    assert_eq!(reg.relative_slot(-1), None);
    assert_eq!(reg.relative_slot(1), Some(WindowSlot::Log));
}

#[test]
fn special_updates_only_for_diag_and_feed() {
    let mut reg = WindowRegistry::new();
    reg.set_active(WindowSlot::Log).expect("valid");
    reg.mark_special_updated(WindowSlot::Diagnostic);
    reg.mark_special_updated(WindowSlot::BackendLog);
    assert_eq!(reg.updated(WindowSlot::Diagnostic), Some(false));
    assert_eq!(reg.updated(WindowSlot::BackendLog), None);

    reg.set_active(WindowSlot::Feed).expect("valid");
    reg.mark_special_updated(WindowSlot::Feed);
    assert_eq!(reg.updated(WindowSlot::Feed), None);
}

#[test]
fn label_lists_updated_windows_sorted() {
    let (mut reg, windows) = registry_with(3);
    reg.set_active(WindowSlot::Chat(1)).expect("valid");
    reg.mark_updated(&windows[2], true);
    reg.mark_updated(&windows[0], false);
    reg.mark_special_updated(WindowSlot::Feed);
    reg.mark_special_updated(WindowSlot::Diagnostic);

    let label = reg.label();
    assert_eq!(label.active, "2:user1");
    assert_eq!(label.updated, vec!["feed", "0", "1", "3"]);
    assert!(label.mentioned.contains("3"));
    assert_eq!(label.mentioned.len(), 1);
}
