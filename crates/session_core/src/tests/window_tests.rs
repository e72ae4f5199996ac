use chrono::TimeZone;
use shared::domain::{UserId, ID_LEN};

use super::*;

fn dm_window() -> ChatWindow {
    ChatWindow::new(WindowTarget::User(UserId([1; ID_LEN])), "alice", "me")
}

fn entry(from: &str, message: &str, day: u32, hour: u32) -> HistoryEntry {
    HistoryEntry {
        from: from.to_string(),
        message: message.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
    }
}

#[test]
fn local_lines_keep_unread_marker_at_end() {
    let cw = dm_window();
    cw.new_internal("hello");
    cw.new_unsent("hi there");
    assert_eq!(cw.unread_idx(), 2);
    assert_eq!(cw.unread_count(), 0);
}

#[test]
fn received_lines_are_unread_until_marked() {
    let cw = dm_window();
    cw.new_received("alice", "yo".into(), UserId([1; ID_LEN]), Utc::now(), false);
    assert_eq!(cw.unread_count(), 1);

    // A local echo after unread content must not hide it.
    cw.new_internal("note");
    assert_eq!(cw.unread_idx(), 0);

    cw.mark_all_read();
    assert_eq!(cw.unread_count(), 0);
}

#[test]
fn history_seeding_inserts_day_markers() {
    let cw = dm_window();
    cw.seed_history(&[
        entry("alice", "one", 1, 10),
        entry("me", "two", 1, 11),
        entry("alice", "three", 2, 9),
    ]);

    let texts: Vec<_> = cw.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(
        texts,
        vec![
            "Day changed to 2024-03-01",
            "one",
            "two",
            "Day changed to 2024-03-02",
            "three"
        ]
    );
    let kinds: Vec<_> = cw.messages().into_iter().map(|m| m.kind).collect();
    assert_eq!(kinds[2], MessageKind::Mine);
    assert_eq!(kinds[4], MessageKind::Received);
    assert_eq!(cw.unread_idx(), 5);
}

#[test]
fn unsent_message_is_marked_sent_by_ref() {
    let cw = dm_window();
    let msg = cw.new_unsent("pending");
    assert!(!cw.messages()[0].sent);
    cw.set_sent(msg);
    assert!(cw.messages()[0].sent);
}

#[test]
fn help_lines_are_appended_together() {
    let cw = dm_window();
    cw.help_lines(vec!["a".to_string(), "b".to_string()]);
    let msgs = cw.messages();
    assert_eq!(msgs.len(), 2);
    assert!(msgs.iter().all(|m| m.kind == MessageKind::Help));
}

#[tokio::test]
async fn init_runs_once() {
    let cw = dm_window();
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    assert_eq!(cw.init_time(), None);
    assert_eq!(cw.init_once(|| async move { first }).await, first);
    assert_eq!(cw.init_once(|| async move { second }).await, first);
    assert_eq!(cw.init_time(), Some(first));
}
