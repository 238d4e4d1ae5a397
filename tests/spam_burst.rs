// tests/spam_burst.rs
use chat_moderator::{AlertHub, MessageEvent, ModerationAlert, SpamDetector, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn msg(n: u64) -> MessageEvent {
    MessageEvent::new(7, 1, format!("message {n}")).with_id(n)
}

#[tokio::test]
async fn sixth_message_in_three_seconds_triggers() {
    let hub = AlertHub::default();
    let mut rx = hub.subscribe();
    let det = SpamDetector::new(5, Duration::seconds(3), hub).unwrap();
    let t = t0();

    for n in 0..5 {
        let at = t + Duration::milliseconds(400 * n as i64);
        assert!(det.record(&msg(n), at).is_none(), "message {n} triggered early");
    }

    let at = t + Duration::milliseconds(2_500);
    let alert = det.record(&msg(5), at).expect("sixth message overflows");
    assert_eq!(alert.user_id, UserId(7));
    // the prior five; the sixth is not part of this burst
    let ids: Vec<u64> = alert.messages.iter().map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    match rx.recv().await.unwrap() {
        ModerationAlert::Spam(a) => assert_eq!(a.messages.len(), 5),
        other => panic!("unexpected alert {other:?}"),
    }

    // old buffer cleared; the sixth message opened a new window
    assert_eq!(det.tracker().count_of(&UserId(7)), Some(1));
    assert_eq!(
        det.tracker().reset_at(&UserId(7)),
        Some(at + Duration::seconds(3))
    );

    // four more fill the new window, the next one overflows it
    for n in 6..10 {
        assert!(det.record(&msg(n), at + Duration::milliseconds(100)).is_none());
    }
    let again = det
        .record(&msg(10), at + Duration::milliseconds(200))
        .expect("second burst");
    let ids: Vec<u64> = again.messages.iter().map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![5, 6, 7, 8, 9]);
}

#[test]
fn window_expiry_forgets_earlier_messages() {
    let det = SpamDetector::new(5, Duration::seconds(3), AlertHub::default()).unwrap();
    let t = t0();
    for n in 0..5 {
        assert!(det.record(&msg(n), t).is_none());
    }
    // after the window, the sixth message opens a new window instead
    let late = t + Duration::seconds(3);
    assert!(det.record(&msg(5), late).is_none());
    assert_eq!(det.tracker().count_of(&UserId(7)), Some(1));
    for n in 6..10 {
        assert!(det.record(&msg(n), late).is_none());
    }
    let alert = det.record(&msg(10), late).unwrap();
    let ids: Vec<u64> = alert.messages.iter().map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![5, 6, 7, 8, 9]);
}
