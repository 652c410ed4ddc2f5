mod common;

use chrono::Duration;

use bridge_social::MessagingService;

use common::Harness;

#[test]
fn sidebar_lists_only_accepted_connections() {
    let h = Harness::new();
    let (one, two, three) = (h.account("One"), h.account("Two"), h.account("Three"));
    h.connect(one, two);

    h.messages.send(one, two, "hi", None).unwrap();
    h.clock.advance(Duration::seconds(1));
    h.messages.send(three, two, "hello from a stranger", None).unwrap();

    let previews = h.aggregator.connections_with_preview(two).unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].id, one);
    assert_eq!(previews[0].last_message.as_deref(), Some("hi"));

    let conversations = h.aggregator.conversations(two).unwrap();
    let counterparts: Vec<i64> = conversations.iter().map(|c| c.counterpart_id).collect();
    assert_eq!(counterparts, vec![three, one]);
    assert_eq!(conversations[0].counterpart_name, "Three");
}

#[test]
fn sidebar_orders_by_recency_then_presence() {
    let h = Harness::new();
    let me = h.account("Me");
    let quiet_offline = h.account("QuietOffline");
    let quiet_online = h.account("QuietOnline");
    let older = h.account("Older");
    let newer = h.account("Newer");
    for other in [quiet_offline, quiet_online, older, newer] {
        h.connect(me, other);
    }

    h.messages.send(older, me, "earlier", None).unwrap();
    h.clock.advance(Duration::minutes(1));
    h.messages.send(me, newer, "later", None).unwrap();
    h.presence.touch(quiet_online).unwrap();

    let ids: Vec<i64> = h
        .aggregator
        .connections_with_preview(me)
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![newer, older, quiet_online, quiet_offline]);
}

#[test]
fn summaries_carry_presence_snapshot() {
    let h = Harness::new();
    let (a, b) = (h.account("Ada"), h.account("Grace"));
    h.messages.send(b, a, "ping", None).unwrap();
    h.presence.touch(b).unwrap();

    let summary = &h.aggregator.conversations(a).unwrap()[0];
    assert!(summary.is_online);
    assert!(summary.last_active_at.is_some());

    h.clock.advance(Duration::minutes(6));
    assert!(!h.aggregator.conversations(a).unwrap()[0].is_online);
}
