use chrono::{Duration, TimeZone, Utc};

use bridge_db::{AnswerOutcome, Database, RequestInsert};
use bridge_types::models::{RequestStatus, Role};

fn seeded() -> (Database, i64, i64, i64) {
    let db = Database::open_in_memory().unwrap();
    let ada = db.create_account("ada@uni.edu", "Ada", Role::Student).unwrap();
    let grace = db.create_account("grace@uni.edu", "Grace", Role::Alumni).unwrap();
    let linus = db.create_account("linus@uni.edu", "Linus", Role::Alumni).unwrap();
    (db, ada, grace, linus)
}

#[test]
fn accounts_resolve_by_id_and_email() {
    let (db, ada, _, _) = seeded();

    let by_id = db.get_account(ada).unwrap().unwrap();
    assert_eq!(by_id.display_name, "Ada");
    assert_eq!(by_id.role, Role::Student);
    assert_eq!(by_id.last_active_at, None);

    let by_email = db.get_account_by_email("ada@uni.edu").unwrap().unwrap();
    assert_eq!(by_email.id, ada);

    assert!(db.get_account(9_999).unwrap().is_none());
}

#[test]
fn batch_lookup_skips_unknown_ids() {
    let (db, ada, grace, _) = seeded();
    let accounts = db.get_accounts(&[grace, 4_242, ada]).unwrap();
    let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![ada, grace]);
}

#[test]
fn touch_records_last_activity() {
    let (db, ada, _, _) = seeded();
    let at = Utc.with_ymd_and_hms(2025, 5, 4, 10, 0, 0).unwrap();

    assert!(db.touch_account(ada, at).unwrap());
    assert_eq!(db.get_account(ada).unwrap().unwrap().last_active_at, Some(at));
    assert!(!db.touch_account(777, at).unwrap());
}

#[test]
fn second_active_request_for_pair_is_blocked_either_direction() {
    let (db, ada, grace, _) = seeded();
    let now = Utc::now();

    let first = match db.insert_connection_request(ada, grace, now).unwrap() {
        RequestInsert::Created(req) => req,
        other => panic!("expected Created, got {:?}", other),
    };

    match db.insert_connection_request(grace, ada, now).unwrap() {
        RequestInsert::Blocked(existing) => assert_eq!(existing.id, first.id),
        other => panic!("expected Blocked, got {:?}", other),
    }

    assert_eq!(db.find_request_between(grace, ada).unwrap().unwrap().id, first.id);
}

#[test]
fn rejected_request_is_replaced_by_a_new_one() {
    let (db, ada, grace, _) = seeded();
    let now = Utc::now();

    let RequestInsert::Created(first) =
        db.insert_connection_request(ada, grace, now).unwrap()
    else {
        panic!("first request should be created");
    };
    assert!(matches!(
        db.answer_connection_request(first.id, RequestStatus::Rejected).unwrap(),
        AnswerOutcome::Answered(_)
    ));

    let RequestInsert::Created(second) =
        db.insert_connection_request(grace, ada, now).unwrap()
    else {
        panic!("rejection must not block a new request");
    };
    assert_ne!(second.id, first.id);
    assert!(db.get_connection_request(first.id).unwrap().is_none());
}

#[test]
fn answers_apply_only_once() {
    let (db, ada, grace, _) = seeded();
    let RequestInsert::Created(req) =
        db.insert_connection_request(ada, grace, Utc::now()).unwrap()
    else {
        panic!("request should be created");
    };

    assert!(matches!(
        db.answer_connection_request(req.id, RequestStatus::Accepted).unwrap(),
        AnswerOutcome::Answered(r) if r.status == RequestStatus::Accepted
    ));
    assert!(matches!(
        db.answer_connection_request(req.id, RequestStatus::Rejected).unwrap(),
        AnswerOutcome::AlreadyAnswered(r) if r.status == RequestStatus::Accepted
    ));
    assert!(matches!(
        db.answer_connection_request(31_337, RequestStatus::Accepted).unwrap(),
        AnswerOutcome::NotFound
    ));
}

#[test]
fn delete_active_between_ignores_direction() {
    let (db, ada, grace, _) = seeded();
    let RequestInsert::Created(req) =
        db.insert_connection_request(ada, grace, Utc::now()).unwrap()
    else {
        panic!("request should be created");
    };
    db.answer_connection_request(req.id, RequestStatus::Accepted).unwrap();

    assert_eq!(db.delete_active_between(grace, ada).unwrap(), 1);
    assert_eq!(db.delete_active_between(grace, ada).unwrap(), 0);
    assert!(db.find_request_between(ada, grace).unwrap().is_none());
}

#[test]
fn listings_filter_by_side_and_status() {
    let (db, ada, grace, linus) = seeded();
    let now = Utc::now();
    db.insert_connection_request(ada, grace, now).unwrap();
    let RequestInsert::Created(accepted) =
        db.insert_connection_request(linus, ada, now).unwrap()
    else {
        panic!("request should be created");
    };
    db.answer_connection_request(accepted.id, RequestStatus::Accepted).unwrap();

    assert_eq!(db.list_requests_sent(ada, RequestStatus::Pending).unwrap().len(), 1);
    assert_eq!(db.list_requests_received(grace, RequestStatus::Pending).unwrap().len(), 1);
    assert!(db.list_requests_received(ada, RequestStatus::Pending).unwrap().is_empty());

    let accepted_for_ada = db.list_accepted_for(ada).unwrap();
    assert_eq!(accepted_for_ada.len(), 1);
    assert_eq!(accepted_for_ada[0].counterpart(ada), linus);
}

#[test]
fn conversation_orders_by_time_then_id() {
    let (db, ada, grace, linus) = seeded();
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();

    let m1 = db.insert_message(ada, grace, "one", None, t0).unwrap();
    let m2 = db.insert_message(grace, ada, "two", None, t0).unwrap();
    let m3 = db.insert_message(ada, grace, "three", Some(8), t0 + Duration::seconds(1)).unwrap();
    db.insert_message(linus, ada, "elsewhere", None, t0 + Duration::seconds(2)).unwrap();

    let history: Vec<i64> = db.get_conversation(grace, ada).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(history, vec![m1.id, m2.id, m3.id]);

    let all = db.get_messages_for_user(ada).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].content, "elsewhere");
    assert_eq!(all[1].event_reference, Some(8));

    let latest = db.latest_message_between(ada, grace).unwrap().unwrap();
    assert_eq!(latest.id, m3.id);
    assert_eq!(db.latest_sent_at().unwrap(), Some(t0 + Duration::seconds(2)));
}
