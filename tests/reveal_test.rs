//! Reveal gate integration tests
//!
//! One-time reveal semantics, receiver masking and the strict isolation
//! invariant: nobody ever sees a foreign assignment.

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use serial_test::serial;
use GiftBuddy::models::{DomainEventKind, EventStatus};
use GiftBuddy::GiftBuddyError;

#[tokio::test]
#[serial]
async fn test_reveal_requires_a_drawn_event() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let pending = seed_ready_event(&factory, &[ALICE, BOB, CAROL]).await;
    assert_matches!(
        factory.reveal_service.reveal(pending.id, ALICE).await,
        Err(GiftBuddyError::InvalidState { .. })
    );

    assert_matches!(
        factory.reveal_service.reveal(9_999, ALICE).await,
        Err(GiftBuddyError::EventNotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_first_reveal_and_steady_state() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    let first = factory.reveal_service.reveal(event.id, ALICE).await.expect("reveal");
    assert!(first.first_reveal);
    assert_ne!(first.receiver_id, ALICE);

    // First reveal moves the event into IN_PROGRESS
    let summary = factory.event_service.get_event(event.id).await.expect("summary");
    assert_eq!(summary.event.status, EventStatus::InProgress);

    // Repeat calls are steady-state: same receiver, same timestamp, no new
    // celebration signal
    let second = factory.reveal_service.reveal(event.id, ALICE).await.expect("re-read");
    assert!(!second.first_reveal);
    assert_eq!(second.receiver_id, first.receiver_id);
    assert_eq!(second.revealed_at, first.revealed_at);

    let log = factory.notification_service.event_log(event.id).await.expect("log");
    let reveal_records = log
        .iter()
        .filter(|e| e.kind == DomainEventKind::AssignmentRevealed)
        .count();
    assert_eq!(reveal_records, 1);
}

#[tokio::test]
#[serial]
async fn test_non_giver_gets_no_assignment() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    // DAVE is not a participant at all
    assert_matches!(
        factory.reveal_service.reveal(event.id, DAVE).await,
        Err(GiftBuddyError::NoAssignment { .. })
    );
    assert!(factory
        .reveal_service
        .my_assignment(event.id, DAVE)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
#[serial]
async fn test_reveal_returns_only_the_callers_row() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);
    let database = GiftBuddy::DatabaseService::new(db.pool.clone());

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    for &giver in &[ORGANIZER, ALICE, BOB, CAROL] {
        let outcome = factory.reveal_service.reveal(event.id, giver).await.expect("reveal");

        let own_row = database
            .assignments
            .find_for_giver(event.id, giver)
            .await
            .expect("query")
            .expect("giver has a row");
        assert_eq!(
            outcome.receiver_id, own_row.receiver_id,
            "reveal must match the caller's own row"
        );
        assert_eq!(outcome.giver_id, giver);
    }

    // Across the whole event, the revealed receivers are exactly the
    // stored bijection: nobody saw a foreign value
    let pairs = db.assignment_pairs(event.id).await.expect("pairs");
    let receivers: std::collections::HashSet<i64> = pairs.iter().map(|&(_, r)| r).collect();
    assert_eq!(receivers.len(), pairs.len());
}

#[tokio::test]
#[serial]
async fn test_my_assignment_masks_until_revealed() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    let masked = factory
        .reveal_service
        .my_assignment(event.id, ALICE)
        .await
        .expect("query")
        .expect("ALICE has an assignment");
    assert!(!masked.revealed);
    assert_eq!(masked.receiver_id, None);

    let outcome = factory.reveal_service.reveal(event.id, ALICE).await.expect("reveal");

    let visible = factory
        .reveal_service
        .my_assignment(event.id, ALICE)
        .await
        .expect("query")
        .expect("ALICE has an assignment");
    assert!(visible.revealed);
    assert_eq!(visible.receiver_id, Some(outcome.receiver_id));
}

#[tokio::test]
#[serial]
async fn test_concurrent_reveals_fire_once() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    let (first, second) = tokio::join!(
        factory.reveal_service.reveal(event.id, BOB),
        factory.reveal_service.reveal(event.id, BOB),
    );
    let first = first.expect("reveal");
    let second = second.expect("reveal");

    assert_eq!(first.receiver_id, second.receiver_id);
    assert_eq!(
        [first.first_reveal, second.first_reveal].iter().filter(|&&f| f).count(),
        1,
        "exactly one call may report the first reveal"
    );

    let log = factory.notification_service.event_log(event.id).await.expect("log");
    let reveal_records = log
        .iter()
        .filter(|e| e.kind == DomainEventKind::AssignmentRevealed)
        .count();
    assert_eq!(reveal_records, 1);
}

#[tokio::test]
#[serial]
async fn test_reveal_still_legal_after_completion() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;
    factory.reveal_service.reveal(event.id, ALICE).await.expect("reveal");
    factory
        .progress_service
        .mark_complete(event.id, ORGANIZER)
        .await
        .expect("complete");

    // A giver who never revealed can still learn their receiver
    let outcome = factory.reveal_service.reveal(event.id, BOB).await.expect("late reveal");
    assert!(outcome.first_reveal);

    // Completion is terminal: the status does not move back to IN_PROGRESS
    let summary = factory.event_service.get_event(event.id).await.expect("summary");
    assert_eq!(summary.event.status, EventStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_reveal_and_redraw_interleave_cleanly() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    // Reveal touches the events row and an assignments row, redraw rewrites
    // the whole assignment set; both take the event lock first, so one
    // simply waits for the other instead of deadlocking.
    let (reveal, redraw) = tokio::join!(
        factory.reveal_service.reveal(event.id, ALICE),
        factory.draw_service.redraw_names(event.id, ORGANIZER),
    );
    let reveal = reveal.expect("reveal");
    let redraw = redraw.expect("redraw");

    assert_eq!(redraw.assignment_count, 4);
    assert_ne!(reveal.receiver_id, ALICE);

    // Whichever transaction committed second decided the final status
    let summary = factory.event_service.get_event(event.id).await.expect("summary");
    assert_matches!(
        summary.event.status,
        EventStatus::Drawn | EventStatus::InProgress
    );

    let pairs = db.assignment_pairs(event.id).await.expect("pairs");
    assert_eq!(pairs.len(), 4);
}
