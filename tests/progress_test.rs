//! Completion tracker integration tests
//!
//! Progress aggregation, per-giver gift-done bookkeeping and the terminal
//! mark-complete transition.

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use serial_test::serial;
use GiftBuddy::models::{DomainEventKind, EventStatus};
use GiftBuddy::GiftBuddyError;

#[tokio::test]
#[serial]
async fn test_progress_tracks_the_exchange() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_event_with_invites(&factory, &[ALICE, BOB, CAROL]).await;

    let progress = factory.progress_service.progress(event.id).await.expect("progress");
    assert_eq!(progress.status, EventStatus::Pending);
    assert_eq!(progress.total_participants, 4);
    assert_eq!(progress.accepted_count, 1); // just the organizer
    assert_eq!(progress.assignment_count, 0);

    for user in [ALICE, BOB, CAROL] {
        factory.participant_service.respond(event.id, user, true).await.expect("accept");
    }
    factory.draw_service.draw_names(event.id, ORGANIZER).await.expect("draw");
    factory.reveal_service.reveal(event.id, ALICE).await.expect("reveal");
    factory.reveal_service.reveal(event.id, BOB).await.expect("reveal");
    factory.progress_service.mark_gift_done(event.id, ALICE).await.expect("gift done");

    let progress = factory.progress_service.progress(event.id).await.expect("progress");
    assert_eq!(progress.status, EventStatus::InProgress);
    assert_eq!(progress.accepted_count, 4);
    assert_eq!(progress.assignment_count, 4);
    assert_eq!(progress.revealed_count, 2);
    assert_eq!(progress.gift_done_count, 1);
}

#[tokio::test]
#[serial]
async fn test_mark_gift_done_is_idempotent() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    assert!(factory.progress_service.mark_gift_done(event.id, ALICE).await.expect("first"));
    assert!(!factory.progress_service.mark_gift_done(event.id, ALICE).await.expect("repeat"));

    let log = factory.notification_service.event_log(event.id).await.expect("log");
    let done_records = log
        .iter()
        .filter(|e| e.kind == DomainEventKind::GiftMarkedDone)
        .count();
    assert_eq!(done_records, 1);

    // Only givers can report gift progress
    assert_matches!(
        factory.progress_service.mark_gift_done(event.id, DAVE).await,
        Err(GiftBuddyError::NoAssignment { .. })
    );

    // And only before the event is closed
    factory.progress_service.mark_complete(event.id, ORGANIZER).await.expect("complete");
    assert_matches!(
        factory.progress_service.mark_gift_done(event.id, BOB).await,
        Err(GiftBuddyError::InvalidState { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_mark_complete_guards() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let pending = seed_ready_event(&factory, &[ALICE, BOB, CAROL]).await;
    assert_matches!(
        factory.progress_service.mark_complete(pending.id, ORGANIZER).await,
        Err(GiftBuddyError::InvalidState { .. })
    );

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    assert_matches!(
        factory.progress_service.mark_complete(event.id, ALICE).await,
        Err(GiftBuddyError::Forbidden(_))
    );

    let completed = factory
        .progress_service
        .mark_complete(event.id, ORGANIZER)
        .await
        .expect("complete");
    assert_eq!(completed.status, EventStatus::Completed);

    // Terminal: completing again is an error, as is any further mutation
    assert_matches!(
        factory.progress_service.mark_complete(event.id, ORGANIZER).await,
        Err(GiftBuddyError::InvalidState { .. })
    );
    assert_matches!(
        factory.draw_service.draw_names(event.id, ORGANIZER).await,
        Err(GiftBuddyError::InvalidState { .. })
    );
    assert_matches!(
        factory.participant_service.invite(event.id, ORGANIZER, DAVE).await,
        Err(GiftBuddyError::InvalidState { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_complete_from_in_progress() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;
    factory.reveal_service.reveal(event.id, ALICE).await.expect("reveal");

    let completed = factory
        .progress_service
        .mark_complete(event.id, ORGANIZER)
        .await
        .expect("complete from in_progress");
    assert_eq!(completed.status, EventStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_concurrent_complete_and_gift_done_agree() {
    let db = TestDatabase::new().await.expect("test database");
    db.cleanup().await.expect("cleanup");
    let factory = services(db.pool.clone(), &db.database_url);

    let event = seed_drawn_event(&factory, &[ALICE, BOB, CAROL]).await;

    // The status check runs under the event row lock: the gift-done write
    // either lands before completion or is rejected, never after.
    let (complete, gift_done) = tokio::join!(
        factory.progress_service.mark_complete(event.id, ORGANIZER),
        factory.progress_service.mark_gift_done(event.id, ALICE),
    );
    complete.expect("complete");

    let progress = factory.progress_service.progress(event.id).await.expect("progress");
    assert_eq!(progress.status, EventStatus::Completed);
    match gift_done {
        Ok(true) => assert_eq!(progress.gift_done_count, 1),
        Ok(false) => panic!("first marking must not report a repeat"),
        Err(GiftBuddyError::InvalidState { .. }) => assert_eq!(progress.gift_done_count, 0),
        Err(other) => panic!("unexpected error: {other}"),
    }
}
