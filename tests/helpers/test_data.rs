//! Seed data builders for integration tests
//!
//! Builders drive the public services rather than inserting rows directly,
//! so every seeded state is a reachable state.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use GiftBuddy::config::Settings;
use GiftBuddy::models::{Budget, CreateEventRequest, Event};
use GiftBuddy::services::ServiceFactory;

pub const ORGANIZER: i64 = 1_000;
pub const ALICE: i64 = 1_001;
pub const BOB: i64 = 1_002;
pub const CAROL: i64 = 1_003;
pub const DAVE: i64 = 1_004;

/// Default settings pointed at the test database
pub fn test_settings(database_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.database.url = database_url.to_string();
    settings
}

/// Service factory over the test pool
pub fn services(pool: PgPool, database_url: &str) -> ServiceFactory {
    ServiceFactory::new(pool, test_settings(database_url)).expect("valid test settings")
}

/// Create-event request a week out, with a modest budget
pub fn event_request(title: &str) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        organizer_id: ORGANIZER,
        draw_date: Utc::now() + Duration::days(7),
        exchange_date: Utc::now() + Duration::days(14),
        budget: Some(Budget {
            amount_minor: 2_500,
            currency: "EUR".to_string(),
        }),
    }
}

/// PENDING event organized by ORGANIZER with the given users invited
pub async fn seed_event_with_invites(factory: &ServiceFactory, invitees: &[i64]) -> Event {
    let event = factory
        .event_service
        .create_event(event_request("Office Secret Santa"))
        .await
        .expect("create event");

    for &user_id in invitees {
        factory
            .participant_service
            .invite(event.id, ORGANIZER, user_id)
            .await
            .expect("invite participant");
    }

    event
}

/// PENDING event where every invitee has accepted, ready to draw
pub async fn seed_ready_event(factory: &ServiceFactory, invitees: &[i64]) -> Event {
    let event = seed_event_with_invites(factory, invitees).await;

    for &user_id in invitees {
        factory
            .participant_service
            .respond(event.id, user_id, true)
            .await
            .expect("accept invitation");
    }

    event
}

/// DRAWN event over ORGANIZER plus the given accepted invitees
pub async fn seed_drawn_event(factory: &ServiceFactory, invitees: &[i64]) -> Event {
    let event = seed_ready_event(factory, invitees).await;

    factory
        .draw_service
        .draw_names(event.id, ORGANIZER)
        .await
        .expect("draw names");

    factory
        .event_service
        .get_event(event.id)
        .await
        .expect("reload event")
        .event
}
