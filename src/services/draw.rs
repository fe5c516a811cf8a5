//! Name-drawing service
//!
//! Produces the secret giver -> receiver mapping for an event: a uniformly
//! shuffled single cycle over the accepted participants. A cycle can never
//! map anyone to themselves, so unconstrained draws succeed on the first
//! shuffle; exclusion rules are handled by bounded retries plus a final
//! swap-repair pass. Persistence is all-or-nothing inside one transaction
//! holding the event row lock.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;

use crate::config::settings::Settings;
use crate::database::{
    AssignmentRepository, DatabasePool, EventRepository, OutboxRepository, ParticipantRepository,
};
use crate::models::event::{Event, EventStatus};
use crate::models::notification::DomainEventKind;
use crate::state::machine::{self, LifecycleAction};
use crate::utils::errors::{GiftBuddyError, Result};
use crate::utils::logging::{log_draw, log_rejected_operation};

/// Directional "this giver must not draw that receiver" rules
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    forbidden: HashSet<(i64, i64)>,
}

impl ExclusionRules {
    pub fn none() -> Self {
        Self::default()
    }

    /// Forbid giver -> receiver
    pub fn forbid(&mut self, giver_id: i64, receiver_id: i64) {
        self.forbidden.insert((giver_id, receiver_id));
    }

    /// Forbid both directions between two users
    pub fn forbid_mutual(&mut self, a: i64, b: i64) {
        self.forbid(a, b);
        self.forbid(b, a);
    }

    pub fn allows(&self, giver_id: i64, receiver_id: i64) -> bool {
        !self.forbidden.contains(&(giver_id, receiver_id))
    }

    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
    }

    pub fn len(&self) -> usize {
        self.forbidden.len()
    }
}

/// Outcome of a successful draw. Reports the count, never the mapping:
/// not even the organizer gets to see who drew whom.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub event: Event,
    pub assignment_count: usize,
    pub attempts: u32,
}

/// Pairs forming a single cycle over `order`: each entry gives to the next
fn cycle_pairs(order: &[i64]) -> Vec<(i64, i64)> {
    (0..order.len())
        .map(|i| (order[i], order[(i + 1) % order.len()]))
        .collect()
}

fn first_violation(pairs: &[(i64, i64)], rules: &ExclusionRules) -> Option<usize> {
    pairs
        .iter()
        .position(|&(giver, receiver)| !rules.allows(giver, receiver))
}

/// Swap receivers between a violating pair and a compatible partner. Each
/// successful swap removes one violation and introduces none, so the loop
/// terminates within `pairs.len()` rounds.
fn try_repair(pairs: &mut [(i64, i64)], rules: &ExclusionRules) -> bool {
    for _ in 0..pairs.len() {
        let Some(i) = first_violation(pairs, rules) else {
            return true;
        };
        let (gi, ri) = pairs[i];

        let partner = (0..pairs.len()).find(|&j| {
            if i == j {
                return false;
            }
            let (gj, rj) = pairs[j];
            // Neither swap may self-assign or break the partner's pair
            gi != rj && gj != ri && rules.allows(gi, rj) && rules.allows(gj, ri)
        });

        match partner {
            Some(j) => {
                let (gj, rj) = pairs[j];
                pairs[i] = (gi, rj);
                pairs[j] = (gj, ri);
            }
            None => return false,
        }
    }

    first_violation(pairs, rules).is_none()
}

/// Generate a valid derangement of `ids` as (giver, receiver) pairs,
/// returning the pairs and the number of shuffle attempts used.
pub fn generate_pairs<R: Rng>(
    rng: &mut R,
    ids: &[i64],
    rules: &ExclusionRules,
    max_attempts: u32,
) -> Result<(Vec<(i64, i64)>, u32)> {
    let max_attempts = max_attempts.max(1);
    let mut order = ids.to_vec();
    let mut last: Vec<(i64, i64)> = Vec::new();

    for attempt in 1..=max_attempts {
        order.shuffle(rng);
        let pairs = cycle_pairs(&order);
        if first_violation(&pairs, rules).is_none() {
            return Ok((pairs, attempt));
        }
        last = pairs;
    }

    if try_repair(&mut last, rules) {
        debug!(attempts = max_attempts, "Draw repaired after retry budget");
        return Ok((last, max_attempts));
    }

    Err(GiftBuddyError::UnsatisfiableConstraints {
        attempts: max_attempts,
    })
}

/// Name-drawing service: owns the draw and redraw operations
#[derive(Clone)]
pub struct DrawService {
    pool: DatabasePool,
    events: EventRepository,
    participants: ParticipantRepository,
    assignments: AssignmentRepository,
    outbox: OutboxRepository,
    settings: Settings,
}

impl DrawService {
    /// Create a new DrawService instance
    pub fn new(pool: DatabasePool, settings: Settings) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
            settings,
        }
    }

    /// Draw names for an event, seeding from OS entropy
    pub async fn draw_names(&self, event_id: i64, caller_id: i64) -> Result<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.draw_names_with(&mut rng, event_id, caller_id, &ExclusionRules::none())
            .await
    }

    /// Draw names with a caller-supplied rng and exclusion rules.
    /// Production goes through `draw_names`; tests inject seeded rngs here.
    pub async fn draw_names_with<R: Rng + Send>(
        &self,
        rng: &mut R,
        event_id: i64,
        caller_id: i64,
        rules: &ExclusionRules,
    ) -> Result<DrawOutcome> {
        debug!(event_id = event_id, caller_id = caller_id, "Attempting to draw names");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "draw_names", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may draw names".to_string(),
            ));
        }

        if let Err(err) = machine::ensure_allowed(LifecycleAction::DrawNames, event.status) {
            // A drawn or running exchange reads better as AlreadyDrawn
            return match event.status {
                EventStatus::Drawn | EventStatus::InProgress => {
                    Err(GiftBuddyError::AlreadyDrawn { event_id })
                }
                _ => Err(err),
            };
        }

        // Belt for the unique constraints: a pending event must hold no rows
        if self.assignments.count_for_event(&mut tx, event_id).await? > 0 {
            return Err(GiftBuddyError::AlreadyDrawn { event_id });
        }

        let accepted = self.participants.accepted_ids(&mut tx, event_id).await?;
        let minimum = self.settings.exchange.min_participants;
        if (accepted.len() as i64) < minimum {
            return Err(GiftBuddyError::InsufficientParticipants {
                event_id,
                accepted: accepted.len() as i64,
                minimum,
            });
        }

        let (pairs, attempts) = generate_pairs(
            rng,
            &accepted,
            rules,
            self.settings.exchange.draw_max_attempts,
        )?;

        self.assignments
            .insert_pairs(&mut tx, event_id, &pairs)
            .await?;

        let event = self
            .events
            .transition_status(&mut tx, event_id, EventStatus::Pending, EventStatus::Drawn)
            .await?
            .ok_or(GiftBuddyError::AlreadyDrawn { event_id })?;

        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::NamesDrawn,
                json!({ "assignment_count": pairs.len() }),
            )
            .await?;

        tx.commit().await?;

        log_draw(event_id, pairs.len(), attempts);

        Ok(DrawOutcome {
            event,
            assignment_count: pairs.len(),
            attempts,
        })
    }

    /// Discard the current assignment set and draw a fresh one
    pub async fn redraw_names(&self, event_id: i64, caller_id: i64) -> Result<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.redraw_names_with(&mut rng, event_id, caller_id, &ExclusionRules::none())
            .await
    }

    /// Redraw with a caller-supplied rng and exclusion rules. The old set is
    /// deleted and the new one inserted in the same transaction; the event
    /// returns to DRAWN with every new row unrevealed.
    pub async fn redraw_names_with<R: Rng + Send>(
        &self,
        rng: &mut R,
        event_id: i64,
        caller_id: i64,
        rules: &ExclusionRules,
    ) -> Result<DrawOutcome> {
        debug!(event_id = event_id, caller_id = caller_id, "Attempting to redraw names");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "redraw_names", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may redraw names".to_string(),
            ));
        }

        machine::ensure_allowed(LifecycleAction::RedrawNames, event.status)?;

        let discarded = self.assignments.delete_for_event(&mut tx, event_id).await?;

        let accepted = self.participants.accepted_ids(&mut tx, event_id).await?;
        let minimum = self.settings.exchange.min_participants;
        if (accepted.len() as i64) < minimum {
            return Err(GiftBuddyError::InsufficientParticipants {
                event_id,
                accepted: accepted.len() as i64,
                minimum,
            });
        }

        let (pairs, attempts) = generate_pairs(
            rng,
            &accepted,
            rules,
            self.settings.exchange.draw_max_attempts,
        )?;

        self.assignments
            .insert_pairs(&mut tx, event_id, &pairs)
            .await?;

        let event = if event.status == EventStatus::InProgress {
            machine::ensure_transition(EventStatus::InProgress, EventStatus::Drawn)?;
            self.events
                .transition_status(
                    &mut tx,
                    event_id,
                    EventStatus::InProgress,
                    EventStatus::Drawn,
                )
                .await?
                .ok_or(GiftBuddyError::EventNotFound { event_id })?
        } else {
            event
        };

        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::NamesRedrawn,
                json!({ "assignment_count": pairs.len(), "discarded": discarded }),
            )
            .await?;

        tx.commit().await?;

        debug!(event_id = event_id, discarded = discarded, "Previous assignments discarded");
        log_draw(event_id, pairs.len(), attempts);

        Ok(DrawOutcome {
            event,
            assignment_count: pairs.len(),
            attempts,
        })
    }

    /// Whether a draw would currently pass its preconditions. Advisory only:
    /// `draw_names` re-checks everything inside its transaction.
    pub async fn can_draw_names(&self, event_id: i64, caller_id: i64) -> Result<bool> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) || event.status != EventStatus::Pending {
            return Ok(false);
        }

        let (_, accepted) = self.participants.counts(event_id).await?;
        Ok(accepted >= self.settings.exchange.min_participants)
    }
}
