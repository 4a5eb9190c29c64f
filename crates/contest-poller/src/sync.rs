//! Idempotent reconciliation of contests against the calendar.
//!
//! Each contest maps to exactly one event under a deterministic id.
//! The calendar API has no conflict-free upsert, and deleting an event
//! only soft-cancels it, so a conflicting insert has to branch on the
//! state of the event already holding the id: active, cancelled, or
//! unreadable.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::calendar::{CalendarApi, CalendarError, EventDateTime, EventPayload, EventStatus};
use crate::codeforces::Contest;
use crate::config::SyncConfig;

/// Deterministic calendar event id for a contest.
///
/// This is the idempotency key: every run targets the same id for the
/// same contest. The scheme is fixed; changing it would orphan every
/// event created under the old one, so any future change needs a
/// migration pass over existing events.
pub fn event_id(contest_id: u64) -> String {
    format!("cf{}v3", contest_id)
}

/// Canonical contest page, linked from the event description.
pub fn contest_url(contest_id: u64) -> String {
    format!("https://codeforces.com/contest/{}", contest_id)
}

/// Build the calendar payload for a contest, with start and end
/// rendered in the display zone.
///
/// The end instant is computed in absolute time (start plus duration)
/// and only then projected into the zone. Projecting first and adding
/// the duration to the wall clock would drift across DST transitions.
pub fn build_event_payload(contest: &Contest, timezone: Tz) -> Result<EventPayload> {
    let start_secs = contest
        .start_time_seconds
        .with_context(|| format!("Contest {} has no start time", contest.id))?;
    let duration_secs = contest
        .duration_seconds
        .with_context(|| format!("Contest {} has no duration", contest.id))?;

    let start = DateTime::from_timestamp(start_secs, 0)
        .with_context(|| format!("Contest {} start time is out of range", contest.id))?;
    let end = start + Duration::seconds(duration_secs);

    Ok(EventPayload {
        id: event_id(contest.id),
        summary: format!("CF: {}", contest.name),
        description: Some(format!("Link: {}", contest_url(contest.id))),
        start: zoned(start, timezone),
        end: zoned(end, timezone),
        status: None,
    })
}

fn zoned(instant: DateTime<Utc>, timezone: Tz) -> EventDateTime {
    EventDateTime {
        date_time: instant.with_timezone(&timezone).to_rfc3339(),
        time_zone: timezone.name().to_string(),
    }
}

/// Terminal state of one contest after a reconcile pass. Nothing is
/// retried; a later run picks up whatever this one could not finish.
#[derive(Debug)]
pub enum SyncOutcome {
    /// No event existed, one was created.
    Added,
    /// An active event already holds the id, nothing written.
    AlreadyExists,
    /// The event existed but was cancelled and got re-confirmed in place.
    Restored,
    /// The existing event could not be read back, record skipped until
    /// calendar access is fixed.
    PermissionDenied,
    /// Anything else, reported so the run can move on.
    Failed(anyhow::Error),
}

/// Per-run outcome counters, reported once the pass is complete.
#[derive(Debug, Default)]
pub struct RunStats {
    pub added: usize,
    pub existing: usize,
    pub restored: usize,
    pub permission_denied: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Added => self.added += 1,
            SyncOutcome::AlreadyExists => self.existing += 1,
            SyncOutcome::Restored => self.restored += 1,
            SyncOutcome::PermissionDenied => self.permission_denied += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.existing + self.restored + self.permission_denied + self.failed
    }
}

/// Drives the create-or-restore-or-skip protocol, one contest at a
/// time, against any [`CalendarApi`] implementation.
pub struct Reconciler<C> {
    calendar: C,
    config: SyncConfig,
}

impl<C: CalendarApi> Reconciler<C> {
    pub fn new(calendar: C, config: SyncConfig) -> Self {
        Self { calendar, config }
    }

    /// Ensure the calendar holds exactly one confirmed event for this
    /// contest. Re-running against an unchanged calendar converges on
    /// `AlreadyExists` without further writes.
    pub async fn reconcile(&self, contest: &Contest) -> SyncOutcome {
        let payload = match build_event_payload(contest, self.config.timezone) {
            Ok(payload) => payload,
            Err(e) => return SyncOutcome::Failed(e),
        };

        match self
            .calendar
            .insert_event(&self.config.calendar_id, &payload)
            .await
        {
            Ok(_) => SyncOutcome::Added,
            Err(CalendarError::Conflict) => self.recover_existing(payload).await,
            Err(e) => SyncOutcome::Failed(e.into()),
        }
    }

    /// The insert hit an id conflict: restore the event if it was
    /// cancelled, leave it alone if it is still active.
    async fn recover_existing(&self, mut payload: EventPayload) -> SyncOutcome {
        let event_id = payload.id.clone();

        let existing = match self
            .calendar
            .get_event(&self.config.calendar_id, &event_id)
            .await
        {
            Ok(event) => event,
            Err(CalendarError::Forbidden(_)) => return SyncOutcome::PermissionDenied,
            Err(e) => return SyncOutcome::Failed(e.into()),
        };

        if !existing.is_cancelled() {
            return SyncOutcome::AlreadyExists;
        }

        tracing::info!("Restoring cancelled event {}", event_id);
        payload.status = Some(EventStatus::Confirmed);

        match self
            .calendar
            .update_event(&self.config.calendar_id, &event_id, &payload)
            .await
        {
            Ok(_) => SyncOutcome::Restored,
            Err(e) => SyncOutcome::Failed(e.into()),
        }
    }
}
