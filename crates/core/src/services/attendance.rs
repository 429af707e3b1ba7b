//! Attendance marking and absence tracking.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use hub_common::{AppError, AppResult};
use hub_db::{
    entities::{
        application::{self, AttendanceStatus},
        user,
    },
    repositories::{DynApplicationStore, DynPostStore},
};
use sea_orm::Set;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use super::penalty::{PenaltyService, require_admin};

/// Per-volunteer locks serializing the count-then-escalate sequence.
#[derive(Default)]
pub struct VolunteerLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VolunteerLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a volunteer's escalation state.
    pub async fn acquire(&self, volunteer_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only the table refers to are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(volunteer_id.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of volunteers with a held or awaited lock.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether no lock is held or awaited.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Per-volunteer attendance figures for the admin overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub volunteer_id: String,
    pub total_events: u64,
    pub present: u64,
    pub absent: u64,
    pub recent_absences: u64,
}

/// Records attendance and hands fresh absence counts to the escalator.
#[derive(Clone)]
pub struct AttendanceService {
    application_store: DynApplicationStore,
    post_store: DynPostStore,
    penalty_service: PenaltyService,
    locks: Arc<VolunteerLocks>,
}

impl AttendanceService {
    /// Create a new attendance service.
    #[must_use]
    pub fn new(
        application_store: DynApplicationStore,
        post_store: DynPostStore,
        penalty_service: PenaltyService,
    ) -> Self {
        Self {
            application_store,
            post_store,
            penalty_service,
            locks: Arc::new(VolunteerLocks::new()),
        }
    }

    /// Mark a volunteer's attendance on an application.
    ///
    /// An ABSENT mark recounts the volunteer's recent absences and may issue
    /// a penalty before returning. Other marks never touch penalties.
    pub async fn mark_attendance(
        &self,
        actor: &user::Model,
        application_id: &str,
        status: AttendanceStatus,
    ) -> AppResult<application::Model> {
        let existing = self
            .application_store
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        let post = self
            .post_store
            .find_by_id(&existing.post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.author_id != actor.id {
            return Err(AppError::Forbidden(
                "Only the post author can mark attendance".to_string(),
            ));
        }

        let volunteer_id = existing.volunteer_id.clone();
        let now = Utc::now();

        let mut active: application::ActiveModel = existing.into();
        active.attendance_status = Set(status);
        active.attendance_marked_at = Set(match status {
            AttendanceStatus::NotMarked => None,
            AttendanceStatus::Present | AttendanceStatus::Absent => Some(now.into()),
        });

        if status != AttendanceStatus::Absent {
            let updated = self.application_store.update(active).await?;
            info!(application_id = %updated.id, status = ?status, "Attendance marked");
            return Ok(updated);
        }

        let _guard = self.locks.acquire(&volunteer_id).await;

        let updated = self.application_store.update(active).await?;
        let recent = self.count_recent(&volunteer_id, now).await?;
        info!(
            application_id = %updated.id,
            volunteer_id = %volunteer_id,
            recent_absences = recent,
            "Absence marked"
        );

        self.penalty_service
            .evaluate(&volunteer_id, recent, now)
            .await?;

        Ok(updated)
    }

    async fn count_recent(&self, volunteer_id: &str, now: DateTime<Utc>) -> AppResult<u64> {
        let since = self.penalty_service.policy().absence_window_start(now);
        self.application_store
            .count_absences_since(volunteer_id, since)
            .await
    }

    /// Absences of a volunteer inside the trailing window.
    pub async fn recent_absences(&self, volunteer_id: &str) -> AppResult<u64> {
        self.count_recent(volunteer_id, Utc::now()).await
    }

    /// Attendance totals per volunteer, most recent absences first.
    pub async fn attendance_overview(
        &self,
        actor: &user::Model,
    ) -> AppResult<Vec<AttendanceSummary>> {
        require_admin(actor)?;

        let now = Utc::now();
        let policy = self.penalty_service.policy();
        let mut by_volunteer: HashMap<String, AttendanceSummary> = HashMap::new();

        for app in self.application_store.find_marked().await? {
            let summary = by_volunteer
                .entry(app.volunteer_id.clone())
                .or_insert_with(|| AttendanceSummary {
                    volunteer_id: app.volunteer_id.clone(),
                    total_events: 0,
                    present: 0,
                    absent: 0,
                    recent_absences: 0,
                });

            summary.total_events += 1;
            match app.attendance_status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => {
                    summary.absent += 1;
                    if app
                        .attendance_marked_at
                        .is_some_and(|t| policy.is_recent_absence(t.to_utc(), now))
                    {
                        summary.recent_absences += 1;
                    }
                }
                AttendanceStatus::NotMarked => {}
            }
        }

        let mut summaries: Vec<_> = by_volunteer.into_values().collect();
        summaries.sort_by(|a, b| {
            b.recent_absences
                .cmp(&a.recent_absences)
                .then_with(|| a.volunteer_id.cmp(&b.volunteer_id))
        });

        Ok(summaries)
    }
}
