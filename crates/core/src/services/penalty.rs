//! Penalty escalation and administration.

use chrono::{DateTime, Duration, Utc};
use hub_common::{AppError, AppResult, EngineConfig, IdGenerator};
use hub_db::{
    entities::{
        penalty::{self, PenaltyStatus, PenaltyType},
        user,
    },
    repositories::{DynPenaltyStore, DynUserStore},
};
use sea_orm::Set;
use tracing::info;
use validator::Validate;

use super::eligibility::is_effective;

/// Absence window and thresholds driving automatic penalties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Length of the trailing absence window.
    pub absence_window: Duration,
    /// Exact count issuing a warning.
    pub warning_threshold: u64,
    /// Exact count issuing a temporary restriction.
    pub restriction_threshold: u64,
    /// Count from which every absence issues a suspension.
    pub suspension_threshold: u64,
    /// Lifetime of a temporary restriction.
    pub restriction_duration: Duration,
    /// Lifetime of a suspension.
    pub suspension_duration: Duration,
}

impl From<&EngineConfig> for EscalationPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            absence_window: Duration::days(config.absence_window_days),
            warning_threshold: config.warning_threshold,
            restriction_threshold: config.restriction_threshold,
            suspension_threshold: config.suspension_threshold,
            restriction_duration: Duration::days(config.restriction_days),
            suspension_duration: Duration::days(config.suspension_days),
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// A penalty the escalator wants to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyTemplate {
    pub penalty_type: PenaltyType,
    pub reason: &'static str,
    pub description: String,
    /// `None` keeps the penalty in force until an admin resolves it.
    pub duration: Option<Duration>,
}

impl EscalationPolicy {
    /// Oldest instant an absence mark may carry and still count at `now`.
    #[must_use]
    pub fn absence_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.absence_window
    }

    /// Whether an absence marked at `marked_at` falls inside the window. The cutoff is inclusive.
    #[must_use]
    pub fn is_recent_absence(&self, marked_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        marked_at >= self.absence_window_start(now)
    }

    /// Map a recent absence count to the penalty it triggers, if any.
    ///
    /// Warning and restriction fire on an exact count only, so a count that
    /// jumps past a threshold skips that tier.
    #[must_use]
    pub fn decide_escalation(&self, recent_absences: u64) -> Option<PenaltyTemplate> {
        if recent_absences >= self.suspension_threshold {
            Some(PenaltyTemplate {
                penalty_type: PenaltyType::Suspension,
                reason: "Excessive Absences",
                description: format!(
                    "You have been marked absent {recent_absences} times. Account suspended."
                ),
                duration: Some(self.suspension_duration),
            })
        } else if recent_absences == self.restriction_threshold {
            Some(PenaltyTemplate {
                penalty_type: PenaltyType::TemporaryRestriction,
                reason: "Excessive Absences",
                description: format!(
                    "You have been marked absent {recent_absences} times. Temporary restrictions applied."
                ),
                duration: Some(self.restriction_duration),
            })
        } else if recent_absences == self.warning_threshold {
            Some(PenaltyTemplate {
                penalty_type: PenaltyType::Warning,
                reason: "Multiple Absences",
                description: format!(
                    "You have been marked absent {recent_absences} times in the last {} days.",
                    self.absence_window.num_days()
                ),
                duration: None,
            })
        } else {
            None
        }
    }
}

/// Input for an admin-issued penalty.
#[derive(Debug, Clone, Validate)]
pub struct CreatePenaltyInput {
    pub user_id: String,
    pub penalty_type: PenaltyType,
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A user's own penalties.
#[derive(Debug, Clone)]
pub struct MyPenalties {
    /// Penalties currently in force.
    pub active: Vec<penalty::Model>,
    /// Full history, newest first.
    pub all: Vec<penalty::Model>,
}

pub(crate) fn require_admin(actor: &user::Model) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Issues automatic penalties and serves admin penalty management.
#[derive(Clone)]
pub struct PenaltyService {
    penalty_store: DynPenaltyStore,
    user_store: DynUserStore,
    policy: EscalationPolicy,
    id_gen: IdGenerator,
}

impl PenaltyService {
    /// Create a new penalty service.
    #[must_use]
    pub const fn new(
        penalty_store: DynPenaltyStore,
        user_store: DynUserStore,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            penalty_store,
            user_store,
            policy,
            id_gen: IdGenerator::new(),
        }
    }

    /// The policy in use.
    #[must_use]
    pub const fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Apply the escalation table to a freshly computed absence count.
    ///
    /// Returns the created penalty, if the count triggered one.
    pub async fn evaluate(
        &self,
        volunteer_id: &str,
        recent_absences: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Option<penalty::Model>> {
        let Some(template) = self.policy.decide_escalation(recent_absences) else {
            return Ok(None);
        };

        let model = penalty::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(volunteer_id.to_string()),
            penalty_type: Set(template.penalty_type),
            status: Set(PenaltyStatus::Active),
            reason: Set(template.reason.to_string()),
            description: Set(Some(template.description)),
            expires_at: Set(template.duration.map(|d| (now + d).into())),
            created_at: Set(now.into()),
            resolved_at: Set(None),
            issued_by: Set(None),
        };

        let created = self.penalty_store.create(model).await?;
        info!(
            penalty_id = %created.id,
            user_id = %volunteer_id,
            penalty_type = ?created.penalty_type,
            recent_absences,
            "Issued automatic penalty"
        );

        Ok(Some(created))
    }

    /// Issue a penalty by hand.
    pub async fn create_penalty(
        &self,
        admin: &user::Model,
        input: CreatePenaltyInput,
    ) -> AppResult<penalty::Model> {
        require_admin(admin)?;
        input.validate()?;

        self.user_store.get_by_id(&input.user_id).await?;

        let model = penalty::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id),
            penalty_type: Set(input.penalty_type),
            status: Set(PenaltyStatus::Active),
            reason: Set(input.reason),
            description: Set(input.description),
            expires_at: Set(input.expires_at.map(Into::into)),
            created_at: Set(Utc::now().into()),
            resolved_at: Set(None),
            issued_by: Set(Some(admin.id.clone())),
        };

        let created = self.penalty_store.create(model).await?;
        info!(
            penalty_id = %created.id,
            user_id = %created.user_id,
            issued_by = %admin.id,
            penalty_type = ?created.penalty_type,
            "Admin issued penalty"
        );

        Ok(created)
    }

    /// Change the status of a penalty.
    ///
    /// `resolved_at` is stamped on RESOLVED and cleared for any other status.
    pub async fn update_status(
        &self,
        admin: &user::Model,
        penalty_id: &str,
        status: PenaltyStatus,
    ) -> AppResult<penalty::Model> {
        require_admin(admin)?;

        let existing = self
            .penalty_store
            .find_by_id(penalty_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Penalty not found".to_string()))?;

        let mut active: penalty::ActiveModel = existing.into();
        active.status = Set(status);
        active.resolved_at = Set(match status {
            PenaltyStatus::Resolved => Some(Utc::now().into()),
            PenaltyStatus::Active | PenaltyStatus::Expired => None,
        });

        let updated = self.penalty_store.update(active).await?;
        info!(penalty_id = %updated.id, status = ?status, admin_id = %admin.id, "Penalty status changed");

        Ok(updated)
    }

    /// Resolve a penalty.
    pub async fn resolve_penalty(
        &self,
        admin: &user::Model,
        penalty_id: &str,
    ) -> AppResult<penalty::Model> {
        self.update_status(admin, penalty_id, PenaltyStatus::Resolved)
            .await
    }

    /// Remove a penalty record.
    pub async fn delete_penalty(&self, admin: &user::Model, penalty_id: &str) -> AppResult<()> {
        require_admin(admin)?;
        self.penalty_store.delete(penalty_id).await?;
        info!(penalty_id = %penalty_id, admin_id = %admin.id, "Penalty deleted");
        Ok(())
    }

    /// Every penalty, newest first.
    pub async fn list_penalties(&self, admin: &user::Model) -> AppResult<Vec<penalty::Model>> {
        require_admin(admin)?;
        self.penalty_store.find_all().await
    }

    /// The caller's penalties, split into those in force and the full history.
    pub async fn my_penalties(&self, actor: &user::Model) -> AppResult<MyPenalties> {
        let all = self.penalty_store.find_by_user(&actor.id).await?;
        let now = Utc::now();
        let active = all.iter().filter(|p| is_effective(p, now)).cloned().collect();
        Ok(MyPenalties { active, all })
    }
}
