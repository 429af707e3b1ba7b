//! Penalty-driven gates on applying and certificate issuance.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use hub_common::{AppError, AppResult};
use hub_db::{
    entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
        penalty::{self, PenaltyStatus, PenaltyType},
    },
    repositories::DynPenaltyStore,
};

/// Whether a penalty is in force at `now`.
///
/// A stored ACTIVE status is not enough: a penalty whose `expires_at` has
/// passed no longer applies even though nothing rewrote its status.
#[must_use]
pub fn is_effective(penalty: &penalty::Model, now: DateTime<Utc>) -> bool {
    penalty.status == PenaltyStatus::Active
        && penalty.expires_at.is_none_or(|expires| expires.to_utc() > now)
}

/// End of the longest-lasting penalty, or `None` if one of them is open-ended.
fn latest_expiry<'a>(
    mut penalties: impl Iterator<Item = &'a penalty::Model>,
) -> Option<DateTime<FixedOffset>> {
    penalties.try_fold(None, |latest: Option<DateTime<FixedOffset>>, p| {
        let expires = p.expires_at?;
        Some(Some(latest.map_or(expires, |l| l.max(expires))))
    })?
}

/// Reason an apply attempt is refused, if any.
///
/// Suspension wins over restriction. Warnings never block.
#[must_use]
pub fn apply_denial(penalties: &[penalty::Model], now: DateTime<Utc>) -> Option<String> {
    let in_force = move |kind: PenaltyType| {
        penalties
            .iter()
            .filter(move |p| p.penalty_type == kind && is_effective(p, now))
    };

    if in_force(PenaltyType::Suspension).next().is_some() {
        let message = match latest_expiry(in_force(PenaltyType::Suspension)) {
            Some(until) => format!(
                "Your account is suspended and cannot apply to opportunities until {}",
                until.format("%Y-%m-%d")
            ),
            None => "Your account is suspended and cannot apply to opportunities".to_string(),
        };
        return Some(message);
    }

    if in_force(PenaltyType::TemporaryRestriction).next().is_some() {
        let message = match latest_expiry(in_force(PenaltyType::TemporaryRestriction)) {
            Some(until) => format!(
                "Your account has a temporary restriction and cannot apply to opportunities until {}",
                until.format("%Y-%m-%d")
            ),
            None => "Your account has a temporary restriction and cannot apply to opportunities"
                .to_string(),
        };
        return Some(message);
    }

    None
}

/// Whether any of the penalties is a suspension in force.
#[must_use]
pub fn is_suspended(penalties: &[penalty::Model], now: DateTime<Utc>) -> bool {
    penalties
        .iter()
        .any(|p| p.penalty_type == PenaltyType::Suspension && is_effective(p, now))
}

/// Reads penalty state at check time and turns it into allow/deny decisions.
#[derive(Clone)]
pub struct EligibilityGate {
    penalty_store: DynPenaltyStore,
}

impl EligibilityGate {
    /// Create a new gate.
    #[must_use]
    pub const fn new(penalty_store: DynPenaltyStore) -> Self {
        Self { penalty_store }
    }

    async fn active_penalties(&self, user_id: &str) -> AppResult<Vec<penalty::Model>> {
        self.penalty_store
            .find_active_by_users(&[user_id.to_string()])
            .await
    }

    /// Penalties of a user in force right now.
    pub async fn effective_penalties(&self, user_id: &str) -> AppResult<Vec<penalty::Model>> {
        let now = Utc::now();
        Ok(self
            .active_penalties(user_id)
            .await?
            .into_iter()
            .filter(|p| is_effective(p, now))
            .collect())
    }

    /// Refuse with `EligibilityDenied` if the user may not apply to a post.
    pub async fn check_apply(&self, user_id: &str) -> AppResult<()> {
        let penalties = self.active_penalties(user_id).await?;
        match apply_denial(&penalties, Utc::now()) {
            Some(message) => {
                tracing::debug!(user_id = %user_id, reason = %message, "Application blocked");
                Err(AppError::EligibilityDenied(message))
            }
            None => Ok(()),
        }
    }

    /// Check that the volunteer behind `application` may receive a certificate.
    ///
    /// Temporary restrictions do not block certificates.
    pub async fn check_certificate(&self, application: &application::Model) -> AppResult<()> {
        if application.status != ApplicationStatus::Approved {
            return Err(AppError::BadRequest(
                "Volunteer must have an approved application".to_string(),
            ));
        }

        if application.attendance_status != AttendanceStatus::Present {
            return Err(AppError::BadRequest(
                "Certificate can only be issued to volunteers who attended the event".to_string(),
            ));
        }

        let penalties = self.active_penalties(&application.volunteer_id).await?;
        if is_suspended(&penalties, Utc::now()) {
            return Err(AppError::EligibilityDenied(
                "Cannot issue certificate to suspended user".to_string(),
            ));
        }

        Ok(())
    }

    /// The subset of `user_ids` currently under suspension.
    pub async fn suspended_among(&self, user_ids: &[String]) -> AppResult<HashSet<String>> {
        let now = Utc::now();
        Ok(self
            .penalty_store
            .find_active_by_users(user_ids)
            .await?
            .into_iter()
            .filter(|p| p.penalty_type == PenaltyType::Suspension && is_effective(p, now))
            .map(|p| p.user_id)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::memory::MemoryStores;

    fn penalty(
        kind: PenaltyType,
        status: PenaltyStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> penalty::Model {
        penalty::Model {
            id: format!("{kind:?}-{status:?}"),
            user_id: "vol".to_string(),
            penalty_type: kind,
            status,
            reason: "test".to_string(),
            description: None,
            expires_at: expires_at.map(Into::into),
            created_at: Utc::now().into(),
            resolved_at: None,
            issued_by: None,
        }
    }

    fn application(status: ApplicationStatus, attendance: AttendanceStatus) -> application::Model {
        application::Model {
            id: "app".to_string(),
            volunteer_id: "vol".to_string(),
            post_id: "post".to_string(),
            message: None,
            status,
            attendance_status: attendance,
            attendance_marked_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_effective_respects_status_and_expiry() {
        let now = Utc::now();
        let open = penalty(PenaltyType::Warning, PenaltyStatus::Active, None);
        let future = penalty(
            PenaltyType::TemporaryRestriction,
            PenaltyStatus::Active,
            Some(now + Duration::days(1)),
        );
        let lapsed = penalty(
            PenaltyType::TemporaryRestriction,
            PenaltyStatus::Active,
            Some(now - Duration::days(1)),
        );
        let at_instant = penalty(PenaltyType::Suspension, PenaltyStatus::Active, Some(now));
        let resolved = penalty(PenaltyType::Suspension, PenaltyStatus::Resolved, None);
        let expired = penalty(PenaltyType::Suspension, PenaltyStatus::Expired, None);

        assert!(is_effective(&open, now));
        assert!(is_effective(&future, now));
        assert!(!is_effective(&lapsed, now));
        assert!(!is_effective(&at_instant, now));
        assert!(!is_effective(&resolved, now));
        assert!(!is_effective(&expired, now));
    }

    #[test]
    fn test_warning_never_blocks() {
        let now = Utc::now();
        let penalties = vec![penalty(PenaltyType::Warning, PenaltyStatus::Active, None)];
        assert_eq!(apply_denial(&penalties, now), None);
    }

    #[test]
    fn test_suspension_is_reported_before_restriction() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let penalties = vec![
            penalty(
                PenaltyType::TemporaryRestriction,
                PenaltyStatus::Active,
                Some(now + Duration::days(30)),
            ),
            penalty(PenaltyType::Suspension, PenaltyStatus::Active, None),
        ];
        assert_eq!(
            apply_denial(&penalties, now).as_deref(),
            Some("Your account is suspended and cannot apply to opportunities")
        );
    }

    #[test]
    fn test_restriction_message_names_end_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let penalties = vec![penalty(
            PenaltyType::TemporaryRestriction,
            PenaltyStatus::Active,
            Some(now + Duration::days(30)),
        )];
        let message = apply_denial(&penalties, now).unwrap();
        assert!(message.contains("temporary restriction"));
        assert!(message.ends_with("until 2026-01-31"));
    }

    #[test]
    fn test_suspension_message_uses_latest_end_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let penalties = vec![
            penalty(
                PenaltyType::Suspension,
                PenaltyStatus::Active,
                Some(now + Duration::days(10)),
            ),
            penalty(
                PenaltyType::Suspension,
                PenaltyStatus::Active,
                Some(now + Duration::days(60)),
            ),
        ];
        assert_eq!(
            apply_denial(&penalties, now).as_deref(),
            Some("Your account is suspended and cannot apply to opportunities until 2026-03-02")
        );
    }

    #[test]
    fn test_lapsed_restriction_does_not_block() {
        let now = Utc::now();
        let penalties = vec![penalty(
            PenaltyType::TemporaryRestriction,
            PenaltyStatus::Active,
            Some(now - Duration::seconds(1)),
        )];
        assert_eq!(apply_denial(&penalties, now), None);
        assert!(!is_suspended(&penalties, now));
    }

    #[tokio::test]
    async fn test_check_apply_reads_store() {
        let stores = MemoryStores::new();
        let gate = EligibilityGate::new(stores.penalties.clone());
        assert!(gate.check_apply("vol").await.is_ok());

        stores
            .penalties
            .insert(penalty(
                PenaltyType::TemporaryRestriction,
                PenaltyStatus::Active,
                Some(Utc::now() + Duration::days(30)),
            ))
            .await;

        let err = gate.check_apply("vol").await.unwrap_err();
        assert!(matches!(err, AppError::EligibilityDenied(_)));
        assert_eq!(gate.effective_penalties("vol").await.unwrap().len(), 1);
        assert!(gate.check_apply("someone-else").await.is_ok());
    }

    #[tokio::test]
    async fn test_certificate_checks() {
        let stores = MemoryStores::new();
        let gate = EligibilityGate::new(stores.penalties.clone());

        let pending = application(ApplicationStatus::Pending, AttendanceStatus::Present);
        assert!(matches!(
            gate.check_certificate(&pending).await,
            Err(AppError::BadRequest(m)) if m == "Volunteer must have an approved application"
        ));

        let absent = application(ApplicationStatus::Approved, AttendanceStatus::Absent);
        assert!(matches!(
            gate.check_certificate(&absent).await,
            Err(AppError::BadRequest(_))
        ));

        let attended = application(ApplicationStatus::Approved, AttendanceStatus::Present);
        assert!(gate.check_certificate(&attended).await.is_ok());

        // Restrictions leave certificates alone
        stores
            .penalties
            .insert(penalty(
                PenaltyType::TemporaryRestriction,
                PenaltyStatus::Active,
                Some(Utc::now() + Duration::days(30)),
            ))
            .await;
        assert!(gate.check_certificate(&attended).await.is_ok());

        stores
            .penalties
            .insert(penalty(PenaltyType::Suspension, PenaltyStatus::Active, None))
            .await;
        assert!(matches!(
            gate.check_certificate(&attended).await,
            Err(AppError::EligibilityDenied(_))
        ));
        assert!(
            gate.suspended_among(&["vol".to_string(), "other".to_string()])
                .await
                .unwrap()
                .contains("vol")
        );
    }
}
