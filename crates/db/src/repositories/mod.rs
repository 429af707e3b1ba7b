//! Repositories backed by sea-orm.

mod application;
mod certificate;
mod penalty;
mod post;
mod store;
mod user;

pub use application::ApplicationRepository;
pub use certificate::CertificateRepository;
pub use penalty::PenaltyRepository;
pub use post::PostRepository;
pub use store::{
    ApplicationStore, CertificateStore, DynApplicationStore, DynCertificateStore,
    DynPenaltyStore, DynPostStore, DynUserStore, PenaltyStore, PostFilter, PostStore, UserStore,
};
pub use user::UserRepository;

use hub_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Convert a database error, surfacing unique-key violations as `Conflict`.
pub(crate) fn map_db_err(err: DbErr, conflict: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Unique constraint violated");
            AppError::Conflict(conflict.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}
