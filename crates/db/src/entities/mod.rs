//! Database entities.

#![allow(missing_docs)]

pub mod application;
pub mod certificate;
pub mod penalty;
pub mod post;
pub mod user;

pub use application::Entity as Application;
pub use certificate::Entity as Certificate;
pub use penalty::Entity as Penalty;
pub use post::Entity as Post;
pub use user::Entity as User;
