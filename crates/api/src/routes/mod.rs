//! HTTP route handlers.

pub mod auth;
pub mod groups;
pub mod health;
pub mod invites;
pub mod payments;
pub mod rounds;
pub mod users;
