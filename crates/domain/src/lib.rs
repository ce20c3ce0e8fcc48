//! Domain layer for the Arisan Digital backend.
//!
//! This crate contains:
//! - Domain models (Group, GroupMember, Round, Payment, User, invites)
//! - Store traits per entity plus the in-memory implementation
//! - The proof-image storage abstraction
//! - The manager services holding the arisan business rules

pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod stores;

pub use error::DomainError;
