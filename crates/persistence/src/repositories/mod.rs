//! Repository implementations of the domain store traits.

use domain::stores::Stores;
use sqlx::PgPool;
use std::sync::Arc;

pub mod group;
pub mod invite;
pub mod otp_code;
pub mod payment;
pub mod round;
pub mod user;

pub use group::GroupRepository;
pub use invite::InviteRepository;
pub use otp_code::OtpRepository;
pub use payment::PaymentRepository;
pub use round::RoundRepository;
pub use user::UserRepository;

/// Builds a store registry backed by PostgreSQL repositories sharing one pool.
pub fn pg_stores(pool: PgPool) -> Stores {
    Stores {
        users: Arc::new(UserRepository::new(pool.clone())),
        groups: Arc::new(GroupRepository::new(pool.clone())),
        rounds: Arc::new(RoundRepository::new(pool.clone())),
        payments: Arc::new(PaymentRepository::new(pool.clone())),
        invites: Arc::new(InviteRepository::new(pool.clone())),
        otp_codes: Arc::new(OtpRepository::new(pool)),
    }
}
