//! Domain models for Arisan Digital.

pub mod group;
pub mod invite;
pub mod otp;
pub mod payment;
pub mod round;
pub mod user;

pub use group::{Frequency, Group, GroupMember, GroupStatus};
pub use invite::GroupInvite;
pub use otp::OtpCode;
pub use payment::{Payment, PaymentStatus};
pub use round::{Round, RoundStatus};
pub use user::User;
