//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod invite;
pub mod otp_code;
pub mod payment;
pub mod round;
pub mod user;

pub use group::{
    FrequencyDb, GroupEntity, GroupMemberEntity, GroupStatusDb, GroupWithMembershipEntity,
    MemberWithUserEntity,
};
pub use invite::GroupInviteEntity;
pub use otp_code::OtpCodeEntity;
pub use payment::{PaymentEntity, PaymentStatusDb, PaymentWithUserEntity, UserPaymentEntity};
pub use round::{RoundEntity, RoundStatusDb, RoundWithWinnerEntity};
pub use user::UserEntity;
