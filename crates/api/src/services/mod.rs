//! Application services: OTP sessions, SMS delivery, proof storage.

pub mod auth;
pub mod sms;
pub mod storage;

#[allow(unused_imports)] // Used in routes
pub use auth::{AuthError, AuthService};
#[allow(unused_imports)] // Used in app assembly
pub use sms::{SmsError, SmsService};
#[allow(unused_imports)] // Used in app assembly
pub use storage::{build_proof_storage, LocalProofStorage};
