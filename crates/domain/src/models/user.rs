//! User domain models.
//!
//! Users are created on first successful OTP verification with an empty
//! `full_name`; profile setup fills it in afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents a registered user identified by phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    /// E.164-normalized Indonesian phone number, unique per user.
    pub phone: String,
    /// Empty string until profile setup completes.
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns true once profile setup has run and set a display name.
    pub fn profile_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
    }
}

/// Request payload for updating the caller's own profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    pub full_name: Option<String>,

    #[validate(length(max = 500, message = "Avatar URL must be at most 500 characters"))]
    pub avatar_url: Option<String>,
}

/// Public user info exposed in member and payment listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserPublic {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Full profile response for the authenticated caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserResponse {
    pub id: Uuid,
    pub phone: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let profile_complete = user.profile_complete();
        Self {
            id: user.id,
            phone: user.phone,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            profile_complete,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
