//! Per-phone throttling for OTP issuance.
//!
//! One governor limiter is kept per phone number; the auth service
//! checks it before generating a code. Limits are hourly because OTP
//! abuse is a cost problem (SMS fan-out), not a load problem.

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};

/// Type alias for the limiter kept per phone.
type KeyRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Registry of per-phone rate limiters.
///
/// A limit of 0 disables throttling entirely.
pub struct PhoneRateLimiter {
    limiters: RwLock<HashMap<String, Arc<KeyRateLimiter>>>,
    limit_per_hour: u32,
}

impl PhoneRateLimiter {
    pub fn new(limit_per_hour: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            limit_per_hour,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit_per_hour > 0
    }

    /// Checks the budget for a phone. On rejection returns the number
    /// of seconds to wait before the next permit.
    pub fn check(&self, phone: &str) -> Result<(), u64> {
        if !self.is_enabled() {
            return Ok(());
        }
        let limiter = self.get_or_create(phone);
        limiter.check().map_err(|not_until| {
            let now = DefaultClock::default().now();
            not_until.wait_time_from(now).as_secs().max(1)
        })
    }

    fn get_or_create(&self, phone: &str) -> Arc<KeyRateLimiter> {
        if let Some(limiter) = self
            .limiters
            .read()
            .expect("rate limiter lock poisoned")
            .get(phone)
        {
            return limiter.clone();
        }

        let mut limiters = self.limiters.write().expect("rate limiter lock poisoned");
        // A writer may have raced us here; entry() keeps the first one.
        limiters
            .entry(phone.to_string())
            .or_insert_with(|| {
                let quota = Quota::per_hour(
                    NonZeroU32::new(self.limit_per_hour).expect("limit checked non-zero"),
                );
                Arc::new(GovRateLimiter::direct(quota))
            })
            .clone()
    }
}

impl std::fmt::Debug for PhoneRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneRateLimiter")
            .field("limit_per_hour", &self.limit_per_hour)
            .finish_non_exhaustive()
    }
}
