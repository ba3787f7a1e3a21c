use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::store::UserStore;

/// Fixed lockout window after the failure threshold is reached.
pub const COOLDOWN_MS: i64 = 300_000;

/// Outcome of a password verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted,
    Rejected { attempts_used: u32, attempts_max: u32 },
    Locked { remaining: Duration },
}

/// Password verification with failure counting and a five-minute
/// lockout. All state lives in [`PasswordSettings`] via the user store,
/// so the policy survives process death.
pub struct PasswordPolicy {
    users: Arc<UserStore>,
}

impl PasswordPolicy {
    pub fn new(users: Arc<UserStore>) -> Self {
        Self { users }
    }

    pub async fn verify(&self, candidate: &str) -> VerifyOutcome {
        self.verify_at(candidate, Utc::now().timestamp_millis()).await
    }

    pub async fn verify_at(&self, candidate: &str, now_ms: i64) -> VerifyOutcome {
        let mut settings = self.users.get_password_settings().await;

        // Lockout gate: once the threshold is reached, every candidate
        // is refused until the cooldown elapses.
        if settings.failed_attempts >= settings.max_failed_attempts
            && settings.max_failed_attempts > 0
        {
            let elapsed = now_ms - settings.last_failed_timestamp;
            if elapsed < COOLDOWN_MS {
                let remaining = (COOLDOWN_MS - elapsed).max(0) as u64;
                return VerifyOutcome::Locked {
                    remaining: Duration::from_millis(remaining),
                };
            }
            settings.failed_attempts = 0;
            settings.last_failed_timestamp = 0;
            self.users.save_password_settings(settings.clone()).await;
        }

        if !settings.password_enabled || candidate == settings.password {
            if settings.failed_attempts > 0 {
                self.users.reset_failed_attempts().await;
            }
            return VerifyOutcome::Accepted;
        }

        let attempts_used = self.users.record_failed_attempt(now_ms).await;
        VerifyOutcome::Rejected {
            attempts_used,
            attempts_max: settings.max_failed_attempts,
        }
    }
}
