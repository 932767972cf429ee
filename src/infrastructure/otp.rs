//! One-time login codes
//!
//! Codes are keyed by account email, expire after a fixed TTL and can be
//! redeemed once. A code is burnt after `MAX_ATTEMPTS` wrong guesses.
//! The store is owned by `AppState`, never global.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use std::time::{Duration, Instant};

/// Wrong guesses allowed before a code is discarded
pub const MAX_ATTEMPTS: u32 = 5;

struct OtpEntry {
    code: u32,
    expires_at: Instant,
    failures: u32,
}

pub struct OtpStore {
    entries: DashMap<String, OtpEntry>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh six digit code for `key`, replacing any previous one
    pub fn issue(&self, key: &str) -> u32 {
        let code = rand::thread_rng().gen_range(100_000..=999_999);
        self.entries.insert(
            key.to_owned(),
            OtpEntry {
                code,
                expires_at: Instant::now() + self.ttl,
                failures: 0,
            },
        );
        code
    }

    /// Redeem a code. A match consumes it; an expired code is discarded,
    /// and so is a code that has seen `MAX_ATTEMPTS` wrong guesses.
    pub fn verify(&self, key: &str, code: u32) -> bool {
        let Entry::Occupied(mut slot) = self.entries.entry(key.to_owned()) else {
            return false;
        };

        if Instant::now() >= slot.get().expires_at {
            slot.remove();
            return false;
        }
        if slot.get().code == code {
            slot.remove();
            return true;
        }

        let entry = slot.get_mut();
        entry.failures += 1;
        if entry.failures >= MAX_ATTEMPTS {
            tracing::warn!(
                "One-time code for {} discarded after {} failures",
                key,
                MAX_ATTEMPTS
            );
            slot.remove();
        }
        false
    }

    /// Drop every expired code, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }
}
