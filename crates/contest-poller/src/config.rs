//! Runtime configuration, loaded from the environment.

use std::env;

use anyhow::{Context, Result};
use chrono_tz::Tz;

/// Display zone used when `SYNC_TIMEZONE` is not set.
pub const DEFAULT_TIMEZONE: Tz = Tz::Asia__Kolkata;

/// Everything a sync pass needs to know about its target calendar.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Calendar to write into, usually the owner's email address.
    pub calendar_id: String,
    /// Zone the event start/end times are rendered in.
    pub timezone: Tz,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// `CALENDAR_ID` is required. `SYNC_TIMEZONE` is optional but must
    /// name a real IANA zone when present.
    pub fn from_env() -> Result<Self> {
        let calendar_id = env::var("CALENDAR_ID").context("CALENDAR_ID must be set")?;

        let timezone = match env::var("SYNC_TIMEZONE") {
            Ok(name) => name
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", name))?,
            Err(_) => DEFAULT_TIMEZONE,
        };

        Ok(Self {
            calendar_id,
            timezone,
        })
    }
}
