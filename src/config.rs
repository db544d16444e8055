use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc, Weekday};

pub const UTC_OFFSET_VAR: &str = "STUDYFLOW_UTC_OFFSET";
pub const WEEK_START_VAR: &str = "STUDYFLOW_WEEK_START";
pub const SNAPSHOT_VAR: &str = "STUDYFLOW_SNAPSHOT";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Calendar used for every day-granularity comparison.
    pub utc_offset: FixedOffset,
    pub week_start: Weekday,
    pub snapshot: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            utc_offset: Local::now().offset().fix(),
            week_start: Weekday::Sun,
            snapshot: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(UTC_OFFSET_VAR).filter(|v| !v.trim().is_empty()) {
            settings.utc_offset = raw
                .trim()
                .parse::<FixedOffset>()
                .ok()
                .with_context(|| format!("{UTC_OFFSET_VAR} must look like +02:00, got '{raw}'"))?;
        }

        if let Some(raw) = lookup(WEEK_START_VAR).filter(|v| !v.trim().is_empty()) {
            settings.week_start = raw
                .trim()
                .parse::<Weekday>()
                .ok()
                .with_context(|| format!("{WEEK_START_VAR} must name a weekday, got '{raw}'"))?;
        }

        settings.snapshot = lookup(SNAPSHOT_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(settings)
    }

    /// Wall-clock time in the configured calendar. Read once per command.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}
