use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::WorkingHours;

pub const DEFAULT_ADVANCE_DAYS: i64 = 30;
pub const DEFAULT_MIN_ADVANCE_HOURS: i64 = 2;
pub const MAX_ADVANCE_DAYS: i64 = 3650;
pub const MAX_MIN_ADVANCE_HOURS: i64 = 24 * MAX_ADVANCE_DAYS;
pub const DEFAULT_CONFIRMATION: &str = "Your booking has been received. See you soon!";
const FALLBACK_LOCALE: &str = "en";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub slug: String,
    pub display_name: String,
    pub booking_settings: BookingSettings,
    pub telegram_chat_id: Option<String>,
    /// Fixed offset of the organization's wall clock from UTC.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default = "default_advance_days")]
    pub advance_days: i64,
    #[serde(default = "default_min_advance_hours")]
    pub min_advance_hours: i64,
    #[serde(default)]
    pub confirmation_message: BTreeMap<String, String>,
}

fn default_advance_days() -> i64 {
    DEFAULT_ADVANCE_DAYS
}

fn default_min_advance_hours() -> i64 {
    DEFAULT_MIN_ADVANCE_HOURS
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            working_hours: WorkingHours::default(),
            advance_days: DEFAULT_ADVANCE_DAYS,
            min_advance_hours: DEFAULT_MIN_ADVANCE_HOURS,
            confirmation_message: BTreeMap::new(),
        }
    }
}

impl BookingSettings {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let settings: BookingSettings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0..=MAX_ADVANCE_DAYS).contains(&self.advance_days) {
            anyhow::bail!("advance_days must be between 0 and {MAX_ADVANCE_DAYS}");
        }
        if !(0..=MAX_MIN_ADVANCE_HOURS).contains(&self.min_advance_hours) {
            anyhow::bail!("min_advance_hours must be between 0 and {MAX_MIN_ADVANCE_HOURS}");
        }
        self.working_hours.validate()
    }

    /// Requested locale, then English, then whatever the organization configured.
    pub fn confirmation_for(&self, locale: Option<&str>) -> String {
        locale
            .and_then(|l| self.confirmation_message.get(l))
            .or_else(|| self.confirmation_message.get(FALLBACK_LOCALE))
            .or_else(|| self.confirmation_message.values().next())
            .filter(|m| !m.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Option<String>,
}
