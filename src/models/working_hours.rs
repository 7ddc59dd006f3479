use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

impl DayHours {
    pub fn open_time(&self) -> Option<NaiveTime> {
        parse_time(&self.open).ok()
    }

    pub fn close_time(&self) -> Option<NaiveTime> {
        parse_time(&self.close).ok()
    }

    /// `open <= t < close`
    pub fn contains(&self, t: NaiveTime) -> bool {
        match (self.open_time(), self.close_time()) {
            (Some(open), Some(close)) => t >= open && t < close,
            _ => false,
        }
    }
}

/// Opening hours keyed by weekday index, 0 = Sunday. A missing key and an
/// explicit `null` both mean the organization is closed that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingHours {
    pub days: BTreeMap<u8, Option<DayHours>>,
}

impl WorkingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WorkingHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (day, entry) in &self.days {
            if *day > 6 {
                anyhow::bail!("invalid weekday index: {day}");
            }
            if let Some(hours) = entry {
                let open = parse_time(&hours.open)?;
                let close = parse_time(&hours.close)?;
                if open >= close {
                    anyhow::bail!(
                        "opening time {} must be before closing time {}",
                        hours.open,
                        hours.close
                    );
                }
            }
        }
        Ok(())
    }

    pub fn weekday_index(dt: &NaiveDateTime) -> u8 {
        dt.weekday().num_days_from_sunday() as u8
    }

    pub fn for_day(&self, weekday: u8) -> Option<&DayHours> {
        self.days.get(&weekday).and_then(|d| d.as_ref())
    }

    pub fn for_datetime(&self, dt: &NaiveDateTime) -> Option<&DayHours> {
        self.for_day(Self::weekday_index(dt))
    }

    pub fn to_human_readable(&self) -> String {
        // Monday-first reads better than the storage order
        [1u8, 2, 3, 4, 5, 6, 0]
            .iter()
            .filter_map(|day| {
                self.for_day(*day)
                    .map(|h| format!("{}: {}-{}", DAY_NAMES[*day as usize], h.open, h.close))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("invalid time: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"0":{"open":"09:00","close":"18:00"},"1":null,"2":{"open":"10:00","close":"16:00"}}"#;
        let hours = WorkingHours::from_json(json).unwrap();
        assert_eq!(hours.days.len(), 3);
        assert!(hours.for_day(0).is_some());
        assert!(hours.for_day(1).is_none());
        assert!(hours.for_day(5).is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(WorkingHours::from_json("not json").is_err());
    }

    #[test]
    fn test_parse_invalid_day() {
        let json = r#"{"7":{"open":"09:00","close":"18:00"}}"#;
        assert!(WorkingHours::from_json(json).is_err());
    }

    #[test]
    fn test_parse_invalid_time() {
        let json = r#"{"1":{"open":"25:00","close":"18:00"}}"#;
        assert!(WorkingHours::from_json(json).is_err());
    }

    #[test]
    fn test_parse_inverted_range() {
        let json = r#"{"1":{"open":"18:00","close":"09:00"}}"#;
        assert!(WorkingHours::from_json(json).is_err());
    }

    #[test]
    fn test_weekday_index_starts_on_sunday() {
        // 2025-06-15 is a Sunday
        assert_eq!(WorkingHours::weekday_index(&dt("2025-06-15 10:00")), 0);
        assert_eq!(WorkingHours::weekday_index(&dt("2025-06-16 10:00")), 1);
        assert_eq!(WorkingHours::weekday_index(&dt("2025-06-21 10:00")), 6);
    }

    #[test]
    fn test_contains_is_half_open() {
        let hours = DayHours {
            open: "09:00".to_string(),
            close: "18:00".to_string(),
        };
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        assert!(hours.contains(t("09:00")));
        assert!(hours.contains(t("17:59")));
        assert!(!hours.contains(t("18:00")));
        assert!(!hours.contains(t("08:59")));
    }

    #[test]
    fn test_to_human_readable() {
        let json = r#"{"0":{"open":"10:00","close":"14:00"},"1":{"open":"09:00","close":"18:00"}}"#;
        let hours = WorkingHours::from_json(json).unwrap();
        assert_eq!(hours.to_human_readable(), "Mon: 09:00-18:00, Sun: 10:00-14:00");
    }

    #[test]
    fn test_to_human_readable_empty() {
        assert_eq!(WorkingHours::default().to_human_readable(), "");
    }
}
