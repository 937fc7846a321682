use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Booked => write!(f, "booked"),
        }
    }
}

/// A 30 minute clinic slot, keyed by date and start time.
///
/// Booking fields are only set while `status` is [`SlotStatus::Booked`].
/// `event_id` points at the event currently mirrored into the clinic
/// calendar, if one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(with = "time_hhmm")]
    pub time: NaiveTime,
    pub status: SlotStatus,
    pub volunteer_name: String,
    pub volunteer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// One entry of the credential's calendar list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
}

/// Provider-independent description of an event to mirror
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub attendees: Vec<String>,
}

// Slot times travel as bare "HH:MM" strings so that ledgers written by
// earlier versions of the tool stay readable.
mod time_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_slot() -> Slot {
        Slot {
            date: "2026-02-15".parse().unwrap(),
            time: NaiveTime::parse_from_str("10:00", "%H:%M").unwrap(),
            status: SlotStatus::Available,
            volunteer_name: "Alex".to_string(),
            volunteer_email: "alex@example.com".to_string(),
            student_email: None,
            subject: None,
            description: None,
            booked_at: None,
            event_id: Some("evt-1".to_string()),
        }
    }

    #[test]
    fn test_slot_serializes_time_as_hh_mm() {
        let json = serde_json::to_value(sample_slot()).unwrap();

        assert_eq!(json["time"], "10:00");
        assert_eq!(json["date"], "2026-02-15");
        assert_eq!(json["status"], "available");
    }

    #[test]
    fn test_unset_booking_fields_are_omitted() {
        let json = serde_json::to_string(&sample_slot()).unwrap();

        assert!(!json.contains("student_email"));
        assert!(!json.contains("booked_at"));
    }

    #[test]
    fn test_slot_round_trips() {
        let slot = Slot {
            status: SlotStatus::Booked,
            student_email: Some("sam@example.com".to_string()),
            subject: Some("Git help".to_string()),
            description: Some("Rebasing gone wrong".to_string()),
            booked_at: Some("2026-02-10T14:23:01.123456".parse().unwrap()),
            ..sample_slot()
        };

        let json = serde_json::to_string(&slot).unwrap();
        let restored: Slot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, slot);
    }

    #[test]
    fn test_rejects_time_with_seconds() {
        let raw = r#"{
            "date": "2026-02-15",
            "time": "10:00:00",
            "status": "available",
            "volunteer_name": "Alex",
            "volunteer_email": "alex@example.com"
        }"#;

        assert!(serde_json::from_str::<Slot>(raw).is_err());
    }
}
