use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const PUBLIC_BOOKING_NOTE: &str = "Created via public booking";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub organization_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: String,
}

impl NewClient {
    /// First whitespace-separated token is the first name, the rest is the last name.
    pub fn from_booking(full_name: &str, phone: &str, email: Option<&str>) -> Self {
        let mut parts = full_name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");

        Self {
            first_name,
            last_name,
            phone: phone.to_string(),
            email: email.map(|e| e.to_string()),
            notes: PUBLIC_BOOKING_NOTE.to_string(),
        }
    }
}
