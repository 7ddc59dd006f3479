use crate::models::Visit;

pub fn generate_ics(visit: &Visit, organization_name: &str) -> String {
    let dtstart = visit.scheduled_at.format("%Y%m%dT%H%M%S").to_string();
    let dtend = visit.ends_at().format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = visit.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@slotbook", visit.id);

    let summary = escape_text(&format!("{} at {}", visit.service_name, organization_name));
    let description = if visit.notes.is_empty() {
        "No additional notes".to_string()
    } else {
        escape_text(&visit.notes)
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Slotbook//Booking Engine//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        status = ics_status(visit),
    )
}

/// RFC 5545 TEXT escaping. Line breaks become a literal `\n` so user input
/// can never start a new property.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn ics_status(visit: &Visit) -> &'static str {
    if visit.status.occupies_slot() {
        "CONFIRMED"
    } else {
        "CANCELLED"
    }
}
