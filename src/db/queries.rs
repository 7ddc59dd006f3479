use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::models::{
    BookingSettings, Client, NewClient, NewVisit, Organization, Reservation, Service, Visit,
    VisitStatus,
};

pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(dt: &NaiveDateTime) -> String {
    dt.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid timestamp {s:?}: {e}"))
}

// ── Organizations ──

pub fn save_organization(conn: &Connection, org: &Organization) -> anyhow::Result<()> {
    let settings_json = serde_json::to_string(&org.booking_settings)?;

    conn.execute(
        "INSERT INTO organizations (id, slug, display_name, booking_settings, telegram_chat_id, utc_offset_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(slug) DO UPDATE SET
           display_name = excluded.display_name,
           booking_settings = excluded.booking_settings,
           telegram_chat_id = excluded.telegram_chat_id,
           utc_offset_minutes = excluded.utc_offset_minutes,
           updated_at = datetime('now')",
        params![
            org.id,
            org.slug,
            org.display_name,
            settings_json,
            org.telegram_chat_id,
            org.utc_offset_minutes,
        ],
    )?;
    Ok(())
}

pub fn get_organization_by_slug(
    conn: &Connection,
    slug: &str,
) -> anyhow::Result<Option<Organization>> {
    let row = conn
        .query_row(
            "SELECT id, slug, display_name, booking_settings, telegram_chat_id, utc_offset_minutes
             FROM organizations WHERE slug = ?1",
            params![slug],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i32>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((id, slug, display_name, settings_json, telegram_chat_id, utc_offset_minutes)) = row
    else {
        return Ok(None);
    };

    let booking_settings = match BookingSettings::from_json(&settings_json) {
        Ok(s) => s,
        Err(e) => {
            // Unreadable settings must not open public booking.
            tracing::warn!(slug = %slug, error = %e, "invalid booking settings, treating as disabled");
            BookingSettings::default()
        }
    };

    Ok(Some(Organization {
        id,
        slug,
        display_name,
        booking_settings,
        telegram_chat_id,
        utc_offset_minutes,
    }))
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, organization_id, name, duration_minutes, price)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id,
            service.organization_id,
            service.name,
            service.duration_minutes,
            service.price,
        ],
    )?;
    Ok(())
}

pub fn get_service(
    conn: &Connection,
    organization_id: &str,
    service_id: &str,
) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            "SELECT id, organization_id, name, duration_minutes, price
             FROM services WHERE organization_id = ?1 AND id = ?2",
            params![organization_id, service_id],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

pub fn list_services(conn: &Connection, organization_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, name, duration_minutes, price
         FROM services WHERE organization_id = ?1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![organization_id], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: row.get(4)?,
    })
}

// ── Clients ──

pub fn find_client_by_phone(
    conn: &Connection,
    organization_id: &str,
    phone: &str,
) -> anyhow::Result<Option<Client>> {
    let result = conn
        .query_row(
            "SELECT id, organization_id, first_name, last_name, phone, email, notes, created_at
             FROM clients WHERE organization_id = ?1 AND phone = ?2
             ORDER BY created_at ASC LIMIT 1",
            params![organization_id, phone],
            |row| Ok(parse_client_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn create_client(
    conn: &Connection,
    organization_id: &str,
    client: &NewClient,
) -> anyhow::Result<Client> {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = Utc::now().naive_utc();

    conn.execute(
        "INSERT INTO clients (id, organization_id, first_name, last_name, phone, email, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            organization_id,
            client.first_name,
            client.last_name,
            client.phone,
            client.email,
            client.notes,
            fmt_ts(&created_at),
        ],
    )?;

    Ok(Client {
        id,
        organization_id: organization_id.to_string(),
        first_name: client.first_name.clone(),
        last_name: client.last_name.clone(),
        phone: client.phone.clone(),
        email: client.email.clone(),
        notes: client.notes.clone(),
        created_at,
    })
}

pub fn list_clients(
    conn: &Connection,
    organization_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Client>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, first_name, last_name, phone, email, notes, created_at
         FROM clients WHERE organization_id = ?1 ORDER BY created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![organization_id, limit], |row| {
        Ok(parse_client_row(row))
    })?;

    let mut clients = vec![];
    for row in rows {
        clients.push(row??);
    }
    Ok(clients)
}

fn parse_client_row(row: &rusqlite::Row) -> anyhow::Result<Client> {
    let created_at: String = row.get(7)?;
    Ok(Client {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        notes: row.get(6)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Visits ──

const VISIT_COLUMNS: &str = "id, organization_id, client_id, service_name, scheduled_at, duration_minutes, price, status, notes, created_at, updated_at";

/// Non-cancelled visits whose `[scheduled_at, scheduled_at + duration)` intersects `[start, end)`.
pub fn find_overlapping_visits(
    conn: &Connection,
    organization_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Vec<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visits
         WHERE organization_id = ?1
           AND status IN ('scheduled', 'completed')
           AND scheduled_at < ?3
           AND datetime(scheduled_at, '+' || duration_minutes || ' minutes') > ?2
         ORDER BY scheduled_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![organization_id, fmt_ts(start), fmt_ts(end)], |row| {
        Ok(parse_visit_row(row))
    })?;

    let mut visits = vec![];
    for row in rows {
        visits.push(row??);
    }
    Ok(visits)
}

pub fn create_visit(conn: &Connection, visit: &NewVisit) -> anyhow::Result<Visit> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    conn.execute(
        "INSERT INTO visits (id, organization_id, client_id, service_name, scheduled_at, duration_minutes, price, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            id,
            visit.organization_id,
            visit.client_id,
            visit.service_name,
            fmt_ts(&visit.scheduled_at),
            visit.duration_minutes,
            visit.price,
            VisitStatus::Scheduled.as_str(),
            visit.notes,
            fmt_ts(&now),
        ],
    )?;

    Ok(Visit {
        id,
        organization_id: visit.organization_id.clone(),
        client_id: visit.client_id.clone(),
        service_name: visit.service_name.clone(),
        scheduled_at: visit.scheduled_at,
        duration_minutes: visit.duration_minutes,
        price: visit.price.clone(),
        status: VisitStatus::Scheduled,
        notes: visit.notes.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Overlap check and insert inside one immediate transaction, so a concurrent
/// writer cannot slip a visit in between.
pub fn create_visit_if_free(conn: &mut Connection, visit: &NewVisit) -> anyhow::Result<Reservation> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let conflicts = find_overlapping_visits(
        &tx,
        &visit.organization_id,
        &visit.scheduled_at,
        &visit.ends_at(),
    )?;
    if !conflicts.is_empty() {
        tx.rollback()?;
        return Ok(Reservation::Conflict(conflicts));
    }

    let created = create_visit(&tx, visit)?;
    tx.commit()?;
    Ok(Reservation::Created(created))
}

pub fn get_visit(conn: &Connection, id: &str) -> anyhow::Result<Option<Visit>> {
    let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_visit_row(row)))
        .optional()?;

    result.transpose()
}

pub fn list_visits(
    conn: &Connection,
    organization_id: &str,
    status_filter: Option<VisitStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Visit>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {VISIT_COLUMNS} FROM visits
                 WHERE organization_id = ?1 AND status = ?2
                 ORDER BY scheduled_at DESC LIMIT ?3"
            ),
            vec![
                Box::new(organization_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(status.as_str()),
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {VISIT_COLUMNS} FROM visits
                 WHERE organization_id = ?1
                 ORDER BY scheduled_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(organization_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_visit_row(row)))?;

    let mut visits = vec![];
    for row in rows {
        visits.push(row??);
    }
    Ok(visits)
}

pub fn update_visit_status(
    conn: &Connection,
    id: &str,
    status: VisitStatus,
) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE visits SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_visit_row(row: &rusqlite::Row) -> anyhow::Result<Visit> {
    let scheduled_at: String = row.get(4)?;
    let status: String = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Visit {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        client_id: row.get(2)?,
        service_name: row.get(3)?,
        scheduled_at: parse_ts(&scheduled_at)?,
        duration_minutes: row.get(5)?,
        price: row.get(6)?,
        status: VisitStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown visit status: {status}"))?,
        notes: row.get(8)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
