use praxis_core::now_rfc3339;
use praxis_sql::{Row, SqlExecutor, Value};

use crate::model::{CreateScheduleEntry, ScheduleEntry, SCHEDULE_KINDS, SCHEDULE_STATUSES};
use crate::service::{OfficeError, OfficeService};

const SCHEDULE_SELECT: &str =
    "SELECT s.id, s.title, s.description, s.starts_at, s.ends_at, s.kind, s.status, \
     s.client_id, c.name AS client_name, s.lawyer_id, u.name AS lawyer_name, \
     s.location, s.notes, s.created_by, s.created_at, s.updated_at \
     FROM schedule_entries s \
     LEFT JOIN clients c ON c.id = s.client_id \
     LEFT JOIN users u ON u.id = s.lawyer_id";

fn entry_from_row(row: &Row) -> Result<ScheduleEntry, OfficeError> {
    Ok(ScheduleEntry {
        id: row
            .get_i64("id")
            .ok_or_else(|| OfficeError::Internal("missing id column".into()))?,
        title: row.get_string("title").unwrap_or_default(),
        description: row.get_string("description"),
        starts_at: row.get_string("starts_at").unwrap_or_default(),
        ends_at: row.get_string("ends_at").unwrap_or_default(),
        kind: row.get_string("kind").unwrap_or_default(),
        status: row.get_string("status").unwrap_or_default(),
        client_id: row.get_i64("client_id"),
        client_name: row.get_string("client_name"),
        lawyer_id: row.get_i64("lawyer_id"),
        lawyer_name: row.get_string("lawyer_name"),
        location: row.get_string("location"),
        notes: row.get_string("notes"),
        created_by: row.get_i64("created_by"),
        created_at: row.get_string("created_at").unwrap_or_default(),
        updated_at: row.get_string("updated_at").unwrap_or_default(),
    })
}

fn validate_entry(input: &CreateScheduleEntry) -> Result<String, OfficeError> {
    if input.title.trim().is_empty() {
        return Err(OfficeError::Validation("title is required".into()));
    }
    if !SCHEDULE_KINDS.contains(&input.kind.as_str()) {
        return Err(OfficeError::Validation(format!(
            "invalid schedule kind '{}'",
            input.kind
        )));
    }
    let status = input
        .status
        .clone()
        .unwrap_or_else(|| "scheduled".to_string());
    if !SCHEDULE_STATUSES.contains(&status.as_str()) {
        return Err(OfficeError::Validation(format!(
            "invalid schedule status '{}'",
            status
        )));
    }
    if input.ends_at <= input.starts_at {
        return Err(OfficeError::Validation(
            "end time must be after start time".into(),
        ));
    }
    Ok(status)
}

/// Filters for the schedule list endpoint.
#[derive(Debug, Default)]
pub struct ScheduleFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub client_id: Option<i64>,
    pub lawyer_id: Option<i64>,
}

impl OfficeService {
    /// True when the lawyer already has a non-cancelled entry overlapping
    /// [starts_at, ends_at). `exclude` skips the entry being updated.
    fn has_conflict(
        &self,
        lawyer_id: i64,
        starts_at: &str,
        ends_at: &str,
        exclude: Option<i64>,
    ) -> Result<bool, OfficeError> {
        // Two intervals overlap iff each starts before the other ends.
        let mut sql = String::from(
            "SELECT id FROM schedule_entries \
             WHERE lawyer_id = ?1 AND status != 'cancelled' \
             AND starts_at < ?3 AND ends_at > ?2",
        );
        let mut params = vec![
            Value::from(lawyer_id),
            Value::from(starts_at),
            Value::from(ends_at),
        ];
        if let Some(id) = exclude {
            params.push(Value::from(id));
            sql.push_str(&format!(" AND id != ?{}", params.len()));
        }
        let rows = self.sql.query(&sql, &params)?;
        Ok(!rows.is_empty())
    }

    pub fn list_schedule(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<ScheduleEntry>, OfficeError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(from) = filter.from.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(from));
            where_sql.push_str(&format!(" AND s.starts_at >= ?{}", params.len()));
        }
        if let Some(to) = filter.to.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(to));
            where_sql.push_str(&format!(" AND s.starts_at <= ?{}", params.len()));
        }
        if let Some(kind) = filter.kind.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(kind));
            where_sql.push_str(&format!(" AND s.kind = ?{}", params.len()));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(status));
            where_sql.push_str(&format!(" AND s.status = ?{}", params.len()));
        }
        if let Some(client_id) = filter.client_id {
            params.push(Value::from(client_id));
            where_sql.push_str(&format!(" AND s.client_id = ?{}", params.len()));
        }
        if let Some(lawyer_id) = filter.lawyer_id {
            params.push(Value::from(lawyer_id));
            where_sql.push_str(&format!(" AND s.lawyer_id = ?{}", params.len()));
        }

        let rows = self.sql.query(
            &format!("{SCHEDULE_SELECT}{where_sql} ORDER BY s.starts_at ASC"),
            &params,
        )?;
        rows.iter().map(entry_from_row).collect()
    }

    pub fn get_schedule_entry(&self, id: i64) -> Result<ScheduleEntry, OfficeError> {
        let rows = self.sql.query(
            &format!("{SCHEDULE_SELECT} WHERE s.id = ?1"),
            &[Value::from(id)],
        )?;
        rows.first()
            .map(entry_from_row)
            .transpose()?
            .ok_or_else(|| OfficeError::NotFound(format!("schedule entry {} not found", id)))
    }

    pub fn create_schedule_entry(
        &self,
        input: CreateScheduleEntry,
        created_by: i64,
    ) -> Result<ScheduleEntry, OfficeError> {
        let status = validate_entry(&input)?;

        if let Some(lawyer_id) = input.lawyer_id {
            self.ensure_lawyer_exists(lawyer_id)?;
            if self.has_conflict(lawyer_id, &input.starts_at, &input.ends_at, None)? {
                return Err(OfficeError::Conflict(
                    "lawyer already has an entry in this time slot".into(),
                ));
            }
        }
        if let Some(client_id) = input.client_id {
            self.ensure_client_exists(client_id)?;
        }

        let now = now_rfc3339();
        let id = self.sql.insert(
            "INSERT INTO schedule_entries (title, description, starts_at, ends_at, kind, \
             status, client_id, lawyer_id, location, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            &[
                Value::from(input.title.trim()),
                Value::from(input.description),
                Value::from(input.starts_at),
                Value::from(input.ends_at),
                Value::from(input.kind),
                Value::from(status),
                Value::from(input.client_id),
                Value::from(input.lawyer_id),
                Value::from(input.location),
                Value::from(input.notes),
                Value::from(created_by),
                Value::from(now.as_str()),
                Value::from(now.as_str()),
            ],
        )?;

        self.get_schedule_entry(id)
    }

    /// Full replace, same validation as create.
    pub fn update_schedule_entry(
        &self,
        id: i64,
        input: CreateScheduleEntry,
    ) -> Result<ScheduleEntry, OfficeError> {
        self.get_schedule_entry(id)?;
        let status = validate_entry(&input)?;

        if let Some(lawyer_id) = input.lawyer_id {
            self.ensure_lawyer_exists(lawyer_id)?;
            if self.has_conflict(lawyer_id, &input.starts_at, &input.ends_at, Some(id))? {
                return Err(OfficeError::Conflict(
                    "lawyer already has an entry in this time slot".into(),
                ));
            }
        }
        if let Some(client_id) = input.client_id {
            self.ensure_client_exists(client_id)?;
        }

        self.sql.exec(
            "UPDATE schedule_entries SET title = ?1, description = ?2, starts_at = ?3, \
             ends_at = ?4, kind = ?5, status = ?6, client_id = ?7, lawyer_id = ?8, \
             location = ?9, notes = ?10, updated_at = ?11 WHERE id = ?12",
            &[
                Value::from(input.title.trim()),
                Value::from(input.description),
                Value::from(input.starts_at),
                Value::from(input.ends_at),
                Value::from(input.kind),
                Value::from(status),
                Value::from(input.client_id),
                Value::from(input.lawyer_id),
                Value::from(input.location),
                Value::from(input.notes),
                Value::from(now_rfc3339()),
                Value::from(id),
            ],
        )?;

        self.get_schedule_entry(id)
    }

    pub fn delete_schedule_entry(&self, id: i64) -> Result<(), OfficeError> {
        let affected = self.sql.exec(
            "DELETE FROM schedule_entries WHERE id = ?1",
            &[Value::from(id)],
        )?;
        if affected == 0 {
            return Err(OfficeError::NotFound(format!(
                "schedule entry {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Today's non-cancelled entries, in start order.
    pub fn schedule_today(&self) -> Result<Vec<ScheduleEntry>, OfficeError> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let rows = self.sql.query(
            &format!(
                "{SCHEDULE_SELECT} WHERE s.starts_at LIKE ?1 AND s.status != 'cancelled' \
                 ORDER BY s.starts_at ASC"
            ),
            &[Value::from(format!("{}%", today))],
        )?;
        rows.iter().map(entry_from_row).collect()
    }

    /// The next non-cancelled entries from now on.
    pub fn schedule_upcoming(&self, limit: u32) -> Result<Vec<ScheduleEntry>, OfficeError> {
        let now = now_rfc3339();
        let rows = self.sql.query(
            &format!(
                "{SCHEDULE_SELECT} WHERE s.starts_at >= ?1 AND s.status != 'cancelled' \
                 ORDER BY s.starts_at ASC LIMIT ?2"
            ),
            &[Value::from(now), Value::from(limit.min(50) as i64)],
        )?;
        rows.iter().map(entry_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use auth::model::Role;

    use super::*;
    use crate::service::testutil::{seed_user, test_service};

    fn entry(lawyer: Option<i64>, starts: &str, ends: &str) -> CreateScheduleEntry {
        CreateScheduleEntry {
            title: "Hearing prep".into(),
            description: None,
            starts_at: starts.into(),
            ends_at: ends.into(),
            kind: "meeting".into(),
            status: None,
            client_id: None,
            lawyer_id: lawyer,
            location: None,
            notes: None,
        }
    }

    #[test]
    fn rejects_inverted_interval_and_bad_kind() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);

        let err = svc
            .create_schedule_entry(
                entry(None, "2026-09-01T11:00:00+00:00", "2026-09-01T10:00:00+00:00"),
                staff,
            )
            .unwrap_err();
        assert!(matches!(err, OfficeError::Validation(_)));

        let mut bad_kind = entry(None, "2026-09-01T10:00:00+00:00", "2026-09-01T11:00:00+00:00");
        bad_kind.kind = "party".into();
        let err = svc.create_schedule_entry(bad_kind, staff).unwrap_err();
        assert!(matches!(err, OfficeError::Validation(_)));
    }

    #[test]
    fn detects_lawyer_time_conflicts() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);
        let lawyer = seed_user(&svc, "lawyer@x.com", Role::Lawyer);

        svc.create_schedule_entry(
            entry(
                Some(lawyer),
                "2026-09-01T10:00:00+00:00",
                "2026-09-01T11:00:00+00:00",
            ),
            staff,
        )
        .unwrap();

        // Overlapping slot for the same lawyer conflicts.
        let err = svc
            .create_schedule_entry(
                entry(
                    Some(lawyer),
                    "2026-09-01T10:30:00+00:00",
                    "2026-09-01T11:30:00+00:00",
                ),
                staff,
            )
            .unwrap_err();
        assert!(matches!(err, OfficeError::Conflict(_)));

        // Back-to-back is fine.
        svc.create_schedule_entry(
            entry(
                Some(lawyer),
                "2026-09-01T11:00:00+00:00",
                "2026-09-01T12:00:00+00:00",
            ),
            staff,
        )
        .unwrap();

        // No lawyer, no conflict to detect.
        svc.create_schedule_entry(
            entry(None, "2026-09-01T10:30:00+00:00", "2026-09-01T11:30:00+00:00"),
            staff,
        )
        .unwrap();
    }

    #[test]
    fn cancelled_entries_do_not_conflict() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);
        let lawyer = seed_user(&svc, "lawyer@x.com", Role::Lawyer);

        let first = svc
            .create_schedule_entry(
                entry(
                    Some(lawyer),
                    "2026-09-01T10:00:00+00:00",
                    "2026-09-01T11:00:00+00:00",
                ),
                staff,
            )
            .unwrap();

        let mut cancelled = entry(
            Some(lawyer),
            "2026-09-01T10:00:00+00:00",
            "2026-09-01T11:00:00+00:00",
        );
        cancelled.status = Some("cancelled".into());
        cancelled.title = first.title.clone();
        // Replacing the first entry with a cancelled copy frees the slot.
        svc.update_schedule_entry(first.id, cancelled).unwrap();

        svc.create_schedule_entry(
            entry(
                Some(lawyer),
                "2026-09-01T10:00:00+00:00",
                "2026-09-01T11:00:00+00:00",
            ),
            staff,
        )
        .unwrap();
    }

    #[test]
    fn upcoming_skips_past_and_cancelled() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);

        svc.create_schedule_entry(
            entry(None, "2000-01-01T10:00:00+00:00", "2000-01-01T11:00:00+00:00"),
            staff,
        )
        .unwrap();
        svc.create_schedule_entry(
            entry(None, "2099-01-01T10:00:00+00:00", "2099-01-01T11:00:00+00:00"),
            staff,
        )
        .unwrap();
        let mut cancelled = entry(None, "2099-02-01T10:00:00+00:00", "2099-02-01T11:00:00+00:00");
        cancelled.status = Some("cancelled".into());
        svc.create_schedule_entry(cancelled, staff).unwrap();

        let upcoming = svc.schedule_upcoming(10).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert!(upcoming[0].starts_at.starts_with("2099-01-01"));
    }
}
