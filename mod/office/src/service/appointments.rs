use praxis_core::now_rfc3339;
use praxis_sql::{Row, SqlExecutor, Value};

use crate::model::{
    Appointment, AppointmentStats, CreateAppointment, UpdateAppointment, APPOINTMENT_STATUSES,
};
use crate::service::{OfficeError, OfficeService};

const APPOINTMENT_SELECT: &str =
    "SELECT a.id, a.kind, a.status, a.scheduled_at, a.client_id, c.name AS client_name, \
     a.lawyer_id, u.name AS lawyer_name, a.notes, a.created_by, a.created_at, a.updated_at \
     FROM appointments a \
     JOIN clients c ON c.id = a.client_id \
     LEFT JOIN users u ON u.id = a.lawyer_id";

fn appointment_from_row(row: &Row) -> Result<Appointment, OfficeError> {
    Ok(Appointment {
        id: row
            .get_i64("id")
            .ok_or_else(|| OfficeError::Internal("missing id column".into()))?,
        kind: row.get_string("kind").unwrap_or_default(),
        status: row.get_string("status").unwrap_or_default(),
        scheduled_at: row.get_string("scheduled_at").unwrap_or_default(),
        client_id: row.get_i64("client_id").unwrap_or_default(),
        client_name: row.get_string("client_name"),
        lawyer_id: row.get_i64("lawyer_id"),
        lawyer_name: row.get_string("lawyer_name"),
        notes: row.get_string("notes"),
        created_by: row.get_i64("created_by"),
        created_at: row.get_string("created_at").unwrap_or_default(),
        updated_at: row.get_string("updated_at").unwrap_or_default(),
    })
}

fn validate_status(status: &str) -> Result<(), OfficeError> {
    if APPOINTMENT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(OfficeError::Validation(format!(
            "invalid appointment status '{}'",
            status
        )))
    }
}

/// Filters for the appointment list endpoint.
#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl OfficeService {
    pub(crate) fn ensure_client_exists(&self, client_id: i64) -> Result<(), OfficeError> {
        let rows = self.sql.query(
            "SELECT id FROM clients WHERE id = ?1",
            &[Value::from(client_id)],
        )?;
        if rows.is_empty() {
            return Err(OfficeError::NotFound(format!(
                "client {} not found",
                client_id
            )));
        }
        Ok(())
    }

    /// Lawyer assignments must point at an active lawyer or admin user.
    pub(crate) fn ensure_lawyer_exists(&self, lawyer_id: i64) -> Result<(), OfficeError> {
        let rows = self.sql.query(
            "SELECT id FROM users WHERE id = ?1 AND active = 1 \
             AND role IN ('lawyer', 'admin')",
            &[Value::from(lawyer_id)],
        )?;
        if rows.is_empty() {
            return Err(OfficeError::NotFound(format!(
                "lawyer {} not found",
                lawyer_id
            )));
        }
        Ok(())
    }

    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<(Vec<Appointment>, usize), OfficeError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(format!("%{}%", search)));
            let n = params.len();
            where_sql.push_str(&format!(" AND (c.name LIKE ?{n} OR a.kind LIKE ?{n})"));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(status));
            where_sql.push_str(&format!(" AND a.status = ?{}", params.len()));
        }
        if let Some(from) = filter.from.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(from));
            where_sql.push_str(&format!(" AND a.scheduled_at >= ?{}", params.len()));
        }
        if let Some(to) = filter.to.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(to));
            where_sql.push_str(&format!(" AND a.scheduled_at <= ?{}", params.len()));
        }

        let total = {
            let rows = self.sql.query(
                &format!(
                    "SELECT COUNT(*) AS cnt FROM appointments a \
                     JOIN clients c ON c.id = a.client_id{where_sql}"
                ),
                &params,
            )?;
            rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize
        };

        let limit = filter.limit.clamp(1, 100);
        let offset = filter.page.saturating_sub(1) * limit;
        params.push(Value::from(limit as i64));
        let limit_idx = params.len();
        params.push(Value::from(offset as i64));
        let offset_idx = params.len();

        let rows = self.sql.query(
            &format!(
                "{APPOINTMENT_SELECT}{where_sql} \
                 ORDER BY a.scheduled_at DESC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
            ),
            &params,
        )?;

        let items = rows
            .iter()
            .map(appointment_from_row)
            .collect::<Result<_, _>>()?;
        Ok((items, total))
    }

    pub fn get_appointment(&self, id: i64) -> Result<Appointment, OfficeError> {
        let rows = self.sql.query(
            &format!("{APPOINTMENT_SELECT} WHERE a.id = ?1"),
            &[Value::from(id)],
        )?;
        rows.first()
            .map(appointment_from_row)
            .transpose()?
            .ok_or_else(|| OfficeError::NotFound(format!("appointment {} not found", id)))
    }

    pub fn create_appointment(
        &self,
        input: CreateAppointment,
        created_by: i64,
    ) -> Result<Appointment, OfficeError> {
        if input.kind.trim().is_empty() {
            return Err(OfficeError::Validation("kind is required".into()));
        }
        let status = input.status.unwrap_or_else(|| "scheduled".to_string());
        validate_status(&status)?;

        self.ensure_client_exists(input.client_id)?;
        if let Some(lawyer_id) = input.lawyer_id {
            self.ensure_lawyer_exists(lawyer_id)?;
        }

        let now = now_rfc3339();
        let id = self.sql.insert(
            "INSERT INTO appointments (kind, status, scheduled_at, client_id, lawyer_id, \
             notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            &[
                Value::from(input.kind.trim()),
                Value::from(status),
                Value::from(input.scheduled_at),
                Value::from(input.client_id),
                Value::from(input.lawyer_id),
                Value::from(input.notes),
                Value::from(created_by),
                Value::from(now.as_str()),
                Value::from(now.as_str()),
            ],
        )?;

        self.get_appointment(id)
    }

    pub fn update_appointment(
        &self,
        id: i64,
        input: UpdateAppointment,
    ) -> Result<Appointment, OfficeError> {
        self.get_appointment(id)?;

        if let Some(status) = input.status.as_deref() {
            validate_status(status)?;
        }
        if let Some(client_id) = input.client_id {
            self.ensure_client_exists(client_id)?;
        }
        if let Some(lawyer_id) = input.lawyer_id {
            self.ensure_lawyer_exists(lawyer_id)?;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        let text_fields: [(&str, Option<String>); 4] = [
            ("kind", input.kind),
            ("status", input.status),
            ("scheduled_at", input.scheduled_at),
            ("notes", input.notes),
        ];
        for (col, value) in text_fields {
            if let Some(v) = value {
                params.push(Value::from(v));
                sets.push(format!("{} = ?{}", col, params.len()));
            }
        }
        let id_fields: [(&str, Option<i64>); 2] =
            [("client_id", input.client_id), ("lawyer_id", input.lawyer_id)];
        for (col, value) in id_fields {
            if let Some(v) = value {
                params.push(Value::from(v));
                sets.push(format!("{} = ?{}", col, params.len()));
            }
        }

        if sets.is_empty() {
            return Err(OfficeError::Validation("no fields to update".into()));
        }

        params.push(Value::from(now_rfc3339()));
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(Value::from(id));

        let sql = format!(
            "UPDATE appointments SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );
        self.sql.exec(&sql, &params)?;

        self.get_appointment(id)
    }

    pub fn delete_appointment(&self, id: i64) -> Result<(), OfficeError> {
        let affected = self
            .sql
            .exec("DELETE FROM appointments WHERE id = ?1", &[Value::from(id)])?;
        if affected == 0 {
            return Err(OfficeError::NotFound(format!(
                "appointment {} not found",
                id
            )));
        }
        Ok(())
    }

    pub fn appointment_stats(&self) -> Result<AppointmentStats, OfficeError> {
        let count_status = |status: &str| {
            self.count(
                "SELECT COUNT(*) AS cnt FROM appointments WHERE status = ?1",
                &[Value::from(status)],
            )
        };
        Ok(AppointmentStats {
            total: self.count("SELECT COUNT(*) AS cnt FROM appointments", &[])?,
            scheduled: count_status("scheduled")?,
            in_progress: count_status("in_progress")?,
            done: count_status("done")?,
            cancelled: count_status("cancelled")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use auth::model::Role;

    use super::*;
    use crate::model::CreateClient;
    use crate::service::testutil::{seed_user, test_service};

    fn seed_client(svc: &OfficeService, uid: i64) -> i64 {
        svc.create_client(
            CreateClient {
                name: "Maria".into(),
                email: None,
                phone: None,
                document: None,
                person_type: None,
                address: None,
                profession: None,
                marital_status: None,
                birth_date: None,
                notes: None,
            },
            uid,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_joins_client_and_lawyer_names() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);
        let lawyer = seed_user(&svc, "lawyer@x.com", Role::Lawyer);
        let client_id = seed_client(&svc, staff);

        let appt = svc
            .create_appointment(
                CreateAppointment {
                    kind: "consultation".into(),
                    status: None,
                    scheduled_at: "2026-09-01T10:00:00+00:00".into(),
                    client_id,
                    lawyer_id: Some(lawyer),
                    notes: None,
                },
                staff,
            )
            .unwrap();

        assert_eq!(appt.status, "scheduled");
        assert_eq!(appt.client_name.as_deref(), Some("Maria"));
        assert_eq!(appt.lawyer_name.as_deref(), Some("Seed User"));
    }

    #[test]
    fn unknown_client_or_lawyer_is_404() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);

        let err = svc
            .create_appointment(
                CreateAppointment {
                    kind: "consultation".into(),
                    status: None,
                    scheduled_at: "2026-09-01T10:00:00+00:00".into(),
                    client_id: 999,
                    lawyer_id: None,
                    notes: None,
                },
                staff,
            )
            .unwrap_err();
        assert!(matches!(err, OfficeError::NotFound(_)));

        let client_id = seed_client(&svc, staff);
        // Office staff cannot be assigned as the lawyer.
        let err = svc
            .create_appointment(
                CreateAppointment {
                    kind: "consultation".into(),
                    status: None,
                    scheduled_at: "2026-09-01T10:00:00+00:00".into(),
                    client_id,
                    lawyer_id: Some(staff),
                    notes: None,
                },
                staff,
            )
            .unwrap_err();
        assert!(matches!(err, OfficeError::NotFound(_)));
    }

    #[test]
    fn list_filters_by_status_and_date_window() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);
        let client_id = seed_client(&svc, staff);

        for (when, status) in [
            ("2026-09-01T10:00:00+00:00", None),
            ("2026-09-02T10:00:00+00:00", Some("done".to_string())),
            ("2026-10-01T10:00:00+00:00", None),
        ] {
            svc.create_appointment(
                CreateAppointment {
                    kind: "consultation".into(),
                    status,
                    scheduled_at: when.into(),
                    client_id,
                    lawyer_id: None,
                    notes: None,
                },
                staff,
            )
            .unwrap();
        }

        let (items, total) = svc
            .list_appointments(&AppointmentFilter {
                status: Some("done".into()),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].status, "done");

        let (_, total) = svc
            .list_appointments(&AppointmentFilter {
                from: Some("2026-09-01T00:00:00+00:00".into()),
                to: Some("2026-09-30T23:59:59+00:00".into()),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn stats_by_status() {
        let svc = test_service();
        let staff = seed_user(&svc, "staff@x.com", Role::Office);
        let client_id = seed_client(&svc, staff);

        let appt = svc
            .create_appointment(
                CreateAppointment {
                    kind: "consultation".into(),
                    status: None,
                    scheduled_at: "2026-09-01T10:00:00+00:00".into(),
                    client_id,
                    lawyer_id: None,
                    notes: None,
                },
                staff,
            )
            .unwrap();
        svc.update_appointment(
            appt.id,
            UpdateAppointment {
                status: Some("cancelled".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let stats = svc.appointment_stats().unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.scheduled, 0);
    }
}
