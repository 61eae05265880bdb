use praxis_core::{new_id, now_rfc3339};
use praxis_sql::{Row, SqlExecutor, SqlStore, Value};

use crate::model::{Client, CreateLead, Lead, LeadStats, UpdateLead, LEAD_STATUSES};
use crate::service::{OfficeError, OfficeService};

const LEAD_COLUMNS: &str = "id, name, phone, email, subject, platform, source, status, \
                            description, notes, entered_at, created_by, created_at, updated_at";

fn lead_from_row(row: &Row) -> Result<Lead, OfficeError> {
    Ok(Lead {
        id: row
            .get_string("id")
            .ok_or_else(|| OfficeError::Internal("missing id column".into()))?,
        name: row.get_string("name").unwrap_or_default(),
        phone: row.get_string("phone"),
        email: row.get_string("email"),
        subject: row.get_string("subject"),
        platform: row.get_string("platform"),
        source: row.get_string("source"),
        status: row.get_string("status").unwrap_or_default(),
        description: row.get_string("description"),
        notes: row.get_string("notes"),
        entered_at: row.get_string("entered_at").unwrap_or_default(),
        created_by: row.get_i64("created_by"),
        created_at: row.get_string("created_at").unwrap_or_default(),
        updated_at: row.get_string("updated_at").unwrap_or_default(),
    })
}

fn validate_status(status: &str) -> Result<(), OfficeError> {
    if LEAD_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(OfficeError::Validation(format!(
            "invalid lead status '{}'",
            status
        )))
    }
}

/// Filters for the lead list endpoint.
#[derive(Debug, Default)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl OfficeService {
    pub fn list_leads(&self, filter: &LeadFilter) -> Result<(Vec<Lead>, usize), OfficeError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(format!("%{}%", search)));
            let n = params.len();
            where_sql.push_str(&format!(
                " AND (name LIKE ?{n} OR email LIKE ?{n} OR phone LIKE ?{n} OR subject LIKE ?{n})"
            ));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(status));
            where_sql.push_str(&format!(" AND status = ?{}", params.len()));
        }
        if let Some(platform) = filter.platform.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::from(platform));
            where_sql.push_str(&format!(" AND platform = ?{}", params.len()));
        }

        let total = {
            let rows = self.sql.query(
                &format!("SELECT COUNT(*) AS cnt FROM leads{where_sql}"),
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
                "SELECT {LEAD_COLUMNS} FROM leads{where_sql} \
                 ORDER BY entered_at DESC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
            ),
            &params,
        )?;

        let items = rows.iter().map(lead_from_row).collect::<Result<_, _>>()?;
        Ok((items, total))
    }

    pub fn get_lead(&self, id: &str) -> Result<Lead, OfficeError> {
        let rows = self.sql.query(
            &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
            &[Value::from(id)],
        )?;
        rows.first()
            .map(lead_from_row)
            .transpose()?
            .ok_or_else(|| OfficeError::NotFound(format!("lead {} not found", id)))
    }

    pub fn create_lead(&self, input: CreateLead, created_by: i64) -> Result<Lead, OfficeError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(OfficeError::Validation("name is required".into()));
        }
        let status = input.status.unwrap_or_else(|| "new".to_string());
        validate_status(&status)?;

        let id = new_id();
        let now = now_rfc3339();
        self.sql.exec(
            "INSERT INTO leads (id, name, phone, email, subject, platform, source, status, \
             description, notes, entered_at, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            &[
                Value::from(id.as_str()),
                Value::from(name),
                Value::from(input.phone),
                Value::from(input.email),
                Value::from(input.subject),
                Value::from(input.platform),
                Value::from(input.source),
                Value::from(status),
                Value::from(input.description),
                Value::from(input.notes),
                Value::from(now.as_str()),
                Value::from(created_by),
                Value::from(now.as_str()),
                Value::from(now.as_str()),
            ],
        )?;

        self.get_lead(&id)
    }

    pub fn update_lead(&self, id: &str, input: UpdateLead) -> Result<Lead, OfficeError> {
        self.get_lead(id)?;

        if let Some(status) = input.status.as_deref() {
            validate_status(status)?;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        let fields: [(&str, Option<String>); 9] = [
            ("name", input.name),
            ("phone", input.phone),
            ("email", input.email),
            ("subject", input.subject),
            ("platform", input.platform),
            ("source", input.source),
            ("status", input.status),
            ("description", input.description),
            ("notes", input.notes),
        ];
        for (col, value) in fields {
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
            "UPDATE leads SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );
        self.sql.exec(&sql, &params)?;

        self.get_lead(id)
    }

    /// Convert a lead into a client. The client insert and the lead
    /// status flip happen in one transaction — a failure of either
    /// leaves both tables untouched.
    pub fn convert_lead(&self, id: &str, converted_by: i64) -> Result<Client, OfficeError> {
        let lead = self.get_lead(id)?;
        if lead.status == "converted" {
            return Err(OfficeError::Conflict("lead is already converted".into()));
        }

        let now = now_rfc3339();
        let mut client_id: i64 = 0;
        self.sql.transact(&mut |tx: &dyn SqlExecutor| {
            client_id = tx.insert(
                "INSERT INTO clients (name, phone, email, notes, created_by, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    Value::from(lead.name.as_str()),
                    Value::from(lead.phone.clone()),
                    Value::from(lead.email.clone()),
                    Value::from(lead.notes.clone()),
                    Value::from(converted_by),
                    Value::from(now.as_str()),
                    Value::from(now.as_str()),
                ],
            )?;
            tx.exec(
                "UPDATE leads SET status = 'converted', updated_at = ?1 WHERE id = ?2",
                &[Value::from(now.as_str()), Value::from(id)],
            )?;
            Ok(())
        })?;

        tracing::info!("converted lead {} into client {}", id, client_id);
        self.get_client(client_id)
    }

    pub fn delete_lead(&self, id: &str) -> Result<(), OfficeError> {
        let affected = self
            .sql
            .exec("DELETE FROM leads WHERE id = ?1", &[Value::from(id)])?;
        if affected == 0 {
            return Err(OfficeError::NotFound(format!("lead {} not found", id)));
        }
        Ok(())
    }

    pub fn lead_stats(&self) -> Result<LeadStats, OfficeError> {
        let count_status = |status: &str| {
            self.count(
                "SELECT COUNT(*) AS cnt FROM leads WHERE status = ?1",
                &[Value::from(status)],
            )
        };
        Ok(LeadStats {
            total: self.count("SELECT COUNT(*) AS cnt FROM leads", &[])?,
            new: count_status("new")?,
            in_progress: count_status("in_progress")?,
            converted: count_status("converted")?,
            discarded: count_status("discarded")?,
        })
    }

    /// Status counts in funnel order, for the CRM funnel widget.
    pub fn lead_funnel(&self) -> Result<Vec<(String, i64)>, OfficeError> {
        let rows = self.sql.query(
            "SELECT status, COUNT(*) AS cnt FROM leads GROUP BY status",
            &[],
        )?;
        let mut counts = std::collections::HashMap::new();
        for row in &rows {
            if let (Some(status), Some(cnt)) = (row.get_string("status"), row.get_i64("cnt")) {
                counts.insert(status, cnt);
            }
        }
        Ok(LEAD_STATUSES
            .iter()
            .map(|s| (s.to_string(), counts.get(*s).copied().unwrap_or(0)))
            .collect())
    }
}
