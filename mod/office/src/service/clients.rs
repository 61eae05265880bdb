use praxis_core::now_rfc3339;
use praxis_sql::{Row, SqlExecutor, Value};

use crate::model::{Client, ClientStats, ClientSummary, CreateClient, UpdateClient};
use crate::service::{OfficeError, OfficeService};

const CLIENT_COLUMNS: &str = "id, name, email, phone, document, person_type, address, \
                              profession, marital_status, birth_date, notes, created_by, \
                              created_at, updated_at";

fn client_from_row(row: &Row) -> Result<Client, OfficeError> {
    Ok(Client {
        id: row
            .get_i64("id")
            .ok_or_else(|| OfficeError::Internal("missing id column".into()))?,
        name: row.get_string("name").unwrap_or_default(),
        email: row.get_string("email"),
        phone: row.get_string("phone"),
        document: row.get_string("document"),
        person_type: row.get_string("person_type"),
        address: row.get_string("address"),
        profession: row.get_string("profession"),
        marital_status: row.get_string("marital_status"),
        birth_date: row.get_string("birth_date"),
        notes: row.get_string("notes"),
        created_by: row.get_i64("created_by"),
        created_at: row.get_string("created_at").unwrap_or_default(),
        updated_at: row.get_string("updated_at").unwrap_or_default(),
    })
}

/// Filters for the client list endpoint.
#[derive(Debug, Default)]
pub struct ClientFilter {
    pub search: Option<String>,
    pub person_type: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl OfficeService {
    /// List clients with appointment aggregates, filtered and paginated.
    pub fn list_clients(
        &self,
        filter: &ClientFilter,
    ) -> Result<(Vec<ClientSummary>, usize), OfficeError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            params.push(Value::from(pattern));
            let n = params.len();
            where_sql.push_str(&format!(
                " AND (c.name LIKE ?{n} OR c.email LIKE ?{n} OR c.phone LIKE ?{n} \
                 OR c.document LIKE ?{n})"
            ));
        }
        if let Some(pt) = filter
            .person_type
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
        {
            params.push(Value::from(pt));
            where_sql.push_str(&format!(" AND c.person_type = ?{}", params.len()));
        }

        let total = {
            let rows = self.sql.query(
                &format!("SELECT COUNT(*) AS cnt FROM clients c{where_sql}"),
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

        // The join needs the column list qualified with the `c.` alias.
        let prefixed = CLIENT_COLUMNS
            .split(", ")
            .map(|col| format!("c.{}", col))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "SELECT {prefixed}, COUNT(a.id) AS total_appointments, \
             MAX(a.scheduled_at) AS last_appointment \
             FROM clients c LEFT JOIN appointments a ON a.client_id = c.id\
             {where_sql} GROUP BY c.id ORDER BY c.name ASC \
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );

        let rows = self.sql.query(&sql, &params)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(ClientSummary {
                client: client_from_row(row)?,
                total_appointments: row.get_i64("total_appointments").unwrap_or(0),
                last_appointment: row.get_string("last_appointment"),
            });
        }

        Ok((items, total))
    }

    pub fn get_client(&self, id: i64) -> Result<Client, OfficeError> {
        let rows = self.sql.query(
            &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
            &[Value::from(id)],
        )?;
        rows.first()
            .map(client_from_row)
            .transpose()?
            .ok_or_else(|| OfficeError::NotFound(format!("client {} not found", id)))
    }

    /// Create a client. Email and phone must be unused.
    pub fn create_client(
        &self,
        input: CreateClient,
        created_by: i64,
    ) -> Result<Client, OfficeError> {
        let name = input.name.trim().to_string();
        if name.len() < 2 {
            return Err(OfficeError::Validation(
                "name must be at least 2 characters".into(),
            ));
        }

        if let Some(email) = input.email.as_deref().filter(|s| !s.is_empty()) {
            let taken = self.sql.query(
                "SELECT id FROM clients WHERE email = ?1",
                &[Value::from(email)],
            )?;
            if !taken.is_empty() {
                return Err(OfficeError::Conflict("email already in use".into()));
            }
        }
        if let Some(phone) = input.phone.as_deref().filter(|s| !s.is_empty()) {
            let taken = self.sql.query(
                "SELECT id FROM clients WHERE phone = ?1",
                &[Value::from(phone)],
            )?;
            if !taken.is_empty() {
                return Err(OfficeError::Conflict("phone already in use".into()));
            }
        }

        let now = now_rfc3339();
        let id = self.sql.insert(
            "INSERT INTO clients (name, email, phone, document, person_type, address, \
             profession, marital_status, birth_date, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            &[
                Value::from(name),
                Value::from(input.email),
                Value::from(input.phone),
                Value::from(input.document),
                Value::from(input.person_type),
                Value::from(input.address),
                Value::from(input.profession),
                Value::from(input.marital_status),
                Value::from(input.birth_date),
                Value::from(input.notes),
                Value::from(created_by),
                Value::from(now.as_str()),
                Value::from(now.as_str()),
            ],
        )?;

        self.get_client(id)
    }

    /// Partial update; unset fields are untouched.
    pub fn update_client(&self, id: i64, input: UpdateClient) -> Result<Client, OfficeError> {
        // Existence first, for a clean 404.
        self.get_client(id)?;

        if let Some(email) = input.email.as_deref().filter(|s| !s.is_empty()) {
            let taken = self.sql.query(
                "SELECT id FROM clients WHERE email = ?1 AND id != ?2",
                &[Value::from(email), Value::from(id)],
            )?;
            if !taken.is_empty() {
                return Err(OfficeError::Conflict("email already in use".into()));
            }
        }
        if let Some(phone) = input.phone.as_deref().filter(|s| !s.is_empty()) {
            let taken = self.sql.query(
                "SELECT id FROM clients WHERE phone = ?1 AND id != ?2",
                &[Value::from(phone), Value::from(id)],
            )?;
            if !taken.is_empty() {
                return Err(OfficeError::Conflict("phone already in use".into()));
            }
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        let fields: [(&str, Option<String>); 10] = [
            ("name", input.name),
            ("email", input.email),
            ("phone", input.phone),
            ("document", input.document),
            ("person_type", input.person_type),
            ("address", input.address),
            ("profession", input.profession),
            ("marital_status", input.marital_status),
            ("birth_date", input.birth_date),
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
            "UPDATE clients SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );
        self.sql.exec(&sql, &params)?;

        self.get_client(id)
    }

    /// Delete a client. Refused while appointments still reference it.
    pub fn delete_client(&self, id: i64) -> Result<(), OfficeError> {
        let appointments = self.count(
            "SELECT COUNT(*) AS cnt FROM appointments WHERE client_id = ?1",
            &[Value::from(id)],
        )?;
        if appointments > 0 {
            return Err(OfficeError::Validation(format!(
                "client has {} appointment(s); remove them first",
                appointments
            )));
        }

        let affected = self
            .sql
            .exec("DELETE FROM clients WHERE id = ?1", &[Value::from(id)])?;
        if affected == 0 {
            return Err(OfficeError::NotFound(format!("client {} not found", id)));
        }
        Ok(())
    }

    /// Name/phone/email prefix search for form autocompletion.
    pub fn autocomplete_clients(&self, term: &str) -> Result<Vec<Client>, OfficeError> {
        let pattern = format!("%{}%", term);
        let rows = self.sql.query(
            &format!(
                "SELECT {CLIENT_COLUMNS} FROM clients \
                 WHERE name LIKE ?1 OR phone LIKE ?1 OR email LIKE ?1 \
                 ORDER BY name ASC LIMIT 10"
            ),
            &[Value::from(pattern)],
        )?;
        rows.iter().map(client_from_row).collect()
    }

    pub fn client_stats(&self) -> Result<ClientStats, OfficeError> {
        let month_start = chrono::Utc::now().format("%Y-%m").to_string();
        Ok(ClientStats {
            total: self.count("SELECT COUNT(*) AS cnt FROM clients", &[])?,
            individuals: self.count(
                "SELECT COUNT(*) AS cnt FROM clients WHERE person_type = 'individual'",
                &[],
            )?,
            companies: self.count(
                "SELECT COUNT(*) AS cnt FROM clients WHERE person_type = 'company'",
                &[],
            )?,
            new_this_month: self.count(
                "SELECT COUNT(*) AS cnt FROM clients WHERE created_at LIKE ?1",
                &[Value::from(format!("{}%", month_start))],
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use auth::model::Role;

    use super::*;
    use crate::service::testutil::{seed_user, test_service};

    fn sample_client(name: &str, email: &str) -> CreateClient {
        CreateClient {
            name: name.into(),
            email: Some(email.into()),
            phone: None,
            document: None,
            person_type: Some("individual".into()),
            address: None,
            profession: None,
            marital_status: None,
            birth_date: None,
            notes: None,
        }
    }

    #[test]
    fn create_get_update_delete() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);

        let client = svc
            .create_client(sample_client("Maria Silva", "maria@x.com"), uid)
            .unwrap();
        assert_eq!(client.name, "Maria Silva");
        assert_eq!(client.created_by, Some(uid));

        let fetched = svc.get_client(client.id).unwrap();
        assert_eq!(fetched.email.as_deref(), Some("maria@x.com"));

        let updated = svc
            .update_client(
                client.id,
                UpdateClient {
                    profession: Some("engineer".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.profession.as_deref(), Some("engineer"));
        // Untouched fields survive a partial update.
        assert_eq!(updated.email.as_deref(), Some("maria@x.com"));

        svc.delete_client(client.id).unwrap();
        assert!(matches!(
            svc.get_client(client.id),
            Err(OfficeError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);
        svc.create_client(sample_client("A", "dup@x.com"), uid).unwrap();

        let err = svc
            .create_client(sample_client("B", "dup@x.com"), uid)
            .unwrap_err();
        assert!(matches!(err, OfficeError::Conflict(_)));
    }

    #[test]
    fn delete_refused_while_appointments_exist() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);
        let client = svc
            .create_client(sample_client("Maria", "m@x.com"), uid)
            .unwrap();

        svc.create_appointment(
            crate::model::CreateAppointment {
                kind: "consultation".into(),
                status: None,
                scheduled_at: "2026-09-01T10:00:00+00:00".into(),
                client_id: client.id,
                lawyer_id: None,
                notes: None,
            },
            uid,
        )
        .unwrap();

        let err = svc.delete_client(client.id).unwrap_err();
        assert!(matches!(err, OfficeError::Validation(_)));
    }

    #[test]
    fn list_filters_and_paginates() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);
        for i in 0..5 {
            svc.create_client(
                sample_client(&format!("Client {}", i), &format!("c{}@x.com", i)),
                uid,
            )
            .unwrap();
        }

        let (items, total) = svc
            .list_clients(&ClientFilter {
                search: None,
                person_type: None,
                page: 1,
                limit: 2,
            })
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].total_appointments, 0);

        let (items, total) = svc
            .list_clients(&ClientFilter {
                search: Some("Client 3".into()),
                person_type: None,
                page: 1,
                limit: 20,
            })
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].client.name, "Client 3");
    }

    #[test]
    fn autocomplete_matches_name_and_email() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);
        svc.create_client(sample_client("Maria Silva", "maria@x.com"), uid)
            .unwrap();
        svc.create_client(sample_client("Jose Santos", "jose@x.com"), uid)
            .unwrap();

        let hits = svc.autocomplete_clients("mari").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Maria Silva");
    }

    #[test]
    fn stats_count_by_person_type() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);
        svc.create_client(sample_client("A", "a@c.com"), uid).unwrap();
        let mut company = sample_client("B Corp", "b@c.com");
        company.person_type = Some("company".into());
        svc.create_client(company, uid).unwrap();

        let stats = svc.client_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.individuals, 1);
        assert_eq!(stats.companies, 1);
        assert_eq!(stats.new_this_month, 2);
    }
}
