use praxis_core::{new_id, now_rfc3339};
use praxis_sql::{Row, SqlExecutor, SqlStore, Value};

use crate::model::{CreateLawyer, Lawyer, UpdateLawyer};
use crate::service::{OfficeError, OfficeService};

const LAWYER_SELECT: &str =
    "SELECT u.id AS user_id, u.name, u.email, u.active, u.created_at, \
     l.bar_number, l.phone, l.address, l.specialties \
     FROM users u JOIN lawyers l ON l.user_id = u.id";

fn lawyer_from_row(row: &Row) -> Result<Lawyer, OfficeError> {
    Ok(Lawyer {
        user_id: row
            .get_i64("user_id")
            .ok_or_else(|| OfficeError::Internal("missing user_id column".into()))?,
        name: row.get_string("name").unwrap_or_default(),
        email: row.get_string("email").unwrap_or_default(),
        bar_number: row.get_string("bar_number").unwrap_or_default(),
        phone: row.get_string("phone"),
        address: row.get_string("address"),
        specialties: row.get_string("specialties"),
        active: row.get_bool("active").unwrap_or(false),
        created_at: row.get_string("created_at").unwrap_or_default(),
    })
}

impl OfficeService {
    pub fn list_lawyers(&self) -> Result<Vec<Lawyer>, OfficeError> {
        let rows = self.sql.query(
            &format!("{LAWYER_SELECT} WHERE u.role = 'lawyer' ORDER BY u.created_at DESC"),
            &[],
        )?;
        rows.iter().map(lawyer_from_row).collect()
    }

    pub fn get_lawyer(&self, user_id: i64) -> Result<Lawyer, OfficeError> {
        let rows = self.sql.query(
            &format!("{LAWYER_SELECT} WHERE u.id = ?1"),
            &[Value::from(user_id)],
        )?;
        rows.first()
            .map(lawyer_from_row)
            .transpose()?
            .ok_or_else(|| OfficeError::NotFound(format!("lawyer {} not found", user_id)))
    }

    /// Create the user account and the lawyer record in one transaction,
    /// with a generated temporary password the lawyer must change.
    pub fn create_lawyer(
        &self,
        input: CreateLawyer,
    ) -> Result<(Lawyer, String), OfficeError> {
        if input.bar_number.trim().len() < 3 {
            return Err(OfficeError::Validation(
                "bar number must be at least 3 characters".into(),
            ));
        }

        let temp_password = format!("tmp-{}", &new_id()[..12]);
        let password_hash = self.auth.hash_password(&temp_password)?;

        let email = input.email.trim().to_lowercase();
        let name = input.name.trim().to_string();
        if name.len() < 2 {
            return Err(OfficeError::Validation(
                "name must be at least 2 characters".into(),
            ));
        }

        let taken = self.sql.query(
            "SELECT id FROM users WHERE email = ?1",
            &[Value::from(email.as_str())],
        )?;
        if !taken.is_empty() {
            return Err(OfficeError::Conflict("email already registered".into()));
        }

        let now = now_rfc3339();
        let mut user_id: i64 = 0;
        self.sql.transact(&mut |tx: &dyn SqlExecutor| {
            user_id = tx.insert(
                "INSERT INTO users (email, name, password_hash, role, active, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, 'lawyer', 1, ?4, ?5)",
                &[
                    Value::from(email.as_str()),
                    Value::from(name.as_str()),
                    Value::from(password_hash.as_str()),
                    Value::from(now.as_str()),
                    Value::from(now.as_str()),
                ],
            )?;
            tx.exec(
                "INSERT INTO lawyers (user_id, bar_number, phone, address, specialties, \
                 created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    Value::from(user_id),
                    Value::from(input.bar_number.trim()),
                    Value::from(input.phone.clone()),
                    Value::from(input.address.clone()),
                    Value::from(input.specialties.clone()),
                    Value::from(now.as_str()),
                    Value::from(now.as_str()),
                ],
            )?;
            Ok(())
        })?;

        tracing::info!("created lawyer account {} (user {})", email, user_id);
        Ok((self.get_lawyer(user_id)?, temp_password))
    }

    pub fn update_lawyer(
        &self,
        user_id: i64,
        input: UpdateLawyer,
    ) -> Result<Lawyer, OfficeError> {
        self.get_lawyer(user_id)?;

        // Account fields go through the auth service (uniqueness checks
        // live there); professional fields are ours.
        if input.name.is_some() || input.email.is_some() {
            self.auth.update_profile(
                user_id,
                auth::model::UpdateProfileRequest {
                    name: input.name.clone(),
                    email: input.email.clone(),
                },
            )?;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        let fields: [(&str, Option<String>); 4] = [
            ("bar_number", input.bar_number),
            ("phone", input.phone),
            ("address", input.address),
            ("specialties", input.specialties),
        ];
        for (col, value) in fields {
            if let Some(v) = value {
                params.push(Value::from(v));
                sets.push(format!("{} = ?{}", col, params.len()));
            }
        }

        if !sets.is_empty() {
            params.push(Value::from(now_rfc3339()));
            sets.push(format!("updated_at = ?{}", params.len()));
            params.push(Value::from(user_id));
            let sql = format!(
                "UPDATE lawyers SET {} WHERE user_id = ?{}",
                sets.join(", "),
                params.len()
            );
            self.sql.exec(&sql, &params)?;
        }

        self.get_lawyer(user_id)
    }

    /// Soft delete: deactivate the user account; the lawyer record and
    /// history stay.
    pub fn deactivate_lawyer(&self, user_id: i64) -> Result<(), OfficeError> {
        self.get_lawyer(user_id)?;
        self.auth.deactivate_user(user_id, None, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::test_service;

    fn sample_lawyer(email: &str) -> CreateLawyer {
        CreateLawyer {
            name: "Ada Counsel".into(),
            email: email.into(),
            bar_number: "BAR-12345".into(),
            phone: Some("555-0100".into()),
            address: None,
            specialties: Some("tax, labor".into()),
        }
    }

    #[test]
    fn create_makes_user_and_record() {
        let svc = test_service();
        let (lawyer, temp_password) = svc.create_lawyer(sample_lawyer("ada@x.com")).unwrap();

        assert_eq!(lawyer.email, "ada@x.com");
        assert_eq!(lawyer.bar_number, "BAR-12345");
        assert!(lawyer.active);
        assert!(temp_password.starts_with("tmp-"));

        // The new account can log in with the temporary password.
        let (_token, user) = svc
            .auth
            .login(
                auth::model::LoginRequest {
                    email: "ada@x.com".into(),
                    password: temp_password,
                },
                None,
                None,
            )
            .unwrap();
        assert_eq!(user.id, lawyer.user_id);
        assert_eq!(user.role, auth::model::Role::Lawyer);

        assert_eq!(svc.list_lawyers().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let svc = test_service();
        svc.create_lawyer(sample_lawyer("ada@x.com")).unwrap();
        let err = svc.create_lawyer(sample_lawyer("ada@x.com")).unwrap_err();
        assert!(matches!(err, OfficeError::Conflict(_)));
    }

    #[test]
    fn update_touches_both_tables() {
        let svc = test_service();
        let (lawyer, _) = svc.create_lawyer(sample_lawyer("ada@x.com")).unwrap();

        let updated = svc
            .update_lawyer(
                lawyer.user_id,
                UpdateLawyer {
                    name: Some("Ada Q. Counsel".into()),
                    bar_number: Some("BAR-99999".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Ada Q. Counsel");
        assert_eq!(updated.bar_number, "BAR-99999");
    }

    #[test]
    fn deactivate_is_soft() {
        let svc = test_service();
        let (lawyer, _) = svc.create_lawyer(sample_lawyer("ada@x.com")).unwrap();

        svc.deactivate_lawyer(lawyer.user_id).unwrap();
        let after = svc.get_lawyer(lawyer.user_id).unwrap();
        assert!(!after.active);
    }
}
