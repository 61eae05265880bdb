use praxis_core::now_rfc3339;
use praxis_sql::{Row, SqlExecutor, Value};

use crate::model::{Settings, UpdateSettings};
use crate::service::{OfficeError, OfficeService};

fn settings_from_row(row: &Row, user_id: i64) -> Settings {
    let defaults = Settings::defaults_for(user_id);
    Settings {
        user_id,
        email_notifications: row
            .get_bool("email_notifications")
            .unwrap_or(defaults.email_notifications),
        whatsapp_notifications: row
            .get_bool("whatsapp_notifications")
            .unwrap_or(defaults.whatsapp_notifications),
        timezone: row.get_string("timezone").unwrap_or(defaults.timezone),
        theme: row.get_string("theme").unwrap_or(defaults.theme),
        locale: row.get_string("locale").unwrap_or(defaults.locale),
        updated_at: row.get_string("updated_at"),
    }
}

const THEMES: &[&str] = &["light", "dark", "system"];

impl OfficeService {
    /// The user's settings, or defaults when none were saved yet.
    pub fn get_settings(&self, user_id: i64) -> Result<Settings, OfficeError> {
        let rows = self.sql.query(
            "SELECT email_notifications, whatsapp_notifications, timezone, theme, locale, \
             updated_at FROM settings WHERE user_id = ?1",
            &[Value::from(user_id)],
        )?;
        Ok(rows
            .first()
            .map(|row| settings_from_row(row, user_id))
            .unwrap_or_else(|| Settings::defaults_for(user_id)))
    }

    /// Merge the provided fields into the stored settings (lazy upsert).
    pub fn update_settings(
        &self,
        user_id: i64,
        input: UpdateSettings,
    ) -> Result<Settings, OfficeError> {
        if let Some(theme) = input.theme.as_deref() {
            if !THEMES.contains(&theme) {
                return Err(OfficeError::Validation(format!(
                    "invalid theme '{}'",
                    theme
                )));
            }
        }

        let current = self.get_settings(user_id)?;
        let merged = Settings {
            user_id,
            email_notifications: input
                .email_notifications
                .unwrap_or(current.email_notifications),
            whatsapp_notifications: input
                .whatsapp_notifications
                .unwrap_or(current.whatsapp_notifications),
            timezone: input.timezone.unwrap_or(current.timezone),
            theme: input.theme.unwrap_or(current.theme),
            locale: input.locale.unwrap_or(current.locale),
            updated_at: Some(now_rfc3339()),
        };

        let exists = !self
            .sql
            .query(
                "SELECT user_id FROM settings WHERE user_id = ?1",
                &[Value::from(user_id)],
            )?
            .is_empty();

        let params = [
            Value::from(merged.email_notifications),
            Value::from(merged.whatsapp_notifications),
            Value::from(merged.timezone.as_str()),
            Value::from(merged.theme.as_str()),
            Value::from(merged.locale.as_str()),
            Value::from(merged.updated_at.clone()),
            Value::from(user_id),
        ];
        if exists {
            self.sql.exec(
                "UPDATE settings SET email_notifications = ?1, whatsapp_notifications = ?2, \
                 timezone = ?3, theme = ?4, locale = ?5, updated_at = ?6 WHERE user_id = ?7",
                &params,
            )?;
        } else {
            self.sql.exec(
                "INSERT INTO settings (email_notifications, whatsapp_notifications, timezone, \
                 theme, locale, updated_at, user_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &params,
            )?;
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use auth::model::Role;

    use super::*;
    use crate::service::testutil::{seed_user, test_service};

    #[test]
    fn defaults_before_first_save() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);

        let settings = svc.get_settings(uid).unwrap();
        assert!(settings.email_notifications);
        assert!(!settings.whatsapp_notifications);
        assert_eq!(settings.theme, "light");
        assert!(settings.updated_at.is_none());
    }

    #[test]
    fn update_merges_and_persists() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);

        svc.update_settings(
            uid,
            UpdateSettings {
                theme: Some("dark".into()),
                ..Default::default()
            },
        )
        .unwrap();

        svc.update_settings(
            uid,
            UpdateSettings {
                whatsapp_notifications: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let settings = svc.get_settings(uid).unwrap();
        // Both updates survive; untouched fields keep their defaults.
        assert_eq!(settings.theme, "dark");
        assert!(settings.whatsapp_notifications);
        assert!(settings.email_notifications);
        assert!(settings.updated_at.is_some());
    }

    #[test]
    fn rejects_unknown_theme() {
        let svc = test_service();
        let uid = seed_user(&svc, "staff@x.com", Role::Office);

        let err = svc
            .update_settings(
                uid,
                UpdateSettings {
                    theme: Some("neon".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, OfficeError::Validation(_)));
    }
}
