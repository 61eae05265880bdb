use serde::{Deserialize, Serialize};

/// Per-user office preferences. A row is created lazily on first
/// update; reads fall back to defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub user_id: i64,
    pub email_notifications: bool,
    pub whatsapp_notifications: bool,
    pub timezone: String,
    pub theme: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Settings {
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            email_notifications: true,
            whatsapp_notifications: false,
            timezone: "UTC".to_string(),
            theme: "light".to_string(),
            locale: "en".to_string(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub whatsapp_notifications: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}
