use serde::{Deserialize, Serialize};

/// A consultation or case-work session with a client.
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub kind: String,
    /// scheduled | in_progress | done | cancelled
    pub status: String,
    pub scheduled_at: String,
    pub client_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lawyer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lawyer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

pub const APPOINTMENT_STATUSES: &[&str] = &["scheduled", "in_progress", "done", "cancelled"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    pub scheduled_at: String,
    pub client_id: i64,
    #[serde(default)]
    pub lawyer_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointment {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub lawyer_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentStats {
    pub total: i64,
    pub scheduled: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
}
