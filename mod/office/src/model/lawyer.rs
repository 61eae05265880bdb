use serde::{Deserialize, Serialize};

/// A lawyer: a user of role `lawyer` joined with their professional
/// record.
#[derive(Debug, Clone, Serialize)]
pub struct Lawyer {
    /// Same as the user id.
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// Bar association registration number.
    pub bar_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialties: Option<String>,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLawyer {
    pub name: String,
    pub email: String,
    pub bar_number: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLawyer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bar_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
}
