use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "code_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Ambassador,
    CampusGuide,
    General,
}

impl CodeKind {
    pub fn to_str(&self) -> &str {
        match self {
            CodeKind::Ambassador => "ambassador",
            CodeKind::CampusGuide => "campus_guide",
            CodeKind::General => "general",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct ReferralCode {
    pub id: Uuid,
    pub code: String,
    pub owner_id: Uuid,
    pub kind: CodeKind,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// One observed attribution fact. Append-only; `code` is not FK-enforced
/// because events are captured client-side before any server validation.
#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct AttributionEvent {
    pub id: Uuid,
    pub code: Option<String>,
    pub action: String,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub raw_params: Option<serde_json::Value>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referer: Option<String>,
    pub session_id: Option<String>,
    pub page_loads: Option<i32>,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NewAttributionEvent {
    pub code: Option<String>,
    pub action: String,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub raw_params: Option<serde_json::Value>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referer: Option<String>,
    pub session_id: Option<String>,
    pub page_loads: Option<i32>,
}
