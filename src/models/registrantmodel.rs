use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::referralmodel::CodeKind;

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct Ambassador {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub occupation: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct CampusGuide {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub university: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Commission-earning party behind a referral code. Ambassadors and campus
/// guides share identical referral mechanics and differ only in registration
/// metadata, so everything downstream works off this union.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Owner {
    Ambassador(Ambassador),
    CampusGuide(CampusGuide),
}

impl Owner {
    pub fn id(&self) -> Uuid {
        match self {
            Owner::Ambassador(a) => a.id,
            Owner::CampusGuide(g) => g.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Owner::Ambassador(a) => &a.name,
            Owner::CampusGuide(g) => &g.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Owner::Ambassador(a) => &a.email,
            Owner::CampusGuide(g) => &g.email,
        }
    }

    pub fn phone(&self) -> Option<&str> {
        match self {
            Owner::Ambassador(a) => a.phone.as_deref(),
            Owner::CampusGuide(g) => g.phone.as_deref(),
        }
    }

    pub fn kind(&self) -> CodeKind {
        match self {
            Owner::Ambassador(_) => CodeKind::Ambassador,
            Owner::CampusGuide(_) => CodeKind::CampusGuide,
        }
    }
}

/// Row shape for the staff-facing free-text registrant search.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistrantMatch {
    pub kind: CodeKind,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
}
