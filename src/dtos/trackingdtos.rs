use serde::{Deserialize, Serialize};

// Field names mirror what the marketing pages already send.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrackReferralDto {
    #[serde(default, rename = "referralCode")]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponseDto {
    pub success: bool,
    pub message: String,
    #[serde(rename = "dbResult")]
    pub db_result: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrackingInfoQueryDto {
    pub code: Option<String>,
}
