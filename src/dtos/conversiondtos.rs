use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::conversionmodel::{Conversion, ConversionStatus};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateConversionDto {
    #[validate(length(min = 1, message = "Referral code is required"))]
    pub referral_code: String,

    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    #[validate(
        length(min = 1, message = "Customer email is required"),
        email(message = "Customer email is invalid")
    )]
    pub customer_email: String,

    pub customer_phone: Option<String>,

    #[validate(length(min = 1, message = "Service type is required"))]
    pub service_type: String,

    #[validate(range(min = 0.0, message = "Service amount must not be negative"))]
    pub service_amount: Option<f64>,

    // Parsed as a calendar date (YYYY-MM-DD) in the handler
    pub conversion_date: String,

    pub status: Option<ConversionStatus>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateConversionDto {
    #[validate(length(min = 1, message = "Referral code must not be empty"))]
    pub referral_code: Option<String>,

    #[validate(length(min = 1, message = "Customer name must not be empty"))]
    pub customer_name: Option<String>,

    #[validate(email(message = "Customer email is invalid"))]
    pub customer_email: Option<String>,

    pub customer_phone: Option<String>,

    #[validate(length(min = 1, message = "Service type must not be empty"))]
    pub service_type: Option<String>,

    #[validate(range(min = 0.0, message = "Service amount must not be negative"))]
    pub service_amount: Option<f64>,

    pub conversion_date: Option<String>,

    pub status: Option<ConversionStatus>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AggregateQueryDto {
    pub code: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversionData {
    pub conversion: Conversion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversionResponseDto {
    pub status: String,
    pub data: ConversionData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversionListResponseDto {
    pub status: String,
    pub conversions: Vec<Conversion>,
    pub results: i64,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
