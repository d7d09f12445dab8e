use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct StaffLoginDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Access key is required"))]
    pub access_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StaffLoginResponseDto {
    pub status: String,
    pub token: String,
}
