use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::models::referralmodel::CodeKind;

// Basic phone number validation - supports international formats
fn validate_phone_format(phone: &Option<String>) -> Result<(), ValidationError> {
    if let Some(phone) = phone {
        let phone_regex =
            regex::Regex::new(r"^(\+?[0-9]{1,3}[- ]?)?[0-9]{3}[- ]?[0-9]{3}[- ]?[0-9]{4}$")
                .map_err(|_| ValidationError::new("Invalid phone regex"))?;

        if !phone_regex.is_match(phone) {
            let mut error = ValidationError::new("invalid_phone");
            error.message = Some(Cow::from(
                "Phone number must be in a valid format (e.g., +1234567890 or 123-456-7890)",
            ));
            return Err(error);
        }
    }
    Ok(())
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterAmbassadorDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(
        min = 10,
        max = 20,
        message = "Phone number must be between 10-20 characters"
    ))]
    pub phone: Option<String>,

    pub occupation: Option<String>,
}

impl RegisterAmbassadorDto {
    pub fn validate_phone_number(&self) -> Result<(), ValidationError> {
        validate_phone_format(&self.phone)
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterCampusGuideDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(
        min = 10,
        max = 20,
        message = "Phone number must be between 10-20 characters"
    ))]
    pub phone: Option<String>,

    pub university: Option<String>,
}

impl RegisterCampusGuideDto {
    pub fn validate_phone_number(&self) -> Result<(), ValidationError> {
        validate_phone_format(&self.phone)
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ReissueCodeDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    pub kind: CodeKind,
}

#[derive(Validate, Debug, Default, Serialize, Deserialize)]
pub struct SearchQueryDto {
    #[validate(length(min = 1, message = "Search query is required"))]
    pub q: String,
}
