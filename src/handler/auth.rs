use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    dtos::authdtos::{StaffLoginDto, StaffLoginResponseDto},
    error::HttpError,
    middleware::is_staff_email,
    utils::token,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new().route("/login", post(login))
}

/// Staff login for the admin surface. Staff identity is the configured
/// email allow-list plus a shared access key; there is no user table.
pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<StaffLoginDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    if !is_staff_email(&app_state, &email) {
        return Err(HttpError::unauthorized("Email is not on the staff list"));
    }

    if body.access_key != app_state.env.admin_access_key {
        return Err(HttpError::unauthorized("Invalid access key"));
    }

    let token = token::create_token(
        &email,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage * 60);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let response = axum::response::Json(StaffLoginResponseDto {
        status: "success".to_string(),
        token,
    });

    let mut headers = HeaderMap::new();

    headers.append(
        header::SET_COOKIE,
        cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
