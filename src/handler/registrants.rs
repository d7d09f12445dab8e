use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::{referraldb::ReferralExt, registrantdb::RegistrantExt},
    dtos::registrantdtos::{
        RegisterAmbassadorDto, RegisterCampusGuideDto, ReissueCodeDto, SearchQueryDto,
    },
    error::{ErrorMessage, HttpError},
    models::referralmodel::{CodeKind, NewAttributionEvent},
    service::{codegen, reconciler::OwnerResolution},
    AppState,
};

pub fn registrants_handler() -> Router {
    Router::new()
        .route("/ambassadors", post(register_ambassador))
        .route("/campus-guides", post(register_campus_guide))
}

pub fn registrant_admin_handler() -> Router {
    Router::new().route("/search", get(search_registrants))
}

pub fn referrals_handler() -> Router {
    Router::new()
        .route("/:code/resolve", get(resolve_code))
        .route("/:code/events", get(get_code_events))
        .route("/:code/deactivate", put(deactivate_code))
        .route("/reissue", post(reissue_code))
}

/// Registration is two separate statements (registrant row, then the code).
/// There is no cross-statement transaction: if the code insert fails the
/// registrant row stays and the error is surfaced so staff can retry.
pub async fn register_ambassador(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterAmbassadorDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    body.validate_phone_number()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_ambassador_by_email(&body.email)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::unique_constraint_violation(
            "Email already registered as an ambassador",
        ));
    }

    let ambassador = app_state
        .db_client
        .save_ambassador(
            &body.name,
            &body.email,
            body.phone.as_deref(),
            body.occupation.as_deref(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let code = codegen::generate_unique(
        &app_state.db_client,
        &ambassador.email,
        &ambassador.name,
        CodeKind::Ambassador,
    )
    .await?;

    let referral_code = app_state
        .db_client
        .save_referral_code(ambassador.id, &code, CodeKind::Ambassador)
        .await
        .map_err(|e| {
            HttpError::server_error(format!(
                "Ambassador was created but the referral code could not be saved: {}",
                e
            ))
        })?;

    app_state.emitter.emit(NewAttributionEvent {
        code: Some(referral_code.code.clone()),
        action: "code_registered".to_string(),
        ..Default::default()
    });

    let referral_link = codegen::generate_referral_link(&app_state.env.app_url, &referral_code.code);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "ambassador": ambassador,
            "referral_code": referral_code.code,
            "referral_link": referral_link
        }
    })))
}

pub async fn register_campus_guide(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterCampusGuideDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    body.validate_phone_number()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_campus_guide_by_email(&body.email)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::unique_constraint_violation(
            "Email already registered as a campus guide",
        ));
    }

    let guide = app_state
        .db_client
        .save_campus_guide(
            &body.name,
            &body.email,
            body.phone.as_deref(),
            body.university.as_deref(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let code = codegen::generate_unique(
        &app_state.db_client,
        &guide.email,
        &guide.name,
        CodeKind::CampusGuide,
    )
    .await?;

    let referral_code = app_state
        .db_client
        .save_referral_code(guide.id, &code, CodeKind::CampusGuide)
        .await
        .map_err(|e| {
            HttpError::server_error(format!(
                "Campus guide was created but the referral code could not be saved: {}",
                e
            ))
        })?;

    app_state.emitter.emit(NewAttributionEvent {
        code: Some(referral_code.code.clone()),
        action: "code_registered".to_string(),
        ..Default::default()
    });

    let referral_link = codegen::generate_referral_link(&app_state.env.app_url, &referral_code.code);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "campus_guide": guide,
            "referral_code": referral_code.code,
            "referral_link": referral_link
        }
    })))
}

/// Staff manual-override search across both registrant kinds.
pub async fn search_registrants(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query_params): Query<SearchQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let matches = app_state.reconciler.search_registrants(&query_params.q).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": matches.len(),
        "matches": matches
    })))
}

/// Owner resolution for a referral code. Unknown and orphaned codes are
/// reported as distinct outcomes, not errors, so batch reporting over many
/// codes never aborts on one bad entry.
pub async fn resolve_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let resolution = app_state.reconciler.resolve_owner(&code).await?;

    let payload = match resolution {
        OwnerResolution::Resolved { code, owner } => serde_json::json!({
            "status": "success",
            "data": {
                "resolution": "resolved",
                "code": code.code,
                "active": code.active,
                "kind": owner.kind().to_str(),
                "owner": {
                    "id": owner.id(),
                    "name": owner.name(),
                    "email": owner.email(),
                    "phone": owner.phone(),
                }
            }
        }),
        OwnerResolution::UnknownCode => serde_json::json!({
            "status": "success",
            "data": {
                "resolution": "unknown_code",
                "code": code
            }
        }),
        OwnerResolution::OrphanedCode { code } => serde_json::json!({
            "status": "success",
            "data": {
                "resolution": "unresolved",
                "code": code.code,
                "active": code.active,
                "message": "Referral code exists but its owner record is missing"
            }
        }),
    };

    Ok(Json(payload))
}

/// Recent attribution events observed under a code, newest first.
pub async fn get_code_events(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let events = app_state
        .db_client
        .get_events_by_code(&code, 100)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": events.len(),
        "events": events
    })))
}

/// Retires a code. The string stays reserved so it is never reissued, and
/// historical conversions under it remain attributable.
pub async fn deactivate_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_referral_code(&code)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReferralCodeNotFound.to_string()))?;

    if !existing.active {
        return Err(HttpError::bad_request("Referral code is already inactive"));
    }

    let updated = app_state
        .db_client
        .deactivate_referral_code(&code)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "code": updated.code,
            "active": updated.active
        }
    })))
}

/// Issues a fresh code for an existing registrant, retiring the current
/// active one first so an owner never holds two active codes of one kind.
pub async fn reissue_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ReissueCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (owner_id, owner_name, owner_email) = match body.kind {
        CodeKind::Ambassador => {
            let ambassador = app_state
                .db_client
                .get_ambassador_by_email(&body.email)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?
                .ok_or_else(|| HttpError::not_found("Ambassador not found"))?;
            (ambassador.id, ambassador.name, ambassador.email)
        }
        CodeKind::CampusGuide => {
            let guide = app_state
                .db_client
                .get_campus_guide_by_email(&body.email)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?
                .ok_or_else(|| HttpError::not_found("Campus guide not found"))?;
            (guide.id, guide.name, guide.email)
        }
        CodeKind::General => {
            return Err(HttpError::bad_request(
                "Codes can only be reissued for ambassadors or campus guides",
            ));
        }
    };

    if let Some(current) = app_state
        .db_client
        .get_active_code_for_owner(owner_id, body.kind)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
    {
        app_state
            .db_client
            .deactivate_referral_code(&current.code)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
    }

    let code = codegen::generate_unique(&app_state.db_client, &owner_email, &owner_name, body.kind)
        .await?;

    let referral_code = app_state
        .db_client
        .save_referral_code(owner_id, &code, body.kind)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let referral_link = codegen::generate_referral_link(&app_state.env.app_url, &referral_code.code);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "referral_code": referral_code.code,
            "referral_link": referral_link,
            "kind": body.kind.to_str()
        }
    })))
}
