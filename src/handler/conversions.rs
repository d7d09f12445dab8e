use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::conversiondb::{ConversionChanges, ConversionExt, NewConversion},
    dtos::conversiondtos::*,
    error::HttpError,
    models::{
        conversionmodel::{ConversionAggregate, ConversionStatus},
        referralmodel::NewAttributionEvent,
    },
    service::error::ServiceError,
    AppState,
};

pub fn conversions_handler() -> Router {
    Router::new()
        .route("/", post(create_conversion).get(get_conversions))
        .route("/aggregate", get(get_conversion_aggregate))
        .route("/by-code/:code", get(get_conversions_by_code))
        .route("/by-owner/:owner_id", get(get_conversions_by_owner))
        .route(
            "/:conversion_id",
            get(get_conversion)
                .put(update_conversion)
                .delete(delete_conversion),
        )
}

pub async fn create_conversion(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateConversionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let conversion_date = parse_conversion_date(&body.conversion_date)?;
    let service_amount = parse_service_amount(body.service_amount)?;

    // Best-effort attribution: unknown or orphaned codes leave the owner
    // columns NULL, they do not block the conversion.
    let attribution = app_state
        .reconciler
        .attribution_for(&body.referral_code)
        .await?;

    let new = NewConversion {
        referral_code: body.referral_code.clone(),
        customer_name: body.customer_name,
        customer_email: body.customer_email,
        customer_phone: body.customer_phone,
        service_type: body.service_type,
        service_amount,
        conversion_date,
        status: body.status.unwrap_or(ConversionStatus::Pending),
        attributed_owner_id: attribution.map(|(id, _)| id),
        attributed_owner_kind: attribution.map(|(_, kind)| kind),
    };

    let conversion = app_state
        .db_client
        .save_conversion(&new)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state.emitter.emit(NewAttributionEvent {
        code: Some(body.referral_code),
        action: "conversion_trigger".to_string(),
        ..Default::default()
    });

    Ok(Json(ConversionResponseDto {
        status: "success".to_string(),
        data: ConversionData { conversion },
    }))
}

pub async fn get_conversion(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(conversion_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let conversion = app_state
        .db_client
        .get_conversion(conversion_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Conversion not found"))?;

    Ok(Json(ConversionResponseDto {
        status: "success".to_string(),
        data: ConversionData { conversion },
    }))
}

pub async fn get_conversions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query_params): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let conversions = app_state
        .db_client
        .get_conversions(page as u32, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let count = app_state
        .db_client
        .get_conversion_count()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ConversionListResponseDto {
        status: "success".to_string(),
        conversions,
        results: count,
    }))
}

pub async fn update_conversion(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(conversion_id): Path<Uuid>,
    Json(body): Json<UpdateConversionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_conversion(conversion_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Conversion not found"))?;

    if let Some(new_status) = body.status {
        if !existing.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatusTransition(existing.status, new_status).into());
        }
    }

    let conversion_date = match &body.conversion_date {
        Some(raw) => Some(parse_conversion_date(raw)?),
        None => None,
    };
    let service_amount = parse_service_amount(body.service_amount)?;

    let mut changes = ConversionChanges {
        referral_code: body.referral_code.clone(),
        customer_name: body.customer_name,
        customer_email: body.customer_email,
        customer_phone: body.customer_phone,
        service_type: body.service_type,
        service_amount,
        conversion_date,
        status: body.status,
        ..Default::default()
    };

    // A changed code re-runs attribution; an unresolvable code keeps the
    // previous owner stamp rather than silently clearing it.
    if let Some(code) = &body.referral_code {
        if *code != existing.referral_code {
            if let Some((owner_id, kind)) = app_state.reconciler.attribution_for(code).await? {
                changes.attributed_owner_id = Some(owner_id);
                changes.attributed_owner_kind = Some(kind);
            }
        }
    }

    let conversion = app_state
        .db_client
        .update_conversion(conversion_id, &changes)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ConversionResponseDto {
        status: "success".to_string(),
        data: ConversionData { conversion },
    }))
}

pub async fn delete_conversion(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(conversion_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_conversion(conversion_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if deleted == 0 {
        return Err(HttpError::not_found("Conversion not found"));
    }

    Ok(Json(Response {
        status: "success",
        message: "Conversion deleted successfully".to_string(),
    }))
}

pub async fn get_conversions_by_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let conversions = app_state
        .db_client
        .get_conversions_by_code(&code)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let results = conversions.len() as i64;

    Ok(Json(ConversionListResponseDto {
        status: "success".to_string(),
        conversions,
        results,
    }))
}

pub async fn get_conversions_by_owner(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let conversions = app_state
        .db_client
        .get_conversions_by_owner(owner_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let summary = ConversionAggregate::from_rows(&conversions);

    Ok(Json(serde_json::json!({
        "status": "success",
        "conversions": conversions,
        "summary": summary
    })))
}

pub async fn get_conversion_aggregate(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query_params): Query<AggregateQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let aggregate = app_state
        .db_client
        .get_conversion_aggregate(query_params.code.as_deref(), query_params.owner_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": aggregate
    })))
}

fn parse_conversion_date(raw: &str) -> Result<NaiveDate, HttpError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HttpError::bad_request("Conversion date must be a valid date (YYYY-MM-DD)"))
}

fn parse_service_amount(raw: Option<f64>) -> Result<Option<BigDecimal>, HttpError> {
    match raw {
        Some(amount) => BigDecimal::try_from(amount)
            .map(Some)
            .map_err(|_| HttpError::bad_request("Service amount is not a valid number")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_date_must_be_a_real_calendar_date() {
        assert!(parse_conversion_date("2024-05-10").is_ok());
        assert!(parse_conversion_date("2024-02-30").is_err());
        assert!(parse_conversion_date("10/05/2024").is_err());
    }

    #[test]
    fn service_amount_conversion_handles_absent_values() {
        assert_eq!(parse_service_amount(None).unwrap(), None);
        assert_eq!(
            parse_service_amount(Some(150.0)).unwrap(),
            Some(BigDecimal::from(150))
        );
        assert!(parse_service_amount(Some(f64::NAN)).is_err());
    }
}
