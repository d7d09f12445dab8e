use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{Map, Value};

use crate::{
    db::referraldb::ReferralExt,
    dtos::trackingdtos::{TrackReferralDto, TrackingInfoQueryDto, TrackingResponseDto},
    error::HttpError,
    models::referralmodel::NewAttributionEvent,
    AppState,
};

pub fn tracking_handler() -> Router {
    Router::new().route("/", get(tracking_info).post(track_referral))
}

/// Records one attribution event. The database write happens inline so the
/// response can report whether it stuck; the legacy form mirror is detached.
/// A database failure downgrades to dbResult "skipped" — attribution is
/// best-effort and must never break the caller's page.
pub async fn track_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TrackReferralDto>,
) -> Result<impl IntoResponse, HttpError> {
    let referral_code = body
        .referral_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| HttpError::bad_request("referralCode is required"))?
        .to_string();

    let action = body
        .action
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "page_visit".to_string());

    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let (source, medium, campaign, raw_params) = referer
        .as_deref()
        .map(|r| utm_fields(&parse_referer_params(r)))
        .unwrap_or((None, None, None, None));

    let user_agent = body.user_agent.or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    let ip_address = body.ip.or_else(|| {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    let event = NewAttributionEvent {
        code: Some(referral_code),
        action,
        source,
        medium,
        campaign,
        raw_params,
        user_agent,
        ip_address,
        referer,
        ..Default::default()
    };

    let db_result = match app_state.db_client.record_attribution_event(&event).await {
        Ok(_) => "saved",
        Err(e) => {
            tracing::warn!("Failed to persist attribution event: {}", e);
            "skipped"
        }
    };

    app_state.emitter.mirror(&event);

    Ok(Json(TrackingResponseDto {
        success: true,
        message: "Referral tracking recorded".to_string(),
        db_result: db_result.to_string(),
    }))
}

/// Informational stub, not real analytics.
pub async fn tracking_info(
    Query(query_params): Query<TrackingInfoQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Referral tracking endpoint is active",
        "code": query_params.code,
        "note": "POST attribution events to this endpoint"
    })))
}

fn parse_referer_params(referer: &str) -> Vec<(String, String)> {
    let query = match referer.split_once('?') {
        Some((_, query)) => query,
        None => return Vec::new(),
    };

    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = urlencoding::decode(key).ok()?.into_owned();
            let value = urlencoding::decode(value).ok()?.into_owned();
            if value.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .collect()
}

const UTM_KEYS: [&str; 6] = ["utm_source", "src", "utm_medium", "med", "utm_campaign", "campaign"];

fn utm_fields(
    params: &[(String, String)],
) -> (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<Value>,
) {
    let lookup = |names: [&str; 2]| {
        names.iter().find_map(|name| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    };

    let source = lookup(["utm_source", "src"]);
    let medium = lookup(["utm_medium", "med"]);
    let campaign = lookup(["utm_campaign", "campaign"]);

    let misc: Map<String, Value> = params
        .iter()
        .filter(|(k, _)| !UTM_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let raw_params = if misc.is_empty() {
        None
    } else {
        Some(Value::Object(misc))
    };

    (source, medium, campaign, raw_params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referer_query_params_are_decoded() {
        let params = parse_referer_params(
            "https://edupath.example.com/blog?utm_source=news%20letter&ref=ABC&empty=",
        );

        assert_eq!(params.len(), 2);
        assert_eq!(params[0], ("utm_source".to_string(), "news letter".to_string()));
        assert_eq!(params[1], ("ref".to_string(), "ABC".to_string()));
    }

    #[test]
    fn referer_without_query_yields_nothing() {
        assert!(parse_referer_params("https://edupath.example.com/blog").is_empty());
    }

    #[test]
    fn utm_long_and_short_names_both_map() {
        let params = vec![
            ("utm_source".to_string(), "newsletter".to_string()),
            ("med".to_string(), "email".to_string()),
            ("fbclid".to_string(), "x1".to_string()),
        ];

        let (source, medium, campaign, raw) = utm_fields(&params);

        assert_eq!(source.as_deref(), Some("newsletter"));
        assert_eq!(medium.as_deref(), Some("email"));
        assert!(campaign.is_none());
        assert_eq!(
            raw.unwrap().get("fbclid").and_then(|v| v.as_str()),
            Some("x1")
        );
    }

    #[test]
    fn long_utm_name_wins_over_short_alias() {
        let params = vec![
            ("src".to_string(), "short".to_string()),
            ("utm_source".to_string(), "long".to_string()),
        ];

        let (source, _, _, _) = utm_fields(&params);
        assert_eq!(source.as_deref(), Some("long"));
    }
}
