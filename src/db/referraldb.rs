// db/referraldb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::referralmodel::{AttributionEvent, CodeKind, NewAttributionEvent, ReferralCode};

#[async_trait]
pub trait ReferralExt {
    async fn save_referral_code(
        &self,
        owner_id: Uuid,
        code: &str,
        kind: CodeKind,
    ) -> Result<ReferralCode, sqlx::Error>;

    async fn get_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<ReferralCode>, sqlx::Error>;

    async fn get_active_code_for_owner(
        &self,
        owner_id: Uuid,
        kind: CodeKind,
    ) -> Result<Option<ReferralCode>, sqlx::Error>;

    async fn deactivate_referral_code(
        &self,
        code: &str,
    ) -> Result<ReferralCode, sqlx::Error>;

    async fn record_attribution_event(
        &self,
        event: &NewAttributionEvent,
    ) -> Result<AttributionEvent, sqlx::Error>;

    async fn get_events_by_code(
        &self,
        code: &str,
        limit: i64,
    ) -> Result<Vec<AttributionEvent>, sqlx::Error>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn save_referral_code(
        &self,
        owner_id: Uuid,
        code: &str,
        kind: CodeKind,
    ) -> Result<ReferralCode, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            INSERT INTO referral_codes (code, owner_id, kind)
            VALUES ($1, $2, $3)
            RETURNING id, code, owner_id, kind, active, created_at
            "#,
        )
        .bind(code)
        .bind(owner_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            SELECT id, code, owner_id, kind, active, created_at
            FROM referral_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_active_code_for_owner(
        &self,
        owner_id: Uuid,
        kind: CodeKind,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            SELECT id, code, owner_id, kind, active, created_at
            FROM referral_codes
            WHERE owner_id = $1 AND kind = $2 AND active = true
            "#,
        )
        .bind(owner_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
    }

    async fn deactivate_referral_code(
        &self,
        code: &str,
    ) -> Result<ReferralCode, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            UPDATE referral_codes
            SET active = false
            WHERE code = $1
            RETURNING id, code, owner_id, kind, active, created_at
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
    }

    async fn record_attribution_event(
        &self,
        event: &NewAttributionEvent,
    ) -> Result<AttributionEvent, sqlx::Error> {
        sqlx::query_as::<_, AttributionEvent>(
            r#"
            INSERT INTO attribution_events
                (code, action, source, medium, campaign, raw_params,
                 user_agent, ip_address, referer, session_id, page_loads)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, code, action, source, medium, campaign, raw_params,
                user_agent, ip_address, referer, session_id, page_loads,
                observed_at
            "#,
        )
        .bind(&event.code)
        .bind(&event.action)
        .bind(&event.source)
        .bind(&event.medium)
        .bind(&event.campaign)
        .bind(&event.raw_params)
        .bind(&event.user_agent)
        .bind(&event.ip_address)
        .bind(&event.referer)
        .bind(&event.session_id)
        .bind(event.page_loads)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_events_by_code(
        &self,
        code: &str,
        limit: i64,
    ) -> Result<Vec<AttributionEvent>, sqlx::Error> {
        sqlx::query_as::<_, AttributionEvent>(
            r#"
            SELECT
                id, code, action, source, medium, campaign, raw_params,
                user_agent, ip_address, referer, session_id, page_loads,
                observed_at
            FROM attribution_events
            WHERE code = $1
            ORDER BY observed_at DESC
            LIMIT $2
            "#,
        )
        .bind(code)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
