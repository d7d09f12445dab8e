// db/conversiondb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::Row;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::{
    conversionmodel::{Conversion, ConversionAggregate, ConversionStatus},
    referralmodel::CodeKind,
};

const CONVERSION_COLUMNS: &str = r#"
    id, referral_code, customer_name, customer_email, customer_phone,
    service_type, service_amount, conversion_date, status,
    attributed_owner_id, attributed_owner_kind,
    created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct NewConversion {
    pub referral_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub service_type: String,
    pub service_amount: Option<BigDecimal>,
    pub conversion_date: NaiveDate,
    pub status: ConversionStatus,
    pub attributed_owner_id: Option<Uuid>,
    pub attributed_owner_kind: Option<CodeKind>,
}

/// Partial update; None leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ConversionChanges {
    pub referral_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub service_type: Option<String>,
    pub service_amount: Option<BigDecimal>,
    pub conversion_date: Option<NaiveDate>,
    pub status: Option<ConversionStatus>,
    pub attributed_owner_id: Option<Uuid>,
    pub attributed_owner_kind: Option<CodeKind>,
}

#[async_trait]
pub trait ConversionExt {
    async fn save_conversion(&self, new: &NewConversion) -> Result<Conversion, sqlx::Error>;

    async fn get_conversion(&self, id: Uuid) -> Result<Option<Conversion>, sqlx::Error>;

    async fn get_conversions(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Conversion>, sqlx::Error>;

    async fn get_conversion_count(&self) -> Result<i64, sqlx::Error>;

    async fn update_conversion(
        &self,
        id: Uuid,
        changes: &ConversionChanges,
    ) -> Result<Conversion, sqlx::Error>;

    async fn delete_conversion(&self, id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_conversions_by_code(&self, code: &str) -> Result<Vec<Conversion>, sqlx::Error>;

    async fn get_conversions_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Conversion>, sqlx::Error>;

    async fn get_conversion_aggregate(
        &self,
        code: Option<&str>,
        owner_id: Option<Uuid>,
    ) -> Result<ConversionAggregate, sqlx::Error>;
}

#[async_trait]
impl ConversionExt for DBClient {
    async fn save_conversion(&self, new: &NewConversion) -> Result<Conversion, sqlx::Error> {
        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            INSERT INTO conversions
                (referral_code, customer_name, customer_email, customer_phone,
                 service_type, service_amount, conversion_date, status,
                 attributed_owner_id, attributed_owner_kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(&new.referral_code)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_phone)
        .bind(&new.service_type)
        .bind(&new.service_amount)
        .bind(new.conversion_date)
        .bind(new.status)
        .bind(new.attributed_owner_id)
        .bind(new.attributed_owner_kind)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_conversion(&self, id: Uuid) -> Result<Option<Conversion>, sqlx::Error> {
        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            SELECT {}
            FROM conversions
            WHERE id = $1
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_conversions(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        let offset = (page - 1) as i64 * limit as i64;

        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            SELECT {}
            FROM conversions
            ORDER BY conversion_date DESC
            LIMIT $1 OFFSET $2
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversion_count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(r#"SELECT COUNT(*) AS count FROM conversions"#)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn update_conversion(
        &self,
        id: Uuid,
        changes: &ConversionChanges,
    ) -> Result<Conversion, sqlx::Error> {
        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            UPDATE conversions
            SET referral_code = COALESCE($2, referral_code),
                customer_name = COALESCE($3, customer_name),
                customer_email = COALESCE($4, customer_email),
                customer_phone = COALESCE($5, customer_phone),
                service_type = COALESCE($6, service_type),
                service_amount = COALESCE($7, service_amount),
                conversion_date = COALESCE($8, conversion_date),
                status = COALESCE($9, status),
                attributed_owner_id = COALESCE($10, attributed_owner_id),
                attributed_owner_kind = COALESCE($11, attributed_owner_kind),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(id)
        .bind(&changes.referral_code)
        .bind(&changes.customer_name)
        .bind(&changes.customer_email)
        .bind(&changes.customer_phone)
        .bind(&changes.service_type)
        .bind(&changes.service_amount)
        .bind(changes.conversion_date)
        .bind(changes.status)
        .bind(changes.attributed_owner_id)
        .bind(changes.attributed_owner_kind)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_conversion(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM conversions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_conversions_by_code(&self, code: &str) -> Result<Vec<Conversion>, sqlx::Error> {
        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            SELECT {}
            FROM conversions
            WHERE referral_code = $1
            ORDER BY conversion_date DESC
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversions_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        sqlx::query_as::<_, Conversion>(&format!(
            r#"
            SELECT {}
            FROM conversions
            WHERE attributed_owner_id = $1
            ORDER BY conversion_date DESC
            "#,
            CONVERSION_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversion_aggregate(
        &self,
        code: Option<&str>,
        owner_id: Option<Uuid>,
    ) -> Result<ConversionAggregate, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_count,
                COUNT(*) FILTER (WHERE status = 'confirmed'::conversion_status)
                    AS confirmed_count,
                COALESCE(SUM(service_amount) FILTER (
                    WHERE status = 'confirmed'::conversion_status
                      AND service_amount IS NOT NULL
                ), 0) AS confirmed_revenue_sum
            FROM conversions
            WHERE ($1::text IS NULL OR referral_code = $1)
              AND ($2::uuid IS NULL OR attributed_owner_id = $2)
            "#,
        )
        .bind(code)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ConversionAggregate {
            count: row.get::<i64, _>("total_count"),
            confirmed_count: row.get::<i64, _>("confirmed_count"),
            confirmed_revenue_sum: row.get::<BigDecimal, _>("confirmed_revenue_sum"),
        })
    }
}
