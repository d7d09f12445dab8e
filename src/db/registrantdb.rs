// db/registrantdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::{
    referralmodel::CodeKind,
    registrantmodel::{Ambassador, CampusGuide, RegistrantMatch},
};

#[async_trait]
pub trait RegistrantExt {
    async fn save_ambassador(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        occupation: Option<&str>,
    ) -> Result<Ambassador, sqlx::Error>;

    async fn get_ambassador(&self, id: Uuid) -> Result<Option<Ambassador>, sqlx::Error>;

    async fn get_ambassador_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Ambassador>, sqlx::Error>;

    async fn save_campus_guide(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        university: Option<&str>,
    ) -> Result<CampusGuide, sqlx::Error>;

    async fn get_campus_guide(&self, id: Uuid) -> Result<Option<CampusGuide>, sqlx::Error>;

    async fn get_campus_guide_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CampusGuide>, sqlx::Error>;

    async fn search_registrants(
        &self,
        query: &str,
    ) -> Result<Vec<RegistrantMatch>, sqlx::Error>;
}

#[async_trait]
impl RegistrantExt for DBClient {
    async fn save_ambassador(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        occupation: Option<&str>,
    ) -> Result<Ambassador, sqlx::Error> {
        sqlx::query_as::<_, Ambassador>(
            r#"
            INSERT INTO ambassadors (name, email, phone, occupation)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, occupation, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(occupation)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_ambassador(&self, id: Uuid) -> Result<Option<Ambassador>, sqlx::Error> {
        sqlx::query_as::<_, Ambassador>(
            r#"
            SELECT id, name, email, phone, occupation, created_at, updated_at
            FROM ambassadors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_ambassador_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Ambassador>, sqlx::Error> {
        sqlx::query_as::<_, Ambassador>(
            r#"
            SELECT id, name, email, phone, occupation, created_at, updated_at
            FROM ambassadors
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_campus_guide(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        university: Option<&str>,
    ) -> Result<CampusGuide, sqlx::Error> {
        sqlx::query_as::<_, CampusGuide>(
            r#"
            INSERT INTO campus_guides (name, email, phone, university)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, university, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(university)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_campus_guide(&self, id: Uuid) -> Result<Option<CampusGuide>, sqlx::Error> {
        sqlx::query_as::<_, CampusGuide>(
            r#"
            SELECT id, name, email, phone, university, created_at, updated_at
            FROM campus_guides
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_campus_guide_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CampusGuide>, sqlx::Error> {
        sqlx::query_as::<_, CampusGuide>(
            r#"
            SELECT id, name, email, phone, university, created_at, updated_at
            FROM campus_guides
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn search_registrants(
        &self,
        query: &str,
    ) -> Result<Vec<RegistrantMatch>, sqlx::Error> {
        let pattern = format!("%{}%", query);

        let ambassadors = sqlx::query_as::<_, Ambassador>(
            r#"
            SELECT DISTINCT a.id, a.name, a.email, a.phone, a.occupation,
                   a.created_at, a.updated_at
            FROM ambassadors a
            LEFT JOIN referral_codes rc
                ON rc.owner_id = a.id AND rc.kind = 'ambassador'::code_kind
            WHERE a.name ILIKE $1
               OR a.email ILIKE $1
               OR a.phone ILIKE $1
               OR rc.code ILIKE $1
            ORDER BY a.name
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let guides = sqlx::query_as::<_, CampusGuide>(
            r#"
            SELECT DISTINCT g.id, g.name, g.email, g.phone, g.university,
                   g.created_at, g.updated_at
            FROM campus_guides g
            LEFT JOIN referral_codes rc
                ON rc.owner_id = g.id AND rc.kind = 'campus_guide'::code_kind
            WHERE g.name ILIKE $1
               OR g.email ILIKE $1
               OR g.phone ILIKE $1
               OR rc.code ILIKE $1
            ORDER BY g.name
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let mut matches: Vec<RegistrantMatch> = Vec::new();

        for a in ambassadors {
            let code = self
                .active_code_string(a.id, CodeKind::Ambassador)
                .await?;
            matches.push(RegistrantMatch {
                kind: CodeKind::Ambassador,
                id: a.id,
                name: a.name,
                email: a.email,
                phone: a.phone,
                referral_code: code,
            });
        }

        for g in guides {
            let code = self
                .active_code_string(g.id, CodeKind::CampusGuide)
                .await?;
            matches.push(RegistrantMatch {
                kind: CodeKind::CampusGuide,
                id: g.id,
                name: g.name,
                email: g.email,
                phone: g.phone,
                referral_code: code,
            });
        }

        Ok(matches)
    }
}

impl DBClient {
    async fn active_code_string(
        &self,
        owner_id: Uuid,
        kind: CodeKind,
    ) -> Result<Option<String>, sqlx::Error> {
        use crate::db::referraldb::ReferralExt;
        Ok(self
            .get_active_code_for_owner(owner_id, kind)
            .await?
            .map(|rc| rc.code))
    }
}
