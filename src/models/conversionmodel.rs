use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::referralmodel::CodeKind;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "conversion_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ConversionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ConversionStatus::Pending => "pending",
            ConversionStatus::Confirmed => "confirmed",
            ConversionStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed moves: pending -> confirmed, pending -> cancelled,
    /// confirmed -> cancelled (reversal). Nothing leaves cancelled.
    /// Restating the current status is a no-op and always allowed.
    pub fn can_transition_to(&self, next: ConversionStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (ConversionStatus::Pending, ConversionStatus::Confirmed)
                | (ConversionStatus::Pending, ConversionStatus::Cancelled)
                | (ConversionStatus::Confirmed, ConversionStatus::Cancelled)
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct Conversion {
    pub id: Uuid,
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
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Conversion {
    pub fn counts_toward_revenue(&self) -> bool {
        self.status == ConversionStatus::Confirmed && self.service_amount.is_some()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionAggregate {
    pub count: i64,
    pub confirmed_count: i64,
    pub confirmed_revenue_sum: BigDecimal,
}

impl ConversionAggregate {
    /// Summarize an already-fetched batch of conversions. Used by the
    /// per-owner report; the global aggregate endpoint sums in SQL instead.
    pub fn from_rows(rows: &[Conversion]) -> Self {
        let mut confirmed_count = 0i64;
        let mut confirmed_revenue_sum = BigDecimal::from(0);

        for row in rows {
            if row.status == ConversionStatus::Confirmed {
                confirmed_count += 1;
                if let Some(amount) = &row.service_amount {
                    confirmed_revenue_sum += amount.clone();
                }
            }
        }

        ConversionAggregate {
            count: rows.len() as i64,
            confirmed_count,
            confirmed_revenue_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion(status: ConversionStatus, amount: Option<i64>) -> Conversion {
        Conversion {
            id: Uuid::new_v4(),
            referral_code: "QX7ZK2M4P9AB".to_string(),
            customer_name: "Ada Obi".to_string(),
            customer_email: "ada@example.com".to_string(),
            customer_phone: None,
            service_type: "visa_processing".to_string(),
            service_amount: amount.map(BigDecimal::from),
            conversion_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            status,
            attributed_owner_id: None,
            attributed_owner_kind: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn revenue_sums_only_confirmed_amounts() {
        let rows = vec![
            conversion(ConversionStatus::Confirmed, Some(100)),
            conversion(ConversionStatus::Confirmed, Some(200)),
            conversion(ConversionStatus::Cancelled, Some(50)),
        ];

        let agg = ConversionAggregate::from_rows(&rows);

        assert_eq!(agg.count, 3);
        assert_eq!(agg.confirmed_count, 2);
        assert_eq!(agg.confirmed_revenue_sum, BigDecimal::from(300));
    }

    #[test]
    fn confirmed_without_amount_counts_but_adds_nothing() {
        let rows = vec![
            conversion(ConversionStatus::Confirmed, None),
            conversion(ConversionStatus::Pending, Some(75)),
        ];

        let agg = ConversionAggregate::from_rows(&rows);

        assert_eq!(agg.confirmed_count, 1);
        assert_eq!(agg.confirmed_revenue_sum, BigDecimal::from(0));
    }

    #[test]
    fn status_machine_allows_documented_transitions() {
        assert!(ConversionStatus::Pending.can_transition_to(ConversionStatus::Confirmed));
        assert!(ConversionStatus::Pending.can_transition_to(ConversionStatus::Cancelled));
        assert!(ConversionStatus::Confirmed.can_transition_to(ConversionStatus::Cancelled));
    }

    #[test]
    fn status_machine_rejects_leaving_cancelled() {
        assert!(!ConversionStatus::Cancelled.can_transition_to(ConversionStatus::Pending));
        assert!(!ConversionStatus::Cancelled.can_transition_to(ConversionStatus::Confirmed));
        assert!(!ConversionStatus::Confirmed.can_transition_to(ConversionStatus::Pending));
    }

    #[test]
    fn restating_current_status_is_allowed() {
        assert!(ConversionStatus::Pending.can_transition_to(ConversionStatus::Pending));
        assert!(ConversionStatus::Cancelled.can_transition_to(ConversionStatus::Cancelled));
    }
}
