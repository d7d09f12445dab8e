// service/codegen.rs
use rand::distr::Alphanumeric;
use rand::{rng, Rng};

use crate::db::db::DBClient;
use crate::db::referraldb::ReferralExt;
use crate::models::referralmodel::CodeKind;
use crate::service::error::ServiceError;

pub const CODE_LENGTH: usize = 12;
const SEGMENT_LENGTH: usize = 4;
const MAX_GENERATION_ATTEMPTS: u32 = 5;

// Per-kind salts keep ambassador and campus-guide codes derivationally
// distinct without any visible pattern difference.
const AMBASSADOR_SALT: &str = "amb-2023";
const CAMPUS_GUIDE_SALT: &str = "cgd-2023";
const GENERAL_SALT: &str = "gen-2023";

fn kind_salt(kind: CodeKind) -> &'static str {
    match kind {
        CodeKind::Ambassador => AMBASSADOR_SALT,
        CodeKind::CampusGuide => CAMPUS_GUIDE_SALT,
        CodeKind::General => GENERAL_SALT,
    }
}

fn hash_segment(input: &str) -> String {
    let digest = format!("{:x}", md5::compute(input.as_bytes()));
    digest[..SEGMENT_LENGTH].to_string()
}

fn random_segment() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(SEGMENT_LENGTH)
        .map(char::from)
        .collect()
}

/// Derive a referral code from identity inputs. Best-effort obfuscation,
/// not security-grade: the output looks random to end users but is NOT
/// cryptographically unpredictable, and uniqueness is NOT guaranteed —
/// callers must check the store and retry (see `generate_unique`).
pub fn generate(
    email: &str,
    name: &str,
    timestamp_ms: i64,
    kind: CodeKind,
) -> Result<String, ServiceError> {
    if email.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Email is required to generate a referral code".to_string(),
        ));
    }
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Name is required to generate a referral code".to_string(),
        ));
    }

    let email_norm = email.trim().to_lowercase();
    let name_norm: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let email_seg = hash_segment(&email_norm);
    let name_seg = hash_segment(&name_norm);

    let ts = timestamp_ms.to_string();
    let ts_seg = ts[ts.len().saturating_sub(SEGMENT_LENGTH)..].to_string();

    let rand_seg = random_segment();

    let salted_seg = hash_segment(&format!(
        "{}:{}:{}:{}",
        email_norm,
        name_norm,
        rand_seg,
        kind_salt(kind)
    ));

    // Interleave the segments character by character so no single input is
    // recognizable as a run in the final code.
    let segments = [email_seg, ts_seg, name_seg, rand_seg, salted_seg];
    let mut interleaved = String::new();
    for i in 0..SEGMENT_LENGTH {
        for seg in &segments {
            if let Some(c) = seg.chars().nth(i) {
                interleaved.push(c);
            }
        }
    }

    let mut code: String = interleaved
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase();

    code.truncate(CODE_LENGTH);
    while code.len() < CODE_LENGTH {
        code.push(
            rng()
                .sample(Alphanumeric) as char,
        );
    }

    Ok(code.to_uppercase())
}

/// Generate a code that does not collide with the referral_codes store.
/// Bounded retry; a deactivated code's string also counts as taken, so a
/// retired code is never reissued.
pub async fn generate_unique(
    db_client: &DBClient,
    email: &str,
    name: &str,
    kind: CodeKind,
) -> Result<String, ServiceError> {
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let code = generate(email, name, chrono::Utc::now().timestamp_millis(), kind)?;

        if db_client.get_referral_code(&code).await?.is_none() {
            return Ok(code);
        }

        tracing::warn!(
            "Referral code collision on attempt {}/{}, regenerating",
            attempt,
            MAX_GENERATION_ATTEMPTS
        );
    }

    Err(ServiceError::CodeSpaceExhausted(MAX_GENERATION_ATTEMPTS))
}

pub fn generate_referral_link(base_url: &str, code: &str) -> String {
    format!("{}/register?ref={}", base_url, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_length_and_character_class() {
        let code = generate(
            "amara@example.com",
            "Amara Eze",
            1714392000000,
            CodeKind::Ambassador,
        )
        .unwrap();

        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn repeated_invocations_differ_in_value_not_shape() {
        let first = generate(
            "amara@example.com",
            "Amara Eze",
            1714392000000,
            CodeKind::CampusGuide,
        )
        .unwrap();
        let second = generate(
            "amara@example.com",
            "Amara Eze",
            1714392000000,
            CodeKind::CampusGuide,
        )
        .unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn empty_identity_inputs_are_rejected() {
        assert!(generate("", "Amara Eze", 1714392000000, CodeKind::Ambassador).is_err());
        assert!(generate("amara@example.com", "   ", 1714392000000, CodeKind::Ambassador).is_err());
    }

    #[test]
    fn referral_link_embeds_code() {
        let link = generate_referral_link("https://edupath.example.com", "QX7ZK2M4P9AB");
        assert_eq!(
            link,
            "https://edupath.example.com/register?ref=QX7ZK2M4P9AB"
        );
    }
}
