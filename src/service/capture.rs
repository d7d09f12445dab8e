// service/capture.rs
use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::models::referralmodel::NewAttributionEvent;

/// Storage seam for the capture store. Browser-local storage semantics:
/// synchronous, per-origin, survives reloads, no expiry handled here.
/// Substituted with `MemoryStore` in tests and embedded hosts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            entries: HashMap::new(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

pub const URL_PARAMS_KEY: &str = "urlParams";
pub const REF_KEY: &str = "ref";
pub const REFERRAL_CODE_KEY: &str = "referralCode";
pub const REFERRAL_DATA_KEY: &str = "referralData";

const CLEAR_STORAGE_PARAM: &str = "clearStorage";
const ALLOWED_PARAMS: [&str; 5] = ["src", "ref", "med", "referrer", "campaign"];

/// Accumulates attribution parameters across navigations on top of an
/// injected key/value store. One instance per page load; `ingest` runs at
/// most once per instance so a double-invoking host cannot double-count.
pub struct CaptureStore<S: KeyValueStore> {
    store: S,
    ingested: bool,
}

impl<S: KeyValueStore> CaptureStore<S> {
    pub fn new(store: S) -> Self {
        CaptureStore {
            store,
            ingested: false,
        }
    }

    /// Merge this navigation's query params into the accumulated state.
    /// Returns the page_visit event to report when the load carried tracked
    /// parameters or an established code; None otherwise. A `clearStorage`
    /// control param wipes everything and short-circuits with no event.
    pub fn ingest(&mut self, params: &[(String, String)]) -> Option<NewAttributionEvent> {
        if self.ingested {
            return None;
        }
        self.ingested = true;

        if params.iter().any(|(k, _)| k == CLEAR_STORAGE_PARAM) {
            self.store.remove(URL_PARAMS_KEY);
            self.store.remove(REF_KEY);
            self.store.remove(REFERRAL_CODE_KEY);
            self.store.remove(REFERRAL_DATA_KEY);
            return None;
        }

        let first_visit = self.store.get(URL_PARAMS_KEY).is_none();
        let mut accumulated = self.load_url_params();

        let mut saw_allowed = false;
        let mut saw_any = false;
        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            saw_any = true;
            if ALLOWED_PARAMS.contains(&key.as_str()) {
                saw_allowed = true;
            }

            let existing = accumulated.get(key).and_then(|v| v.as_str().map(String::from));
            let merged = merge_param_value(existing.as_deref(), value);
            accumulated.insert(key.clone(), Value::String(merged));
        }

        if first_visit && !saw_allowed {
            accumulated.insert("src".to_string(), Value::String("direct".to_string()));
        }

        if let Ok(serialized) = serde_json::to_string(&Value::Object(accumulated.clone())) {
            self.store.set(URL_PARAMS_KEY, &serialized);
        }

        // Referral capture: `ref` wins over `referrer`, first non-empty value
        // of each. Mirrored into the legacy keys older pages still read.
        let captured_code = first_param(params, "ref").or_else(|| first_param(params, "referrer"));

        if let Some(code) = &captured_code {
            self.store.set(REF_KEY, code);
            self.store.set(REFERRAL_CODE_KEY, code);

            let source = accumulated
                .get("src")
                .and_then(|v| v.as_str())
                .unwrap_or("direct")
                .to_string();
            let data = json!({
                "code": code,
                "timestamp": chrono::Utc::now().timestamp_millis(),
                "source": source,
            });
            self.store.set(REFERRAL_DATA_KEY, &data.to_string());
        }

        let effective_code =
            captured_code.or_else(|| self.store.get(REFERRAL_CODE_KEY).or_else(|| self.store.get(REF_KEY)));

        if !saw_any && effective_code.is_none() {
            return None;
        }

        let misc: Map<String, Value> = accumulated
            .iter()
            .filter(|(k, _)| !ALLOWED_PARAMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(NewAttributionEvent {
            code: effective_code,
            action: "page_visit".to_string(),
            source: accumulated
                .get("src")
                .and_then(|v| v.as_str().map(String::from)),
            medium: accumulated
                .get("med")
                .and_then(|v| v.as_str().map(String::from)),
            campaign: accumulated
                .get("campaign")
                .and_then(|v| v.as_str().map(String::from)),
            raw_params: if misc.is_empty() {
                None
            } else {
                Some(Value::Object(misc))
            },
            ..Default::default()
        })
    }

    /// URL-provided code wins, else the most recently stored code, else None.
    pub fn current_code(&self, url_code: Option<&str>) -> Option<String> {
        if let Some(code) = url_code {
            if !code.trim().is_empty() {
                return Some(code.trim().to_string());
            }
        }
        self.store
            .get(REFERRAL_CODE_KEY)
            .or_else(|| self.store.get(REF_KEY))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_url_params(&self) -> Map<String, Value> {
        self.store
            .get(URL_PARAMS_KEY)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }
}

fn first_param(params: &[(String, String)], name: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, v)| k == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}

/// Set-union-then-join: split the stored value on commas, add the incoming
/// value only if absent, rejoin. First-seen order is preserved.
fn merge_param_value(existing: Option<&str>, incoming: &str) -> String {
    let incoming = incoming.trim();
    let mut parts: Vec<String> = existing
        .map(|e| {
            e.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !parts.iter().any(|p| p == incoming) {
        parts.push(incoming.to_string());
    }

    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn stored_param(store: &MemoryStore, key: &str) -> Option<String> {
        store
            .get(URL_PARAMS_KEY)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|v| v.get(key).and_then(|p| p.as_str().map(String::from)))
    }

    #[test]
    fn repeated_value_is_not_duplicated() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("src", "newsletter")]));

        // second page load over the same persistent store
        let mut capture = CaptureStore::new(capture.store().clone());
        capture.ingest(&params(&[("src", "newsletter")]));

        assert_eq!(
            stored_param(capture.store(), "src").as_deref(),
            Some("newsletter")
        );
    }

    #[test]
    fn new_values_union_in_first_seen_order() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("src", "newsletter")]));

        let mut capture = CaptureStore::new(capture.store().clone());
        capture.ingest(&params(&[("src", "social")]));

        assert_eq!(
            stored_param(capture.store(), "src").as_deref(),
            Some("newsletter,social")
        );
    }

    #[test]
    fn ref_takes_priority_over_referrer() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        let event = capture
            .ingest(&params(&[("referrer", "XYZ"), ("ref", "ABC")]))
            .unwrap();

        assert_eq!(event.code.as_deref(), Some("ABC"));
        assert_eq!(capture.store().get(REFERRAL_CODE_KEY).as_deref(), Some("ABC"));
        assert_eq!(capture.store().get(REF_KEY).as_deref(), Some("ABC"));
    }

    #[test]
    fn clear_storage_wipes_everything_and_emits_nothing() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("src", "newsletter"), ("ref", "ABC"), ("fbclid", "x1")]));

        let mut capture = CaptureStore::new(capture.store().clone());
        let event = capture.ingest(&params(&[("clearStorage", "1"), ("src", "social")]));

        assert!(event.is_none());
        assert!(capture.store().get(URL_PARAMS_KEY).is_none());
        assert!(capture.store().get(REF_KEY).is_none());
        assert!(capture.store().get(REFERRAL_CODE_KEY).is_none());
        assert!(capture.store().get(REFERRAL_DATA_KEY).is_none());
    }

    #[test]
    fn first_visit_without_tracked_params_seeds_direct() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("page", "home")]));

        assert_eq!(
            stored_param(capture.store(), "src").as_deref(),
            Some("direct")
        );
    }

    #[test]
    fn ingest_runs_at_most_once_per_page_load() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("src", "newsletter")]));
        // host double-invocation on the same load must not re-accumulate
        let second = capture.ingest(&params(&[("src", "social")]));

        assert!(second.is_none());
        assert_eq!(
            stored_param(capture.store(), "src").as_deref(),
            Some("newsletter")
        );
    }

    #[test]
    fn misc_params_accumulate_in_raw_bucket() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("fbclid", "x1"), ("ref", "ABC")]));

        let mut capture = CaptureStore::new(capture.store().clone());
        let event = capture.ingest(&params(&[("fbclid", "x2")])).unwrap();

        let raw = event.raw_params.unwrap();
        assert_eq!(raw.get("fbclid").and_then(|v| v.as_str()), Some("x1,x2"));
        // established code carries over onto later events
        assert_eq!(event.code.as_deref(), Some("ABC"));
    }

    #[test]
    fn url_code_wins_over_stored_code() {
        let mut capture = CaptureStore::new(MemoryStore::new());
        capture.ingest(&params(&[("ref", "STORED")]));

        assert_eq!(capture.current_code(Some("FROMURL")).as_deref(), Some("FROMURL"));
        assert_eq!(capture.current_code(None).as_deref(), Some("STORED"));
        assert_eq!(capture.current_code(Some("  ")).as_deref(), Some("STORED"));
    }

    #[test]
    fn no_tracked_state_yields_no_code() {
        let capture = CaptureStore::new(MemoryStore::new());
        assert!(capture.current_code(None).is_none());
    }

    #[test]
    fn merge_preserves_existing_and_dedups() {
        assert_eq!(merge_param_value(None, "newsletter"), "newsletter");
        assert_eq!(
            merge_param_value(Some("newsletter"), "newsletter"),
            "newsletter"
        );
        assert_eq!(
            merge_param_value(Some("newsletter,social"), "ads"),
            "newsletter,social,ads"
        );
    }
}
