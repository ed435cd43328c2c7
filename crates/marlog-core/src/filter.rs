//! Sensitive-data filter
//!
//! Scrubbing is pure and total: every input produces an output, nothing
//! panics, and the output of a scrub is a fixed point of the same scrub.
//!
//! Rules, per key of a mapping:
//! - key in the sensitive set (case-insensitive) → `"[redacted]"`, no descent
//! - nested mapping or list → scrubbed recursively
//! - opaque handle → `"[object <type>]"`
//! - string over 16000 characters → cut to 16000 plus `"... [truncated]"`
//! - anything else passes through
//!
//! Nesting deeper than `max_depth` collapses to `"[depth limit]"`.

use crate::value::{Context, Value};
use marlog_core_types::schema::{DEPTH_LIMIT, REDACTED, TRUNCATED};
use marlog_core_types::RequestMeta;
use std::collections::BTreeSet;

/// Strings longer than this many characters are truncated
pub const MAX_STRING_CHARS: usize = 16_000;

/// Request bodies are summarised to this many bytes
pub const MAX_BODY_SNIPPET_BYTES: usize = 4_000;

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Keys redacted when the configuration names none
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "pass",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "cookie",
    "set-cookie",
    "access_token",
    "refresh_token",
    "credit_card",
    "cc",
    "ssn",
    "nid",
    "pin",
    "otp",
    "private_key",
    "client_secret",
];

/// Scrubs a context before it is formatted
pub trait ContextFilter: Send + Sync {
    fn scrub(&self, data: &Context) -> Context;
}

/// Key-based redaction filter
#[derive(Debug, Clone)]
pub struct SensitiveDataFilter {
    keys: BTreeSet<String>,
    max_depth: usize,
}

impl SensitiveDataFilter {
    /// Create a filter for the given keys (lowercased on the way in)
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_default_keys() -> Self {
        Self::new(DEFAULT_SENSITIVE_KEYS.iter().copied())
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    fn scrub_map(&self, data: &Context, depth: usize) -> Context {
        data.iter()
            .map(|(key, value)| {
                let scrubbed = if self.is_sensitive(key) {
                    Value::Str(REDACTED.to_string())
                } else {
                    self.scrub_value(value, depth + 1)
                };
                (key.clone(), scrubbed)
            })
            .collect()
    }

    fn scrub_value(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::Map(_) | Value::List(_) if depth >= self.max_depth => {
                Value::Str(DEPTH_LIMIT.to_string())
            }
            Value::Map(map) => Value::Map(self.scrub_map(map, depth)),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.scrub_value(item, depth + 1))
                    .collect(),
            ),
            Value::Opaque(o) => Value::Str(format!("[object {}]", o.type_name())),
            Value::Str(s) => Value::Str(truncate_if_huge(s)),
            other => other.clone(),
        }
    }

    /// Summarise the current request for an error report
    ///
    /// Query parameters are scrubbed like any context; the body (only for
    /// non-GET requests) is cut to a short snippet and never parsed.
    pub fn scrub_request(&self, meta: &RequestMeta, query: &Context, body: Option<&str>) -> Context {
        let mut server = Context::new();
        server.insert("method".to_string(), Value::from(meta.method.clone()));
        server.insert("uri".to_string(), Value::from(meta.uri.clone()));
        server.insert("host".to_string(), Value::from(meta.host.clone()));
        server.insert("ip".to_string(), Value::from(meta.ip.clone()));
        server.insert("ua".to_string(), Value::from(meta.user_agent.clone()));

        let is_get = meta
            .method
            .as_deref()
            .map_or(true, |m| m.eq_ignore_ascii_case("GET"));
        let snippet = match body {
            Some(raw) if !is_get && !raw.is_empty() => Value::Str(body_snippet(raw)),
            _ => Value::Null,
        };

        let mut out = Context::new();
        out.insert("query".to_string(), Value::Map(self.scrub(query)));
        out.insert("server".to_string(), Value::Map(server));
        out.insert("body_snippet".to_string(), snippet);
        out
    }
}

impl Default for SensitiveDataFilter {
    fn default() -> Self {
        Self::with_default_keys()
    }
}

impl ContextFilter for SensitiveDataFilter {
    fn scrub(&self, data: &Context) -> Context {
        self.scrub_map(data, 0)
    }
}

fn truncate_if_huge(s: &str) -> String {
    match s.char_indices().nth(MAX_STRING_CHARS) {
        Some((cut, _)) if !is_already_truncated(s) => format!("{}{}", &s[..cut], TRUNCATED),
        _ => s.to_string(),
    }
}

// A string this filter produced: exactly the limit followed by the marker.
fn is_already_truncated(s: &str) -> bool {
    s.strip_suffix(TRUNCATED)
        .is_some_and(|head| head.chars().count() == MAX_STRING_CHARS)
}

fn body_snippet(raw: &str) -> String {
    if raw.len() <= MAX_BODY_SNIPPET_BYTES {
        return raw.to_string();
    }
    let mut cut = MAX_BODY_SNIPPET_BYTES;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &raw[..cut], TRUNCATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx;
    use proptest::prelude::*;

    fn filter() -> SensitiveDataFilter {
        SensitiveDataFilter::new(["password", "Token", "authorization"])
    }

    #[test]
    fn test_redacts_case_insensitively() {
        let out = filter().scrub(&ctx! { "PassWord" => "hunter2", "user" => "alice" });
        assert_eq!(out["PassWord"], Value::from(REDACTED));
        assert_eq!(out["user"], Value::from("alice"));
    }

    #[test]
    fn test_redacted_maps_are_not_descended() {
        let nested = ctx! { "inner" => "x" };
        let out = filter().scrub(&ctx! { "token" => nested });
        assert_eq!(out["token"], Value::from(REDACTED));
    }

    #[test]
    fn test_recurses_into_maps_and_lists() {
        let input = ctx! {
            "user" => ctx! { "name" => "bob", "password" => "pw" },
            "attempts" => vec![Value::Map(ctx! { "authorization" => "Bearer abc" })],
        };
        let out = filter().scrub(&input);
        let user = out["user"].as_map().unwrap();
        assert_eq!(user["password"], Value::from(REDACTED));
        assert_eq!(user["name"], Value::from("bob"));
        match &out["attempts"] {
            Value::List(items) => {
                assert_eq!(items[0].as_map().unwrap()["authorization"], Value::from(REDACTED))
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_opaque_becomes_placeholder() {
        let out = filter().scrub(&ctx! { "handle" => Value::opaque(7u16) });
        assert_eq!(out["handle"], Value::from("[object u16]"));
    }

    #[test]
    fn test_truncates_huge_strings() {
        let huge = "é".repeat(MAX_STRING_CHARS + 10);
        let out = filter().scrub(&ctx! { "blob" => huge });
        let s = out["blob"].as_str().unwrap();
        assert!(s.ends_with(TRUNCATED));
        assert_eq!(s.chars().count(), MAX_STRING_CHARS + TRUNCATED.chars().count());
    }

    #[test]
    fn test_string_at_limit_untouched() {
        let exact = "a".repeat(MAX_STRING_CHARS);
        let out = filter().scrub(&ctx! { "blob" => exact.clone() });
        assert_eq!(out["blob"], Value::Str(exact));
    }

    #[test]
    fn test_depth_limit_collapses_deep_nesting() {
        let mut value = Value::from("leaf");
        for _ in 0..10 {
            value = Value::Map(ctx! { "next" => value });
        }
        let filter = filter().with_max_depth(3);
        let out = filter.scrub(&ctx! { "root" => value });
        let lvl1 = out["root"].as_map().unwrap();
        let lvl2 = lvl1["next"].as_map().unwrap();
        assert_eq!(lvl2["next"], Value::from(DEPTH_LIMIT));
    }

    #[test]
    fn test_scrub_request_summary() {
        let meta = RequestMeta::new().with_method("POST").with_uri("/login");
        let body = "x".repeat(MAX_BODY_SNIPPET_BYTES + 1);
        let out = filter().scrub_request(&meta, &ctx! { "token" => "abc", "page" => 2 }, Some(&body));

        let query = out["query"].as_map().unwrap();
        assert_eq!(query["token"], Value::from(REDACTED));
        assert_eq!(query["page"], Value::Int(2));
        assert_eq!(out["server"].as_map().unwrap()["method"], Value::from("POST"));
        assert!(out["body_snippet"].as_str().unwrap().ends_with(TRUNCATED));
    }

    #[test]
    fn test_scrub_request_skips_body_for_get() {
        let meta = RequestMeta::new().with_method("get");
        let out = filter().scrub_request(&meta, &Context::new(), Some("payload"));
        assert!(out["body_snippet"].is_null());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            "[a-z]{0,12}".prop_map(Value::Str),
            (MAX_STRING_CHARS - 2..MAX_STRING_CHARS + 20)
                .prop_map(|n| Value::Str("z".repeat(n))),
            Just(Value::from(REDACTED)),
        ];
        leaf.prop_recursive(6, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map(
                    prop_oneof!["[a-z]{1,8}", Just("PASSWORD".to_string()), Just("token".to_string())],
                    inner,
                    0..4
                )
                .prop_map(Value::Map),
            ]
        })
    }

    fn arb_context() -> impl Strategy<Value = Context> {
        prop::collection::btree_map(
            prop_oneof!["[a-z_]{1,10}", Just("Password".to_string())],
            arb_value(),
            0..6,
        )
    }

    fn assert_no_sensitive_values(filter: &SensitiveDataFilter, ctx: &Context) {
        for (k, v) in ctx {
            if filter.is_sensitive(k) {
                assert_eq!(v, &Value::from(REDACTED));
            } else if let Value::Map(inner) = v {
                assert_no_sensitive_values(filter, inner);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_scrub_is_idempotent(input in arb_context()) {
            let f = filter().with_max_depth(4);
            let once = f.scrub(&input);
            let twice = f.scrub(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_sensitive_keys_always_redacted(input in arb_context()) {
            let f = filter();
            let out = f.scrub(&input);
            assert_no_sensitive_values(&f, &out);
        }
    }
}
