//! Server and user preference resolution.
//!
//! A session carries the server's settings and the logged-in user's settings.
//! Normally the user's value wins; when the server sets `forceSettings`, the
//! server's value wins instead. A key only counts as set when it is present
//! and not `null`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Preference key selecting the dark theme.
pub const DARK_MODE: &str = "darkMode";

/// The server and user records of a session, as returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub server: Map<String, Value>,
    #[serde(default)]
    pub user: Map<String, Value>,
}

impl Session {
    pub fn new(server: Map<String, Value>, user: Map<String, Value>) -> Self {
        Self { server, user }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the server overrides user preferences.
    ///
    /// Any truthy value counts, like a JavaScript `Boolean(...)` check.
    pub fn force_settings(&self) -> bool {
        self.server.get("forceSettings").is_some_and(is_truthy)
    }

    /// Resolves a top-level preference field.
    pub fn preference(&self, key: &str) -> Option<&Value> {
        resolve(&self.server, &self.user, key, self.force_settings())
    }

    /// Resolves a preference stored under each record's `attributes` map.
    pub fn attribute_preference(&self, key: &str) -> Option<&Value> {
        let server_attrs = attributes(&self.server);
        let user_attrs = attributes(&self.user);
        match (server_attrs, user_attrs) {
            (Some(s), Some(u)) => resolve(s, u, key, self.force_settings()),
            (Some(s), None) => present(s, key),
            (None, Some(u)) => present(u, key),
            (None, None) => None,
        }
    }

    /// Resolves a top-level preference, deserialized into `T`.
    ///
    /// Falls back to `default` when the key is unset or has the wrong type.
    pub fn preference_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        convert_or(self.preference(key), default)
    }

    /// Resolves an attribute preference, deserialized into `T`.
    pub fn attribute_preference_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        convert_or(self.attribute_preference(key), default)
    }

    /// The `darkMode` attribute preference, `false` when unset.
    pub fn dark_mode(&self) -> bool {
        self.attribute_preference_or(DARK_MODE, false)
    }
}

fn resolve<'a>(
    server: &'a Map<String, Value>,
    user: &'a Map<String, Value>,
    key: &str,
    force_settings: bool,
) -> Option<&'a Value> {
    let (first, second) = if force_settings {
        (server, user)
    } else {
        (user, server)
    };
    present(first, key).or_else(|| present(second, key))
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn attributes(record: &Map<String, Value>) -> Option<&Map<String, Value>> {
    record.get("attributes").and_then(Value::as_object)
}

fn convert_or<T: DeserializeOwned>(value: Option<&Value>, default: T) -> T {
    value
        .and_then(|v| T::deserialize(v).ok())
        .unwrap_or(default)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(server: Value, user: Value) -> Session {
        serde_json::from_value(json!({ "server": server, "user": user })).unwrap()
    }

    #[test]
    fn user_wins_without_force_settings() {
        let s = session(json!({ "map": "osm" }), json!({ "map": "carto" }));
        assert_eq!(s.preference("map"), Some(&json!("carto")));
    }

    #[test]
    fn server_wins_with_force_settings() {
        let s = session(
            json!({ "forceSettings": true, "map": "osm" }),
            json!({ "map": "carto" }),
        );
        assert_eq!(s.preference("map"), Some(&json!("osm")));
    }

    #[test]
    fn null_values_are_skipped() {
        let s = session(json!({ "map": "osm" }), json!({ "map": null }));
        assert_eq!(s.preference("map"), Some(&json!("osm")));

        let forced = session(
            json!({ "forceSettings": 1, "map": null }),
            json!({ "map": "carto" }),
        );
        assert_eq!(forced.preference("map"), Some(&json!("carto")));
    }

    #[test]
    fn missing_everywhere_uses_default() {
        let s = session(json!({}), json!({}));
        assert_eq!(s.preference("map"), None);
        assert_eq!(s.preference_or("zoom", 10u32), 10);
    }

    #[test]
    fn attribute_preferences_follow_the_same_rule() {
        let s = session(
            json!({ "attributes": { "darkMode": false } }),
            json!({ "attributes": { "darkMode": true } }),
        );
        assert!(s.dark_mode());

        let forced = session(
            json!({ "forceSettings": "yes", "attributes": { "darkMode": false } }),
            json!({ "attributes": { "darkMode": true } }),
        );
        assert!(!forced.dark_mode());
    }

    #[test]
    fn attribute_preference_with_one_side_missing() {
        let s = session(json!({ "attributes": { "speedUnit": "kmh" } }), json!({}));
        assert_eq!(s.attribute_preference_or("speedUnit", String::new()), "kmh");
        assert!(!Session::default().dark_mode());
    }

    #[test]
    fn wrong_type_falls_back_to_default() {
        let s = session(json!({}), json!({ "attributes": { "darkMode": "sometimes" } }));
        assert!(!s.dark_mode());
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!({})));
    }
}
