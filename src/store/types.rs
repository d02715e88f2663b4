//! Table names and insert row shapes.

use serde::Deserialize;
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Tables exposed through the data proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    /// Workout sessions.
    Sessions,
    /// Nutrition entries.
    Nutrition,
}

/// Caller body for a new session. Both fields are passed through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInput {
    /// Total lifted volume.
    #[serde(default)]
    pub total_volume: Option<Value>,
    /// Exercise details, opaque to the proxy.
    #[serde(default)]
    pub exercises: Option<Value>,
}

impl SessionInput {
    /// Build the row to insert. Absent fields are left out rather than sent as null.
    pub fn into_row(self, user_id: &str) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("user_id".to_string(), Value::String(user_id.to_string()));
        if let Some(total_volume) = self.total_volume {
            row.insert("total_volume".to_string(), total_volume);
        }
        if let Some(exercises) = self.exercises {
            row.insert("exercises".to_string(), exercises);
        }
        row
    }
}

/// Merge a caller body with the owner id. The header id always wins.
pub fn nutrition_row(mut body: Map<String, Value>, user_id: &str) -> Map<String, Value> {
    body.insert("user_id".to_string(), Value::String(user_id.to_string()));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn table_names_match_store() {
        assert_eq!(Table::Sessions.as_ref(), "sessions");
        assert_eq!(Table::Nutrition.to_string(), "nutrition");
        assert_eq!(Table::from_str("sessions").unwrap(), Table::Sessions);
    }

    #[test]
    fn session_row_omits_absent_fields() {
        let input: SessionInput = serde_json::from_value(json!({ "total_volume": 100 })).unwrap();
        let row = input.into_row("u1");

        assert_eq!(
            Value::Object(row),
            json!({ "user_id": "u1", "total_volume": 100 })
        );
    }

    #[test]
    fn session_row_drops_unknown_fields() {
        let input: SessionInput = serde_json::from_value(json!({
            "total_volume": 2500.5,
            "exercises": [{ "name": "squat", "sets": 5 }],
            "user_id": "someone-else",
            "notes": "ignored"
        }))
        .unwrap();
        let row = input.into_row("u1");

        assert_eq!(
            Value::Object(row),
            json!({
                "user_id": "u1",
                "total_volume": 2500.5,
                "exercises": [{ "name": "squat", "sets": 5 }]
            })
        );
    }

    #[test]
    fn nutrition_row_overrides_caller_user_id() {
        let body = json!({ "food": "egg", "user_id": "spoofed" });
        let Value::Object(body) = body else {
            unreachable!()
        };

        let row = nutrition_row(body, "u2");
        assert_eq!(Value::Object(row), json!({ "food": "egg", "user_id": "u2" }));
    }
}
