use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Status used by the dashboard for open items.
pub const STATUS_PROCESSING: i64 = 1;
/// Status used by the dashboard for finished items.
pub const STATUS_COMPLETED: i64 = 2;

/// A to-do item as stored and as returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i64,
    /// Owner. Always taken from the authenticated session, never from input.
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields for create and update.
///
/// Unknown fields (a smuggled `user_id`, `item_id`, ...) are ignored by serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub status: i64,
}

/// `null` reads as an empty string, like an absent field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ItemInput {
    /// A write needs a title and a status past the zero sentinel.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && self.status >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_invalid() {
        let input = ItemInput {
            title: String::new(),
            description: "d".into(),
            status: STATUS_PROCESSING,
        };
        assert!(!input.is_valid());
    }

    #[test]
    fn zero_status_is_invalid() {
        let input = ItemInput {
            title: "buy milk".into(),
            ..Default::default()
        };
        assert!(!input.is_valid());
    }

    #[test]
    fn missing_fields_default_to_invalid_input() {
        let input: ItemInput = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(input.status, 0);
        assert!(!input.is_valid());
    }

    #[test]
    fn null_strings_read_as_empty() {
        let input: ItemInput =
            serde_json::from_str(r#"{"title":"x","description":null,"status":1}"#).unwrap();
        assert_eq!(input.description, "");
        assert!(input.is_valid());

        let input: ItemInput = serde_json::from_str(r#"{"title":null,"status":1}"#).unwrap();
        assert!(!input.is_valid());
    }
}
