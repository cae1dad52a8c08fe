//! Page commands accepted by a session.
//!
//! A [`Command`] is the unit of work a client sends to a session's tab.
//! Commands use a `name`-tagged wire format:
//!
//! ```json
//! { "name": "navigate", "url": "https://example.com/" }
//! { "name": "click", "selector": "#submit" }
//! { "name": "type", "selector": "#qty", "text": "3" }
//! ```
//!
//! The `type` command accepts its `text` field as either a JSON string
//! or a JSON number; numbers are typed out using their decimal form.

use std::fmt;

use serde::de::{Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use url::Url;

/// A single command to run against a session's page.
///
/// Commands run sequentially per session: each one completes (or fails)
/// before the session picks up the next.
///
/// # Example
///
/// ```rust
/// use browser_session_api::Command;
///
/// let command: Command =
///     serde_json::from_str(r##"{ "name": "click", "selector": "#submit" }"##).unwrap();
/// assert_eq!(command, Command::Click { selector: "#submit".to_string() });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Command {
    /// Navigate the page to `url` and wait for the load to settle.
    Navigate {
        /// Absolute URL to load.
        url: Url,
    },

    /// Click the first element matching `selector`.
    Click {
        /// CSS selector of the element to click.
        selector: String,
    },

    /// Type `text` into the first element matching `selector`.
    Type {
        /// CSS selector of the element to receive the text.
        selector: String,
        /// Text to type. Accepts a JSON string or number on the wire.
        #[serde(deserialize_with = "string_or_number")]
        text: String,
    },
}

impl Command {
    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Navigate { .. } => "navigate",
            Command::Click { .. } => "click",
            Command::Type { .. } => "type",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Navigate { url } => write!(f, "navigate {}", url),
            Command::Click { selector } => write!(f, "click {}", selector),
            Command::Type { selector, .. } => write!(f, "type into {}", selector),
        }
    }
}

/// Accept a string or a number, yielding the string form either way.
///
/// Clients frequently send numeric form values unquoted; rejecting them
/// would make the API needlessly strict.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies the wire format of each command variant.
    #[test]
    fn test_deserialize_commands() {
        let navigate: Command =
            serde_json::from_str(r#"{ "name": "navigate", "url": "https://example.com/page" }"#)
                .unwrap();
        assert_eq!(
            navigate,
            Command::Navigate {
                url: Url::parse("https://example.com/page").unwrap()
            }
        );

        let click: Command =
            serde_json::from_str(r##"{ "name": "click", "selector": "#submit" }"##).unwrap();
        assert_eq!(
            click,
            Command::Click {
                selector: "#submit".to_string()
            }
        );

        let type_cmd: Command =
            serde_json::from_str(r##"{ "name": "type", "selector": "#user", "text": "alice" }"##)
                .unwrap();
        assert_eq!(
            type_cmd,
            Command::Type {
                selector: "#user".to_string(),
                text: "alice".to_string()
            }
        );
    }

    /// Verifies that numeric text values are accepted for type commands.
    #[test]
    fn test_type_accepts_numeric_text() {
        let quantity: Command =
            serde_json::from_str(r##"{ "name": "type", "selector": "#qty", "text": 42 }"##)
                .unwrap();
        assert_eq!(
            quantity,
            Command::Type {
                selector: "#qty".to_string(),
                text: "42".to_string()
            }
        );

        let price: Command =
            serde_json::from_str(r##"{ "name": "type", "selector": "#price", "text": 19.5 }"##)
                .unwrap();
        assert_eq!(
            price,
            Command::Type {
                selector: "#price".to_string(),
                text: "19.5".to_string()
            }
        );

        let negative: Command =
            serde_json::from_str(r##"{ "name": "type", "selector": "#delta", "text": -3 }"##)
                .unwrap();
        assert_eq!(
            negative,
            Command::Type {
                selector: "#delta".to_string(),
                text: "-3".to_string()
            }
        );
    }

    /// Verifies that serialization produces the name-tagged shape.
    #[test]
    fn test_serialize_commands() {
        let navigate = Command::Navigate {
            url: Url::parse("https://example.com/").unwrap(),
        };
        let json = serde_json::to_value(&navigate).unwrap();
        assert_eq!(json["name"], "navigate");
        assert_eq!(json["url"], "https://example.com/");

        let type_cmd = Command::Type {
            selector: "#qty".to_string(),
            text: "42".to_string(),
        };
        let json = serde_json::to_value(&type_cmd).unwrap();
        assert_eq!(json["name"], "type");
        assert_eq!(json["text"], "42");
    }

    /// Verifies that unknown command names are rejected.
    #[test]
    fn test_unknown_command_rejected() {
        let result: Result<Command, _> =
            serde_json::from_str(r#"{ "name": "scroll", "amount": 10 }"#);
        assert!(result.is_err());
    }

    /// Verifies that a navigate command requires a parseable URL.
    #[test]
    fn test_navigate_requires_valid_url() {
        let result: Result<Command, _> =
            serde_json::from_str(r#"{ "name": "navigate", "url": "not a url" }"#);
        assert!(result.is_err());
    }

    /// Verifies command names and display forms.
    #[test]
    fn test_command_names_and_display() {
        let click = Command::Click {
            selector: "#go".to_string(),
        };
        assert_eq!(click.name(), "click");
        assert_eq!(click.to_string(), "click #go");

        let type_cmd = Command::Type {
            selector: "#pw".to_string(),
            text: "secret".to_string(),
        };
        // Text stays out of the display form
        assert_eq!(type_cmd.to_string(), "type into #pw");
    }
}
