use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::timestamp::{CanonicalTimestamp, EpochSeconds};

pub const REQUEST_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const CANONICAL_TIMESTAMP_KEY: &str = "timestamp";

/// Keys the stored record adds on top of the input fields.
pub const RESERVED_RECORD_KEYS: [&str; 2] = [REQUEST_TIMESTAMP_HEADER, CANONICAL_TIMESTAMP_KEY];

pub const TOKEN: &str = "token";
pub const TEAM_ID: &str = "team_id";
pub const TEAM_DOMAIN: &str = "team_domain";
pub const CHANNEL_ID: &str = "channel_id";
pub const CHANNEL_NAME: &str = "channel_name";
pub const USER_ID: &str = "user_id";
pub const USER_NAME: &str = "user_name";
pub const COMMAND: &str = "command";
pub const TEXT: &str = "text";
pub const API_APP_ID: &str = "api_app_id";
pub const IS_ENTERPRISE_INSTALL: &str = "is_enterprise_install";
pub const RESPONSE_URL: &str = "response_url";
pub const TRIGGER_ID: &str = "trigger_id";

/// Every form field a Slack slash command or flattened interaction carries,
/// in the order they are checked.
pub const SLACK_FORM_FIELDS: [&str; 13] = [
    TOKEN,
    TEAM_ID,
    TEAM_DOMAIN,
    CHANNEL_ID,
    CHANNEL_NAME,
    USER_ID,
    USER_NAME,
    COMMAND,
    TEXT,
    API_APP_ID,
    IS_ENTERPRISE_INSTALL,
    RESPONSE_URL,
    TRIGGER_ID,
];

pub type FormFields = BTreeMap<String, String>;

/// Header map with case-insensitive lookup. Names are stored lowercased.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    values: BTreeMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for RequestHeaders
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub request_timestamp: String,
    pub epoch: EpochSeconds,
    pub fields: FormFields,
}

impl InboundEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn into_record(self, timestamp: CanonicalTimestamp) -> EventRecord {
        EventRecord { fields: self.fields, request_timestamp: self.request_timestamp, timestamp }
    }
}

/// The row handed to persistence: the input fields unchanged, plus the raw
/// header under `x-slack-request-timestamp` and the canonical time under
/// `timestamp`. Validation guarantees the input fields never use those keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub fields: FormFields,
    pub request_timestamp: String,
    pub timestamp: CanonicalTimestamp,
}

impl EventRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut flat = self.fields.clone();
        flat.insert(REQUEST_TIMESTAMP_HEADER.to_owned(), self.request_timestamp.clone());
        flat.insert(CANONICAL_TIMESTAMP_KEY.to_owned(), self.timestamp.as_str().to_owned());
        flat
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.to_flat_map();
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (key, value) in &flat {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventRecord, FormFields, InboundEvent, RequestHeaders, SLACK_FORM_FIELDS};
    use crate::timestamp::{normalize, EpochSeconds};

    fn event() -> InboundEvent {
        let fields: FormFields =
            SLACK_FORM_FIELDS.iter().map(|name| (name.to_string(), format!("{name}-v"))).collect();
        InboundEvent {
            request_timestamp: "1727689594".to_owned(),
            epoch: EpochSeconds { secs: 1_727_689_594, nanos: 0 },
            fields,
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let headers = RequestHeaders::new().with("X-Slack-Request-Timestamp", "1");

        assert_eq!(headers.get("x-slack-request-timestamp"), Some("1"));
        assert_eq!(headers.get("X-SLACK-REQUEST-TIMESTAMP"), Some("1"));
        assert_eq!(headers.get("x-slack-signature"), None);
    }

    #[test]
    fn record_keeps_every_input_field_and_adds_two_keys() {
        let event = event();
        let input = event.fields.clone();
        let record: EventRecord = event.into_record(normalize("1727689594").expect("valid"));

        let flat = record.to_flat_map();
        assert_eq!(flat.len(), input.len() + 2);
        for (key, value) in &input {
            assert_eq!(flat.get(key), Some(value), "field `{key}` should be carried unchanged");
        }
        assert_eq!(flat["timestamp"], "2024-09-30 17:46:34");
        assert_eq!(flat["x-slack-request-timestamp"], "1727689594");
    }

    #[test]
    fn record_serializes_as_flat_object() {
        let record = event().into_record(normalize("1727689723").expect("valid"));
        let json = serde_json::to_value(&record).expect("serialize");

        assert_eq!(json["user_id"], "user_id-v");
        assert_eq!(json["timestamp"], "2024-09-30 17:48:43");
        assert_eq!(json["x-slack-request-timestamp"], "1727689594");
        assert_eq!(json.as_object().map(|object| object.len()), Some(15));
    }
}
