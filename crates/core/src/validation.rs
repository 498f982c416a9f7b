//! Request validation gate.
//!
//! Checks run in a fixed order so that error messages are reproducible:
//! timestamp header presence, then required fields in list order (the first
//! missing one is reported), then reserved record keys, then the timestamp
//! syntax.

use crate::domain::event::{
    FormFields, InboundEvent, RequestHeaders, RESERVED_RECORD_KEYS, REQUEST_TIMESTAMP_HEADER,
    SLACK_FORM_FIELDS, TEXT,
};
use crate::errors::ValidationError;
use crate::timestamp::EpochSeconds;

pub type ValidationResult = Result<InboundEvent, ValidationError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredFields {
    names: Vec<String>,
    free_text: Option<String>,
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self::slack_form()
    }
}

impl RequiredFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect(), free_text: None }
    }

    /// All Slack form fields, with `text` as the free-text field.
    pub fn slack_form() -> Self {
        Self::new(SLACK_FORM_FIELDS).with_free_text(TEXT)
    }

    /// The free-text field may be empty; every other required field may not.
    pub fn with_free_text(mut self, name: impl Into<String>) -> Self {
        self.free_text = Some(name.into());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn is_free_text(&self, name: &str) -> bool {
        self.free_text.as_deref() == Some(name)
    }

    fn first_missing(&self, fields: &FormFields) -> Option<&str> {
        self.names().find(|name| match fields.get(*name) {
            None => true,
            Some(value) => value.is_empty() && !self.is_free_text(name),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validator {
    required: RequiredFields,
}

impl Validator {
    pub fn new(required: RequiredFields) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &RequiredFields {
        &self.required
    }

    pub fn validate(&self, headers: &RequestHeaders, fields: FormFields) -> ValidationResult {
        validate(headers, fields, &self.required)
    }
}

pub fn validate(
    headers: &RequestHeaders,
    fields: FormFields,
    required: &RequiredFields,
) -> ValidationResult {
    let Some(request_timestamp) = headers.get(REQUEST_TIMESTAMP_HEADER) else {
        return Err(ValidationError::MissingHeader);
    };

    if let Some(missing) = required.first_missing(&fields) {
        return Err(ValidationError::MissingField(missing.to_owned()));
    }

    if let Some(reserved) = RESERVED_RECORD_KEYS.iter().find(|key| fields.contains_key(**key)) {
        return Err(ValidationError::ReservedField((*reserved).to_owned()));
    }

    let epoch = EpochSeconds::parse(request_timestamp)?;

    Ok(InboundEvent { request_timestamp: request_timestamp.to_owned(), epoch, fields })
}

#[cfg(test)]
mod tests {
    use super::{validate, RequiredFields, Validator};
    use crate::domain::event::{FormFields, RequestHeaders, SLACK_FORM_FIELDS};
    use crate::errors::ValidationError;

    fn complete_fields() -> FormFields {
        SLACK_FORM_FIELDS.iter().map(|name| (name.to_string(), format!("{name}-value"))).collect()
    }

    fn headers(timestamp: &str) -> RequestHeaders {
        RequestHeaders::new().with("X-Slack-Request-Timestamp", timestamp)
    }

    #[test]
    fn accepts_complete_request_with_numeric_timestamp() {
        let event = Validator::default()
            .validate(&headers("1727689594"), complete_fields())
            .expect("request should be accepted");

        assert_eq!(event.request_timestamp, "1727689594");
        assert_eq!(event.epoch.secs, 1_727_689_594);
        assert_eq!(event.fields, complete_fields());
    }

    #[test]
    fn accepts_fractional_timestamp() {
        let event = Validator::default()
            .validate(&headers("1727689594.123"), complete_fields())
            .expect("fractional timestamp should be accepted");

        assert_eq!(event.epoch.nanos, 123_000_000);
    }

    #[test]
    fn missing_header_wins_over_everything_else() {
        let result = Validator::default().validate(&RequestHeaders::new(), FormFields::new());
        assert_eq!(result, Err(ValidationError::MissingHeader));

        let result = Validator::default()
            .validate(&RequestHeaders::new().with("x-slack-signature", "v0=abc"), complete_fields());
        assert_eq!(result, Err(ValidationError::MissingHeader));
    }

    #[test]
    fn reports_first_missing_field_in_required_order() {
        let mut fields = complete_fields();
        fields.remove("user_name");
        fields.remove("team_id");

        let result = Validator::default().validate(&headers("1727689594"), fields);

        assert_eq!(result, Err(ValidationError::MissingField("team_id".to_owned())));
    }

    #[test]
    fn required_order_comes_from_the_list_not_the_map() {
        let required = RequiredFields::new(["user_name", "team_id"]);
        let result = validate(&headers("1"), FormFields::new(), &required);

        assert_eq!(result, Err(ValidationError::MissingField("user_name".to_owned())));
    }

    #[test]
    fn empty_free_text_is_allowed_but_other_empty_fields_are_missing() {
        let mut fields = complete_fields();
        fields.insert("text".to_owned(), String::new());
        assert!(Validator::default().validate(&headers("1727689594"), fields.clone()).is_ok());

        fields.insert("channel_id".to_owned(), String::new());
        let result = Validator::default().validate(&headers("1727689594"), fields);
        assert_eq!(result, Err(ValidationError::MissingField("channel_id".to_owned())));
    }

    #[test]
    fn free_text_must_still_be_present() {
        let mut fields = complete_fields();
        fields.remove("text");

        let result = Validator::default().validate(&headers("1727689594"), fields);

        assert_eq!(result, Err(ValidationError::MissingField("text".to_owned())));
    }

    #[test]
    fn field_check_runs_before_timestamp_syntax() {
        let mut fields = complete_fields();
        fields.remove("token");

        let result = Validator::default().validate(&headers("not-a-number"), fields);

        assert_eq!(result, Err(ValidationError::MissingField("token".to_owned())));
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        for raw in ["", "abc", "-5", "1.2.3"] {
            let result = Validator::default().validate(&headers(raw), complete_fields());
            assert_eq!(result, Err(ValidationError::InvalidTimestamp), "`{raw}`");
        }
    }

    #[test]
    fn fields_named_like_record_keys_are_rejected() {
        for key in ["timestamp", "x-slack-request-timestamp"] {
            let mut fields = complete_fields();
            fields.insert(key.to_owned(), "2000-01-01 00:00:00".to_owned());

            let result = Validator::default().validate(&headers("1727689594"), fields);

            assert_eq!(result, Err(ValidationError::ReservedField(key.to_owned())), "`{key}`");
        }
    }

    #[test]
    fn extra_fields_are_kept() {
        let mut fields = complete_fields();
        fields.insert("enterprise_id".to_owned(), "E1".to_owned());

        let event =
            Validator::default().validate(&headers("1"), fields).expect("extra fields are fine");

        assert_eq!(event.field("enterprise_id"), Some("E1"));
    }
}
