//! Kronos core: request validation and timestamp normalization for the Slack
//! timestamp logger.
//!
//! ```text
//! inbound request → Validator → (reject | InboundEvent)
//!                                   ↓
//!                         TimestampNormalizer → EventRecord → persistence
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod response;
pub mod timestamp;
pub mod validation;

pub use domain::action::{describe_action, TimestampAction};
pub use domain::event::{
    EventRecord, FormFields, InboundEvent, RequestHeaders, REQUEST_TIMESTAMP_HEADER,
    SLACK_FORM_FIELDS,
};
pub use errors::{IngestError, ValidationError};
pub use response::{ApiResponse, ResponseStatus};
pub use timestamp::{normalize, CanonicalTimestamp, EpochSeconds, TimestampNormalizer};
pub use validation::{validate, RequiredFields, ValidationResult, Validator};
