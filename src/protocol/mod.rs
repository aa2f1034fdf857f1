//! Topic grammar and message types shared by the Stream Hub client

pub mod messages;
pub mod topics;

pub use messages::{
    Event, EventPayload, Timestamp, Trail, TrailPayload, TrailValue, TIMESTAMP_FORMAT,
};
pub use topics::{
    build_handler_topic, parse_handler_topic, validate_agent_id, validate_handler_name,
    HandlerKind, ParsedTopic, TopicError, ValidationError, AGENT_ID_LENGTH,
};
