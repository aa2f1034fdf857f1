//! Topic grammar and parameter validation for Stream Hub subscriptions
//!
//! Trail and event messages arrive on topics of the form
//! `agent/{agent_id}/{kind}/{name}`. This module builds those topics at
//! registration time and takes them back apart at dispatch time.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed length of an agent client id.
pub const AGENT_ID_LENGTH: usize = 32;

/// Message category carried in the topic and the handler key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Trail,
    Event,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Trail => "trail",
            HandlerKind::Event => "event",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trail" => Ok(HandlerKind::Trail),
            "event" => Ok(HandlerKind::Event),
            other => Err(TopicError::UnknownKind(other.to_string())),
        }
    }
}

/// Validation errors for registration parameters
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("agent client id should be a 32 character string, got {0} characters")]
    InvalidAgentIdLength(usize),
    #[error("{kind} name should be at least 1 character")]
    EmptyName { kind: HandlerKind },
}

/// Errors produced when taking an inbound topic apart
#[derive(Debug, Error, PartialEq)]
pub enum TopicError {
    #[error("topic should have at least 4 segments: '{0}'")]
    TooFewSegments(String),
    #[error("topic should start with the 'agent' segment: '{0}'")]
    InvalidPrefix(String),
    #[error("unknown message kind in topic: '{0}'")]
    UnknownKind(String),
}

pub fn validate_agent_id(agent_id: &str) -> Result<(), ValidationError> {
    let len = agent_id.chars().count();
    if len != AGENT_ID_LENGTH {
        return Err(ValidationError::InvalidAgentIdLength(len));
    }
    Ok(())
}

pub fn validate_handler_name(kind: HandlerKind, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName { kind });
    }
    Ok(())
}

/// Build the fully qualified subscription topic for one handler key.
pub fn build_handler_topic(kind: HandlerKind, agent_id: &str, name: &str) -> String {
    format!("agent/{agent_id}/{kind}/{name}")
}

/// Components recovered from an inbound message topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    pub agent_id: String,
    pub kind: HandlerKind,
    pub name: String,
}

/// Take an inbound topic apart: the agent id is the second slash-delimited
/// segment, the kind the third, and the name the last.
pub fn parse_handler_topic(topic: &str) -> Result<ParsedTopic, TopicError> {
    let segments: Vec<&str> = topic.split('/').collect();

    if segments.len() < 4 {
        return Err(TopicError::TooFewSegments(topic.to_string()));
    }
    if segments[0] != "agent" {
        return Err(TopicError::InvalidPrefix(topic.to_string()));
    }

    let kind = segments[2].parse()?;

    Ok(ParsedTopic {
        agent_id: segments[1].to_string(),
        kind,
        name: segments[segments.len() - 1].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const AGENT: &str = "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

    #[test]
    fn test_build_handler_topic() {
        assert_eq!(
            build_handler_topic(HandlerKind::Trail, AGENT, "engine_temperature"),
            format!("agent/{AGENT}/trail/engine_temperature")
        );
        assert_eq!(
            build_handler_topic(HandlerKind::Event, AGENT, "started"),
            format!("agent/{AGENT}/event/started")
        );
    }

    #[test]
    fn test_parse_handler_topic() {
        let parsed = parse_handler_topic(&format!("agent/{AGENT}/trail/speed")).unwrap();
        assert_eq!(parsed.agent_id, AGENT);
        assert_eq!(parsed.kind, HandlerKind::Trail);
        assert_eq!(parsed.name, "speed");

        let parsed = parse_handler_topic(&format!("agent/{AGENT}/event/started")).unwrap();
        assert_eq!(parsed.kind, HandlerKind::Event);
        assert_eq!(parsed.name, "started");
    }

    #[test]
    fn test_parse_handler_topic_name_is_last_segment() {
        // Extra segments fold into the name position: the last segment wins.
        let parsed = parse_handler_topic(&format!("agent/{AGENT}/trail/extra/speed")).unwrap();
        assert_eq!(parsed.name, "speed");
    }

    #[test]
    fn test_parse_handler_topic_errors() {
        assert_eq!(
            parse_handler_topic("agent/abc/trail"),
            Err(TopicError::TooFewSegments("agent/abc/trail".to_string()))
        );
        assert_eq!(
            parse_handler_topic("device/abc/trail/speed"),
            Err(TopicError::InvalidPrefix(
                "device/abc/trail/speed".to_string()
            ))
        );
        assert_eq!(
            parse_handler_topic("agent/abc/metric/speed"),
            Err(TopicError::UnknownKind("metric".to_string()))
        );
    }

    #[test]
    fn test_validate_agent_id() {
        assert!(validate_agent_id(AGENT).is_ok());
        assert_eq!(
            validate_agent_id(""),
            Err(ValidationError::InvalidAgentIdLength(0))
        );
        assert_eq!(
            validate_agent_id("too-short"),
            Err(ValidationError::InvalidAgentIdLength(9))
        );
        assert_eq!(
            validate_agent_id(&"x".repeat(33)),
            Err(ValidationError::InvalidAgentIdLength(33))
        );
    }

    #[test]
    fn test_validate_handler_name() {
        assert!(validate_handler_name(HandlerKind::Trail, "speed").is_ok());
        assert_eq!(
            validate_handler_name(HandlerKind::Trail, ""),
            Err(ValidationError::EmptyName {
                kind: HandlerKind::Trail
            })
        );
        assert_eq!(
            validate_handler_name(HandlerKind::Event, ""),
            Err(ValidationError::EmptyName {
                kind: HandlerKind::Event
            })
        );
    }

    #[test]
    fn test_handler_kind_round_trip() {
        assert_eq!("trail".parse::<HandlerKind>().unwrap(), HandlerKind::Trail);
        assert_eq!("event".parse::<HandlerKind>().unwrap(), HandlerKind::Event);
        assert!("Trail".parse::<HandlerKind>().is_err());
        assert!("".parse::<HandlerKind>().is_err());
    }

    proptest! {
        #[test]
        fn parse_inverts_build(
            agent_id in "[a-f0-9]{32}",
            name in "[a-zA-Z0-9_-]{1,24}",
            trail in proptest::bool::ANY,
        ) {
            let kind = if trail { HandlerKind::Trail } else { HandlerKind::Event };
            let topic = build_handler_topic(kind, &agent_id, &name);
            let parsed = parse_handler_topic(&topic).unwrap();
            prop_assert_eq!(parsed.agent_id, agent_id);
            prop_assert_eq!(parsed.kind, kind);
            prop_assert_eq!(parsed.name, name);
        }
    }
}
