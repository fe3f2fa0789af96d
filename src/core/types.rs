//! DK-002: Resource descriptors, type tokens, run states and provenance events.
//!
//! A descriptor is the immutable record a constructor call produces. Events
//! are the JSONL provenance records a run appends to its event log.

use super::error::{Error, Result};
use super::value::PropertyValue;
use crate::tripwire::hasher;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-token prefix shared by every provider resource.
pub const PROVIDER_TOKEN_PREFIX: &str = "pulumi:providers:";

// ============================================================================
// Type tokens
// ============================================================================

/// A `package:module:Type` token identifying which constructor built a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeToken(String);

impl TypeToken {
    /// Parse a token. Exactly three non-empty `:`-separated parts are required.
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::invalid(
                "type",
                format!("type token must be package:module:Type, got \"{}\"", token),
            ));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn package(&self) -> &str {
        self.part(0)
    }

    pub fn module(&self) -> &str {
        self.part(1)
    }

    pub fn type_name(&self) -> &str {
        self.part(2)
    }

    /// True for `pulumi:providers:<pkg>` tokens.
    pub fn is_provider(&self) -> bool {
        self.0.starts_with(PROVIDER_TOKEN_PREFIX)
    }

    fn part(&self, i: usize) -> &str {
        self.0.split(':').nth(i).unwrap_or_default()
    }
}

impl TryFrom<String> for TypeToken {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<TypeToken> for String {
    fn from(t: TypeToken) -> Self {
        t.0
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Parent/provider relations for a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOptions {
    /// Logical name of the parent resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Logical name of the provider resource that realizes this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ResourceOptions {
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.provider = Some(name.into());
        self
    }
}

/// A registered declaration. Built once by a constructor, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    name: String,
    type_token: TypeToken,
    inputs: IndexMap<String, PropertyValue>,
    options: ResourceOptions,
}

impl ResourceDescriptor {
    pub(crate) fn new(
        name: String,
        type_token: TypeToken,
        inputs: IndexMap<String, PropertyValue>,
        options: ResourceOptions,
    ) -> Self {
        Self {
            name,
            type_token,
            inputs,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_token(&self) -> &TypeToken {
        &self.type_token
    }

    /// Provided inputs only; omitted fields are absent.
    pub fn inputs(&self) -> &IndexMap<String, PropertyValue> {
        &self.inputs
    }

    pub fn input(&self, key: &str) -> Option<&PropertyValue> {
        self.inputs.get(key)
    }

    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    /// BLAKE3 of type, name, options and key-sorted inputs.
    pub fn hash(&self) -> String {
        let mut components = vec![self.type_token.to_string(), format!("{:?}", self.name)];
        if let Some(ref parent) = self.options.parent {
            components.push(format!("parent={:?}", parent));
        }
        if let Some(ref provider) = self.options.provider {
            components.push(format!("provider={:?}", provider));
        }
        let mut keys: Vec<&String> = self.inputs.keys().collect();
        keys.sort();
        for key in keys {
            components.push(format!("{:?}={}", key, self.inputs[key].canonical()));
        }
        let refs: Vec<&str> = components.iter().map(String::as_str).collect();
        hasher::composite_hash(&refs)
    }
}

// ============================================================================
// Run state
// ============================================================================

/// Run driver state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT-STARTED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

// ============================================================================
// Provenance events
// ============================================================================

/// Provenance event for the JSONL event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        project: String,
        stack: String,
        run_id: String,
        declkit_version: String,
    },
    ResourceRegistered {
        run_id: String,
        resource: String,
        #[serde(rename = "type")]
        type_token: String,
        hash: String,
    },
    RunSucceeded {
        run_id: String,
        resources: u32,
        fingerprint: String,
        total_seconds: f64,
    },
    RunFailed {
        run_id: String,
        kind: String,
        error: String,
        total_seconds: f64,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: RunEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(answer: f64) -> ResourceDescriptor {
        let mut inputs = IndexMap::new();
        inputs.insert(
            "answer".to_string(),
            PropertyValue::number(answer).unwrap(),
        );
        ResourceDescriptor::new(
            "Question".to_string(),
            TypeToken::parse("pkg:module:Object").unwrap(),
            inputs,
            ResourceOptions::default(),
        )
    }

    #[test]
    fn test_dk002_type_token_parts() {
        let t = TypeToken::parse("pkg:module:Object").unwrap();
        assert_eq!(t.package(), "pkg");
        assert_eq!(t.module(), "module");
        assert_eq!(t.type_name(), "Object");
        assert!(!t.is_provider());
        assert!(TypeToken::parse("pulumi:providers:pkg").unwrap().is_provider());
    }

    #[test]
    fn test_dk002_type_token_rejects_malformed() {
        assert!(TypeToken::parse("pkg:Object").is_err());
        assert!(TypeToken::parse("pkg::Object").is_err());
        assert!(TypeToken::parse("a:b:c:d").is_err());
    }

    #[test]
    fn test_dk002_type_token_serde() {
        let t = TypeToken::parse("pkg:index:Thing").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"pkg:index:Thing\"");
        let bad: std::result::Result<TypeToken, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_dk002_descriptor_hash_deterministic() {
        assert_eq!(descriptor(42.0).hash(), descriptor(42.0).hash());
        assert_ne!(descriptor(42.0).hash(), descriptor(24.0).hash());
        assert!(descriptor(42.0).hash().starts_with("blake3:"));
    }

    fn with_input(name: &str, key: &str, value: PropertyValue) -> ResourceDescriptor {
        let mut inputs = IndexMap::new();
        inputs.insert(key.to_string(), value);
        ResourceDescriptor::new(
            name.to_string(),
            TypeToken::parse("pulumi:providers:pkg").unwrap(),
            inputs,
            ResourceOptions::default(),
        )
    }

    #[test]
    fn test_dk002_equal_descriptors_hash_equal_across_zero_sign() {
        let pos = with_input("Q", "answer", PropertyValue::Number(0.0));
        let neg = with_input("Q", "answer", PropertyValue::Number(-0.0));
        assert_eq!(pos, neg);
        assert_eq!(pos.hash(), neg.hash());
        assert_eq!(descriptor(0.0).hash(), descriptor(-0.0).hash());
    }

    #[test]
    fn test_dk002_crafted_map_key_changes_hash() {
        let plain = PropertyValue::map([
            ("a", PropertyValue::string("1")),
            ("b", PropertyValue::string("2")),
        ])
        .unwrap();
        let crafted =
            PropertyValue::map([(r#"a: "1", b"#, PropertyValue::string("2"))]).unwrap();
        let a = with_input("P", "objectProp", plain);
        let b = with_input("P", "objectProp", crafted);
        assert_ne!(a, b);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_dk002_crafted_input_key_changes_hash() {
        let a = with_input("P", "x", PropertyValue::string("1"));
        let b = with_input("P", r#"x="1""#, PropertyValue::bool(true));
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_dk002_descriptor_hash_includes_options() {
        let plain = descriptor(42.0);
        let parented = ResourceDescriptor::new(
            plain.name().to_string(),
            plain.type_token().clone(),
            plain.inputs().clone(),
            ResourceOptions::default().parent("Other"),
        );
        assert_ne!(plain.hash(), parented.hash());
    }

    #[test]
    fn test_dk002_run_state_terminal() {
        assert!(!RunState::NotStarted.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert_eq!(RunState::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_dk002_run_event_serde() {
        let event = RunEvent::ResourceRegistered {
            run_id: "r-abc".to_string(),
            resource: "Other".to_string(),
            type_token: "pkg:index:Thing".to_string(),
            hash: "blake3:xyz".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"resource_registered\""));
        assert!(json.contains("\"type\":\"pkg:index:Thing\""));
    }
}
