//! JSON-Schema-shaped output nodes.
//!
//! The serde representation of [`SchemaNode`] is the on-disk format of stored
//! schema files, so field names and skipping rules are part of the contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Description prefix of the cycle-breaking placeholder
pub const CIRCULAR_REFERENCE: &str = "circular reference to";
/// Description of the depth-limit placeholder
pub const MAX_DEPTH_REACHED: &str = "max depth reached";
/// Description of an untyped value
pub const DYNAMIC_VALUE: &str = "dynamic value: any JSON payload is accepted";
/// Description of the fallback emitted when no strategy could resolve a type
pub const SCHEMA_UNAVAILABLE: &str =
    "schema unavailable: type information could not be resolved, the payload shape is unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
}

/// One node of a compiled schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Absent for nodes whose type could not be determined
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl SchemaNode {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    /// Object node with a description and no structure
    pub fn annotated_object(description: impl Into<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        Self {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Object used as a string-keyed map
    pub fn map(values: SchemaNode) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            additional_properties: Some(Box::new(values)),
            ..Default::default()
        }
    }

    /// Object with named properties; an empty `required` list is left out
    pub fn object(properties: BTreeMap<String, SchemaNode>, required: Vec<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            ..Default::default()
        }
    }

    pub fn circular_reference(identity: &str) -> Self {
        Self::annotated_object(format!("{} {}", CIRCULAR_REFERENCE, identity))
    }

    pub fn max_depth_reached() -> Self {
        Self::annotated_object(MAX_DEPTH_REACHED)
    }

    pub fn dynamic() -> Self {
        Self::annotated_object(DYNAMIC_VALUE)
    }

    /// Placeholder signalling degraded information (not an absent body)
    pub fn unavailable() -> Self {
        Self::map(SchemaNode::default()).with_description(SCHEMA_UNAVAILABLE)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this node was produced by the cycle or depth guard
    pub fn is_guard_placeholder(&self) -> bool {
        self.properties.is_none()
            && self.items.is_none()
            && self.additional_properties.is_none()
            && self.description.as_deref().is_some_and(|d| {
                d.starts_with(CIRCULAR_REFERENCE) || d == MAX_DEPTH_REACHED
            })
    }

    /// Whether this node is the degraded fallback placeholder
    pub fn is_unavailable(&self) -> bool {
        self.description.as_deref() == Some(SCHEMA_UNAVAILABLE)
    }

    /// Check the container shape invariants over the whole tree.
    ///
    /// `items` implies `array`, `additionalProperties` implies `object`, never both.
    pub fn is_well_formed(&self) -> bool {
        if self.items.is_some() && self.schema_type != Some(SchemaType::Array) {
            return false;
        }
        if self.additional_properties.is_some() && self.schema_type != Some(SchemaType::Object) {
            return false;
        }
        if self.items.is_some() && self.additional_properties.is_some() {
            return false;
        }
        self.properties
            .iter()
            .flat_map(|props| props.values())
            .chain(self.items.as_deref())
            .chain(self.additional_properties.as_deref())
            .all(SchemaNode::is_well_formed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serialized_field_names() {
        let mut props = BTreeMap::new();
        props.insert(
            "tags".to_string(),
            SchemaNode::array(SchemaNode::of_type(SchemaType::String)),
        );
        props.insert(
            "labels".to_string(),
            SchemaNode::map(SchemaNode::of_type(SchemaType::String)),
        );
        let mut name = SchemaNode::of_type(SchemaType::String);
        name.min_length = Some(1);
        name.enum_values = Some(vec![json!("a")]);
        props.insert("name".to_string(), name);
        let node = SchemaNode::object(props, vec!["name".to_string()]);

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                    "name": {"type": "string", "minLength": 1, "enum": ["a"]},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let mut node = SchemaNode::of_type(SchemaType::Integer);
        node.minimum = Some(0.0);
        node.maximum = Some(99.5);
        node.example = Some(json!(7));
        let text = serde_json::to_string(&node).unwrap();
        let back: SchemaNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_placeholders() {
        assert!(SchemaNode::circular_reference("Node").is_guard_placeholder());
        assert!(SchemaNode::max_depth_reached().is_guard_placeholder());
        assert!(!SchemaNode::dynamic().is_guard_placeholder());
        assert_eq!(
            SchemaNode::circular_reference("Node").description.as_deref(),
            Some("circular reference to Node")
        );
        let fallback = SchemaNode::unavailable();
        assert!(fallback.is_unavailable());
        assert!(fallback.is_well_formed());
    }

    #[test]
    fn test_shape_invariant_check() {
        let mut broken = SchemaNode::of_type(SchemaType::Object);
        broken.items = Some(Box::new(SchemaNode::default()));
        assert!(!broken.is_well_formed());

        let nested = SchemaNode::array(SchemaNode::map(SchemaNode::dynamic()));
        assert!(nested.is_well_formed());
    }
}
