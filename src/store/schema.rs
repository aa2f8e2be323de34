use serde::{Deserialize, Serialize};

/// Value kinds an attribute can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    String,
    Number,
    Date,
    Binary,
}

/// One attribute slot of an entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Relationship cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

/// One relationship slot of an entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
}

impl RelationshipDescriptor {
    pub fn new(name: &str, target: &str, cardinality: Cardinality) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            cardinality,
        }
    }
}

/// Immutable descriptor of an entity kind. Produced by the store's metadata;
/// read-only to this framework. Attribute and relationship order is the order
/// formatters see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
    pub relationships: Vec<RelationshipDescriptor>,
}

impl EntitySchema {
    pub fn new(name: &str, attributes: Vec<AttributeDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            relationships: Vec::new(),
        }
    }

    pub fn with_relationships(mut self, relationships: Vec<RelationshipDescriptor>) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
