//! Domain records returned by the Sheldon service.
//!
//! # Design
//! `Node` and `Edge` are snapshots: they are decoded from a response body and
//! never change afterwards. Edges carry endpoint ids, not nodes; resolving an
//! endpoint takes another request (see `SheldonClient::fetch_neighbours`).
//!
//! Identifiers are not normalised. The service sends node ids as strings from
//! search and as integers from some lookups, edge ids as integers and edge
//! endpoints as strings. `Id` keeps whichever representation arrived:
//!
//! | field        | usual wire type |
//! |--------------|-----------------|
//! | `Node::id`   | string (search, create), integer (`/nodes/{id}`) |
//! | `Edge::id`   | integer |
//! | `Edge::from` | string |
//! | `Edge::to`   | string |

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Free-form JSON attributes attached to a node or edge.
pub type Payload = Map<String, Value>;

/// A node or edge identifier as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(id) => write!(f, "{id}"),
            Id::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Id::Int(id)
    }
}

impl From<i32> for Id {
    fn from(id: i32) -> Self {
        Id::Int(id.into())
    }
}

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Id::Int(id.into())
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Id::Str(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Id::Str(id)
    }
}

impl From<&Id> for Id {
    fn from(id: &Id) -> Self {
        id.clone()
    }
}

impl From<&Node> for Id {
    fn from(node: &Node) -> Self {
        node.id.clone()
    }
}

impl From<&Edge> for Id {
    fn from(edge: &Edge) -> Self {
        edge.id.clone()
    }
}

/// A typed entity in the remote graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: Id,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    payload: Payload,
}

impl Node {
    pub fn new(id: impl Into<Id>, kind: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            payload,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The node type label, e.g. `Movie`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {} ({})", self.id, self.kind)
    }
}

/// A directed, typed relation between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: Id,
    #[serde(rename = "type", default)]
    kind: String,
    from: Id,
    to: Id,
    #[serde(default)]
    payload: Payload,
}

impl Edge {
    pub fn new(
        id: impl Into<Id>,
        kind: impl Into<String>,
        from: impl Into<Id>,
        to: impl Into<Id>,
        payload: Payload,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            from: from.into(),
            to: to.into(),
            payload,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The edge type label, e.g. `genre_taggings`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn from(&self) -> &Id {
        &self.from
    }

    pub fn to(&self) -> &Id {
        &self.to
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge {} ({}/{}->{})", self.id, self.kind, self.from, self.to)
    }
}

/// One entry of a mixed search or collection result.
///
/// An object carrying both `from` and `to` keys decodes as an `Edge`; every
/// other object decodes as a `Node`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Element {
    Node(Node),
    Edge(Edge),
}

impl Element {
    /// Whether a decoded JSON object has the edge shape.
    pub fn is_edge_shaped(object: &Payload) -> bool {
        object.contains_key("from") && object.contains_key("to")
    }

    fn shape(&self) -> &'static str {
        match self {
            Element::Node(_) => "node",
            Element::Edge(_) => "edge",
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Element::Node(node) => Some(node),
            Element::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Edge(edge) => Some(edge),
            Element::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Result<Node, ApiError> {
        match self {
            Element::Node(node) => Ok(node),
            other => Err(ApiError::UnexpectedElement {
                expected: "node",
                found: other.shape(),
            }),
        }
    }

    pub fn into_edge(self) -> Result<Edge, ApiError> {
        match self {
            Element::Edge(edge) => Ok(edge),
            other => Err(ApiError::UnexpectedElement {
                expected: "edge",
                found: other.shape(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Payload::deserialize(deserializer)?;
        if Element::is_edge_shaped(&object) {
            serde_json::from_value(Value::Object(object))
                .map(Element::Edge)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(Value::Object(object))
                .map(Element::Node)
                .map_err(de::Error::custom)
        }
    }
}

/// Search strategy forwarded to the service's query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchIndex {
    #[default]
    Exact,
    Fulltext,
}

impl SearchIndex {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchIndex::Exact => "exact",
            SearchIndex::Fulltext => "fulltext",
        }
    }
}

/// Narrows a user's high scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighScoreFilter {
    Tracked,
    Untracked,
}

impl HighScoreFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            HighScoreFilter::Tracked => "tracked",
            HighScoreFilter::Untracked => "untracked",
        }
    }
}

/// Request payload for creating a node of `kind`.
#[derive(Debug, Clone)]
pub struct CreateNode {
    pub kind: String,
    pub payload: Payload,
}

/// Request payload for creating an edge of `kind` between two nodes.
#[derive(Debug, Clone)]
pub struct CreateEdge {
    pub from: Id,
    pub to: Id,
    pub kind: String,
    pub payload: Payload,
}
