//! Response body decoding.
//!
//! These functions assume the caller has already checked the status code.
//! A body that is not the expected JSON is a `DeserializationError`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::types::{Edge, Element, Node};

pub fn parse_node(body: &str) -> Result<Node, ApiError> {
    serde_json::from_str(body).map_err(ApiError::decode)
}

pub fn parse_edge(body: &str) -> Result<Edge, ApiError> {
    serde_json::from_str(body).map_err(ApiError::decode)
}

/// Decodes a JSON array of node- and edge-shaped objects. An empty or
/// whitespace-only body is an empty result.
pub fn parse_search_result(body: &str) -> Result<Vec<Element>, ApiError> {
    parse_optional_array(body)
}

/// Decodes an arbitrary JSON document.
pub fn parse_json(body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(ApiError::decode)
}

pub fn parse_optional_array<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(ApiError::decode)
}

/// Type names from a `/status` document's `schema`: edge types are the
/// entries carrying both `source_class` and `target_class`, node types carry
/// neither. Names keep the order the service sent them in.
pub fn schema_types(status: &Value, edges: bool) -> Result<Vec<String>, ApiError> {
    let schema = status
        .get("schema")
        .and_then(Value::as_object)
        .ok_or(ApiError::MissingSchema)?;
    let types = schema
        .iter()
        .filter(|(_, entry)| {
            let has_source = entry.get("source_class").is_some();
            let has_target = entry.get("target_class").is_some();
            if edges {
                has_source && has_target
            } else {
                !has_source && !has_target
            }
        })
        .map(|(name, _)| name.clone())
        .collect();
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Id;
    use serde_json::json;

    #[test]
    fn parse_node_reads_fields() {
        let node = parse_node(r#"{"type":"Movie","id":"123","payload":{"title":"MyTitle"}}"#).unwrap();
        assert_eq!(node.id(), &Id::from("123"));
        assert_eq!(node.kind(), "Movie");
        assert_eq!(node.payload()["title"], "MyTitle");
    }

    #[test]
    fn parse_node_bad_json() {
        let err = parse_node("not json").unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn search_result_mixes_shapes() {
        let body = json!([
            {"type": "Movie", "id": "123"},
            {"id": 5, "type": "actings", "from": "6", "to": "10", "payload": {"weight": 5}}
        ])
        .to_string();
        let elements = parse_search_result(&body).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].as_node().unwrap().kind(), "Movie");
        assert_eq!(elements[1].as_edge().unwrap().to(), &Id::from("10"));
    }

    #[test]
    fn empty_body_is_empty_result() {
        assert!(parse_search_result("").unwrap().is_empty());
        assert!(parse_search_result("  \n").unwrap().is_empty());
        assert!(parse_search_result("[]").unwrap().is_empty());
    }

    #[test]
    fn search_result_rejects_objects() {
        let err = parse_search_result(r#"{"id":"1"}"#).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    fn status() -> Value {
        json!({"schema": {
            "Movie": {"properties": [], "count": 4},
            "Person": {"properties": [], "count": 6},
            "Acting": {"properties": [], "source_class": [], "target_class": []},
            "Like": {"properties": [], "source_class": [], "target_class": []},
            "Half": {"properties": [], "source_class": []}
        }})
    }

    #[test]
    fn schema_node_types() {
        assert_eq!(schema_types(&status(), false).unwrap(), vec!["Movie", "Person"]);
    }

    #[test]
    fn schema_edge_types() {
        assert_eq!(schema_types(&status(), true).unwrap(), vec!["Acting", "Like"]);
    }

    #[test]
    fn schema_types_keep_service_order() {
        let status = json!({"schema": {
            "Person": {"properties": [], "count": 6},
            "Movie": {"properties": [], "count": 4},
            "Like": {"properties": [], "source_class": [], "target_class": []},
            "Acting": {"properties": [], "source_class": [], "target_class": []}
        }});
        assert_eq!(schema_types(&status, false).unwrap(), vec!["Person", "Movie"]);
        assert_eq!(schema_types(&status, true).unwrap(), vec!["Like", "Acting"]);
    }

    #[test]
    fn schema_missing() {
        let err = schema_types(&json!({"nodes": 3}), false).unwrap_err();
        assert!(matches!(err, ApiError::MissingSchema));
    }
}
