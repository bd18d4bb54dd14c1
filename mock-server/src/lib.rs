//! In-memory stand-in for the Sheldon service.
//!
//! Serves the same routes and status codes as the real service over an
//! `Arc<RwLock<Graph>>`. Node ids are sequential integers rendered as strings,
//! edge ids are integers, edge endpoints are node id strings.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Default)]
pub struct Graph {
    next_id: u64,
    nodes: BTreeMap<u64, Node>,
    edges: BTreeMap<u64, Edge>,
}

impl Graph {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn insert_node(&mut self, kind: &str, payload: Map<String, Value>) -> Node {
        let id = self.allocate_id();
        let node = Node {
            id: id.to_string(),
            kind: kind.to_string(),
            payload,
        };
        self.nodes.insert(id, node.clone());
        node
    }

    /// Creates the `kind` edge between two nodes, or replaces its payload if
    /// it already exists. `None` if either node is missing.
    pub fn upsert_edge(
        &mut self,
        from: &str,
        to: &str,
        kind: &str,
        payload: Map<String, Value>,
    ) -> Option<Edge> {
        if self.node(from).is_none() || self.node(to).is_none() {
            return None;
        }
        if let Some(edge) = self
            .edges
            .values_mut()
            .find(|e| e.from == from && e.to == to && e.kind == kind)
        {
            edge.payload = payload;
            return Some(edge.clone());
        }
        let id = self.allocate_id();
        let edge = Edge {
            id,
            kind: kind.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            payload,
        };
        self.edges.insert(id, edge.clone());
        Some(edge)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(&id.parse().ok()?)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(&id.parse().ok()?)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(&id.parse().ok()?)
    }

    fn edges_from<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.from == from)
    }

    fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(&id.parse().ok()?)?;
        self.edges.retain(|_, e| e.from != node.id && e.to != node.id);
        Some(node)
    }

    fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        self.edges.remove(&id.parse().ok()?)
    }

    /// Schema in the `/status` layout: node types carry `properties` and
    /// `count`, edge types additionally `source_class` and `target_class`.
    /// Type entries keyed by name, in name order.
    fn schema(&self) -> Map<String, Value> {
        let mut schema = BTreeMap::new();
        for node in self.nodes.values() {
            let entry = schema
                .entry(node.kind.clone())
                .or_insert_with(|| json!({"properties": [], "count": 0}));
            let count = entry["count"].as_u64().unwrap_or(0);
            entry["count"] = json!(count + 1);
        }
        for edge in self.edges.values() {
            let source = self.node(&edge.from).map(|n| n.kind.clone());
            let target = self.node(&edge.to).map(|n| n.kind.clone());
            schema.entry(edge.kind.clone()).or_insert_with(|| {
                json!({
                    "properties": [],
                    "source_class": source.into_iter().collect::<Vec<_>>(),
                    "target_class": target.into_iter().collect::<Vec<_>>(),
                })
            });
        }
        schema.into_iter().collect()
    }
}

/// Whether a plural route segment (`movies`) names a node type (`Movie`).
fn kind_matches(segment: &str, kind: &str) -> bool {
    let segment = segment.to_lowercase();
    let kind = kind.to_lowercase();
    segment == kind || segment == format!("{kind}s")
}

/// Search option matching: `*` at the end of `wanted` is a prefix wildcard.
fn value_matches(value: Option<&Value>, wanted: &str) -> bool {
    let actual = match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => return false,
    };
    match wanted.strip_suffix('*') {
        Some(prefix) => actual.starts_with(prefix),
        None => actual == wanted,
    }
}

pub type Db = Arc<RwLock<Graph>>;

pub fn app() -> Router {
    app_with(Graph::default())
}

pub fn app_with(graph: Graph) -> Router {
    let db: Db = Arc::new(RwLock::new(graph));
    Router::new()
        .route("/search", get(facebook_search))
        .route("/search/nodes/{kind}", get(search_nodes))
        .route(
            "/nodes/{id}",
            get(get_node)
                .post(create_node)
                .put(update_node)
                .delete(delete_node),
        )
        .route("/nodes/{id}/ids", get(node_ids_of_type))
        .route("/nodes/{id}/reindex", put(reindex_node))
        .route("/nodes/{id}/connections/{kind}", get(node_edges))
        .route(
            "/nodes/{id}/connections/{kind}/{to}",
            get(get_edge_between).put(put_edge_between),
        )
        .route("/connections/{id}", get(get_edge).delete(delete_edge))
        .route("/connections/{id}/reindex", put(reindex_edge))
        .route("/status", get(status))
        .route("/high_scores/users/{id}", get(high_scores))
        .route("/high_scores/users/{id}/{filter}", get(filtered_high_scores))
        .route("/recommendations/user/{id}/containers", get(recommendations))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn search_nodes(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Query(mut options): Query<HashMap<String, String>>,
) -> Response {
    // `type` selects the index; both behave the same here.
    options.remove("type");
    let graph = db.read().await;
    let hits: Vec<Node> = graph
        .nodes
        .values()
        .filter(|n| kind_matches(&kind, &n.kind))
        .filter(|n| options.iter().all(|(k, v)| value_matches(n.payload.get(k), v)))
        .cloned()
        .collect();
    tracing::debug!(%kind, hits = hits.len(), "search");
    if hits.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(hits).into_response()
    }
}

async fn facebook_search(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Node>> {
    let graph = db.read().await;
    let hits = match params.get("q") {
        Some(q) => graph
            .nodes
            .values()
            .filter(|n| value_matches(n.payload.get("facebook_ids"), q))
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    Json(hits)
}

async fn get_node(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Node>, StatusCode> {
    let graph = db.read().await;
    let node = graph.node(&id).cloned();
    node.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_node(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> (StatusCode, Json<Node>) {
    let node = db.write().await.insert_node(&kind, payload);
    tracing::debug!(id = %node.id, kind = %node.kind, "node created");
    (StatusCode::CREATED, Json(node))
}

async fn update_node(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Node>, StatusCode> {
    let mut graph = db.write().await;
    let node = graph.node_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    node.payload = payload;
    Ok(Json(node.clone()))
}

async fn delete_node(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    match db.write().await.remove_node(&id) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn node_ids_of_type(State(db): State<Db>, Path(kind): Path<String>) -> Json<Vec<u64>> {
    let graph = db.read().await;
    let ids = graph
        .nodes
        .iter()
        .filter(|(_, n)| kind_matches(&kind, &n.kind))
        .map(|(id, _)| *id)
        .collect();
    Json(ids)
}

async fn reindex_node(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Node>, StatusCode> {
    let graph = db.read().await;
    let node = graph.node(&id).cloned();
    node.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn node_edges(
    State(db): State<Db>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Json<Vec<Edge>>, StatusCode> {
    let graph = db.read().await;
    if graph.node(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let edges = graph.edges_from(&id).filter(|e| e.kind == kind).cloned().collect();
    Ok(Json(edges))
}

async fn get_edge_between(
    State(db): State<Db>,
    Path((from, kind, to)): Path<(String, String, String)>,
) -> Result<Json<Edge>, StatusCode> {
    let graph = db.read().await;
    let edge = graph
        .edges_from(&from)
        .find(|e| e.kind == kind && e.to == to)
        .cloned();
    edge.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_edge_between(
    State(db): State<Db>,
    Path((from, kind, to)): Path<(String, String, String)>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Edge>, StatusCode> {
    let mut graph = db.write().await;
    let edge = graph.upsert_edge(&from, &to, &kind, payload);
    edge.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn get_edge(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Edge>, StatusCode> {
    let graph = db.read().await;
    let edge = graph.edge(&id).cloned();
    edge.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_edge(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    match db.write().await.remove_edge(&id) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn reindex_edge(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Edge>, StatusCode> {
    let graph = db.read().await;
    let edge = graph.edge(&id).cloned();
    edge.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn status(State(db): State<Db>) -> Json<Value> {
    let graph = db.read().await;
    Json(json!({ "schema": graph.schema() }))
}

async fn high_scores(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Vec<Edge>>, StatusCode> {
    let graph = db.read().await;
    if graph.node(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(graph.edges_from(&id).cloned().collect()))
}

async fn filtered_high_scores(
    State(db): State<Db>,
    Path((id, filter)): Path<(String, String)>,
) -> Result<Json<Vec<Edge>>, StatusCode> {
    let tracked = match filter.as_str() {
        "tracked" => true,
        "untracked" => false,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let graph = db.read().await;
    if graph.node(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let edges = graph
        .edges_from(&id)
        .filter(|e| e.payload.get("tracked").and_then(Value::as_bool).unwrap_or(false) == tracked)
        .cloned()
        .collect();
    Ok(Json(edges))
}

/// Nodes the user links to that have a container.
async fn recommendations(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Vec<Node>>, StatusCode> {
    let graph = db.read().await;
    if graph.node(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let nodes = graph
        .edges_from(&id)
        .filter_map(|e| graph.node(&e.to))
        .filter(|n| value_matches(n.payload.get("has_container"), "true"))
        .cloned()
        .collect();
    Ok(Json(nodes))
}
