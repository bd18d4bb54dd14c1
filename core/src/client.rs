//! The public Sheldon API.
//!
//! # Design
//! Every operation follows the same pattern: build the URI from the effective
//! host, send one request through the `Transport`, compare the status with
//! the single code the operation expects, then decode the body or return the
//! operation's failure value (`false`, `None`, empty list). Transport and
//! decode failures are returned as `Err` and never folded into those values.

use std::time::Instant;

use serde_json::Value;

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::parse;
use crate::types::{
    CreateEdge, CreateNode, Edge, Element, HighScoreFilter, Id, Node, Payload, SearchIndex,
};
use crate::urls;

/// Client for one Sheldon deployment.
///
/// Holds its own `Config`; there is no process-wide state. Requests block
/// until the full response is read.
#[derive(Debug, Clone)]
pub struct SheldonClient<T = UreqTransport> {
    config: Config,
    transport: T,
}

impl Default for SheldonClient<UreqTransport> {
    fn default() -> Self {
        Self::with_transport(Config::default(), UreqTransport::new())
    }
}

impl SheldonClient<UreqTransport> {
    pub fn new(host: &str) -> Self {
        Self::with_transport(Config::new(host), UreqTransport::new())
    }

    pub fn from_env() -> Self {
        Self::with_transport(Config::from_env(), UreqTransport::new())
    }
}

/// Restores the previous temporary host when dropped, including on unwind.
struct HostScope<'a, T> {
    client: &'a mut SheldonClient<T>,
    previous: Option<String>,
}

impl<T> Drop for HostScope<'_, T> {
    fn drop(&mut self) {
        let previous = self.previous.take();
        self.client.config.set_temp_host(previous.as_deref());
    }
}

impl<T: Transport> SheldonClient<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The host requests currently go to.
    pub fn host(&self) -> &str {
        self.config.host()
    }

    pub fn set_host(&mut self, host: &str) {
        self.config.set_host(host);
    }

    pub fn set_log(&mut self, log: bool) {
        self.config.set_log(log);
    }

    /// Runs `f` with requests directed at `host`, then restores the previous
    /// host however `f` exits.
    ///
    /// ```no_run
    /// # use sheldon_client::SheldonClient;
    /// let mut client = SheldonClient::new("http://sheldon.host");
    /// let _node = client.with_host("http://localhost:3000", |c| c.node(1234));
    /// assert_eq!(client.host(), "http://sheldon.host");
    /// ```
    pub fn with_host<R>(&mut self, host: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.config.temp_host().map(str::to_string);
        self.config.set_temp_host(Some(host));
        let mut scope = HostScope {
            client: self,
            previous,
        };
        f(&mut *scope.client)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), uri = %request.uri, "sending request");
        let started = Instant::now();
        let response = self.transport.send(&request)?;
        if self.config.log() {
            tracing::info!(
                target: "sheldon_client::requests",
                method = request.method.as_str(),
                uri = %request.uri,
                status = response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request completed"
            );
        }
        Ok(response)
    }

    fn get(&self, uri: String) -> Result<HttpResponse, ApiError> {
        self.execute(HttpRequest::empty(HttpMethod::Get, uri))
    }

    /// Sends a request and reports whether the service answered 200.
    fn send_ok(&self, request: HttpRequest) -> Result<bool, ApiError> {
        Ok(self.execute(request)?.status == 200)
    }

    fn get_json(&self, uri: String) -> Result<Option<Value>, ApiError> {
        let response = self.get(uri)?;
        if response.status != 200 {
            return Ok(None);
        }
        parse::parse_json(&response.body).map(Some)
    }

    fn get_elements(&self, uri: String) -> Result<Vec<Element>, ApiError> {
        let response = self.get(uri)?;
        if response.status != 200 {
            return Ok(Vec::new());
        }
        parse::parse_search_result(&response.body)
    }

    /// Searches nodes of `kind` (a plural type such as `movies`). Options are
    /// passed to the service's index as query parameters.
    pub fn search(
        &self,
        kind: &str,
        options: &[(&str, &str)],
        index: SearchIndex,
    ) -> Result<Vec<Node>, ApiError> {
        let uri = urls::search_url(self.host(), kind, options, index);
        self.get_elements(uri)?
            .into_iter()
            .map(Element::into_node)
            .collect()
    }

    /// Edges of `kind` leaving `node`.
    pub fn fetch_edges(&self, node: impl Into<Id>, kind: &str) -> Result<Vec<Edge>, ApiError> {
        let uri = urls::node_edges_url(self.host(), &node.into(), kind);
        self.get_elements(uri)?
            .into_iter()
            .map(Element::into_edge)
            .collect()
    }

    /// Nodes at the far end of the `kind` edges leaving `node`, one extra
    /// request per edge. A neighbour that cannot be fetched fails the whole
    /// call.
    pub fn fetch_neighbours(&self, node: impl Into<Id>, kind: &str) -> Result<Vec<Node>, ApiError> {
        self.fetch_edges(node, kind)?
            .iter()
            .map(|edge| match self.fetch_node(edge.to())? {
                Some(node) => Ok(node),
                None => Err(ApiError::MissingNeighbour(edge.to().clone())),
            })
            .collect()
    }

    /// Nodes or edges listed at `path`, relative to the host.
    pub fn fetch_collection(&self, path: &str) -> Result<Vec<Element>, ApiError> {
        self.get_elements(urls::collection_url(self.host(), path))
    }

    pub fn fetch_edge_collection(&self, path: &str) -> Result<Vec<Element>, ApiError> {
        self.fetch_collection(path)
    }

    /// Whatever nodes or edges carry the Facebook id `fbid`; the first entry
    /// is usually the one wanted.
    pub fn facebook_item(&self, fbid: &str) -> Result<Vec<Element>, ApiError> {
        self.get_elements(urls::facebook_id_search_url(self.host(), fbid))
    }

    pub fn fetch_node(&self, id: impl Into<Id>) -> Result<Option<Node>, ApiError> {
        let response = self.get(urls::node_url(self.host(), &id.into()))?;
        if response.status != 200 {
            return Ok(None);
        }
        parse::parse_node(&response.body).map(Some)
    }

    pub fn node(&self, id: impl Into<Id>) -> Result<Option<Node>, ApiError> {
        self.fetch_node(id)
    }

    /// Creates a node; the service answers 201 with the stored node.
    pub fn create_node(&self, input: &CreateNode) -> Result<Option<Node>, ApiError> {
        let uri = urls::create_node_url(self.host(), &input.kind);
        let request = HttpRequest::json(HttpMethod::Post, uri, Some(&input.payload))?;
        let response = self.execute(request)?;
        if response.status != 201 {
            return Ok(None);
        }
        parse::parse_node(&response.body).map(Some)
    }

    /// Replaces a node's payload. The node is looked up first; if it does not
    /// exist no update is sent.
    pub fn update_node(&self, id: impl Into<Id>, payload: &Payload) -> Result<bool, ApiError> {
        let Some(node) = self.fetch_node(id)? else {
            return Ok(false);
        };
        let uri = urls::node_url(self.host(), node.id());
        self.send_ok(HttpRequest::json(HttpMethod::Put, uri, Some(payload))?)
    }

    pub fn delete_node(&self, id: impl Into<Id>) -> Result<bool, ApiError> {
        let uri = urls::node_url(self.host(), &id.into());
        self.send_ok(HttpRequest::empty(HttpMethod::Delete, uri))
    }

    pub fn reindex_node(&self, id: impl Into<Id>) -> Result<bool, ApiError> {
        let uri = urls::reindex_node_url(self.host(), &id.into());
        self.send_ok(HttpRequest::empty(HttpMethod::Put, uri))
    }

    /// Every id of nodes of `kind`, as the service encodes them.
    pub fn get_node_ids_of_type(&self, kind: &str) -> Result<Option<Vec<Id>>, ApiError> {
        let response = self.get(urls::node_ids_of_type_url(self.host(), kind))?;
        if response.status != 200 {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(ApiError::decode)
    }

    pub fn edge(&self, id: impl Into<Id>) -> Result<Option<Edge>, ApiError> {
        let response = self.get(urls::edge_url(self.host(), &id.into()))?;
        if response.status != 200 {
            return Ok(None);
        }
        parse::parse_edge(&response.body).map(Some)
    }

    /// The `kind` edge from `from` to `to`, if there is one.
    pub fn edge_between(
        &self,
        from: impl Into<Id>,
        to: impl Into<Id>,
        kind: &str,
    ) -> Result<Option<Edge>, ApiError> {
        let uri = urls::edge_between_url(self.host(), &from.into(), &to.into(), kind);
        let response = self.get(uri)?;
        if response.status != 200 {
            return Ok(None);
        }
        parse::parse_edge(&response.body).map(Some)
    }

    pub fn create_edge(&self, input: &CreateEdge) -> Result<bool, ApiError> {
        let uri = urls::edge_between_url(self.host(), &input.from, &input.to, &input.kind);
        self.send_ok(HttpRequest::json(HttpMethod::Put, uri, Some(&input.payload))?)
    }

    /// Sends `body` to the edge between `from` and `to`.
    pub fn update_edge(
        &self,
        from: impl Into<Id>,
        to: impl Into<Id>,
        kind: &str,
        body: &Payload,
    ) -> Result<bool, ApiError> {
        let uri = urls::edge_between_url(self.host(), &from.into(), &to.into(), kind);
        self.send_ok(HttpRequest::json(HttpMethod::Put, uri, Some(body))?)
    }

    pub fn delete_edge(&self, id: impl Into<Id>) -> Result<bool, ApiError> {
        let uri = urls::edge_url(self.host(), &id.into());
        self.send_ok(HttpRequest::empty(HttpMethod::Delete, uri))
    }

    pub fn reindex_edge(&self, id: impl Into<Id>) -> Result<bool, ApiError> {
        let uri = urls::reindex_edge_url(self.host(), &id.into());
        self.send_ok(HttpRequest::empty(HttpMethod::Put, uri))
    }

    /// A user's high-score edges, decoded but otherwise untouched.
    pub fn get_highscores(
        &self,
        user: impl Into<Id>,
        filter: Option<HighScoreFilter>,
    ) -> Result<Option<Value>, ApiError> {
        self.get_json(urls::high_score_url(self.host(), &user.into(), filter))
    }

    pub fn get_highscores_tracked(&self, user: impl Into<Id>) -> Result<Option<Value>, ApiError> {
        self.get_highscores(user, Some(HighScoreFilter::Tracked))
    }

    pub fn get_highscores_untracked(&self, user: impl Into<Id>) -> Result<Option<Value>, ApiError> {
        self.get_highscores(user, Some(HighScoreFilter::Untracked))
    }

    pub fn get_recommendations(&self, user: impl Into<Id>) -> Result<Option<Value>, ApiError> {
        self.get_json(urls::recommendation_url(self.host(), &user.into()))
    }

    /// The raw `/status` document.
    pub fn status(&self) -> Result<Option<Value>, ApiError> {
        self.get_json(urls::status_url(self.host()))
    }

    fn schema_types(&self, edges: bool) -> Result<Vec<String>, ApiError> {
        let response = self.get(urls::status_url(self.host()))?;
        if response.status != 200 {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        let status = parse::parse_json(&response.body)?;
        parse::schema_types(&status, edges)
    }

    /// Node types known to the service.
    pub fn node_types(&self) -> Result<Vec<String>, ApiError> {
        self.schema_types(false)
    }

    /// Edge types known to the service.
    pub fn edge_types(&self) -> Result<Vec<String>, ApiError> {
        self.schema_types(true)
    }

    #[deprecated(note = "use `node_types`")]
    pub fn get_node_types(&self) -> Result<Vec<String>, ApiError> {
        tracing::warn!("SheldonClient::get_node_types is deprecated, use SheldonClient::node_types");
        self.schema_types(false)
    }

    #[deprecated(note = "use `edge_types`")]
    pub fn get_edge_types(&self) -> Result<Vec<String>, ApiError> {
        tracing::warn!("SheldonClient::get_edge_types is deprecated, use SheldonClient::edge_types");
        self.schema_types(true)
    }
}
