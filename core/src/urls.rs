//! Request URI construction.
//!
//! Every function takes the effective host (already stripped of its trailing
//! slash) and returns the absolute URI for one kind of request. Path segments
//! and query values are percent-encoded; search options are emitted in key
//! order so the same call always yields the same URI.

use std::collections::BTreeMap;

use urlencoding::encode;

use crate::types::{HighScoreFilter, Id, SearchIndex};

fn segment(value: &str) -> String {
    encode(value).into_owned()
}

fn query(params: &BTreeMap<&str, &str>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `/search/nodes/{kind}?{options}`, plus `type={index}` for non-exact
/// searches.
///
/// `type` is the service's index parameter: a caller option named `type` is
/// sent as given for exact searches and replaced by the index otherwise.
pub fn search_url(host: &str, kind: &str, options: &[(&str, &str)], index: SearchIndex) -> String {
    let mut params: BTreeMap<&str, &str> = options.iter().copied().collect();
    if index != SearchIndex::default() {
        params.insert("type", index.as_str());
    }
    let base = format!("{host}/search/nodes/{}", segment(kind));
    if params.is_empty() {
        base
    } else {
        format!("{base}?{}", query(&params))
    }
}

pub fn node_url(host: &str, id: &Id) -> String {
    format!("{host}/nodes/{}", segment(&id.to_string()))
}

pub fn create_node_url(host: &str, kind: &str) -> String {
    format!("{host}/nodes/{}", segment(kind))
}

pub fn node_ids_of_type_url(host: &str, kind: &str) -> String {
    format!("{host}/nodes/{}/ids", segment(kind))
}

pub fn edge_url(host: &str, id: &Id) -> String {
    format!("{host}/connections/{}", segment(&id.to_string()))
}

/// `/nodes/{from}/connections/{kind}/{to}`: fetching, creating and updating
/// the edge between two nodes all address it this way.
pub fn edge_between_url(host: &str, from: &Id, to: &Id, kind: &str) -> String {
    format!(
        "{host}/nodes/{}/connections/{}/{}",
        segment(&from.to_string()),
        segment(kind),
        segment(&to.to_string())
    )
}

pub fn node_edges_url(host: &str, node: &Id, kind: &str) -> String {
    format!(
        "{host}/nodes/{}/connections/{}",
        segment(&node.to_string()),
        segment(kind)
    )
}

pub fn reindex_node_url(host: &str, id: &Id) -> String {
    format!("{}/reindex", node_url(host, id))
}

pub fn reindex_edge_url(host: &str, id: &Id) -> String {
    format!("{}/reindex", edge_url(host, id))
}

pub fn status_url(host: &str) -> String {
    format!("{host}/status")
}

pub fn high_score_url(host: &str, user: &Id, filter: Option<HighScoreFilter>) -> String {
    let base = format!("{host}/high_scores/users/{}", segment(&user.to_string()));
    match filter {
        Some(filter) => format!("{base}/{}", filter.as_str()),
        None => base,
    }
}

pub fn recommendation_url(host: &str, user: &Id) -> String {
    format!(
        "{host}/recommendations/user/{}/containers",
        segment(&user.to_string())
    )
}

pub fn facebook_id_search_url(host: &str, fbid: &str) -> String {
    format!("{host}/search?q={}", encode(fbid))
}

/// A caller-supplied path appended to the host verbatim.
pub fn collection_url(host: &str, path: &str) -> String {
    format!("{host}{path}")
}
