//! Node and edge lifecycle against the live mock service.
//!
//! # Design
//! Starts the mock server on a random port, then drives every facade
//! operation over real HTTP through `UreqTransport`, so URL building, the
//! JSON headers, status handling and decoding are checked end to end.

use serde_json::{json, Value};
use sheldon_client::{
    ApiError, Config, CreateEdge, CreateNode, Id, Payload, SearchIndex, SheldonClient,
    UreqTransport,
};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn payload(value: Value) -> Payload {
    value.as_object().cloned().unwrap()
}

fn create(client: &SheldonClient, kind: &str, body: Value) -> Id {
    let node = client
        .create_node(&CreateNode {
            kind: kind.to_string(),
            payload: payload(body),
        })
        .unwrap()
        .expect("node should be created");
    node.id().clone()
}

#[test]
fn graph_lifecycle() {
    let host = start_server();
    let mut client = SheldonClient::with_transport(Config::new(&host), UreqTransport::new());
    client.set_log(true);

    // Step 1: empty service.
    assert!(client.search("movies", &[("title", "The Matrix")], SearchIndex::Exact).unwrap().is_empty());
    assert_eq!(client.node_types().unwrap(), Vec::<String>::new());

    // Step 2: create nodes.
    let matrix = create(&client, "Movie", json!({"title": "The Matrix", "production_year": 1999, "has_container": "true"}));
    let action = create(&client, "Genre", json!({"name": "Action"}));
    let user = create(&client, "User", json!({"facebook_ids": "123456"}));

    // Step 3: search and fetch.
    let found = client
        .search("movies", &[("title", "The Matrix"), ("production_year", "1999")], SearchIndex::Fulltext)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), &matrix);
    let fetched = client.fetch_node(&matrix).unwrap().unwrap();
    assert_eq!(fetched, found[0]);
    assert_eq!(client.get_node_ids_of_type("movies").unwrap().unwrap().len(), 1);

    // Step 4: connect nodes, passing node values as endpoints.
    let created = client
        .create_edge(&CreateEdge {
            from: Id::from(&fetched),
            to: action.clone(),
            kind: "genre_taggings".to_string(),
            payload: payload(json!({"weight": 1.0})),
        })
        .unwrap();
    assert!(created);
    assert!(client
        .create_edge(&CreateEdge {
            from: user.clone(),
            to: matrix.clone(),
            kind: "likes".to_string(),
            payload: payload(json!({"tracked": true})),
        })
        .unwrap());

    let edge = client.edge_between(&matrix, &action, "genre_taggings").unwrap().unwrap();
    assert_eq!(edge.from(), &matrix);
    assert_eq!(edge.to(), &action);
    assert_eq!(client.edge(edge.id()).unwrap().unwrap(), edge);
    assert!(client.edge_between(&action, &matrix, "genre_taggings").unwrap().is_none());

    // Step 5: traverse.
    let edges = client.fetch_edges(&matrix, "genre_taggings").unwrap();
    assert_eq!(edges, vec![edge.clone()]);
    let neighbours = client.fetch_neighbours(&fetched, "genre_taggings").unwrap();
    assert_eq!(neighbours.len(), 1);
    assert_eq!(neighbours[0].payload()["name"], "Action");

    // Step 6: schema.
    assert_eq!(client.node_types().unwrap(), vec!["Genre", "Movie", "User"]);
    assert_eq!(client.edge_types().unwrap(), vec!["genre_taggings", "likes"]);

    // Step 7: user views.
    let scores = client.get_highscores_tracked(&user).unwrap().unwrap();
    assert_eq!(scores.as_array().unwrap().len(), 1);
    assert_eq!(client.get_highscores_untracked(&user).unwrap(), Some(json!([])));
    let recommendations = client.get_recommendations(&user).unwrap().unwrap();
    assert_eq!(recommendations[0]["payload"]["title"], "The Matrix");
    let items = client.facebook_item("123456").unwrap();
    assert_eq!(items[0].as_node().unwrap().id(), &user);
    let collection = client
        .fetch_edge_collection(&format!("/high_scores/users/{user}/tracked"))
        .unwrap();
    assert_eq!(collection[0].as_edge().unwrap().to(), &matrix);

    // Step 8: updates.
    assert!(client.update_node(&action, &payload(json!({"name": "Drama"}))).unwrap());
    assert_eq!(client.node(&action).unwrap().unwrap().payload()["name"], "Drama");
    assert!(!client.update_node(999, &payload(json!({"name": "Nope"}))).unwrap());
    assert!(client
        .update_edge(&matrix, &action, "genre_taggings", &payload(json!({"weight": 0.5})))
        .unwrap());
    assert_eq!(client.edge(edge.id()).unwrap().unwrap().payload()["weight"], 0.5);

    // Step 9: reindex.
    assert!(client.reindex_node(&matrix).unwrap());
    assert!(client.reindex_edge(edge.id()).unwrap());
    assert!(!client.reindex_node(999).unwrap());

    // Step 10: delete.
    assert!(client.delete_edge(edge.id()).unwrap());
    assert!(!client.delete_edge(edge.id()).unwrap());
    assert!(client.delete_node(&action).unwrap());
    assert!(!client.delete_node(&action).unwrap());
    assert!(client.fetch_node(&action).unwrap().is_none());
}

#[test]
fn deleting_target_drops_edges() {
    let host = start_server();
    let client = SheldonClient::new(&host);
    let a = create(&client, "Movie", json!({}));
    let b = create(&client, "Genre", json!({}));
    assert!(client
        .create_edge(&CreateEdge {
            from: a.clone(),
            to: b.clone(),
            kind: "genre_taggings".to_string(),
            payload: Payload::new(),
        })
        .unwrap());

    assert!(client.delete_node(&b).unwrap());
    assert!(client.fetch_neighbours(&a, "genre_taggings").unwrap().is_empty());
}

#[test]
fn with_host_targets_other_service() {
    let real = start_server();
    let other = start_server();
    let mut client = SheldonClient::new(&format!("{real}/"));

    let id = client.with_host(&other, |c| create(c, "Movie", json!({"title": "Elsewhere"})));
    assert_eq!(client.host(), real);

    assert!(client.fetch_node(&id).unwrap().is_none());
    let remote = client.with_host(&other, |c| c.fetch_node(&id)).unwrap();
    assert_eq!(remote.unwrap().payload()["title"], "Elsewhere");
}

#[test]
fn unreachable_service_is_an_error() {
    let client = SheldonClient::new("http://127.0.0.1:1");
    let err = client.delete_node(1).unwrap_err();
    assert!(matches!(err, ApiError::TransportError(_)));
}

/// Serves `body` once as a raw HTTP/1.1 response, after reading the request
/// head.
fn serve_once(body: String) -> String {
    use std::io::{BufRead, BufReader, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(body.as_bytes()).unwrap();
        stream.flush().unwrap();
    });
    format!("http://{addr}")
}

#[test]
fn large_id_listing_is_read_whole() {
    let count = 1_600_000;
    let ids: Vec<u64> = (1..=count).collect();
    let body = serde_json::to_string(&ids).unwrap();
    assert!(body.len() > 10 * 1024 * 1024);

    let client = SheldonClient::new(&serve_once(body));
    let listed = client.get_node_ids_of_type("movies").unwrap().expect("ids should be listed");
    assert_eq!(listed.len(), count as usize);
    assert_eq!(listed[0], Id::from(1));
    assert_eq!(listed[listed.len() - 1], Id::Int(count as i64));
}
