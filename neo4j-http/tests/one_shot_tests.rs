// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! One-shot transactions, result mapping and client helpers against a fake
//! HTTP endpoint

#[path = "testutils/mod.rs"]
mod testutils;

use neo4j_http::{AccessMode, Client, Error, Parameters, QueryLogLevel, Results, Statement};
use serde_json::json;
use testutils::fake_server::{error_body, request_json, result_set, results_body, FakeServer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const ONE_SHOT_PATH: &str = "/db/neo4j/tx/commit";

fn mount_one_shot(fake: &FakeServer, response: ResponseTemplate) {
    fake.mount(
        Mock::given(method("POST"))
            .and(path(ONE_SHOT_PATH))
            .respond_with(response),
    );
}

#[test]
fn test_one_shot_maps_every_result_set() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(results_body(vec![
            result_set(&["name"], vec![json!(["Klaus"]), json!(["Anna"])]),
            result_set(&["count"], vec![json!([2])]),
        ])),
    );

    let client = fake.client();
    let results = client
        .with_one_shot(AccessMode::Read, |statements| {
            statements
                .add_statement("MATCH (n:User) RETURN n.name AS name ORDER BY name DESC")
                .add_statement("MATCH (n:User) RETURN count(n) AS count");
        })
        .expect("One-shot failed");

    assert_eq!(results.len(), 2);
    let names = results.get(0).expect("first set");
    assert_eq!(names.column_values("name"), Some(vec![&json!("Klaus"), &json!("Anna")]));
    assert_eq!(results.get(1).and_then(|s| s.first()).map(|r| &r["count"]), Some(&json!(2)));

    let requests = fake.received_on("POST", ONE_SHOT_PATH);
    assert_eq!(requests.len(), 1);
    assert_eq!(request_json(&requests[0])["statements"].as_array().map(Vec::len), Some(2));
    assert_eq!(client.pool().in_use(), 0);
}

#[test]
fn test_one_shot_reports_single_error_of_failing_statement() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(error_body(
            "Neo.ClientError.Statement.SyntaxError",
            "Invalid input 'RETRN'",
        )),
    );

    let client = fake.client();
    let result = client.with_one_shot(AccessMode::Write, |statements| {
        statements
            .add_statement("CREATE (n:User {name: 'Klaus'})")
            .add_statement("RETRN 1")
            .add_statement("MATCH (n) RETURN n");
    });

    match result {
        Err(Error::TransactionRollback(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code.as_deref(), Some("Neo.ClientError.Statement.SyntaxError"));
            assert_eq!(errors[0].message, "Invalid input 'RETRN'");
        }
        other => panic!("expected TransactionRollback, got {:?}", other),
    }
}

#[test]
fn test_empty_one_shot_is_rejected_before_any_request() {
    let fake = FakeServer::ready();

    let client = fake.client();
    let result = client.with_one_shot(AccessMode::Write, |_| {});

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(fake.received_on("POST", ONE_SHOT_PATH).is_empty());
    assert!(fake.received_on("GET", "/").is_empty());
    assert_eq!(client.pool().in_use(), 0);
}

#[test]
fn test_one_shot_without_statements_is_invalid() {
    let fake = FakeServer::ready();

    let result = fake.client().one_shot(AccessMode::Write, &[]);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_run_query_sends_parameters_and_flags() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "columns": [],
                "data": [],
                "stats": { "contains_updates": true, "nodes_created": 1 }
            }],
            "errors": []
        })),
    );

    let mut parameters = Parameters::new();
    parameters.insert("name".into(), json!("Klaus"));
    parameters.insert("with_stats".into(), json!(true));

    let results = fake
        .client()
        .run_query(AccessMode::Write, "CREATE (n:User {name: $name})", parameters)
        .expect("Query failed");

    let set = results.first().expect("one result set");
    assert_eq!(set.stat("nodes_created"), Some(1));
    assert_eq!(set.contains_updates(), Some(true));

    let requests = fake.received_on("POST", ONE_SHOT_PATH);
    let statement = &request_json(&requests[0])["statements"][0];
    assert_eq!(statement["includeStats"], json!(true));
    assert_eq!(statement["parameters"]["name"], json!("Klaus"));
    assert!(statement.get("resultDataContents").is_none());
}

#[test]
fn test_graph_results_are_decoded() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "columns": ["n"],
                "data": [{
                    "row": [{ "name": "Klaus" }],
                    "meta": [{ "id": 1, "elementId": "4:abc:1", "type": "node", "deleted": false }],
                    "graph": {
                        "nodes": [{
                            "id": "1",
                            "elementId": "4:abc:1",
                            "labels": ["User"],
                            "properties": { "name": "Klaus" }
                        }],
                        "relationships": []
                    }
                }]
            }],
            "errors": []
        })),
    );

    let results = fake
        .client()
        .one_shot(
            AccessMode::Read,
            &[Statement::new("MATCH (n:User) RETURN n").result_as_graph(true)],
        )
        .expect("Query failed");

    let row = results.first().and_then(|s| s.first()).expect("one row");
    assert_eq!(row["n"]["name"], json!("Klaus"));
    assert_eq!(row.meta()[0]["type"], json!("node"));
    let graph = row.graph().expect("graph fragment");
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.nodes[0].has_label("User"));

    let requests = fake.received_on("POST", ONE_SHOT_PATH);
    assert_eq!(
        request_json(&requests[0])["statements"][0]["resultDataContents"],
        json!(["row", "graph"])
    );
}

#[test]
fn test_raw_results_are_returned_undecoded() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(results_body(vec![result_set(
            &["n"],
            vec![json!([1])],
        )])),
    );

    let client = Client::new(fake.config().with_raw_results(true)).expect("Failed to create client");
    let results = client
        .one_shot(AccessMode::Read, &[Statement::new("RETURN 1 AS n")])
        .expect("Query failed");

    let raw = results.raw().expect("raw results");
    assert_eq!(raw[0]["columns"], json!(["n"]));
    assert_eq!(raw[0]["data"][0]["row"], json!([1]));
}

#[test]
fn test_response_hook_rewrites_body_before_decoding() {
    let fake = FakeServer::ready();
    mount_one_shot(
        &fake,
        ResponseTemplate::new(200).set_body_json(results_body(vec![result_set(
            &["greeting"],
            vec![json!(["hallo"])],
        )])),
    );

    let client = fake.client().with_response_hook(|body| body.replace("hallo", "hello"));
    let results = client
        .run_query(AccessMode::Read, "RETURN 'hallo' AS greeting", Parameters::new())
        .expect("Query failed");

    assert_eq!(results.single_value(), Some(&json!("hello")));
}

#[test]
fn test_undecodable_body_is_invalid_json() {
    let fake = FakeServer::ready();
    mount_one_shot(&fake, ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"));

    let result = fake
        .client()
        .one_shot(AccessMode::Read, &[Statement::new("RETURN 1")]);

    assert!(matches!(result, Err(Error::InvalidJson(_))));
}

#[test]
fn test_body_without_results_maps_to_empty() {
    let fake = FakeServer::ready();
    mount_one_shot(&fake, ResponseTemplate::new(200).set_body_json(json!({})));

    let results = fake
        .client()
        .one_shot(AccessMode::Read, &[Statement::new("RETURN 1")])
        .expect("Query failed");

    assert_eq!(results, Results::empty());
}

#[test]
fn test_query_log_counts_requests() {
    let fake = FakeServer::ready();
    mount_one_shot(&fake, ResponseTemplate::new(200).set_body_json(results_body(vec![])));

    let client = Client::new(fake.config().with_query_log(QueryLogLevel::Debug))
        .expect("Failed to create client");
    for _ in 0..3 {
        client
            .one_shot(AccessMode::Read, &[Statement::new("RETURN $x").param("x", 1)])
            .expect("Query failed");
    }

    assert_eq!(client.requests_logged(), 3);
}

#[test]
fn test_query_log_off_counts_nothing() {
    let fake = FakeServer::ready();
    mount_one_shot(&fake, ResponseTemplate::new(200).set_body_json(results_body(vec![])));

    let client = fake.client();
    client
        .one_shot(AccessMode::Read, &[Statement::new("RETURN 1")])
        .expect("Query failed");

    assert_eq!(client.requests_logged(), 0);
}

#[test]
fn test_server_info_reads_discovery_document() {
    let fake = FakeServer::ready();

    let info = fake.client().server_info().expect("Failed to read server info");

    assert_eq!(info.neo4j_version, "5.20.0");
    assert_eq!(info.neo4j_edition.as_deref(), Some("community"));
}

#[test]
fn test_server_info_failure_is_response_error() {
    let fake = FakeServer::start();
    fake.mount(
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("starting")),
    );

    match fake.client().server_info() {
        Err(Error::Response(error)) => {
            assert_eq!(error.status, Some(503));
            assert_eq!(error.message, "starting");
        }
        other => panic!("expected Response error, got {:?}", other),
    }
}
