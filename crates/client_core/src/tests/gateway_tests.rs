use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use shared::{
    domain::EntityPk,
    protocol::{FilterSet, TimeWindow},
};
use tokio::net::TcpListener;

use super::*;

#[derive(Clone, Default)]
struct ServerState {
    seen_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn entities_handler(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    state.seen_queries.lock().unwrap().push(params);
    Json(json!({
        "entities": [
            {
                "pk": 1,
                "original": "Hello",
                "format": "ftl",
                "translation": [
                    { "string": "Pozdravljen", "approved": true }
                ]
            }
        ],
        "has_next": true,
        "stats": { "total": 1, "approved": 1 }
    }))
}

async fn siblings_handler(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    state.seen_queries.lock().unwrap().push(params);
    Json(json!({
        "preceding": [
            { "pk": 4, "original": "Before", "format": "ftl", "translation": [] }
        ],
        "succeeding": []
    }))
}

async fn spawn_server(state: ServerState) -> String {
    let app = Router::new()
        .route("/get-entities/", get(entities_handler))
        .route("/get-sibling-entities/", get(siblings_handler))
        .route(
            "/broken/get-entities/",
            get(|| async { (StatusCode::NOT_FOUND, "no such resource") }),
        )
        .route(
            "/forbidden/get-entities/",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "code": "forbidden",
                        "message": "review access required"
                    })),
                )
            }),
        )
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn fetch_page_builds_query_and_decodes_response() {
    let state = ServerState::default();
    let base = spawn_server(state.clone()).await;
    let gateway = HttpEntityGateway::new(&base).expect("gateway");

    let filters = FilterSet {
        entity_ids: Some(vec![EntityPk(1), EntityPk(2)]),
        exclude_entities: vec![EntityPk(9)],
        search: Some("hello".into()),
        status: Some("missing".into()),
        time: Some(TimeWindow {
            start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 1, 31, 23, 59, 0).unwrap(),
        }),
        ..FilterSet::default()
    };

    let page = gateway
        .fetch_page("sl", "demo", "demo.ftl", &filters)
        .await
        .expect("page");

    assert!(page.has_next);
    assert_eq!(page.entities.len(), 1);
    assert_eq!(page.entities[0].pk, EntityPk(1));
    assert!(page.entities[0].translation[0].approved);
    assert_eq!(page.stats.total, 1);

    let queries = state.seen_queries.lock().unwrap();
    let query = &queries[0];
    assert_eq!(query["locale"], "sl");
    assert_eq!(query["project"], "demo");
    assert_eq!(query["resource"], "demo.ftl");
    assert_eq!(query["entity_ids"], "1,2");
    assert_eq!(query["exclude_entities"], "9");
    assert_eq!(query["search"], "hello");
    assert_eq!(query["status"], "missing");
    assert_eq!(query["time"], "202001010000-202001312359");
    assert!(!query.contains_key("tag"));
}

#[tokio::test]
async fn fetch_siblings_decodes_bundle() {
    let state = ServerState::default();
    let base = spawn_server(state.clone()).await;
    let gateway = HttpEntityGateway::new(&base).expect("gateway");

    let bundle = gateway
        .fetch_siblings(EntityPk(5), "sl")
        .await
        .expect("bundle");

    assert_eq!(bundle.preceding.len(), 1);
    assert_eq!(bundle.preceding[0].pk, EntityPk(4));
    assert!(bundle.succeeding.is_empty());

    let queries = state.seen_queries.lock().unwrap();
    assert_eq!(queries[0]["entity"], "5");
    assert_eq!(queries[0]["locale"], "sl");
}

#[tokio::test]
async fn non_success_status_maps_to_api_exception() {
    let base = spawn_server(ServerState::default()).await;
    let gateway = HttpEntityGateway::new(&format!("{base}broken/")).expect("gateway");

    let err = gateway
        .fetch_page("sl", "demo", "demo.ftl", &FilterSet::default())
        .await
        .expect_err("should fail");

    let api = err.downcast_ref::<ApiException>().expect("typed error");
    assert_eq!(api.code, ErrorCode::NotFound);
    assert_eq!(api.message, "no such resource");
}

#[tokio::test]
async fn structured_error_body_overrides_the_status_code_mapping() {
    let base = spawn_server(ServerState::default()).await;
    let gateway = HttpEntityGateway::new(&format!("{base}forbidden/")).expect("gateway");

    let err = gateway
        .fetch_page("sl", "demo", "demo.ftl", &FilterSet::default())
        .await
        .expect_err("should fail");

    let api = err.downcast_ref::<ApiException>().expect("typed error");
    assert_eq!(api.code, ErrorCode::Forbidden);
    assert_eq!(api.message, "review access required");
}

#[tokio::test]
async fn missing_gateway_always_errors() {
    let gateway = MissingEntityGateway;
    assert!(gateway
        .fetch_page("sl", "demo", "demo.ftl", &FilterSet::default())
        .await
        .is_err());
    assert!(gateway.fetch_siblings(EntityPk(1), "sl").await.is_err());
}
