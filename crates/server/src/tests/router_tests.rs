use super::*;
use axum::{
    body::{self, Body},
    http::Request,
};
use serde_json::json;
use server_api::ApiContext;
use shared::{domain::UserId, protocol::ConnectorConfig};
use storage::Storage;
use tower::ServiceExt;

async fn test_app() -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    build_router(
        Arc::new(AppState {
            api: ApiContext { storage },
            connector: ConnectorConfig::default(),
        }),
        64 * 1024,
    )
}

fn operation(path: &str, body: Value) -> Request<Body> {
    let body = body.to_string();
    Request::post(path)
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

const QUERY: &str = "/services/app/connectors/example/executeQuery";
const MUTATION: &str = "/services/app/connectors/example/executeMutation";

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn inserted_part_request_is_listed_through_query_endpoint() {
    let app = test_app().await;
    let mechanic = UserId::new();

    let response = app
        .clone()
        .oneshot(operation(
            MUTATION,
            json!({
                "operationName": "InsertPartRequest",
                "variables": {
                    "mechanicId": mechanic,
                    "partDescription": "brake pads",
                    "vehicleMake": "Toyota",
                    "vehicleModel": "Camry",
                    "vehicleYear": 2018,
                },
            }),
        ))
        .await
        .expect("insert response");
    assert_eq!(response.status(), StatusCode::OK);
    let inserted = json_body(response).await;
    let id = inserted["data"]["partRequest_insert"]["id"].clone();
    assert!(id.is_string());

    let response = app
        .oneshot(operation(
            QUERY,
            json!({
                "operationName": "GetPartRequestsByMechanic",
                "variables": { "mechanicId": mechanic },
            }),
        ))
        .await
        .expect("query response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    let requests = listed["data"]["partRequests"].as_array().expect("array");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["id"], id);
    assert!(requests[0].get("VIN").is_none());
    assert!(requests[0]["createdAt"].is_string());
}

#[tokio::test]
async fn validation_failure_maps_to_bad_request() {
    let app = test_app().await;
    let response = app
        .oneshot(operation(
            MUTATION,
            json!({
                "operationName": "CreateShopProfile",
                "variables": {
                    "userId": UserId::new(),
                    "primaryContactPerson": "",
                    "shopName": "AutoParts Plus",
                },
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn unknown_connector_is_not_found() {
    let app = test_app().await;
    let response = app
        .oneshot(operation(
            "/services/app/connectors/other/executeQuery",
            json!({ "operationName": "ListShopProfiles" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_shop_profiles_accepts_missing_variables() {
    let app = test_app().await;
    let response = app
        .oneshot(operation(QUERY, json!({ "operationName": "ListShopProfiles" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["shopProfiles"], json!([]));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(
        Arc::new(AppState {
            api: ApiContext { storage },
            connector: ConnectorConfig::default(),
        }),
        32,
    );
    let response = app
        .oneshot(operation(
            QUERY,
            json!({ "operationName": "ListShopProfiles", "variables": null, "padding": "x".repeat(64) }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn list_shop_profiles_accepts_empty_variables_object() {
    let app = test_app().await;
    let response = app
        .oneshot(operation(
            QUERY,
            json!({ "operationName": "ListShopProfiles", "variables": {} }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["shopProfiles"], json!([]));
}

#[tokio::test]
async fn malformed_json_body_answers_with_api_error() {
    let app = test_app().await;
    let request = Request::post(QUERY)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "validation");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn missing_content_type_answers_with_api_error() {
    let app = test_app().await;
    let request = Request::post(MUTATION)
        .body(Body::from(r#"{"operationName":"ListShopProfiles"}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["code"], "validation");
}
