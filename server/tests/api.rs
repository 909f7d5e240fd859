// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use resbroker_core::{
    AccessPolicy, Broker, CheckExistence, Error, ResourceLocator, Result, SignAccessPolicy,
};
use resbroker_server::{create_router, AppState, INTERNAL_ERROR_MESSAGE};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Debug)]
struct FakeSigner;

#[async_trait::async_trait]
impl SignAccessPolicy for FakeSigner {
    fn account_name(&self) -> &str {
        "test"
    }

    async fn sign_policy(&self, _: &ResourceLocator, policy: &AccessPolicy) -> Result<String> {
        let mut query = format!("sp={}", policy.permission());
        if let Some(expiry) = policy.expiry() {
            query.push_str(&format!(
                "&se={}",
                resbroker_core::time::format_sas_datetime(expiry).replace(':', "%3A")
            ));
        }
        query.push_str("&sig=fake");
        Ok(query)
    }
}

#[derive(Debug)]
struct FakeContainers;

#[async_trait::async_trait]
impl CheckExistence for FakeContainers {
    async fn container_exists(&self, container: &str) -> Result<bool> {
        match container {
            "photos" => Ok(true),
            "broken" => Err(Error::unexpected("connection reset by peer")),
            _ => Ok(false),
        }
    }
}

fn app() -> Router {
    create_router(AppState::new(Broker::new(FakeSigner, FakeContainers)))
}

async fn post(uri: &str, body: impl Into<Body>) -> (StatusCode, String) {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_json(uri: &str, body: Value) -> (StatusCode, String) {
    post(uri, body.to_string()).await
}

#[tokio::test]
async fn test_issue_blob_token() {
    let (status, body) = post_json(
        "/resources?type=blob",
        json!({
            "name": "cat.jpg",
            "container": "photos",
            "permissions": "rw",
            "expiry": "2199-03-12T07:00:00Z"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "uri": "https://test.blob.core.windows.net/photos/cat.jpg?sp=rw&se=2199-03-12T07%3A00%3A00Z&sig=fake"
        })
    );
}

#[tokio::test]
async fn test_issue_table_token() {
    let (status, body) = post_json(
        "/resources?type=table",
        json!({"name": "scores", "permissions": "w", "expiry": null}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body["uri"],
        "https://test.table.core.windows.net/scores?sp=aud&sig=fake"
    );
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let cases = vec![
        ("/resources", json!({"name": "scores", "permissions": "r"})),
        ("/resources?type=queue", json!({"name": "scores", "permissions": "r"})),
        ("/resources?type=table", json!({"permissions": "r"})),
        ("/resources?type=table", json!({"name": "  ", "permissions": "r"})),
        ("/resources?type=blob", json!({"name": "cat.jpg", "permissions": "r"})),
        ("/resources?type=table", json!({"name": "scores", "permissions": "x"})),
        (
            "/resources?type=table",
            json!({"name": "scores", "permissions": "r", "expiry": "tomorrow"}),
        ),
    ];

    for (uri, payload) in cases {
        let (status, body) = post_json(uri, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {payload}: {body}");
        assert!(!body.is_empty());
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (status, _) = post("/resources?type=table", "name=scores").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_container_is_forbidden() {
    let (status, _) = post_json(
        "/resources?type=blob",
        json!({"name": "cat.jpg", "container": "videos", "permissions": "r"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_internal_errors_are_hidden() {
    let (status, body) = post_json(
        "/resources?type=blob",
        json!({"name": "cat.jpg", "container": "broken", "permissions": "r"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, INTERNAL_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_wrong_method() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/resources?type=blob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
