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

//! HTTP surface of the resource broker.
//!
//! A single endpoint issues access tokens:
//!
//! ```text
//! POST /resources?type=blob
//! {"name": "cat.jpg", "container": "photos", "permissions": "r", "expiry": "2199-03-12T07:00:00Z"}
//!
//! 200 {"uri": "https://account.blob.core.windows.net/photos/cat.jpg?sv=..."}
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use resbroker_core::{AccessToken, Broker};
use serde::Deserialize;
use serde_json::Value;

mod error;
pub use error::{ApiError, INTERNAL_ERROR_MESSAGE};

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
/// Env value overriding [`DEFAULT_ADDR`].
pub const RESBROKER_ADDR: &str = "RESBROKER_ADDR";

/// Shared application state for all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Broker issuing the tokens.
    pub broker: Arc<Broker>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(broker: Broker) -> Self {
        Self {
            broker: Arc::new(broker),
        }
    }
}

/// Query parameters of `POST /resources`.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    /// `blob` or `table`.
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Creates the router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/resources", post(create_resource))
        .with_state(state)
}

/// Handler for `POST /resources`.
///
/// The body is taken as raw bytes so that a non-JSON body is reported as a
/// plain 400 like every other validation failure.
pub async fn create_resource(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
    body: Bytes,
) -> Result<Json<AccessToken>, ApiError> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    let token = state
        .broker
        .issue_from_payload(query.resource_type.as_deref(), &payload)
        .await?;
    Ok(Json(token))
}
