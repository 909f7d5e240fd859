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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use resbroker_core::{Error, ErrorKind};

/// Body returned for failures the client can't act on.
pub const INTERNAL_ERROR_MESSAGE: &str = "failed to issue access token";

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is not JSON.
    MalformedBody(String),
    /// Validation or issuance failed.
    Broker(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Broker(err)
    }
}

impl ApiError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Broker(err) if err.is_bad_request() => StatusCode::BAD_REQUEST,
            ApiError::Broker(err) if err.kind() == ErrorKind::ResourceNotFound => {
                StatusCode::FORBIDDEN
            }
            ApiError::Broker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::MalformedBody(msg) => {
                warn!("rejected request with malformed body: {msg}");
                format!("request body must be a JSON object: {msg}")
            }
            ApiError::Broker(err) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("failed to issue access token: {err:?}");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            ApiError::Broker(err) => {
                warn!("rejected request: {err}");
                err.to_string()
            }
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (Error::name_missing("name"), StatusCode::BAD_REQUEST),
            (Error::expiration_invalid("expiry"), StatusCode::BAD_REQUEST),
            (
                Error::permission_combination_unsupported("blob"),
                StatusCode::BAD_REQUEST,
            ),
            (Error::resource_not_found("container"), StatusCode::FORBIDDEN),
            (
                Error::signing_failed("key"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::unexpected("network"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let kind = err.kind();
            assert_eq!(ApiError::from(err).status(), expected, "kind: {kind}");
        }
        assert_eq!(
            ApiError::MalformedBody("eof".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
