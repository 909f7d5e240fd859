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

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderValue, Request, StatusCode};
use log::debug;
use percent_encoding::utf8_percent_encode;
use resbroker_core::hash::{base64_decode, base64_hmac_sha256};
use resbroker_core::time::{format_http_date, now, DateTime};
use resbroker_core::{CheckExistence, Context, Error, Result, SigningRequest};

use crate::constants::*;
use crate::Credential;

/// ContainerExistenceChecker asks the blob service whether a container
/// exists with a [Get Container Properties][1] call.
///
/// [1]: https://learn.microsoft.com/en-us/rest/api/storageservices/get-container-properties
#[derive(Debug)]
pub struct ContainerExistenceChecker {
    ctx: Context,
    credential: Credential,
    endpoint: String,
    time: Option<DateTime>,
}

impl ContainerExistenceChecker {
    /// Create a checker for the blob service at `endpoint`, such as
    /// `https://account.blob.core.windows.net`.
    pub fn new(ctx: Context, credential: Credential, endpoint: impl Into<String>) -> Self {
        Self {
            ctx,
            credential,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    fn build_request(&self, container: &str) -> Result<Request<Bytes>> {
        let req = Request::head(format!(
            "{}/{}?restype=container",
            self.endpoint,
            utf8_percent_encode(container, &AZURE_PATH_ENCODE_SET)
        ))
        .header(X_MS_VERSION, STORAGE_VERSION)
        .body(Bytes::new())?;

        let (mut parts, body) = req.into_parts();
        let mut ctx = SigningRequest::build(&mut parts)?;

        let Credential::SharedKey {
            account_name,
            account_key,
        } = &self.credential;

        ctx.headers.insert(
            X_MS_DATE,
            format_http_date(self.time.unwrap_or_else(now)).parse()?,
        );
        let string_to_sign = string_to_sign(&ctx, account_name)?;
        let decode_content = base64_decode(account_key).map_err(|e| {
            Error::signing_failed("account key is not valid base64").with_source(e)
        })?;
        let signature = base64_hmac_sha256(&decode_content, string_to_sign.as_bytes());

        ctx.headers.insert(header::AUTHORIZATION, {
            let mut value: HeaderValue = format!("SharedKey {account_name}:{signature}").parse()?;
            value.set_sensitive(true);
            value
        });

        ctx.apply(&mut parts)?;
        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl CheckExistence for ContainerExistenceChecker {
    async fn container_exists(&self, container: &str) -> Result<bool> {
        let req = self.build_request(container)?;
        let resp = self.ctx.http_send(req).await?;
        debug!(
            "container {container} properties responded with {}",
            resp.status()
        );

        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::unexpected(format!(
                "unexpected status {status} while checking container {container}"
            ))),
        }
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-Encoding + "\n" +
/// Content-Language + "\n" +
/// Content-Length + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// If-Modified-Since + "\n" +
/// If-Match + "\n" +
/// If-None-Match + "\n" +
/// If-Unmodified-Since + "\n" +
/// Range + "\n" +
/// CanonicalizedHeaders + "\n" +
/// CanonicalizedResource;
/// ```
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
fn string_to_sign(ctx: &SigningRequest, account_name: &str) -> Result<String> {
    let content_md5 = header::HeaderName::from_static("content-md5");
    let headers = [
        &header::CONTENT_ENCODING,
        &header::CONTENT_LANGUAGE,
        &header::CONTENT_LENGTH,
        &content_md5,
        &header::CONTENT_TYPE,
        &header::DATE,
        &header::IF_MODIFIED_SINCE,
        &header::IF_MATCH,
        &header::IF_NONE_MATCH,
        &header::IF_UNMODIFIED_SINCE,
        &header::RANGE,
    ];

    let mut s = String::with_capacity(256);
    s.push_str(ctx.method.as_str());
    s.push('\n');
    for name in headers {
        let value = ctx.header_get_or_default(name)?;
        // A zero Content-Length must be signed as empty.
        if !(*name == header::CONTENT_LENGTH && value == "0") {
            s.push_str(value);
        }
        s.push('\n');
    }
    s.push_str(&SigningRequest::pairs_to_string(
        ctx.header_to_vec_with_prefix("x-ms-")?,
        ":",
        "\n",
    ));
    s.push('\n');
    s.push_str(&canonicalize_resource(ctx, account_name));

    debug!("string to sign: {s:?}");
    Ok(s)
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalize_resource(ctx: &SigningRequest, account_name: &str) -> String {
    if ctx.query.is_empty() {
        return format!("/{}{}", account_name, ctx.path);
    }

    format!(
        "/{}{}\n{}",
        account_name,
        ctx.path,
        ctx.query_to_percent_decoded_string(":", "\n")
    )
}
