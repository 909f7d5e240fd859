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

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::locator::DEFAULT_ENDPOINT_SUFFIX;
use crate::{
    AccessPolicy, CheckExistence, Error, ResourceLocator, ResourceRequest, ResourceType, Result,
    SignAccessPolicy,
};

/// The issued token: the resource URI with the signed query appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Full URI granting the requested access.
    pub uri: String,
}

/// Broker is the main struct used to issue access tokens.
///
/// It holds no per request state and can be shared freely.
#[derive(Clone, Debug)]
pub struct Broker {
    signer: Arc<dyn SignAccessPolicy>,
    checker: Arc<dyn CheckExistence>,
    protocol: String,
    endpoint_suffix: String,
    blob_endpoint: Option<String>,
    table_endpoint: Option<String>,
}

impl Broker {
    /// Create a new broker.
    pub fn new(signer: impl SignAccessPolicy, checker: impl CheckExistence) -> Self {
        Self {
            signer: Arc::new(signer),
            checker: Arc::new(checker),
            protocol: "https".to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            blob_endpoint: None,
            table_endpoint: None,
        }
    }

    /// Issue tokens for another endpoint suffix.
    pub fn with_endpoint_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = suffix.into();
        self
    }

    /// Issue tokens for `http` or `https` endpoints.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Issue tokens against an explicit endpoint for one service, for example
    /// a storage emulator.
    pub fn with_endpoint(mut self, resource_type: ResourceType, endpoint: impl Into<String>) -> Self {
        match resource_type {
            ResourceType::Blob => self.blob_endpoint = Some(endpoint.into()),
            ResourceType::Table => self.table_endpoint = Some(endpoint.into()),
        }
        self
    }

    /// Validate a loosely typed request and issue a token for it.
    ///
    /// See [`ResourceRequest::from_payload`] for the accepted payload.
    pub async fn issue_from_payload(
        &self,
        resource_type: Option<&str>,
        payload: &Value,
    ) -> Result<AccessToken> {
        let req = ResourceRequest::from_payload(resource_type, payload)?;
        self.issue(&req).await
    }

    /// Issue a token for a validated request.
    ///
    /// The access policy is built first, so an unsupported permission set is
    /// reported without touching the storage service. For blobs the container
    /// must then exist, otherwise a
    /// [`ResourceNotFound`](crate::ErrorKind::ResourceNotFound) error is
    /// returned.
    pub async fn issue(&self, req: &ResourceRequest) -> Result<AccessToken> {
        // Policy errors must win over a missing container.
        let policy = AccessPolicy::build(req)?;

        if let (ResourceType::Blob, Some(container)) = (req.resource_type(), req.container()) {
            if !self.checker.container_exists(container).await? {
                return Err(Error::resource_not_found(format!(
                    "container {container} does not exist"
                )));
            }
        }

        let locator = ResourceLocator::for_request(self.signer.account_name(), req)
            .with_protocol(&self.protocol)
            .with_endpoint_suffix(&self.endpoint_suffix)
            .with_endpoint(match req.resource_type() {
                ResourceType::Blob => self.blob_endpoint.as_deref(),
                ResourceType::Table => self.table_endpoint.as_deref(),
            });
        debug!("signing policy {policy:?} for {}", locator.canonical_resource());

        let query = self.signer.sign_policy(&locator, &policy).await?;

        info!(
            "issued {} token for {} with permission {:?}",
            req.resource_type(),
            locator.canonical_resource(),
            policy.permission()
        );
        Ok(AccessToken {
            uri: format!("{}?{}", locator.uri(), query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Permissions};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct EchoSigner;

    #[async_trait::async_trait]
    impl SignAccessPolicy for EchoSigner {
        fn account_name(&self) -> &str {
            "test"
        }

        async fn sign_policy(&self, _: &ResourceLocator, policy: &AccessPolicy) -> Result<String> {
            Ok(format!("sp={}&sig=fake", policy.permission()))
        }
    }

    #[derive(Debug, Default)]
    struct Containers {
        existing: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl CheckExistence for Containers {
        async fn container_exists(&self, container: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.existing.contains(&container))
        }
    }

    #[derive(Debug)]
    struct BrokenChecker;

    #[async_trait::async_trait]
    impl CheckExistence for BrokenChecker {
        async fn container_exists(&self, _: &str) -> Result<bool> {
            Err(Error::unexpected("connection reset"))
        }
    }

    fn broker() -> Broker {
        Broker::new(
            EchoSigner,
            Containers {
                existing: vec!["photos"],
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_issue_blob() {
        let req = ResourceRequest::new(
            ResourceType::Blob,
            "cat.jpg",
            Some("photos".to_string()),
            Permissions::READ_WRITE,
            None,
        )
        .unwrap();

        let token = broker().issue(&req).await.unwrap();
        assert_eq!(
            token.uri,
            "https://test.blob.core.windows.net/photos/cat.jpg?sp=rw&sig=fake"
        );
    }

    #[tokio::test]
    async fn test_issue_table_skips_existence_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = Broker::new(
            EchoSigner,
            Containers {
                existing: vec![],
                calls: calls.clone(),
            },
        );

        let token = broker
            .issue_from_payload(Some("table"), &json!({"name": "scores", "permissions": "w"}))
            .await
            .unwrap();

        assert_eq!(
            token.uri,
            "https://test.table.core.windows.net/scores?sp=aud&sig=fake"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_container_is_not_found() {
        let err = broker()
            .issue_from_payload(
                Some("blob"),
                &json!({"name": "cat.jpg", "container": "videos", "permissions": "r"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert!(!err.is_bad_request());
    }

    #[tokio::test]
    async fn test_checker_failure_is_propagated() {
        let broker = Broker::new(EchoSigner, BrokenChecker);
        let err = broker
            .issue_from_payload(
                Some("blob"),
                &json!({"name": "cat.jpg", "container": "photos", "permissions": "r"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[tokio::test]
    async fn test_partial_blob_write_rejected_before_existence_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = Broker::new(
            EchoSigner,
            Containers {
                existing: vec![],
                calls: calls.clone(),
            },
        );
        let req = ResourceRequest::new(
            ResourceType::Blob,
            "cat.jpg",
            Some("videos".to_string()),
            Permissions::ADD,
            None,
        )
        .unwrap();

        let err = broker.issue(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionCombinationUnsupported);
        assert!(err.is_bad_request());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_runs_before_existence_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = Broker::new(
            EchoSigner,
            Containers {
                existing: vec!["photos"],
                calls: calls.clone(),
            },
        );

        let err = broker
            .issue_from_payload(
                Some("blob"),
                &json!({"name": "", "container": "photos", "permissions": "r"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NameMissing);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_endpoint() {
        let broker = broker()
            .with_protocol("http")
            .with_endpoint_suffix("core.chinacloudapi.cn");

        let token = broker
            .issue_from_payload(Some("table"), &json!({"name": "scores", "permissions": "r"}))
            .await
            .unwrap();

        assert_eq!(
            token.uri,
            "http://test.table.core.chinacloudapi.cn/scores?sp=r&sig=fake"
        );
    }

    #[tokio::test]
    async fn test_explicit_endpoint() {
        let broker = broker().with_endpoint(ResourceType::Blob, "http://127.0.0.1:10000/test");

        let token = broker
            .issue_from_payload(
                Some("blob"),
                &json!({"name": "cat.jpg", "container": "photos", "permissions": "r"}),
            )
            .await
            .unwrap();
        assert_eq!(token.uri, "http://127.0.0.1:10000/test/photos/cat.jpg?sp=r&sig=fake");

        // Tables keep the default endpoint.
        let token = broker
            .issue_from_payload(Some("table"), &json!({"name": "scores", "permissions": "r"}))
            .await
            .unwrap();
        assert_eq!(token.uri, "https://test.table.core.windows.net/scores?sp=r&sig=fake");
    }

    #[test]
    fn test_access_token_json() {
        let token = AccessToken {
            uri: "https://test.table.core.windows.net/scores?sp=r".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            json!({"uri": "https://test.table.core.windows.net/scores?sp=r"})
        );
    }
}
