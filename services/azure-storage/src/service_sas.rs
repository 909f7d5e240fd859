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
use log::debug;
use resbroker_core::hash::{base64_decode, base64_hmac_sha256};
use resbroker_core::time::{format_sas_datetime, DateTime};
use resbroker_core::{
    AccessPolicy, Error, ResourceLocator, ResourceType, Result, SignAccessPolicy,
};

use crate::constants::STORAGE_VERSION;
use crate::Credential;

/// Signed resource for a single blob.
const BLOB_SIGNED_RESOURCE: &str = "b";

/// A service shared access signature for one blob or table.
///
/// - [Create a service SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas)
pub struct ServiceSharedAccessSignature<'a> {
    key: &'a str,
    locator: &'a ResourceLocator,
    permissions: &'a str,
    start: DateTime,
    expiry: Option<DateTime>,
    version: &'static str,
}

impl<'a> ServiceSharedAccessSignature<'a> {
    /// Create a SAS token signer for `policy` on the resource at `locator`.
    pub fn new(key: &'a str, locator: &'a ResourceLocator, policy: &'a AccessPolicy) -> Self {
        Self {
            key,
            locator,
            permissions: policy.permission(),
            start: policy.start(),
            expiry: policy.expiry(),
            version: STORAGE_VERSION,
        }
    }

    /// Construct string to sign
    ///
    /// ## Format
    ///
    /// ```text
    /// signedPermissions + "\n" +
    /// signedStart + "\n" +
    /// signedExpiry + "\n" +
    /// canonicalizedResource + "\n" +
    /// signedIdentifier + "\n" +
    /// signedIP + "\n" +
    /// signedProtocol + "\n" +
    /// signedVersion + "\n" +
    /// ...service specific fields
    /// ```
    ///
    /// Blobs add signedResource, snapshot time, encryption scope and the
    /// five response header overrides. Tables add the partition and row key
    /// ranges.
    fn string_to_sign(&self) -> String {
        let mut parts = vec![
            self.permissions.to_string(),
            format_sas_datetime(self.start),
            self.expiry.map(format_sas_datetime).unwrap_or_default(),
            self.locator.canonical_resource(),
            // signedIdentifier, signedIP, signedProtocol
            String::new(),
            String::new(),
            String::new(),
            self.version.to_string(),
        ];

        match self.locator.resource_type() {
            ResourceType::Blob => {
                parts.push(BLOB_SIGNED_RESOURCE.to_string());
                // snapshot time, encryption scope, rscc, rscd, rsce, rscl, rsct
                parts.extend(std::iter::repeat(String::new()).take(7));
            }
            ResourceType::Table => {
                // spk, srk, epk, erk
                parts.extend(std::iter::repeat(String::new()).take(4));
            }
        }

        parts.join("\n")
    }

    /// Compute the `sig` value.
    pub fn signature(&self) -> Result<String> {
        let string_to_sign = self.string_to_sign();
        debug!("string to sign: {string_to_sign:?}");

        let decode_content = base64_decode(self.key).map_err(|e| {
            Error::signing_failed("account key is not valid base64").with_source(e)
        })?;
        Ok(base64_hmac_sha256(&decode_content, string_to_sign.as_bytes()))
    }

    /// Build the query pairs, values already form-urlencoded.
    pub fn token(&self) -> Result<Vec<(String, String)>> {
        let mut elements: Vec<(String, String)> = vec![("sv".to_string(), self.version.to_string())];
        match self.locator.resource_type() {
            ResourceType::Blob => {
                elements.push(("sr".to_string(), BLOB_SIGNED_RESOURCE.to_string()))
            }
            ResourceType::Table => {
                elements.push(("tn".to_string(), urlencoded(self.locator.name())))
            }
        }
        elements.push((
            "st".to_string(),
            urlencoded(&format_sas_datetime(self.start)),
        ));
        if let Some(expiry) = self.expiry {
            elements.push(("se".to_string(), urlencoded(&format_sas_datetime(expiry))));
        }
        elements.push(("sp".to_string(), urlencoded(self.permissions)));
        elements.push(("sig".to_string(), urlencoded(&self.signature()?)));

        Ok(elements)
    }
}

fn urlencoded(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// SasSigner issues service SAS tokens with a shared key credential.
#[derive(Debug, Clone)]
pub struct SasSigner {
    credential: Credential,
}

impl SasSigner {
    /// Create a new signer.
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl SignAccessPolicy for SasSigner {
    fn account_name(&self) -> &str {
        self.credential.account_name()
    }

    async fn sign_policy(&self, locator: &ResourceLocator, policy: &AccessPolicy) -> Result<String> {
        let Credential::SharedKey { account_key, .. } = &self.credential;

        let token = ServiceSharedAccessSignature::new(account_key, locator, policy).token()?;
        Ok(token
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use resbroker_core::hash::base64_encode;
    use resbroker_core::time::parse_datetime;
    use resbroker_core::{ErrorKind, Permissions, ResourceRequest};

    fn policy(resource_type: ResourceType, expiry: Option<&str>) -> AccessPolicy {
        let container = match resource_type {
            ResourceType::Blob => Some("photos".to_string()),
            ResourceType::Table => None,
        };
        let req = ResourceRequest::new(
            resource_type,
            "cat.jpg",
            container,
            Permissions::READ_WRITE,
            expiry.map(|v| parse_datetime(v).unwrap()),
        )
        .unwrap();

        AccessPolicy::build_at(&req, parse_datetime("2022-03-01T08:17:34Z").unwrap()).unwrap()
    }

    #[test]
    fn test_blob_string_to_sign() {
        let locator = ResourceLocator::blob("account", "photos", "cat.jpg");
        let policy = policy(ResourceType::Blob, Some("2199-03-12T07:00:00Z"));
        let sas = ServiceSharedAccessSignature::new("a2V5", &locator, &policy);

        assert_eq!(
            sas.string_to_sign(),
            "rw\n2022-03-01T08:12:34Z\n2199-03-12T07:00:00Z\n/blob/account/photos/cat.jpg\n\n\n\n2020-12-06\nb\n\n\n\n\n\n\n"
        );
    }

    #[test]
    fn test_table_string_to_sign() {
        let locator = ResourceLocator::table("account", "Scores");
        let policy = policy(ResourceType::Table, None);
        let sas = ServiceSharedAccessSignature::new("a2V5", &locator, &policy);

        assert_eq!(
            sas.string_to_sign(),
            "raud\n2022-03-01T08:12:34Z\n\n/table/account/scores\n\n\n\n2020-12-06\n\n\n\n"
        );
    }

    #[test]
    fn test_blob_token() {
        let key = base64_encode("key".as_bytes());
        let locator = ResourceLocator::blob("account", "photos", "cat.jpg");
        let policy = policy(ResourceType::Blob, Some("2199-03-12T07:00:00Z"));
        let sas = ServiceSharedAccessSignature::new(&key, &locator, &policy);

        let token = sas.token().unwrap();
        let keys: Vec<&str> = token.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["sv", "sr", "st", "se", "sp", "sig"]);
        assert_eq!(token[2].1, "2022-03-01T08%3A12%3A34Z");
        assert_eq!(token[3].1, "2199-03-12T07%3A00%3A00Z");
        assert_eq!(
            token[5].1,
            urlencoded(&base64_hmac_sha256(b"key", sas.string_to_sign().as_bytes()))
        );
    }

    #[test]
    fn test_table_token_without_expiry() {
        let key = base64_encode("key".as_bytes());
        let locator = ResourceLocator::table("account", "Scores");
        let policy = policy(ResourceType::Table, None);
        let sas = ServiceSharedAccessSignature::new(&key, &locator, &policy);

        let token = sas.token().unwrap();
        let keys: Vec<&str> = token.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["sv", "tn", "st", "sp", "sig"]);
        assert_eq!(token[1].1, "Scores");
        assert_eq!(token[3].1, "raud");
    }

    #[tokio::test]
    async fn test_sign_policy_with_bad_key() {
        let signer = SasSigner::new(Credential::with_shared_key("account", "not base64!"));
        let locator = ResourceLocator::table("account", "scores");

        let err = signer
            .sign_policy(&locator, &policy(ResourceType::Table, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailed);
    }

    #[tokio::test]
    async fn test_sign_policy_query() {
        let signer = SasSigner::new(Credential::with_shared_key(
            "account",
            &base64_encode("key".as_bytes()),
        ));
        let locator = ResourceLocator::blob("account", "photos", "cat.jpg");

        let query = signer
            .sign_policy(&locator, &policy(ResourceType::Blob, None))
            .await
            .unwrap();
        assert!(query.starts_with("sv=2020-12-06&sr=b&st=2022-03-01T08%3A12%3A34Z&sp=rw&sig="));
        assert!(!query.contains("se="));
        assert_eq!(signer.account_name(), "account");
    }
}
