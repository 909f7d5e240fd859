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

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{ResourceRequest, ResourceType};

/// Default DNS suffix of the public storage cloud.
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Characters kept as-is in resource paths; `/` is kept so that virtual
/// directories in blob names survive.
static PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'/')
    .remove(b'~');

/// Where a resource lives: account, service, container and object name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    resource_type: ResourceType,
    account: String,
    container: Option<String>,
    name: String,
    protocol: String,
    endpoint_suffix: String,
    endpoint: Option<String>,
}

impl ResourceLocator {
    /// Locate a blob.
    pub fn blob(
        account: impl Into<String>,
        container: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: ResourceType::Blob,
            account: account.into(),
            container: Some(container.into()),
            name: name.into(),
            protocol: "https".to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            endpoint: None,
        }
    }

    /// Locate a table.
    pub fn table(account: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Table,
            account: account.into(),
            container: None,
            name: name.into(),
            protocol: "https".to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            endpoint: None,
        }
    }

    /// Locate the resource a validated request points at.
    ///
    /// The container is taken as is: [`ResourceRequest`] guarantees one for
    /// blobs and none for tables.
    pub fn for_request(account: impl Into<String>, req: &ResourceRequest) -> Self {
        Self {
            resource_type: req.resource_type(),
            account: account.into(),
            container: req.container().map(str::to_string),
            name: req.name().to_string(),
            protocol: "https".to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            endpoint: None,
        }
    }

    /// Use another endpoint suffix, for example a sovereign cloud.
    pub fn with_endpoint_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = suffix.into();
        self
    }

    /// Use `http` or `https`.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Use an explicit service endpoint such as
    /// `http://127.0.0.1:10000/devstoreaccount1`.
    ///
    /// Protocol and endpoint suffix are ignored once an endpoint is set.
    pub fn with_endpoint(mut self, endpoint: Option<impl Into<String>>) -> Self {
        self.endpoint = endpoint.map(Into::into);
        self
    }

    /// Kind of the located resource.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Storage account name.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Container of a blob, `None` for tables.
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Blob or table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service endpoint, like `https://account.blob.core.windows.net`.
    pub fn endpoint(&self) -> String {
        if let Some(endpoint) = &self.endpoint {
            return endpoint.trim_end_matches('/').to_string();
        }

        format!(
            "{}://{}.{}.{}",
            self.protocol,
            self.account,
            self.resource_type.service_name(),
            self.endpoint_suffix
        )
    }

    /// Resource URI without any query.
    ///
    /// - Blob: `https://{account}.blob.core.windows.net/{container}/{name}`
    /// - Table: `https://{account}.table.core.windows.net/{name}`
    pub fn uri(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint(),
            utf8_percent_encode(&self.path(), &PATH_ENCODE_SET)
        )
    }

    /// Canonicalized resource used in service SAS string-to-sign.
    ///
    /// - Blob: `/blob/{account}/{container}/{name}`
    /// - Table: `/table/{account}/{lowercased name}`
    pub fn canonical_resource(&self) -> String {
        match self.resource_type {
            ResourceType::Blob => format!("/blob/{}/{}", self.account, self.path()),
            ResourceType::Table => format!("/table/{}/{}", self.account, self.name.to_lowercase()),
        }
    }

    /// `{container}/{name}`, or just `{name}` without a container.
    fn path(&self) -> String {
        match &self.container {
            Some(container) => format!("{container}/{}", self.name),
            None => self.name.clone(),
        }
    }
}
