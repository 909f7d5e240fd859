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

use std::fmt::{Debug, Formatter};

use log::debug;
use resbroker_core::utils::Redact;
use resbroker_core::{Broker, Context, Error, ResourceType, Result, DEFAULT_ENDPOINT_SUFFIX};

use crate::constants::*;
use crate::{connection_string, ContainerExistenceChecker, Credential, SasSigner};

/// Config carries all the configuration for the storage account tokens are
/// issued for.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - connection string: `AccountName`
    /// - env value: [`AZURE_STORAGE_ACCOUNT_NAME`]
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - connection string: `AccountKey`
    /// - env value: [`AZURE_STORAGE_ACCOUNT_KEY`]
    pub account_key: Option<String>,
    /// `endpoint_suffix` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - connection string: `EndpointSuffix`
    /// - env value: [`AZURE_STORAGE_ENDPOINT_SUFFIX`]
    ///
    /// Defaults to `core.windows.net`.
    pub endpoint_suffix: Option<String>,
    /// `http` or `https`, from `DefaultEndpointsProtocol`. Defaults to `https`.
    pub protocol: Option<String>,
    /// Explicit blob endpoint, from `BlobEndpoint`.
    pub blob_endpoint: Option<String>,
    /// Explicit table endpoint, from `TableEndpoint`.
    pub table_endpoint: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(Redact::from))
            .field("endpoint_suffix", &self.endpoint_suffix)
            .field("protocol", &self.protocol)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("table_endpoint", &self.table_endpoint)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    ///
    /// A connection string in [`RESOURCE_BROKER_BLOB_CONNECTION_STRING`] or
    /// [`AZURE_STORAGE_CONNECTION_STRING`] is read first; the single value
    /// variables only fill in what is still missing.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        let conn_str = ctx
            .env_var(RESOURCE_BROKER_BLOB_CONNECTION_STRING)
            .or_else(|| ctx.env_var(AZURE_STORAGE_CONNECTION_STRING));
        if let Some(conn_str) = conn_str {
            debug!("loading storage config from connection string");
            self = self.merge(connection_string::parse(&conn_str)?);
        }

        if self.account_name.is_none() {
            self.account_name = ctx.env_var(AZURE_STORAGE_ACCOUNT_NAME);
        }
        if self.account_key.is_none() {
            self.account_key = ctx.env_var(AZURE_STORAGE_ACCOUNT_KEY);
        }
        if self.endpoint_suffix.is_none() {
            self.endpoint_suffix = ctx.env_var(AZURE_STORAGE_ENDPOINT_SUFFIX);
        }

        Ok(self)
    }

    /// Parses an [Azure connection string][1] into a configuration object.
    ///
    /// An example of a connection string looks like:
    ///
    /// ```txt
    /// DefaultEndpointsProtocol=https;
    /// AccountName=mystorageaccount;
    /// AccountKey=Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==;
    /// EndpointSuffix=core.windows.net
    /// ```
    ///
    /// [1]: https://learn.microsoft.com/en-us/azure/storage/common/storage-configure-connection-string
    pub fn try_from_connection_string(conn_str: &str) -> Result<Self> {
        connection_string::parse(conn_str)
    }

    /// Build the shared key credential.
    pub fn credential(&self) -> Result<Credential> {
        let (Some(account_name), Some(account_key)) = (&self.account_name, &self.account_key)
        else {
            return Err(Error::config_invalid(
                "storage account name and key are required",
            ));
        };

        let cred = Credential::with_shared_key(account_name, account_key);
        if !cred.is_valid() {
            return Err(Error::config_invalid(
                "storage account name and key must not be blank",
            ));
        }
        Ok(cred)
    }

    /// Endpoint of the given service.
    ///
    /// Returns the explicit endpoint if configured, otherwise
    /// `{protocol}://{account}.{service}.{suffix}`.
    pub fn endpoint(&self, resource_type: ResourceType) -> Result<String> {
        let explicit = match resource_type {
            ResourceType::Blob => &self.blob_endpoint,
            ResourceType::Table => &self.table_endpoint,
        };
        if let Some(endpoint) = explicit {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }

        let account_name = self
            .account_name
            .as_deref()
            .ok_or_else(|| Error::config_invalid("storage account name is required"))?;
        Ok(format!(
            "{}://{}.{}.{}",
            self.protocol(),
            account_name,
            resource_type.service_name(),
            self.endpoint_suffix()
        ))
    }

    /// Build a broker issuing tokens for this account.
    ///
    /// `ctx` must carry an [`HttpSend`](resbroker_core::HttpSend) for the
    /// container existence check.
    pub fn build_broker(&self, ctx: Context) -> Result<Broker> {
        let cred = self.credential()?;
        let checker =
            ContainerExistenceChecker::new(ctx, cred.clone(), self.endpoint(ResourceType::Blob)?);

        let mut broker = Broker::new(SasSigner::new(cred), checker)
            .with_protocol(self.protocol())
            .with_endpoint_suffix(self.endpoint_suffix());
        if let Some(endpoint) = &self.blob_endpoint {
            broker = broker.with_endpoint(ResourceType::Blob, endpoint);
        }
        if let Some(endpoint) = &self.table_endpoint {
            broker = broker.with_endpoint(ResourceType::Table, endpoint);
        }
        Ok(broker)
    }

    fn protocol(&self) -> &str {
        self.protocol.as_deref().unwrap_or("https")
    }

    fn endpoint_suffix(&self) -> &str {
        self.endpoint_suffix
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
    }

    /// Values already set on `self` win.
    fn merge(self, other: Config) -> Config {
        Config {
            account_name: self.account_name.or(other.account_name),
            account_key: self.account_key.or(other.account_key),
            endpoint_suffix: self.endpoint_suffix.or(other.endpoint_suffix),
            protocol: self.protocol.or(other.protocol),
            blob_endpoint: self.blob_endpoint.or(other.blob_endpoint),
            table_endpoint: self.table_endpoint.or(other.table_endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use resbroker_core::{ErrorKind, StaticEnv};

    const KEY: &str = "dGVzdGtleQ==";

    fn ctx(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv::from_pairs(envs.iter().copied()))
    }

    #[test]
    fn test_from_env_prefers_broker_connection_string() {
        let ctx = ctx(&[
            (
                RESOURCE_BROKER_BLOB_CONNECTION_STRING,
                "AccountName=broker;AccountKey=dGVzdGtleQ==",
            ),
            (
                AZURE_STORAGE_CONNECTION_STRING,
                "AccountName=generic;AccountKey=b3RoZXI=",
            ),
        ]);

        let config = Config::default().from_env(&ctx).unwrap();
        assert_eq!(config.account_name.as_deref(), Some("broker"));
        assert_eq!(config.account_key.as_deref(), Some(KEY));
    }

    #[test]
    fn test_from_env_single_values() {
        let ctx = ctx(&[
            (AZURE_STORAGE_ACCOUNT_NAME, "test"),
            (AZURE_STORAGE_ACCOUNT_KEY, KEY),
            (AZURE_STORAGE_ENDPOINT_SUFFIX, "core.usgovcloudapi.net"),
        ]);

        let config = Config::default().from_env(&ctx).unwrap();
        assert_eq!(
            config,
            Config {
                account_name: Some("test".to_string()),
                account_key: Some(KEY.to_string()),
                endpoint_suffix: Some("core.usgovcloudapi.net".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_from_env_keeps_explicit_values() {
        let ctx = ctx(&[(AZURE_STORAGE_CONNECTION_STRING, "AccountName=generic")]);

        let config = Config {
            account_name: Some("explicit".to_string()),
            ..Default::default()
        }
        .from_env(&ctx)
        .unwrap();
        assert_eq!(config.account_name.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_from_env_invalid_connection_string() {
        let ctx = ctx(&[(RESOURCE_BROKER_BLOB_CONNECTION_STRING, "AccountName")]);

        let err = Config::default().from_env(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_credential() {
        let err = Config::default().credential().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Config {
            account_name: Some("test".to_string()),
            account_key: Some(" ".to_string()),
            ..Default::default()
        }
        .credential()
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let cred = Config {
            account_name: Some("test".to_string()),
            account_key: Some(KEY.to_string()),
            ..Default::default()
        }
        .credential()
        .unwrap();
        assert_eq!(cred.account_name(), "test");
    }

    #[test]
    fn test_endpoint() {
        let config = Config {
            account_name: Some("test".to_string()),
            table_endpoint: Some("http://127.0.0.1:10002/test/".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.endpoint(ResourceType::Blob).unwrap(),
            "https://test.blob.core.windows.net"
        );
        assert_eq!(
            config.endpoint(ResourceType::Table).unwrap(),
            "http://127.0.0.1:10002/test"
        );
        assert!(Config::default().endpoint(ResourceType::Blob).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::try_from_connection_string("UseDevelopmentStorage=true").unwrap();

        let s = format!("{config:?}");
        assert!(s.contains("devstoreaccount1"));
        assert!(!s.contains("Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq"));
    }
}
