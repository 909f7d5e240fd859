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

//! Core components for issuing storage access tokens.
//!
//! This crate turns a client request for a blob or table into a
//! time-limited, permission-scoped access token without ever handling the
//! storage account key itself.
//!
//! ## Overview
//!
//! - [`ResourceRequest`] validates the loosely typed client input.
//! - [`AccessPolicy`] derives the validity window and the permission code
//!   for the target resource type.
//! - [`Broker`] checks that blob containers exist, asks a
//!   [`SignAccessPolicy`] implementation for the signed query and returns an
//!   [`AccessToken`].
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use resbroker_core::{
//!     AccessPolicy, Broker, CheckExistence, ResourceLocator, Result, SignAccessPolicy,
//! };
//! use serde_json::json;
//!
//! #[derive(Debug)]
//! struct MySigner;
//!
//! #[async_trait]
//! impl SignAccessPolicy for MySigner {
//!     fn account_name(&self) -> &str {
//!         "myaccount"
//!     }
//!
//!     async fn sign_policy(&self, _: &ResourceLocator, policy: &AccessPolicy) -> Result<String> {
//!         Ok(format!("sp={}&sig=...", policy.permission()))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct AllContainersExist;
//!
//! #[async_trait]
//! impl CheckExistence for AllContainersExist {
//!     async fn container_exists(&self, _: &str) -> Result<bool> {
//!         Ok(true)
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let broker = Broker::new(MySigner, AllContainersExist);
//! let token = broker
//!     .issue_from_payload(
//!         Some("blob"),
//!         &json!({"name": "cat.jpg", "container": "photos", "permissions": "r"}),
//!     )
//!     .await?;
//! println!("{}", token.uri);
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: HMAC and base64 helpers for signer implementations
//! - [`time`]: Date/time parsing and formatting
//! - [`utils`]: Secret redaction for `Debug` output

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};
mod request;
pub use request::SigningRequest;

mod permission;
pub use permission::Permissions;
mod resource;
pub use resource::{ResourceRequest, ResourceType};
mod policy;
pub use policy::{AccessPolicy, START_TIME_SKEW};
mod locator;
pub use locator::{ResourceLocator, DEFAULT_ENDPOINT_SUFFIX};

mod api;
pub use api::{CheckExistence, SignAccessPolicy};
mod broker;
pub use broker::{AccessToken, Broker};
