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

//! Azure Storage support for resbroker
//!
//! This crate provides:
//! - Configuration from env values and connection strings
//! - Service SAS tokens for blobs and tables
//! - Container existence checks signed with Shared Key
//!
//! # Example
//!
//! ```rust,no_run
//! use resbroker_azure_storage::Config;
//! use resbroker_core::{Context, Result};
//! use serde_json::json;
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let config = Config::default().from_env(&ctx)?;
//! let broker = config.build_broker(ctx)?;
//!
//! let token = broker
//!     .issue_from_payload(Some("table"), &json!({"name": "scores", "permissions": "r"}))
//!     .await?;
//! println!("{}", token.uri);
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::{
    AZURE_STORAGE_ACCOUNT_KEY, AZURE_STORAGE_ACCOUNT_NAME, AZURE_STORAGE_CONNECTION_STRING,
    AZURE_STORAGE_ENDPOINT_SUFFIX, RESOURCE_BROKER_BLOB_CONNECTION_STRING, STORAGE_VERSION,
};

mod config;
pub use config::Config;
mod connection_string;

mod credential;
pub use credential::Credential;

mod service_sas;
pub use service_sas::{SasSigner, ServiceSharedAccessSignature};

mod check_existence;
pub use check_existence::ContainerExistenceChecker;
