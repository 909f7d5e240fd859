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

use std::fmt::Debug;

use crate::{AccessPolicy, ResourceLocator, Result};

/// SignAccessPolicy turns an access policy into a signed query string.
///
/// Implementations own the account credential; the broker never sees it.
#[async_trait::async_trait]
pub trait SignAccessPolicy: Debug + Send + Sync + Unpin + 'static {
    /// Name of the storage account the signer holds a key for.
    fn account_name(&self) -> &str;

    /// Sign `policy` for the resource at `locator`.
    ///
    /// Returns the query string, without the leading `?`, that grants the
    /// policy when appended to [`ResourceLocator::uri`].
    async fn sign_policy(&self, locator: &ResourceLocator, policy: &AccessPolicy)
        -> Result<String>;
}

/// CheckExistence tells whether a blob container exists.
///
/// This is an I/O call; no retry is attempted on failure.
#[async_trait::async_trait]
pub trait CheckExistence: Debug + Send + Sync + Unpin + 'static {
    /// Returns `Ok(false)` if the container doesn't exist.
    async fn container_exists(&self, container: &str) -> Result<bool>;
}
