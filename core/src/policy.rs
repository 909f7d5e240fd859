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

use chrono::TimeDelta;

use crate::time::{self, DateTime};
use crate::{Error, Permissions, ResourceRequest, ResourceType, Result};

/// How far in the past a policy starts, so that clients whose clock lags
/// behind the storage service are not rejected right away.
pub const START_TIME_SKEW: TimeDelta = TimeDelta::minutes(5);

/// A signed access policy: the validity window plus the permission code in
/// the vocabulary of the target resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    start: DateTime,
    expiry: Option<DateTime>,
    permission: String,
}

impl AccessPolicy {
    /// Build the policy for `req` starting from the current time.
    pub fn build(req: &ResourceRequest) -> Result<Self> {
        Self::build_at(req, time::now())
    }

    /// Build the policy for `req` as if the current time were `now`.
    pub fn build_at(req: &ResourceRequest, now: DateTime) -> Result<Self> {
        let permission = match req.resource_type() {
            ResourceType::Blob => blob_permission(req.permissions())?,
            ResourceType::Table => table_permission(req.permissions()),
        };

        Ok(Self {
            start: now - START_TIME_SKEW,
            expiry: req.expiration(),
            permission,
        })
    }

    /// Time the policy becomes valid.
    pub fn start(&self) -> DateTime {
        self.start
    }

    /// Time the policy stops being valid, `None` if it doesn't expire.
    pub fn expiry(&self) -> Option<DateTime> {
        self.expiry
    }

    /// Permission code, such as `rw` for blobs or `raud` for tables.
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

/// Blobs only understand coarse read and write.
///
/// `ADD`, `UPDATE` and `DELETE` are accepted together as `WRITE`, but a
/// partial subset can't be expressed and is rejected instead of being
/// widened to full write access.
fn blob_permission(permissions: Permissions) -> Result<String> {
    let mut code = String::with_capacity(2);

    if permissions.contains(Permissions::READ) {
        code.push('r');
    }

    if permissions.contains(Permissions::WRITE) {
        code.push('w');
    } else if permissions.intersects(Permissions::WRITE) {
        return Err(Error::permission_combination_unsupported(
            "Blobs do not support Add, Update, or Delete permissions. Use the Write permission instead.",
        ));
    }

    Ok(code)
}

/// Tables encode every bit, always in `r`, `a`, `u`, `d` order.
fn table_permission(permissions: Permissions) -> String {
    [
        (Permissions::READ, 'r'),
        (Permissions::ADD, 'a'),
        (Permissions::UPDATE, 'u'),
        (Permissions::DELETE, 'd'),
    ]
    .into_iter()
    .filter(|(bit, _)| permissions.contains(*bit))
    .map(|(_, c)| c)
    .collect()
}
