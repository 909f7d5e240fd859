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

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::time::{parse_datetime, DateTime};
use crate::{Error, Permissions, Result};

/// Storage resource kinds a token can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A blob inside a container.
    Blob,
    /// A table.
    Table,
}

impl ResourceType {
    /// Name of the storage service that hosts this resource, as used in
    /// endpoints and canonical resources.
    pub fn service_name(&self) -> &'static str {
        match self {
            ResourceType::Blob => "blob",
            ResourceType::Table => "table",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("blob") {
            Ok(ResourceType::Blob)
        } else if s.eq_ignore_ascii_case("table") {
            Ok(ResourceType::Table)
        } else {
            Err(Error::resource_type_unsupported(format!(
                "resource type must be blob or table, got {s:?}"
            )))
        }
    }
}

/// A validated request for access to one storage resource.
///
/// A value of this type always satisfies:
///
/// - `name` is non-blank.
/// - `container` is `Some` and non-blank for blobs, `None` for tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    resource_type: ResourceType,
    name: String,
    container: Option<String>,
    permissions: Permissions,
    expiration: Option<DateTime>,
}

impl ResourceRequest {
    /// Build a request from already typed values.
    ///
    /// `container` is ignored for tables.
    pub fn new(
        resource_type: ResourceType,
        name: impl Into<String>,
        container: Option<String>,
        permissions: Permissions,
        expiration: Option<DateTime>,
    ) -> Result<Self> {
        let name = name.into();
        if is_blank(&name) {
            return Err(Error::name_missing("name must not be empty"));
        }

        let container = match resource_type {
            ResourceType::Blob => match container {
                Some(v) if !is_blank(&v) => Some(v),
                _ => return Err(Error::container_missing("container must not be empty")),
            },
            ResourceType::Table => None,
        };

        Ok(Self {
            resource_type,
            name,
            container,
            permissions,
            expiration,
        })
    }

    /// Validate a loosely typed request.
    ///
    /// `resource_type` comes from the `type` query parameter, `payload` is
    /// the JSON body carrying `name`, `permissions`, `expiry` and, for
    /// blobs, `container`. Checks run in this order and the first failure
    /// wins:
    ///
    /// 1. `type` is `blob` or `table`, case-insensitively.
    /// 2. `name` is a non-blank string.
    /// 3. For blobs, `container` is a non-blank string.
    /// 4. `permissions` is an accepted token, see [`Permissions::from_str`].
    /// 5. `expiry` is absent, `null`, or a parsable date/time.
    pub fn from_payload(resource_type: Option<&str>, payload: &Value) -> Result<Self> {
        let resource_type: ResourceType = resource_type
            .ok_or_else(|| Error::resource_type_unsupported("type parameter is required"))?
            .parse()?;

        let name = match payload.get("name") {
            Some(Value::String(v)) if !is_blank(v) => v.clone(),
            _ => return Err(Error::name_missing("name must be a non-empty string")),
        };

        let container = match resource_type {
            ResourceType::Blob => match payload.get("container") {
                Some(Value::String(v)) if !is_blank(v) => Some(v.clone()),
                _ => {
                    return Err(Error::container_missing(
                        "container must be a non-empty string",
                    ))
                }
            },
            ResourceType::Table => None,
        };

        let permissions = match payload.get("permissions") {
            Some(Value::String(v)) => v.parse()?,
            _ => {
                return Err(Error::permissions_invalid(
                    "permissions must be one of r, w, rw or wr",
                ))
            }
        };

        let expiration = match payload.get("expiry") {
            None | Some(Value::Null) => None,
            Some(Value::String(v)) => Some(parse_datetime(v)?),
            Some(v) => {
                return Err(Error::expiration_invalid(format!(
                    "expiry must be a date/time string, got {v}"
                )))
            }
        };

        Ok(Self {
            resource_type,
            name,
            container,
            permissions,
            expiration,
        })
    }

    /// Kind of the requested resource.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Blob or table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container holding the blob, `None` for tables.
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Requested permissions.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Requested expiration, `None` means the token never expires by policy.
    pub fn expiration(&self) -> Option<DateTime> {
        self.expiration
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
