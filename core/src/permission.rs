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
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use crate::Error;

/// Access a client asks for, as a set of operation bits.
///
/// `WRITE` is not a bit of its own: it is the union of `ADD`, `UPDATE` and
/// `DELETE`. How the set is encoded into a permission code depends on the
/// resource type, see [`AccessPolicy`](crate::AccessPolicy).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(u8);

impl Permissions {
    /// No access.
    pub const NONE: Permissions = Permissions(0);
    /// Read (and, for tables, query) access.
    pub const READ: Permissions = Permissions(1);
    /// Add new entities.
    pub const ADD: Permissions = Permissions(1 << 1);
    /// Update existing entities.
    pub const UPDATE: Permissions = Permissions(1 << 2);
    /// Delete entities.
    pub const DELETE: Permissions = Permissions(1 << 3);
    /// Full write access.
    pub const WRITE: Permissions = Permissions(Self::ADD.0 | Self::UPDATE.0 | Self::DELETE.0);
    /// Full read and write access.
    pub const READ_WRITE: Permissions = Permissions(Self::READ.0 | Self::WRITE.0);

    /// Returns true if every bit of `other` is set in `self`.
    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set in `self`.
    pub fn intersects(self, other: Permissions) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Permissions;

    fn bitand(self, rhs: Self) -> Self::Output {
        Permissions(self.0 & rhs.0)
    }
}

impl Debug for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = [
            (Self::READ, "READ"),
            (Self::ADD, "ADD"),
            (Self::UPDATE, "UPDATE"),
            (Self::DELETE, "DELETE"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| name)
        .collect::<Vec<_>>();

        if names.is_empty() {
            f.write_str("Permissions(NONE)")
        } else {
            write!(f, "Permissions({})", names.join(" | "))
        }
    }
}

/// Parses the permission token sent by clients.
///
/// Accepted tokens, matched exactly:
///
/// | token | permissions  |
/// |-------|--------------|
/// | `r`   | `READ`       |
/// | `w`   | `WRITE`      |
/// | `rw`  | `READ_WRITE` |
/// | `wr`  | `READ_WRITE` |
impl FromStr for Permissions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Permissions::READ),
            "w" => Ok(Permissions::WRITE),
            "rw" | "wr" => Ok(Permissions::READ_WRITE),
            _ => Err(Error::permissions_invalid(format!(
                "permissions must be one of r, w, rw or wr, got {s:?}"
            ))),
        }
    }
}
