// SPDX-License-Identifier: MIT

//! Account capability flags.

/// Capability flags for an account, derived from its granted scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub admin: bool,
    pub owner: bool,
    pub waitlist: bool,
    pub employee: bool,
}

impl Permissions {
    /// Derive flags from the `granted_scopes` list of a self profile.
    pub fn from_scopes<S: AsRef<str>>(scopes: &[S]) -> Self {
        let mut permissions = Self::default();
        for scope in scopes {
            match scope.as_ref() {
                "admin" => permissions.admin = true,
                "owner" => permissions.owner = true,
                "waitlist" => permissions.waitlist = true,
                "employee" => permissions.employee = true,
                _ => {}
            }
        }
        permissions
    }
}
