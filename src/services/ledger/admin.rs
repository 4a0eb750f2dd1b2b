// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::LedgerError;
use std::collections::HashSet;

/// `isAdmin` predicate over transport identities.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: HashSet<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: ids
                .into_iter()
                .map(Into::into)
                .map(|id: String| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(identity.trim())
    }

    pub fn require(&self, identity: &str) -> Result<(), LedgerError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(format!(
                "{identity} is not an administrator"
            )))
        }
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_identities_are_admins() {
        let policy = AdminPolicy::new(["7631664265", " 6343896085 ", ""]);
        assert_eq!(policy.len(), 2);
        assert!(policy.is_admin("6343896085"));
        assert!(policy.require("7631664265").is_ok());
        assert!(matches!(
            policy.require("42"),
            Err(LedgerError::Unauthorized(_))
        ));
    }
}
