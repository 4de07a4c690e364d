//! RBAC roles and the endpoint→permission table.
//!
//! Grounded verbatim on `examples/original_source/projects/quantsys/
//! services/a2a_hub/test_priority_scheduler... /test_rbac_unit.py`'s
//! permission matrix: four built-in roles, five permissions, deny-by-
//! default for unknown roles.

use serde::{Deserialize, Serialize};

/// A built-in RBAC role. Any token that does not map to one of these is
/// treated as `Invalid` and denied every permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Submitter,
    Worker,
    Auditor,
    Admin,
    Invalid,
}

impl Role {
    pub fn from_str(s: &str) -> Self {
        match s {
            "submitter" => Self::Submitter,
            "worker" => Self::Worker,
            "auditor" => Self::Auditor,
            "admin" => Self::Admin,
            _ => Self::Invalid,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitter => "submitter",
            Self::Worker => "worker",
            Self::Auditor => "auditor",
            Self::Admin => "admin",
            Self::Invalid => "invalid",
        }
    }
}

/// A permission checked by the policy gate before a route handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Create,
    ReadAll,
    ReportResult,
    ReplayDlq,
    Assign,
}

impl Role {
    /// Whether this role holds `permission`. `Admin` holds everything;
    /// `Invalid` holds nothing; the rest follow the matrix in
    /// `test_rbac_unit.py`.
    pub const fn has_permission(self, permission: Permission) -> bool {
        use Permission::{Assign, Create, ReadAll, ReplayDlq, ReportResult};
        match self {
            Self::Admin => true,
            Self::Invalid => false,
            Self::Submitter => matches!(permission, Create | ReadAll),
            Self::Worker => matches!(permission, ReportResult),
            Self::Auditor => matches!(permission, ReadAll),
        }
    }
}
