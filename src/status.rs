//! Status

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Approval state of a collection or order record.
///
/// Records start out `Pending`. `Approved` and `Rejected` are final as far as
/// the views are concerned, but nothing stops a record from being moved again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Awaiting an approver
    #[default]
    Pending,

    /// Accepted by the approver
    Approved,

    /// Refused by the approver
    Rejected,
}

impl Status {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    /// Arabic label used by the collections views.
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "قيد الانتظار",
            Status::Approved => "تم الموافقة",
            Status::Rejected => "تم الرفض",
        }
    }

    /// Arabic label used by the order views, where approval means supplied.
    pub fn order_label(self) -> &'static str {
        match self {
            Status::Approved => "تم التوريد",
            other => other.label(),
        }
    }

    /// Whether the approve/reject actions still apply.
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "approved" => Ok(Status::Approved),
            "rejected" => Ok(Status::Rejected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Status filter offered by list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    /// Everything
    #[default]
    All,

    /// Pending only
    Pending,

    /// Approved only
    Approved,

    /// Rejected only
    Rejected,
}

impl StatusFilter {
    /// Whether a record or group with `status` passes the filter.
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == Status::Pending,
            StatusFilter::Approved => status == Status::Approved,
            StatusFilter::Rejected => status == Status::Rejected,
        }
    }
}

/// How a group's status is derived from its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusPolicy {
    /// Each member overwrites the group status in input order, so the last
    /// member decides. This is what the collections view has always shown.
    #[default]
    LastMemberWins,

    /// The member that created the group decides; later members never change
    /// it. This is what the order collector has always shown.
    FirstMemberWins,

    /// Pending if any member is pending, else approved if every member is
    /// approved, else rejected.
    Consensus,
}

impl StatusPolicy {
    /// Folds the next member's status into the group's current status.
    ///
    /// `first` is true for the member that created the group.
    pub(crate) fn fold(self, current: Status, next: Status, first: bool) -> Status {
        if first {
            return next;
        }

        match self {
            StatusPolicy::LastMemberWins => next,
            StatusPolicy::FirstMemberWins => current,
            StatusPolicy::Consensus => match (current, next) {
                (Status::Pending, _) | (_, Status::Pending) => Status::Pending,
                (Status::Approved, Status::Approved) => Status::Approved,
                _ => Status::Rejected,
            },
        }
    }
}
