//! Tender and bid status values
//!
//! Tenders move CREATED → PUBLISHED → CLOSED, and may be CANCELLED from any
//! state. Only the set of legal values is enforced: any named status may
//! replace any other, provided the caller passed the ownership check.
use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

#[derive(
    minicbor::Encode,
    minicbor::Decode,
    serde::Serialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    #[n(0)]
    Created,
    #[n(1)]
    Published,
    #[n(2)]
    Closed,
    #[n(3)]
    Cancelled,
}

impl TenderStatus {
    pub const ALL: [TenderStatus; 4] = [
        TenderStatus::Created,
        TenderStatus::Published,
        TenderStatus::Closed,
        TenderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TenderStatus::Created => "CREATED",
            TenderStatus::Published => "PUBLISHED",
            TenderStatus::Closed => "CLOSED",
            TenderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether the tender shows up in the public listing.
    pub fn is_listed(self) -> bool {
        self == TenderStatus::Published
    }

    /// Status after asking to move to `next`.
    // No adjacency table: CLOSED -> CREATED is as legal as CREATED -> PUBLISHED.
    pub fn transition(self, next: TenderStatus) -> TenderStatus {
        next
    }
}

impl FromStr for TenderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase();
        if normalised.is_empty() {
            return Err(ValidationError::Missing("status"));
        }

        TenderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalised)
            .ok_or(ValidationError::UnknownValue {
                kind: "status",
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bids are created in CREATED and no further transitions are exposed.
#[derive(
    minicbor::Encode,
    minicbor::Decode,
    serde::Serialize,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    #[default]
    #[n(0)]
    Created,
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidStatus::Created => f.write_str("CREATED"),
        }
    }
}
