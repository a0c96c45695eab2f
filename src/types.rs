//! Identifiers, timestamps and the small value types shared by every record
use super::error::ValidationError;
use super::utils::{decode_bech32_id, new_uuid_to_bech32};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

// chrono's `Utc` marker is not `Ord`, so a derive would never apply
impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl serde::Serialize for TimeStamp<Utc> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

/// Declares a bech32m encoded identifier newtype. The prefix doubles as the
/// kind name reported in validation errors.
macro_rules! bech32_id {
    ($(#[$meta:meta])* $name:ident, $hrp:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub const HRP: &'static str = $hrp;

            /// Mint a fresh, time-ordered identifier.
            pub fn generate() -> Result<Self, ValidationError> {
                new_uuid_to_bech32(Self::HRP).map(Self)
            }
            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                decode_bech32_id(Self::HRP, raw).map(Self)
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<C> minicbor::Encode<C> for $name {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                _: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                e.str(&self.0)?.ok()
            }
        }

        impl<'b, C> minicbor::Decode<'b, C> for $name {
            fn decode(
                d: &mut minicbor::Decoder<'b>,
                _: &mut C,
            ) -> Result<Self, minicbor::decode::Error> {
                Ok(Self(d.str()?.to_owned()))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

bech32_id!(TenderId, "tender");
bech32_id!(BidId, "bid");
bech32_id!(
    /// Identifies a snapshot in either version log.
    VersionId,
    "ver"
);
bech32_id!(UserId, "user");
bech32_id!(OrganizationId, "org");
bech32_id!(ResponsibleId, "resp");

#[derive(
    minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum ServiceType {
    #[n(0)]
    Construction,
    #[n(1)]
    Delivery,
    #[n(2)]
    Manufacture,
}

impl FromStr for ServiceType {
    type Err = ValidationError;

    // exact match, as the category names are published verbatim
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Construction" => Ok(ServiceType::Construction),
            "Delivery" => Ok(ServiceType::Delivery),
            "Manufacture" => Ok(ServiceType::Manufacture),
            other => Err(ValidationError::UnknownValue {
                kind: "service type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceType::Construction => "Construction",
            ServiceType::Delivery => "Delivery",
            ServiceType::Manufacture => "Manufacture",
        })
    }
}

#[derive(
    minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum AuthorType {
    #[n(0)]
    User,
    #[n(1)]
    Organization,
}

impl FromStr for AuthorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(AuthorType::User),
            "Organization" => Ok(AuthorType::Organization),
            other => Err(ValidationError::UnknownValue {
                kind: "author type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for AuthorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthorType::User => "User",
            AuthorType::Organization => "Organization",
        })
    }
}

// legal forms an organization may be registered under
#[derive(
    minicbor::Encode, minicbor::Decode, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum OrganizationType {
    #[n(0)]
    IE,
    #[n(1)]
    LLC,
    #[n(2)]
    JSC,
}

impl FromStr for OrganizationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IE" => Ok(OrganizationType::IE),
            "LLC" => Ok(OrganizationType::LLC),
            "JSC" => Ok(OrganizationType::JSC),
            other => Err(ValidationError::UnknownValue {
                kind: "organization type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Limit/offset window for list operations. A missing or zero limit falls
/// back to the configured default page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self { limit, offset }
    }

    /// Returns `(limit, offset)` with defaults applied.
    pub fn resolve(&self, default_limit: usize) -> (usize, usize) {
        let limit = self.limit.filter(|l| *l > 0).unwrap_or(default_limit);
        (limit, self.offset.unwrap_or(0))
    }
}
