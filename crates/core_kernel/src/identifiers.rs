//! Strongly-typed identifiers for domain entities
//!
//! Every entity in the ledger is keyed by a store-assigned numeric id. Newtype
//! wrappers keep a `ClaimId` from ever being passed where a `PolicyId` is expected.
//! Human-facing reference numbers (`POL-…`, `CLM-…`, `PAY-…`) are separate values
//! generated by [`ReferenceNumber`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store identifier
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw store identifier
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the entity name used in error messages
            pub fn entity() -> &'static str {
                $entity
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(PlanId, "Plan");
define_id!(PolicyId, "Policy");
define_id!(ClaimId, "Claim");
define_id!(TreatmentId, "TreatmentRecord");
define_id!(PaymentId, "Payment");
define_id!(HospitalId, "Hospital");
define_id!(UserId, "User");
define_id!(NotificationId, "Notification");

/// Prefix of a generated reference number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Policy,
    Claim,
    Payment,
}

impl ReferenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ReferenceKind::Policy => "POL",
            ReferenceKind::Claim => "CLM",
            ReferenceKind::Payment => "PAY",
        }
    }
}

/// Human-readable reference of the form `PREFIX-XXXXXXXX`
///
/// The suffix is the first eight hex digits of a fresh v4 UUID, upper-cased.
/// Uniqueness is probabilistic; the store's unique indexes are the backstop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// Generates a fresh reference number
    pub fn generate(kind: ReferenceKind) -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", kind.prefix(), simple[..8].to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Checks that a string has the `PREFIX-XXXXXXXX` shape for the given kind
    pub fn is_well_formed(value: &str, kind: ReferenceKind) -> bool {
        match value.split_once('-') {
            Some((prefix, suffix)) => {
                prefix == kind.prefix()
                    && suffix.len() == 8
                    && suffix
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            }
            None => false,
        }
    }
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ReferenceNumber> for String {
    fn from(reference: ReferenceNumber) -> String {
        reference.0
    }
}
