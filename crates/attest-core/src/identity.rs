//! # Identifier Newtypes
//!
//! [`Did`] is validated at construction and on deserialization, so a `Did`
//! value is always of the form `did:<method>:<identifier>`. The UUID-backed
//! ids keep batch jobs, presentation requests and submissions in separate
//! namespaces: a `JobId` cannot be passed where a `SubmissionId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Did
// ---------------------------------------------------------------------------

/// A Decentralized Identifier, `did:<method>:<method-specific-id>`.
///
/// The method is lowercase ASCII alphanumeric and non-empty. The
/// method-specific id is non-empty and contains no whitespace. DID URL
/// fragments (`#key-1`) are not part of a `Did`; see [`Did::split_url`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Validate and wrap a DID string.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if !is_valid_did(&s) {
            return Err(ValidationError::InvalidDid(s));
        }
        Ok(Self(s))
    }

    /// The full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method, e.g. `key` for `did:key:z6Mk...`.
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        let prefix = 4 + self.method().len() + 1;
        self.0.get(prefix..).unwrap_or_default()
    }

    /// Split a DID URL such as `did:key:z6Mk...#z6Mk...` into the DID and
    /// its fragment (without the `#`).
    pub fn split_url(url: &str) -> Result<(Self, Option<&str>), ValidationError> {
        match url.split_once('#') {
            Some((did, fragment)) => Ok((Self::new(did)?, Some(fragment))),
            None => Ok((Self::new(url)?, None)),
        }
    }

    /// Build a DID URL pointing at a fragment of this DID's document.
    pub fn with_fragment(&self, fragment: &str) -> String {
        format!("{}#{}", self.0, fragment)
    }
}

fn is_valid_did(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("did:") else {
        return false;
    };
    let Some((method, id)) = rest.split_once(':') else {
        return false;
    };
    !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && !id.is_empty()
        && !id.contains('#')
        && !id.chars().any(char::is_whitespace)
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// UUID-backed ids
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a batch issuance job.
    JobId,
    "job"
);
uuid_id!(
    /// Identifier of a presentation request.
    RequestId,
    "request"
);
uuid_id!(
    /// Identifier of a presentation submission.
    SubmissionId,
    "submission"
);
