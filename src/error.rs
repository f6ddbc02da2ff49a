//! Error handling.

use chrono::{DateTime, Utc};

use core::fmt;

use crate::alloc::String;

/// Part of the token a claim belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimLocation {
    /// Token header.
    Header,
    /// Token payload.
    Payload,
}

impl fmt::Display for ClaimLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
        })
    }
}

/// Segment of a compact token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// First segment: the encoded header.
    Header,
    /// Second segment: the encoded payload.
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
        })
    }
}

/// Errors that may occur during token parsing.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// Token has invalid structure.
    ///
    /// Valid tokens must consist of 3 base64url-encoded parts (header, payload, and signature)
    /// separated by periods.
    InvalidTokenStructure,
    /// Cannot decode base64.
    Base64 {
        /// Segment that failed decoding.
        segment: Segment,
        /// Underlying error.
        source: base64ct::Error,
    },
    /// Segment does not contain a JSON object.
    MalformedJson {
        /// Segment that failed decoding.
        segment: Segment,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Algorithm mentioned in the token header differs from the one supplied by the caller.
    AlgorithmMismatch {
        /// Expected algorithm name.
        expected: &'static str,
        /// Actual algorithm in the token, if the `alg` header is a string.
        actual: Option<String>,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTokenStructure => {
                formatter.write_str("Invalid token structure; expected 3 segments")
            }
            Self::Base64 { segment, source } => {
                write!(formatter, "base64 decoding error in {segment}: {source}")
            }
            Self::MalformedJson { segment, source } => {
                write!(formatter, "Malformed token {segment}: {source}")
            }
            Self::AlgorithmMismatch {
                expected,
                actual: Some(actual),
            } => write!(
                formatter,
                "Token algorithm ({actual}) differs from expected ({expected})"
            ),
            Self::AlgorithmMismatch {
                expected,
                actual: None,
            } => write!(
                formatter,
                "Token header has no algorithm; expected {expected}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64 { source, .. } => Some(source),
            Self::MalformedJson { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reason why a claim was deemed invalid during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidClaimReason {
    /// The claim is present, but its value is JSON `null`.
    Null,
    /// The claim value does not satisfy the constraint configured in the validator.
    ConstraintViolated,
    /// The token is not yet valid as per the `nbf` claim.
    NotYetValid {
        /// Moment from which the token is valid.
        not_before: DateTime<Utc>,
    },
    /// The claim is expected to be a timestamp, but has another type.
    NotATimestamp,
}

impl fmt::Display for InvalidClaimReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => formatter.write_str("is null"),
            Self::ConstraintViolated => formatter.write_str("does not conform to constraint"),
            Self::NotYetValid { not_before } => {
                write!(formatter, "is not yet valid; valid from {not_before}")
            }
            Self::NotATimestamp => formatter.write_str("is not a timestamp"),
        }
    }
}

/// Kind of an [`Error`], allowing to match on the failure category without
/// destructuring the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid argument passed to a mutator (e.g., a `null` claim value).
    InvalidArgument,
    /// Claim set could not be serialized.
    Encode,
    /// Cryptographic engine could not produce a signature.
    Sign,
    /// Compact token could not be parsed.
    Decode,
    /// Cryptographic engine failed while verifying a signature.
    Verification,
    /// Signature does not match the signed data.
    InvalidSignature,
    /// Claim required by the validator is absent.
    MissingClaim,
    /// Claim is present, but is invalid.
    InvalidClaim,
    /// Token has expired.
    Expired,
    /// Stored claim value has an unexpected type.
    ClaimType,
}

impl ErrorKind {
    /// Checks whether this kind signals that a token has failed validation.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            Self::Verification
                | Self::InvalidSignature
                | Self::MissingClaim
                | Self::InvalidClaim
                | Self::Expired
        )
    }
}

/// Errors produced by this crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid argument passed to a claim mutator.
    InvalidArgument {
        /// Name of the offending claim.
        name: String,
        /// Human-readable description of the problem.
        message: &'static str,
    },
    /// Claim set cannot be serialized into JSON.
    Encode(serde_json::Error),
    /// Signature cannot be produced.
    Sign(anyhow::Error),
    /// Token cannot be parsed.
    Decode(DecodeError),
    /// Cryptographic engine has failed during signature verification. This is distinct
    /// from a signature mismatch, which is signalled with [`Self::InvalidSignature`].
    Verification(anyhow::Error),
    /// Token signature has failed verification.
    InvalidSignature,
    /// Claim requested during validation is not present in the token.
    MissingClaim {
        /// Location of the claim.
        location: ClaimLocation,
        /// Claim name.
        name: String,
    },
    /// Claim is invalid.
    InvalidClaim {
        /// Location of the claim.
        location: ClaimLocation,
        /// Claim name.
        name: String,
        /// Reason the claim is invalid.
        reason: InvalidClaimReason,
    },
    /// Token has expired.
    Expired {
        /// Expiration moment recorded in the token.
        expired_at: DateTime<Utc>,
    },
    /// Claim value cannot be read as the requested type.
    ClaimType {
        /// Claim name.
        name: String,
        /// Underlying conversion error.
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Sign(_) => ErrorKind::Sign,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Verification(_) => ErrorKind::Verification,
            Self::InvalidSignature => ErrorKind::InvalidSignature,
            Self::MissingClaim { .. } => ErrorKind::MissingClaim,
            Self::InvalidClaim { .. } => ErrorKind::InvalidClaim,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::ClaimType { .. } => ErrorKind::ClaimType,
        }
    }

    pub(crate) fn invalid_claim(
        location: ClaimLocation,
        name: impl Into<String>,
        reason: InvalidClaimReason,
    ) -> Self {
        Self::InvalidClaim {
            location,
            name: name.into(),
            reason,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name, message } => {
                write!(formatter, "Invalid argument for claim `{name}`: {message}")
            }
            Self::Encode(e) => write!(formatter, "Cannot serialize claims: {e}"),
            Self::Sign(e) => write!(formatter, "Cannot sign token: {e}"),
            Self::Decode(e) => write!(formatter, "Cannot decode token: {e}"),
            Self::Verification(e) => write!(formatter, "Cannot verify signature: {e}"),
            Self::InvalidSignature => formatter.write_str("Signature has failed verification"),
            Self::MissingClaim { location, name } => {
                write!(formatter, "Claim `{name}` is not present in {location}")
            }
            Self::InvalidClaim {
                location,
                name,
                reason,
            } => write!(formatter, "Claim `{name}` in {location} {reason}"),
            Self::Expired { expired_at } => write!(formatter, "Token expired on {expired_at}"),
            Self::ClaimType { name, source } => {
                write!(formatter, "Claim `{name}` has unexpected type: {source}")
            }
        }
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Sign(e) | Self::Verification(e) => Some(e.as_ref()),
            Self::Decode(e) => Some(e),
            Self::ClaimType { source, .. } => Some(source),
            _ => None,
        }
    }
}
