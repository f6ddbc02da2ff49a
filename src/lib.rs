//! Issuing, parsing and validating signed [JSON web tokens (JWT)][JWT] with HMAC
//! and RSA signatures.
//!
//! # Design choices
//!
//! - Signing algorithms together with their keys are expressed via the [`Algorithm`] enum.
//!   An `Algorithm` is immutable and can be shared across threads.
//! - [JWT header] and payload are thin wrappers ([`Header`], [`Payload`]) around a generic
//!   string-keyed [`ClaimSet`]. Claim values are untyped in the set; a type is imposed
//!   when a value is read, and reads never coerce between JSON types.
//! - The [`alg` field] of the header is filled automatically from the algorithm during
//!   token creation, and is compared to the expected algorithm during parsing.
//!   The algorithm is never selected based on the token contents, which eliminates
//!   [algorithm switching attacks][switching].
//! - A [`Token`] is signed exactly once, when it is built by the [`TokenBuilder`].
//!   Parsed tokens keep their encoded header and payload verbatim, so signature verification
//!   is performed on the exact bytes received.
//! - [`Validator`] checks the signature, expiration and maturity of a token, and
//!   any number of declarative constraints on header and payload claims.
//!
//! Registered time claims (`exp`, `nbf`, `iat`) are stored as integer **milliseconds**
//! since the Unix epoch and exposed as [`DateTime<Utc>`](chrono::DateTime).
//!
//! ## Supported algorithms
//!
//! | Algorithm(s) | Feature | Description |
//! |--------------|---------|-------------|
//! | `HS256`, `HS384`, `HS512` | - | Uses pure Rust [`sha2`] and [`hmac`] crates |
//! | `RS256`, `RS384`, `RS512` | `rsa` | Uses pure Rust [`rsa`] crate with blinding |
//!
//! Key strength is checked on demand with [`Algorithm::ensure_strong()`].
//!
//! # Crate features
//!
//! - `std` (on by default) is propagated to the core dependencies and enables `std`-specific
//!   functionality (such as error types implementing the standard `Error` trait).
//! - `clock` (on by default) enables getting the current time using `Utc::now()` from
//!   [`chrono`]. Without it, [`TimeOptions`] and [`Validator`] must be created with
//!   an explicit clock function.
//! - `rsa` (on by default) enables `RS*` algorithms.
//! - `tracing` (off by default) emits [`tracing`] events at the `DEBUG` level when
//!   a token is rejected by [`Validator`]. Events mention the error kind and the claim name,
//!   never claim values or key material.
//!
//! Without the `std` feature, the crate is `no_std`-compatible; some `alloc` types
//! are still used, such as `String` and `Vec`.
//!
//! [JWT]: https://jwt.io/
//! [switching]: https://auth0.com/blog/critical-vulnerabilities-in-json-web-token-libraries/
//! [JWT header]: https://tools.ietf.org/html/rfc7519#section-5
//! [`alg` field]: https://tools.ietf.org/html/rfc7515#section-4.1.1
//! [`sha2`]: https://docs.rs/sha2/
//! [`hmac`]: https://docs.rs/hmac/
//! [`rsa`]: https://docs.rs/rsa/
//! [`chrono`]: https://docs.rs/chrono/
//! [`tracing`]: https://docs.rs/tracing/
//!
//! # Examples
//!
//! Basic JWT lifecycle:
//!
//! ```
//! use chrono::{Duration, Utc};
//! use jwt_lite::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let algorithm = Algorithm::hs384(b"super_secret_key_donut_steel_0123456789abcdefghijklmn");
//! let algorithm = algorithm.ensure_strong()?;
//!
//! // Create a token.
//! let token = Token::builder(&algorithm)
//!     .with_issuer("auth.example.com")
//!     .with_subject("alice")
//!     .with_issued_at(Utc::now())
//!     .with_expiration_time(Utc::now() + Duration::hours(1))
//!     .with_claim("admin", false)?
//!     .sign()?;
//!
//! // Parse the token.
//! let token = Token::parse(&algorithm, &token)?;
//! assert_eq!(token.header().algorithm()?, Some("HS384"));
//!
//! // Validate the token.
//! let validator = Validator::default()
//!     .with_issuer("auth.example.com")
//!     .with_claim("admin", false);
//! token.validate_with(&validator)?;
//! assert_eq!(token.payload().subject()?, Some("alice"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom claim decoding
//!
//! ```
//! # use jwt_lite::prelude::*;
//! # use serde::Deserialize;
//! #[derive(Debug, PartialEq, Deserialize)]
//! struct Profile {
//!     name: String,
//!     age: u32,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let algorithm = Algorithm::hs256("secret");
//! let token = Token::builder(&algorithm)
//!     .with_claim("profile", serde_json::json!({ "name": "Alice", "age": 32 }))?
//!     .build()?;
//!
//! let payload = token.payload();
//! let profile: Option<Profile> = payload.get_as("profile")?;
//! assert_eq!(profile.unwrap().age, 32);
//! // Reads never coerce between JSON types.
//! assert!(payload.get_as::<String>("profile").is_err());
//! // A converter can be applied to the raw value.
//! let has_name = payload.get_with("profile", |value| value.get("name").is_some());
//! assert_eq!(has_name, Some(true));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
// Documentation settings.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_root_url = "https://docs.rs/jwt-lite/0.1.0")]
// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod alg;
mod claims;
mod error;
mod token;
mod validator;

// Polyfill for `alloc` types.
mod alloc {
    #[cfg(not(feature = "std"))]
    extern crate alloc;

    #[cfg(not(feature = "std"))]
    pub use alloc::{
        borrow::ToOwned,
        boxed::Box,
        format,
        string::{String, ToString},
        vec::Vec,
    };
    #[cfg(feature = "std")]
    pub use std::{
        borrow::ToOwned,
        boxed::Box,
        format,
        string::{String, ToString},
        vec::Vec,
    };
}

/// Prelude to neatly import all necessary stuff from the crate.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        Algorithm, ClaimSet, Error, ErrorKind, Header, Payload, TimeOptions, Token,
        TokenValidator, Validator,
    };
}

pub use crate::{
    alg::{Algorithm, HashAlg, WeakKeyError},
    claims::{ClaimSet, Header, Payload, RegisteredClaim},
    error::{ClaimLocation, DecodeError, Error, ErrorKind, InvalidClaimReason, Segment},
    token::{Token, TokenBuilder},
    validator::{TimeOptions, TokenValidator, Validator},
};
