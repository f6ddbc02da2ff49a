//! Token validation: signature check, temporal checks and declarative claim constraints.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use core::fmt;

use crate::{
    alloc::{Box, String, Vec},
    claims::millis_to_timestamp,
    ClaimLocation, ClaimSet, Error, InvalidClaimReason, Token,
};

/// Time-related validation options.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct TimeOptions<F = fn() -> DateTime<Utc>> {
    /// Leeway to use during validation.
    pub leeway: Duration,
    /// Source of the current timestamps.
    pub clock_fn: F,
}

impl<F: Fn() -> DateTime<Utc>> TimeOptions<F> {
    /// Creates options based on the specified time leeway and clock function.
    pub fn new(leeway: Duration, clock_fn: F) -> Self {
        Self { leeway, clock_fn }
    }
}

impl TimeOptions {
    /// Creates options based on the specified time leeway. The clock source is [`Utc::now()`].
    #[cfg(feature = "clock")]
    #[cfg_attr(docsrs, doc(cfg(feature = "clock")))]
    pub fn from_leeway(leeway: Duration) -> Self {
        Self {
            leeway,
            clock_fn: Utc::now,
        }
    }
}

/// Zero leeway, [`Utc::now()`] as the clock source.
#[cfg(feature = "clock")]
impl Default for TimeOptions {
    fn default() -> Self {
        Self::from_leeway(Duration::zero())
    }
}

/// Check that a [`Token`] must pass before it is trusted.
///
/// [`Validator`] is the standard implementation; custom implementations can be passed
/// to [`Token::validate_with()`].
pub trait TokenValidator {
    /// Validates the token. Success is signalled by returning `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token must be rejected.
    fn validate(&self, token: &Token<'_>) -> Result<(), Error>;
}

type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

struct Constraint {
    name: String,
    predicate: Predicate,
}

impl fmt::Debug for Constraint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Constraint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Constraints(Vec<Constraint>);

impl Constraints {
    fn insert(&mut self, name: String, predicate: Predicate) {
        if let Some(existing) = self.0.iter_mut().find(|constraint| constraint.name == name) {
            existing.predicate = predicate;
        } else {
            self.0.push(Constraint { name, predicate });
        }
    }

    fn check(&self, location: ClaimLocation, claims: &ClaimSet) -> Result<(), Error> {
        for Constraint { name, predicate } in &self.0 {
            let value = claims.get(name).ok_or_else(|| Error::MissingClaim {
                location,
                name: name.clone(),
            })?;
            if value.is_null() {
                return Err(Error::invalid_claim(
                    location,
                    name.as_str(),
                    InvalidClaimReason::Null,
                ));
            }
            if !predicate(value) {
                return Err(Error::invalid_claim(
                    location,
                    name.as_str(),
                    InvalidClaimReason::ConstraintViolated,
                ));
            }
        }
        Ok(())
    }
}

/// Reads the audience from a raw claim value, which may be a single string or a string array.
fn audience_values(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(audience) => Some(core::iter::once(audience.as_str()).collect()),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

fn equals(expected: Value) -> Predicate {
    Box::new(move |value| *value == expected)
}

fn equals_timestamp(expected: DateTime<Utc>) -> Predicate {
    Box::new(move |value| millis_to_timestamp(value) == Some(expected))
}

/// Validator checking token signature, `exp` / `nbf` claims, and optional constraints
/// on header and payload claims.
///
/// Validation is a fixed pipeline:
///
/// 1. The signature is verified. On failure, [`Error::InvalidSignature`] is returned
///    and no further checks are performed.
/// 2. Header constraints are checked in the order they were added.
/// 3. If the payload contains `exp`, the token must not be expired ([`Error::Expired`]).
///    If the payload contains `nbf`, the token must be already valid.
/// 4. Payload constraints are checked in the order they were added.
///
/// Each constraint requires the claim to be present ([`Error::MissingClaim`]), non-null
/// and satisfying the constraint ([`Error::InvalidClaim`]). Adding a constraint for a claim
/// that already has one replaces the previous constraint, keeping its position.
/// The first failing check determines the returned error.
///
/// # Examples
///
/// ```
/// # use chrono::{Duration, Utc};
/// # use jwt_lite::{Algorithm, ErrorKind, Token, Validator};
/// # fn main() -> anyhow::Result<()> {
/// let algorithm = Algorithm::hs256(b"super_secret_key_donut_steel_0123");
/// let token = Token::builder(&algorithm)
///     .with_issuer("issuer")
///     .with_audience(["aud1", "aud2"])
///     .with_expiration_time(Utc::now() + Duration::hours(1))
///     .build()?;
///
/// let validator = Validator::default()
///     .with_issuer("issuer")
///     .with_one_of_audience(["aud1", "aud3"]);
/// token.validate_with(&validator)?;
///
/// let validator = Validator::default().with_all_of_audience(["aud1", "aud3"]);
/// let err = token.validate_with(&validator).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::InvalidClaim);
/// # Ok(())
/// # }
/// ```
pub struct Validator<F = fn() -> DateTime<Utc>> {
    header_constraints: Constraints,
    payload_constraints: Constraints,
    time_options: TimeOptions<F>,
}

impl<F> fmt::Debug for Validator<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Validator")
            .field("header_constraints", &self.header_constraints)
            .field("payload_constraints", &self.payload_constraints)
            .field("leeway", &self.time_options.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "clock")]
impl Default for Validator {
    fn default() -> Self {
        Self::new(TimeOptions::default())
    }
}

impl<F: Fn() -> DateTime<Utc>> Validator<F> {
    /// Creates a validator without claim constraints.
    pub fn new(time_options: TimeOptions<F>) -> Self {
        Self {
            header_constraints: Constraints::default(),
            payload_constraints: Constraints::default(),
            time_options,
        }
    }

    /// Replaces time options used for `exp` / `nbf` checks.
    pub fn with_time_options<G>(self, time_options: TimeOptions<G>) -> Validator<G> {
        Validator {
            header_constraints: self.header_constraints,
            payload_constraints: self.payload_constraints,
            time_options,
        }
    }

    /// Returns time options used by this validator.
    pub fn time_options(&self) -> &TimeOptions<F> {
        &self.time_options
    }

    /// Requires the header claim to be equal to `value`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header_constraints.insert(name.into(), equals(value.into()));
        self
    }

    /// Requires the header claim to satisfy `predicate`.
    pub fn with_header_predicate<P>(mut self, name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.header_constraints.insert(name.into(), Box::new(predicate));
        self
    }

    /// Requires the `typ` header to be equal to `token_type`.
    pub fn with_type(self, token_type: impl Into<String>) -> Self {
        self.with_header("typ", token_type.into())
    }

    /// Requires the `cty` header to be equal to `content_type`.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("cty", content_type.into())
    }

    /// Requires the `alg` header to be equal to `algorithm`.
    pub fn with_algorithm(self, algorithm: impl Into<String>) -> Self {
        self.with_header("alg", algorithm.into())
    }

    /// Requires the payload claim to be equal to `value`. Values are compared as JSON,
    /// without type coercion (e.g., `1` is not equal to `"1"` or `1.0`).
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload_constraints.insert(name.into(), equals(value.into()));
        self
    }

    /// Requires the payload claim to satisfy `predicate`.
    pub fn with_claim_predicate<P>(mut self, name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.payload_constraints.insert(name.into(), Box::new(predicate));
        self
    }

    /// Requires the `iss` claim to be equal to `issuer`.
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with_claim("iss", issuer.into())
    }

    /// Requires the `sub` claim to be equal to `subject`.
    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with_claim("sub", subject.into())
    }

    /// Requires the `jti` claim to be equal to `id`.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_claim("jti", id.into())
    }

    /// Requires the `aud` claim to contain at least one of the `audience` values.
    pub fn with_one_of_audience<I>(self, audience: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let expected: Vec<String> = audience.into_iter().map(Into::into).collect();
        self.with_claim_predicate("aud", move |value| {
            audience_values(value).map_or(false, |actual| {
                actual
                    .iter()
                    .any(|aud| expected.iter().any(|expected| expected == aud))
            })
        })
    }

    /// Requires the `aud` claim to contain all of the `audience` values.
    pub fn with_all_of_audience<I>(self, audience: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let expected: Vec<String> = audience.into_iter().map(Into::into).collect();
        self.with_claim_predicate("aud", move |value| {
            audience_values(value).map_or(false, |actual| {
                expected
                    .iter()
                    .all(|expected| actual.contains(&expected.as_str()))
            })
        })
    }

    /// Requires the `exp` claim to be equal to `expiration_time` (with millisecond precision).
    pub fn with_expiration_time(mut self, expiration_time: DateTime<Utc>) -> Self {
        self.payload_constraints
            .insert("exp".into(), equals_timestamp(expiration_time));
        self
    }

    /// Requires the `nbf` claim to be equal to `not_before` (with millisecond precision).
    pub fn with_not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.payload_constraints
            .insert("nbf".into(), equals_timestamp(not_before));
        self
    }

    /// Requires the `iat` claim to be equal to `issued_at` (with millisecond precision).
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.payload_constraints
            .insert("iat".into(), equals_timestamp(issued_at));
        self
    }

    fn check_signature(token: &Token<'_>) -> Result<(), Error> {
        let Some(signature) = token.signature_bytes() else {
            return Err(Error::InvalidSignature);
        };
        let message = token.signing_input().as_bytes();
        match token.algorithm().verify(message, &signature) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidSignature),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "signature verification engine failure");
                Err(Error::InvalidSignature)
            }
        }
    }

    fn check_time_claims(&self, claims: &ClaimSet) -> Result<(), Error> {
        let now = (self.time_options.clock_fn)();
        let leeway = self.time_options.leeway;

        if let Some(value) = claims.get("exp") {
            let expired_at = Self::timestamp(value, "exp")?;
            let is_expired = expired_at
                .checked_add_signed(leeway)
                .map_or(false, |deadline| now > deadline);
            if is_expired {
                return Err(Error::Expired { expired_at });
            }
        }

        if let Some(value) = claims.get("nbf") {
            let not_before = Self::timestamp(value, "nbf")?;
            let is_premature = not_before
                .checked_sub_signed(leeway)
                .map_or(false, |start| now < start);
            if is_premature {
                return Err(Error::invalid_claim(
                    ClaimLocation::Payload,
                    "nbf",
                    InvalidClaimReason::NotYetValid { not_before },
                ));
            }
        }
        Ok(())
    }

    fn timestamp(value: &Value, name: &str) -> Result<DateTime<Utc>, Error> {
        let reason = if value.is_null() {
            InvalidClaimReason::Null
        } else {
            InvalidClaimReason::NotATimestamp
        };
        millis_to_timestamp(value)
            .ok_or_else(|| Error::invalid_claim(ClaimLocation::Payload, name, reason))
    }

    fn run_checks(&self, token: &Token<'_>) -> Result<(), Error> {
        Self::check_signature(token)?;
        self.header_constraints
            .check(ClaimLocation::Header, token.header().claims())?;
        let payload = token.payload().claims();
        self.check_time_claims(payload)?;
        self.payload_constraints.check(ClaimLocation::Payload, payload)
    }
}

impl<F: Fn() -> DateTime<Utc>> TokenValidator for Validator<F> {
    fn validate(&self, token: &Token<'_>) -> Result<(), Error> {
        let result = self.run_checks(token);
        #[cfg(feature = "tracing")]
        log_rejection(token, &result);
        result
    }
}

#[cfg(feature = "tracing")]
fn log_rejection(token: &Token<'_>, result: &Result<(), Error>) {
    let Err(err) = result else {
        return;
    };
    let alg = token.algorithm().name();
    match err {
        Error::MissingClaim { location, name } | Error::InvalidClaim { location, name, .. } => {
            tracing::debug!(alg, kind = ?err.kind(), %location, claim = %name, "token rejected");
        }
        _ => tracing::debug!(alg, kind = ?err.kind(), "token rejected"),
    }
}
