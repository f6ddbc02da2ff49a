//! Claim containers: the generic [`ClaimSet`] and its [`Header`] / [`Payload`] projections.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize};
use serde_json::{Map, Value};

use core::fmt;

use crate::{
    alloc::{String, ToOwned, Vec},
    DecodeError, Error, Segment,
};

/// Claim names reserved by the JWT standard, shared by [`Header`] and [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RegisteredClaim {
    /// `typ` header: application-specific [token type].
    ///
    /// [token type]: https://tools.ietf.org/html/rfc7519#section-5.1
    Type,
    /// `cty` header: content type.
    ContentType,
    /// `alg` header: name of the signing algorithm.
    Algorithm,
    /// `iss` claim: token issuer.
    Issuer,
    /// `sub` claim: token subject.
    Subject,
    /// `aud` claim: intended audience(s) of the token.
    Audience,
    /// `exp` claim: expiration time.
    ExpirationTime,
    /// `nbf` claim: moment from which the token is valid.
    NotBefore,
    /// `iat` claim: issuance time.
    IssuedAt,
    /// `jti` claim: unique token identifier.
    Id,
}

impl RegisteredClaim {
    /// Claims registered for the token header.
    pub const HEADER: [Self; 3] = [Self::Type, Self::ContentType, Self::Algorithm];
    /// Claims registered for the token payload.
    pub const PAYLOAD: [Self; 7] = [
        Self::Issuer,
        Self::Subject,
        Self::Audience,
        Self::ExpirationTime,
        Self::NotBefore,
        Self::IssuedAt,
        Self::Id,
    ];

    /// Returns the serialized name of this claim.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Type => "typ",
            Self::ContentType => "cty",
            Self::Algorithm => "alg",
            Self::Issuer => "iss",
            Self::Subject => "sub",
            Self::Audience => "aud",
            Self::ExpirationTime => "exp",
            Self::NotBefore => "nbf",
            Self::IssuedAt => "iat",
            Self::Id => "jti",
        }
    }

    /// Checks whether this claim holds a timestamp (`exp`, `nbf` or `iat`).
    pub const fn is_time(self) -> bool {
        matches!(self, Self::ExpirationTime | Self::NotBefore | Self::IssuedAt)
    }

    /// Looks up a registered claim by its serialized name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::HEADER
            .into_iter()
            .chain(Self::PAYLOAD)
            .find(|claim| claim.name() == name)
    }
}

impl fmt::Display for RegisteredClaim {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// String-keyed mapping of claim values.
///
/// Values are untyped at the container level. A type is imposed when a value is read,
/// either via [`Self::get_as()`] (which fails with [`Error::ClaimType`] on type mismatch
/// and never coerces between JSON types) or via a caller-supplied converter
/// ([`Self::get_with()`]).
///
/// Keys are kept sorted, so the JSON form of a set is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet {
    claims: Map<String, Value>,
}

impl ClaimSet {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim, replacing a previous value with the same name.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `value` is `null`; the set is left unchanged.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), Error> {
        let name = name.into();
        let value = value.into();
        if value.is_null() {
            return Err(Error::InvalidArgument {
                name,
                message: "claim value must not be null",
            });
        }
        self.claims.insert(name, value);
        Ok(())
    }

    /// Inserts a value known to be non-null.
    pub(crate) fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        debug_assert!(!value.is_null());
        self.claims.insert(name.to_owned(), value);
    }

    /// Removes a claim, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.claims.remove(name)
    }

    /// Checks whether a claim with the specified name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Gets the raw value of a claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Reads a claim as the specified type. Returns `Ok(None)` if the claim is absent.
    ///
    /// The value may be borrowed from the set, e.g. `get_as::<&str>("iss")`.
    pub fn get_as<'a, T: Deserialize<'a>>(&'a self, name: &str) -> Result<Option<T>, Error> {
        self.claims
            .get(name)
            .map(|value| {
                T::deserialize(value).map_err(|source| Error::ClaimType {
                    name: name.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Applies `converter` to the raw claim value, if the claim is present.
    pub fn get_with<T>(&self, name: &str, converter: impl FnOnce(&Value) -> T) -> Option<T> {
        self.claims.get(name).map(converter)
    }

    /// Reads a claim stored as an integer number of milliseconds since the Unix epoch.
    pub fn get_timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, Error> {
        self.claims
            .get(name)
            .map(|value| {
                millis_to_timestamp(value).ok_or_else(|| Error::ClaimType {
                    name: name.to_owned(),
                    source: serde_json::Error::custom(
                        "expected a timestamp in milliseconds since the Unix epoch",
                    ),
                })
            })
            .transpose()
    }

    /// Returns the number of claims in this set.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Checks whether this set is empty.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterates over claims in the order of their names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.claims.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the JSON object backing this set.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Serializes this set into JSON and encodes it with base64url without padding.
    pub fn to_encoded_form(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(&self.claims).map_err(Error::Encode)?;
        Ok(Base64UrlUnpadded::encode_string(&json))
    }

    /// Restores a set from its base64url-encoded JSON form. The JSON is taken verbatim;
    /// in particular, `null` values are retained so that validation can reject them.
    pub fn from_encoded_form(encoded: &str, segment: Segment) -> Result<Self, DecodeError> {
        let json = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|source| DecodeError::Base64 { segment, source })?;
        let claims = serde_json::from_slice(&json)
            .map_err(|source| DecodeError::MalformedJson { segment, source })?;
        Ok(Self { claims })
    }
}

impl From<ClaimSet> for Map<String, Value> {
    fn from(set: ClaimSet) -> Self {
        set.claims
    }
}

impl TryFrom<Map<String, Value>> for ClaimSet {
    type Error = Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for (name, value) in map {
            set.add(name, value)?;
        }
        Ok(set)
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn millis_to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let Value::Number(number) = value else {
        return None;
    };
    let millis = match number.as_i64() {
        Some(millis) => millis,
        // Only finite floats inside the `i64` range are accepted; the fractional part is dropped.
        None => number
            .as_f64()
            .filter(|millis| millis.is_finite() && millis.abs() < 9.2e18)
            .map(|millis| millis as i64)?,
    };
    DateTime::from_timestamp_millis(millis)
}

macro_rules! impl_claim_set_accessors {
    ($name:ident) => {
        impl $name {
            /// Adds a claim, replacing a previous value with the same name.
            ///
            /// # Errors
            ///
            /// Fails with [`Error::InvalidArgument`] if `value` is `null`.
            pub fn add(
                &mut self,
                name: impl Into<String>,
                value: impl Into<Value>,
            ) -> Result<(), Error> {
                self.claims.add(name, value)
            }

            /// Gets the raw value of a claim.
            pub fn get(&self, name: &str) -> Option<&Value> {
                self.claims.get(name)
            }

            /// Checks whether a claim with the specified name is present.
            pub fn contains(&self, name: &str) -> bool {
                self.claims.contains(name)
            }

            /// Applies `converter` to the raw claim value, if the claim is present.
            pub fn get_with<T>(
                &self,
                name: &str,
                converter: impl FnOnce(&Value) -> T,
            ) -> Option<T> {
                self.claims.get_with(name, converter)
            }

            /// Returns the underlying claim set.
            pub fn claims(&self) -> &ClaimSet {
                &self.claims
            }

            /// Serializes claims into JSON and encodes them with base64url without padding.
            pub fn to_encoded_form(&self) -> Result<String, Error> {
                self.claims.to_encoded_form()
            }
        }

        impl From<ClaimSet> for $name {
            fn from(claims: ClaimSet) -> Self {
                Self { claims }
            }
        }

        impl From<$name> for ClaimSet {
            fn from(value: $name) -> Self {
                value.claims
            }
        }
    };
}

/// JWT header.
///
/// A header created with [`Self::new()`] is pre-seeded with `typ: "JWT"`.
/// The `alg` claim is filled automatically when a token is built, and cannot be made
/// to disagree with the signing algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    claims: ClaimSet,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl_claim_set_accessors!(Header);

impl Header {
    /// Creates a header with the `typ` claim set to `"JWT"`.
    pub fn new() -> Self {
        Self::empty().with_token_type("JWT")
    }

    /// Creates a header without any claims.
    pub fn empty() -> Self {
        Self {
            claims: ClaimSet::new(),
        }
    }

    /// Reads a claim as the specified type. Returns `Ok(None)` if the claim is absent.
    pub fn get_as<'a, T: Deserialize<'a>>(&'a self, name: &str) -> Result<Option<T>, Error> {
        self.claims.get_as(name)
    }

    /// Sets the `typ` claim.
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.set_token_type(token_type);
        self
    }

    /// Sets the `typ` claim.
    pub fn set_token_type(&mut self, token_type: impl Into<String>) {
        self.claims
            .insert(RegisteredClaim::Type.name(), token_type.into());
    }

    /// Sets the `cty` claim.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.set_content_type(content_type);
        self
    }

    /// Sets the `cty` claim.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.claims
            .insert(RegisteredClaim::ContentType.name(), content_type.into());
    }

    pub(crate) fn set_algorithm(&mut self, algorithm: &str) {
        self.claims.insert(RegisteredClaim::Algorithm.name(), algorithm);
    }

    /// Gets the `typ` claim.
    pub fn token_type(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::Type.name())
    }

    /// Gets the `cty` claim.
    pub fn content_type(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::ContentType.name())
    }

    /// Gets the `alg` claim.
    pub fn algorithm(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::Algorithm.name())
    }
}

/// JWT payload.
///
/// Registered time claims (`exp`, `nbf`, `iat`) are stored as integer milliseconds
/// since the Unix epoch and are read back as [`DateTime`]s.
///
/// # Examples
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use jwt_lite::Payload;
/// # fn main() -> anyhow::Result<()> {
/// let expiration = Utc.timestamp_millis_opt(1_614_676_926_172).unwrap();
/// let payload = Payload::new()
///     .with_issuer("issuer")
///     .with_audience(["aud1", "aud2"])
///     .with_expiration_time(expiration);
///
/// assert_eq!(payload.get("exp"), Some(&serde_json::json!(1_614_676_926_172_i64)));
/// assert_eq!(payload.expiration_time()?, Some(expiration));
/// assert_eq!(payload.audience()?, ["aud1", "aud2"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    claims: ClaimSet,
}

impl_claim_set_accessors!(Payload);

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a claim as the specified type. Returns `Ok(None)` if the claim is absent.
    ///
    /// Registered time claims are always materialized as a timestamp first, so they can be
    /// read as a [`DateTime`] regardless of their stored representation; reading them
    /// as a number fails.
    pub fn get_as<'a, T: Deserialize<'a>>(&'a self, name: &str) -> Result<Option<T>, Error> {
        let is_time_claim = RegisteredClaim::from_name(name).is_some_and(RegisteredClaim::is_time);
        if !is_time_claim {
            return self.claims.get_as(name);
        }

        let Some(timestamp) = self.claims.get_timestamp(name)? else {
            return Ok(None);
        };
        let value = serde_json::to_value(timestamp).map_err(Error::Encode)?;
        T::deserialize(value)
            .map(Some)
            .map_err(|source| Error::ClaimType {
                name: name.to_owned(),
                source,
            })
    }

    /// Sets the `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.set_issuer(issuer);
        self
    }

    /// Sets the `iss` claim.
    pub fn set_issuer(&mut self, issuer: impl Into<String>) {
        self.claims.insert(RegisteredClaim::Issuer.name(), issuer.into());
    }

    /// Gets the `iss` claim.
    pub fn issuer(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::Issuer.name())
    }

    /// Sets the `sub` claim.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.set_subject(subject);
        self
    }

    /// Sets the `sub` claim.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.claims.insert(RegisteredClaim::Subject.name(), subject.into());
    }

    /// Gets the `sub` claim.
    pub fn subject(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::Subject.name())
    }

    /// Sets the `aud` claim. The audience is always stored as an array.
    pub fn with_audience<I>(mut self, audience: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.set_audience(audience);
        self
    }

    /// Sets the `aud` claim. The audience is always stored as an array.
    pub fn set_audience<I>(&mut self, audience: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let audience: Vec<Value> = audience
            .into_iter()
            .map(|item| Value::String(item.into()))
            .collect();
        self.claims.insert(RegisteredClaim::Audience.name(), audience);
    }

    /// Gets the `aud` claim. A single string is read as a one-element audience;
    /// an absent claim is read as an empty audience.
    pub fn audience(&self) -> Result<Vec<&str>, Error> {
        let name = RegisteredClaim::Audience.name();
        match self.claims.get(name) {
            None => Ok(Vec::new()),
            Some(Value::String(audience)) => Ok(core::iter::once(audience.as_str()).collect()),
            Some(_) => Ok(self.claims.get_as(name)?.unwrap_or_default()),
        }
    }

    /// Sets the `exp` claim.
    pub fn with_expiration_time(self, expiration_time: DateTime<Utc>) -> Self {
        self.with_expiration_millis(expiration_time.timestamp_millis())
    }

    /// Sets the `exp` claim in milliseconds since the Unix epoch.
    pub fn with_expiration_millis(mut self, millis: i64) -> Self {
        self.claims
            .insert(RegisteredClaim::ExpirationTime.name(), millis);
        self
    }

    /// Gets the `exp` claim.
    pub fn expiration_time(&self) -> Result<Option<DateTime<Utc>>, Error> {
        self.claims
            .get_timestamp(RegisteredClaim::ExpirationTime.name())
    }

    /// Sets the `nbf` claim.
    pub fn with_not_before(self, not_before: DateTime<Utc>) -> Self {
        self.with_not_before_millis(not_before.timestamp_millis())
    }

    /// Sets the `nbf` claim in milliseconds since the Unix epoch.
    pub fn with_not_before_millis(mut self, millis: i64) -> Self {
        self.claims.insert(RegisteredClaim::NotBefore.name(), millis);
        self
    }

    /// Gets the `nbf` claim.
    pub fn not_before(&self) -> Result<Option<DateTime<Utc>>, Error> {
        self.claims.get_timestamp(RegisteredClaim::NotBefore.name())
    }

    /// Sets the `iat` claim.
    pub fn with_issued_at(self, issued_at: DateTime<Utc>) -> Self {
        self.with_issued_at_millis(issued_at.timestamp_millis())
    }

    /// Sets the `iat` claim in milliseconds since the Unix epoch.
    pub fn with_issued_at_millis(mut self, millis: i64) -> Self {
        self.claims.insert(RegisteredClaim::IssuedAt.name(), millis);
        self
    }

    /// Gets the `iat` claim.
    pub fn issued_at(&self) -> Result<Option<DateTime<Utc>>, Error> {
        self.claims.get_timestamp(RegisteredClaim::IssuedAt.name())
    }

    /// Sets the `jti` claim.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Sets the `jti` claim.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.claims.insert(RegisteredClaim::Id.name(), id.into());
    }

    /// Gets the `jti` claim.
    pub fn id(&self) -> Result<Option<&str>, Error> {
        self.get_as(RegisteredClaim::Id.name())
    }
}
