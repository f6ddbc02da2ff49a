//! Signed tokens: building, encoding and parsing.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde_json::Value;
use smallvec::{smallvec, SmallVec};

use core::fmt;

use crate::{
    alloc::{format, String, ToOwned, Vec},
    Algorithm, ClaimSet, DecodeError, Error, Header, Payload, Segment, TokenValidator,
};

/// Maximum "reasonable" signature size in bytes (enough for a 4096-bit RSA modulus).
const SIGNATURE_SIZE: usize = 512;

/// Staged builder of a [`Token`].
///
/// The builder accumulates header and payload claims; the token is signed exactly once,
/// in [`Self::build()`] (or [`Self::sign()`], which also encodes the built token).
/// The `alg` header is always set from the algorithm passed to [`Token::builder()`],
/// overwriting any value supplied via the builder; `typ` defaults to `JWT`.
///
/// # Examples
///
/// ```
/// # use chrono::{Duration, Utc};
/// # use jwt_lite::{Algorithm, Token};
/// # fn main() -> anyhow::Result<()> {
/// let algorithm = Algorithm::hs256(b"super_secret_key_donut_steel_0123");
/// let token = Token::builder(&algorithm)
///     .with_issuer("auth.example.com")
///     .with_audience(["api", "admin"])
///     .with_expiration_time(Utc::now() + Duration::minutes(10))
///     .with_claim("scope", "read")?
///     .build()?;
///
/// let compact = token.to_string();
/// let parsed = Token::parse(&algorithm, &compact)?;
/// parsed.validate()?;
/// assert_eq!(parsed.payload().issuer()?, Some("auth.example.com"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[must_use = "builder does nothing until `build()` or `sign()` is called"]
pub struct TokenBuilder<'a> {
    algorithm: &'a Algorithm,
    header: Header,
    payload: Payload,
}

impl<'a> TokenBuilder<'a> {
    fn new(algorithm: &'a Algorithm) -> Self {
        Self {
            algorithm,
            header: Header::new(),
            payload: Payload::new(),
        }
    }

    /// Sets the `typ` header.
    pub fn with_type(mut self, token_type: impl Into<String>) -> Self {
        self.header.set_token_type(token_type);
        self
    }

    /// Sets the `cty` header.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.header.set_content_type(content_type);
        self
    }

    /// Adds a custom header claim.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `value` is `null`.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, Error> {
        self.header.add(name, value)?;
        Ok(self)
    }

    /// Replaces the header claims accumulated so far.
    pub fn with_header_claims(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    /// Replaces the payload claims accumulated so far.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.payload.set_issuer(issuer);
        self
    }

    /// Sets the `sub` claim.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.payload.set_subject(subject);
        self
    }

    /// Sets the `aud` claim. The audience is always encoded as a string array.
    pub fn with_audience<I>(mut self, audience: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.payload.set_audience(audience);
        self
    }

    /// Sets the `exp` claim.
    pub fn with_expiration_time(mut self, expiration_time: DateTime<Utc>) -> Self {
        self.payload = self.payload.with_expiration_time(expiration_time);
        self
    }

    /// Sets the `exp` claim as milliseconds since the Unix epoch.
    pub fn with_expiration_millis(mut self, millis: i64) -> Self {
        self.payload = self.payload.with_expiration_millis(millis);
        self
    }

    /// Sets the `nbf` claim.
    pub fn with_not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.payload = self.payload.with_not_before(not_before);
        self
    }

    /// Sets the `nbf` claim as milliseconds since the Unix epoch.
    pub fn with_not_before_millis(mut self, millis: i64) -> Self {
        self.payload = self.payload.with_not_before_millis(millis);
        self
    }

    /// Sets the `iat` claim.
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.payload = self.payload.with_issued_at(issued_at);
        self
    }

    /// Sets the `iat` claim as milliseconds since the Unix epoch.
    pub fn with_issued_at_millis(mut self, millis: i64) -> Self {
        self.payload = self.payload.with_issued_at_millis(millis);
        self
    }

    /// Sets the `jti` claim.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.payload.set_id(id);
        self
    }

    /// Adds a custom payload claim.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `value` is `null`.
    pub fn with_claim(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, Error> {
        self.payload.add(name, value)?;
        Ok(self)
    }

    /// Adds several custom payload claims.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if any of the values is `null`.
    pub fn with_claims<I, K, V>(mut self, claims: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in claims {
            self.payload.add(name, value)?;
        }
        Ok(self)
    }

    /// Signs the accumulated claims, producing an immutable token.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Encode`] if claims cannot be serialized, or with [`Error::Sign`]
    /// if the algorithm cannot produce a signature.
    pub fn build(self) -> Result<Token<'a>, Error> {
        let Self {
            algorithm,
            mut header,
            payload,
        } = self;
        if !header.contains("typ") {
            header.set_token_type("JWT");
        }
        header.set_algorithm(algorithm.name());

        let signing_input = format!(
            "{}.{}",
            header.to_encoded_form()?,
            payload.to_encoded_form()?
        );
        let signature = algorithm.sign(signing_input.as_bytes())?;
        Ok(Token {
            algorithm,
            header,
            payload,
            signature: Base64UrlUnpadded::encode_string(&signature),
            signing_input,
        })
    }

    /// Builds the token and returns its compact serialization.
    ///
    /// # Errors
    ///
    /// Fails in the same cases as [`Self::build()`].
    pub fn sign(self) -> Result<String, Error> {
        self.build().map(|token| token.encode())
    }
}

/// Token together with the algorithm it was signed or will be verified with.
///
/// A token is created either by [`TokenBuilder::build()`] or by [`Self::parse()`].
/// In both cases it is immutable; the signing input is fixed at creation, so that
/// verifying a parsed token uses exactly the bytes received.
#[derive(Debug, Clone)]
pub struct Token<'a> {
    algorithm: &'a Algorithm,
    header: Header,
    payload: Payload,
    signing_input: String,
    signature: String,
}

impl<'a> Token<'a> {
    /// Starts building a token signed with the specified algorithm.
    pub fn builder(algorithm: &'a Algorithm) -> TokenBuilder<'a> {
        TokenBuilder::new(algorithm)
    }

    /// Parses a token from its compact serialization.
    ///
    /// The signature is neither decoded nor verified; it is the validator's responsibility.
    /// The `alg` header must equal the name of the supplied `algorithm`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Decode`] if the string does not consist of exactly 3 segments,
    /// if the header or payload is not base64url-encoded JSON object, or if the `alg` header
    /// does not match.
    pub fn parse(algorithm: &'a Algorithm, compact: &str) -> Result<Self, Error> {
        let segments: Vec<_> = compact.splitn(4, '.').collect();
        let (encoded_header, encoded_payload, signature) = match segments[..] {
            [header, payload, signature] => (header, payload, signature),
            _ => return Err(DecodeError::InvalidTokenStructure.into()),
        };

        let header = Header::from(ClaimSet::from_encoded_form(
            encoded_header,
            Segment::Header,
        )?);
        let payload = Payload::from(ClaimSet::from_encoded_form(
            encoded_payload,
            Segment::Payload,
        )?);

        let expected = algorithm.name();
        match header.get("alg") {
            Some(Value::String(actual)) if actual == expected => {}
            actual => {
                return Err(DecodeError::AlgorithmMismatch {
                    expected,
                    actual: actual.and_then(Value::as_str).map(ToOwned::to_owned),
                }
                .into());
            }
        }

        Ok(Self {
            algorithm,
            header,
            payload,
            signing_input: format!("{encoded_header}.{encoded_payload}"),
            signature: signature.to_owned(),
        })
    }

    /// Returns the algorithm associated with this token.
    pub fn algorithm(&self) -> &'a Algorithm {
        self.algorithm
    }

    /// Returns the token header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the token payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the base64url-encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the signing input: encoded header and payload separated by a period.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Returns the compact serialization of this token.
    pub fn encode(&self) -> String {
        format!("{}.{}", self.signing_input, self.signature)
    }

    /// Decodes the signature. Returns `None` if it is not valid base64url.
    pub(crate) fn signature_bytes(&self) -> Option<SmallVec<[u8; SIGNATURE_SIZE]>> {
        let mut bytes: SmallVec<[u8; SIGNATURE_SIZE]> =
            smallvec![0; 3 * (self.signature.len() + 3) / 4];
        let len = Base64UrlUnpadded::decode(&self.signature, &mut bytes)
            .ok()?
            .len();
        bytes.truncate(len);
        Some(bytes)
    }

    /// Validates this token with the default [`Validator`](crate::Validator): the signature
    /// and the `exp` / `nbf` claims are checked against the current time.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the token must not be trusted.
    #[cfg(feature = "clock")]
    #[cfg_attr(docsrs, doc(cfg(feature = "clock")))]
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_with(&crate::Validator::default())
    }

    /// Validates this token with the specified validator.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the token must not be trusted.
    pub fn validate_with<V: TokenValidator + ?Sized>(&self, validator: &V) -> Result<(), Error> {
        validator.validate(self)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.signing_input, self.signature)
    }
}
