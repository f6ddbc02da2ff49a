//! JWT algorithms based on HMACs.

use hmac::{digest::InvalidLength, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use core::fmt;

use crate::{alg::HashAlg, alloc::Vec, Error};

macro_rules! compute_hmac {
    ($digest:ty, $key:expr, $message:expr) => {
        <hmac::Hmac<$digest> as Mac>::new_from_slice($key).map(|mut mac| {
            mac.update($message);
            mac.finalize().into_bytes().to_vec()
        })
    };
}

/// Signing / verifying key for `HS*` algorithms. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacKey(Vec<u8>);

impl fmt::Debug for HmacKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("HmacKey").field(&"_").finish()
    }
}

impl HmacKey {
    /// Creates a key from the specified `bytes`.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().to_vec())
    }
}

impl From<&[u8]> for HmacKey {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for HmacKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// `HS256`, `HS384` or `HS512` algorithm together with the shared secret.
///
/// See [RFC 7518] for the algorithm specification.
///
/// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
#[derive(Debug, Clone)]
pub struct Hmac {
    hash_alg: HashAlg,
    key: HmacKey,
}

impl Hmac {
    pub(crate) fn new(hash_alg: HashAlg, key: HmacKey) -> Self {
        Self { hash_alg, key }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self.hash_alg {
            HashAlg::Sha256 => "HS256",
            HashAlg::Sha384 => "HS384",
            HashAlg::Sha512 => "HS512",
        }
    }

    pub(crate) fn description(&self) -> &'static str {
        match self.hash_alg {
            HashAlg::Sha256 => "HmacSHA256",
            HashAlg::Sha384 => "HmacSHA384",
            HashAlg::Sha512 => "HmacSHA512",
        }
    }

    pub(crate) fn hash_alg(&self) -> HashAlg {
        self.hash_alg
    }

    /// Returns the shared secret.
    pub fn key(&self) -> &HmacKey {
        &self.key
    }

    fn mac(&self, message: &[u8]) -> Result<Vec<u8>, InvalidLength> {
        let key = self.key.as_ref();
        match self.hash_alg {
            HashAlg::Sha256 => compute_hmac!(Sha256, key, message),
            HashAlg::Sha384 => compute_hmac!(Sha384, key, message),
            HashAlg::Sha512 => compute_hmac!(Sha512, key, message),
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        self.mac(message)
            .map_err(|err| Error::Sign(anyhow::Error::msg(err)))
    }

    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let expected = self
            .mac(message)
            .map_err(|err| Error::Verification(anyhow::Error::msg(err)))?;
        Ok(expected.ct_eq(signature).into())
    }
}
