//! RSA-based JWT schemes: `RS*`.

pub use rsa::{RsaPrivateKey, RsaPublicKey};

use rsa::{traits::PublicKeyParts, Pkcs1v15Sign};
use sha2::{Sha256, Sha384, Sha512};

use core::{convert::TryFrom, fmt};

use crate::{alg::HashAlg, alloc::Vec, Error};

/// Standard RSA modulus length, used as the key-strength floor for `RS*` algorithms.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[non_exhaustive]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub enum ModulusBits {
    /// 2048-bit modulus; required for `RS256`.
    Bits2048,
    /// 3072-bit modulus; required for `RS384`.
    Bits3072,
    /// 4096-bit modulus; required for `RS512`.
    Bits4096,
}

impl ModulusBits {
    const ALL: [Self; 3] = [Self::Bits2048, Self::Bits3072, Self::Bits4096];

    /// Number of bits in the modulus.
    pub fn bits(self) -> usize {
        match self {
            Self::Bits2048 => 2_048,
            Self::Bits3072 => 3_072,
            Self::Bits4096 => 4_096,
        }
    }

    /// Minimum modulus length accepted by [`Algorithm::ensure_strong()`] for `hash_alg`.
    ///
    /// [`Algorithm::ensure_strong()`]: crate::Algorithm::ensure_strong()
    pub fn min_for(hash_alg: HashAlg) -> Self {
        match hash_alg {
            HashAlg::Sha256 => Self::Bits2048,
            HashAlg::Sha384 => Self::Bits3072,
            HashAlg::Sha512 => Self::Bits4096,
        }
    }
}

impl TryFrom<usize> for ModulusBits {
    type Error = ModulusBitsError;

    fn try_from(bits: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|modulus| modulus.bits() == bits)
            .ok_or(ModulusBitsError { bits })
    }
}

/// Bit length that does not correspond to any [`ModulusBits`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub struct ModulusBitsError {
    /// Rejected bit length.
    pub bits: usize,
}

impl fmt::Display for ModulusBitsError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "RSA modulus of {} bits is not one of 2048, 3072 or 4096 bits",
            self.bits
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ModulusBitsError {}

/// `RS256`, `RS384` or `RS512` algorithm together with its keys.
///
/// The algorithm employs PKCS#1 v1.5 padding and one of the hash functions from
/// the SHA-2 family. See [RFC 7518] for more details.
///
/// An instance created from a public key only can verify signatures, but fails
/// to sign tokens.
///
/// [RFC 7518]: https://www.rfc-editor.org/rfc/rfc7518.html#section-3.3
#[derive(Clone)]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub struct Rsa {
    hash_alg: HashAlg,
    signing_key: Option<RsaPrivateKey>,
    verifying_key: RsaPublicKey,
}

impl fmt::Debug for Rsa {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Rsa")
            .field("hash_alg", &self.hash_alg)
            .field("can_sign", &self.signing_key.is_some())
            .field("modulus_bits", &self.modulus_bits())
            .finish()
    }
}

impl Rsa {
    pub(crate) fn new(hash_alg: HashAlg, signing_key: RsaPrivateKey) -> Self {
        Self {
            hash_alg,
            verifying_key: signing_key.to_public_key(),
            signing_key: Some(signing_key),
        }
    }

    pub(crate) fn verifier(hash_alg: HashAlg, verifying_key: RsaPublicKey) -> Self {
        Self {
            hash_alg,
            signing_key: None,
            verifying_key,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self.hash_alg {
            HashAlg::Sha256 => "RS256",
            HashAlg::Sha384 => "RS384",
            HashAlg::Sha512 => "RS512",
        }
    }

    pub(crate) fn description(&self) -> &'static str {
        match self.hash_alg {
            HashAlg::Sha256 => "SHA256withRSA",
            HashAlg::Sha384 => "SHA384withRSA",
            HashAlg::Sha512 => "SHA512withRSA",
        }
    }

    pub(crate) fn hash_alg(&self) -> HashAlg {
        self.hash_alg
    }

    /// Returns the public key used for verification.
    pub fn verifying_key(&self) -> &RsaPublicKey {
        &self.verifying_key
    }

    /// Checks whether this instance holds a private key and can thus sign tokens.
    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    pub(crate) fn modulus_bits(&self) -> usize {
        self.verifying_key.size() * 8
    }

    fn padding_scheme(&self) -> Pkcs1v15Sign {
        match self.hash_alg {
            HashAlg::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            HashAlg::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            HashAlg::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let signing_key = self.signing_key.as_ref().ok_or_else(|| {
            Error::Sign(anyhow::Error::msg(
                "RSA algorithm was created without a private key",
            ))
        })?;
        let digest = self.hash_alg.digest(message);
        signing_key
            .sign_with_rng(&mut rand_core::OsRng, self.padding_scheme(), &digest)
            .map_err(|err| Error::Sign(anyhow::Error::msg(err)))
    }

    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let digest = self.hash_alg.digest(message);
        match self
            .verifying_key
            .verify(self.padding_scheme(), &digest, signature)
        {
            Ok(()) => Ok(true),
            Err(rsa::Error::Verification) => Ok(false),
            Err(err) => Err(Error::Verification(anyhow::Error::msg(err))),
        }
    }
}
