//! Implementations of JWT signing / verification algorithms.
//!
//! Algorithms are represented by the [`Algorithm`] sum type; each variant owns its key
//! material, which is read-only after construction. An `Algorithm` can thus be shared
//! across threads and used to sign / verify many tokens concurrently.

use sha2::{Digest, Sha256, Sha384, Sha512};

use core::fmt;

use crate::{alloc::Vec, Error};

mod hmacs;
// RSA implementation.
#[cfg(feature = "rsa")]
mod rsa;

pub use self::hmacs::{Hmac, HmacKey};
#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub use self::rsa::{ModulusBits, Rsa, RsaPrivateKey, RsaPublicKey};

/// Hash function from the SHA-2 family used by an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlg {
    /// Returns the output size of the hash function in bits.
    pub const fn bits(self) -> usize {
        match self {
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    pub(crate) fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
        }
    }
}

/// JWT signing algorithm together with its key material.
///
/// # Examples
///
/// ```
/// # use jwt_lite::{Algorithm, Token};
/// # fn main() -> anyhow::Result<()> {
/// let algorithm = Algorithm::hs384("secret");
/// let token = Token::builder(&algorithm).sign()?;
/// assert_eq!(
///     token,
///     "eyJhbGciOiJIUzM4NCIsInR5cCI6IkpXVCJ9.e30.\
///      nx2GHSOLOGjofcETRXDMFQfkhN3YB-B5WMieLPkIM0MazzxtHN0YpuV5OMyQvx3r"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Algorithm {
    /// `HS*` algorithms.
    Hmac(Hmac),
    /// `RS*` algorithms.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    Rsa(Rsa),
}

impl Algorithm {
    /// `HS256` algorithm with the specified secret.
    pub fn hs256(secret: impl AsRef<[u8]>) -> Self {
        Self::Hmac(Hmac::new(HashAlg::Sha256, HmacKey::new(secret)))
    }

    /// `HS384` algorithm with the specified secret.
    pub fn hs384(secret: impl AsRef<[u8]>) -> Self {
        Self::Hmac(Hmac::new(HashAlg::Sha384, HmacKey::new(secret)))
    }

    /// `HS512` algorithm with the specified secret.
    pub fn hs512(secret: impl AsRef<[u8]>) -> Self {
        Self::Hmac(Hmac::new(HashAlg::Sha512, HmacKey::new(secret)))
    }

    /// `RS256` algorithm with the specified private key. The public key used
    /// for verification is derived from it.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs256(signing_key: RsaPrivateKey) -> Self {
        Self::Rsa(Rsa::new(HashAlg::Sha256, signing_key))
    }

    /// `RS384` algorithm with the specified private key.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs384(signing_key: RsaPrivateKey) -> Self {
        Self::Rsa(Rsa::new(HashAlg::Sha384, signing_key))
    }

    /// `RS512` algorithm with the specified private key.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs512(signing_key: RsaPrivateKey) -> Self {
        Self::Rsa(Rsa::new(HashAlg::Sha512, signing_key))
    }

    /// `RS256` algorithm able only to verify signatures.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs256_verifier(verifying_key: RsaPublicKey) -> Self {
        Self::Rsa(Rsa::verifier(HashAlg::Sha256, verifying_key))
    }

    /// `RS384` algorithm able only to verify signatures.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs384_verifier(verifying_key: RsaPublicKey) -> Self {
        Self::Rsa(Rsa::verifier(HashAlg::Sha384, verifying_key))
    }

    /// `RS512` algorithm able only to verify signatures.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    pub fn rs512_verifier(verifying_key: RsaPublicKey) -> Self {
        Self::Rsa(Rsa::verifier(HashAlg::Sha512, verifying_key))
    }

    /// Returns the name of this algorithm, as mentioned in the `alg` field of the JWT header.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hmac(hmac) => hmac.name(),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.name(),
        }
    }

    /// Returns the conventional name of the underlying cryptographic primitive,
    /// such as `HmacSHA256` or `SHA256withRSA`.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Hmac(hmac) => hmac.description(),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.description(),
        }
    }

    /// Returns the hash function used by this algorithm.
    pub fn hash_alg(&self) -> HashAlg {
        match self {
            Self::Hmac(hmac) => hmac.hash_alg(),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.hash_alg(),
        }
    }

    /// Signs a `message`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Sign`] if the cryptographic engine cannot produce a signature
    /// (e.g., an RSA algorithm created without a private key).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Self::Hmac(hmac) => hmac.sign(message),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.sign(message),
        }
    }

    /// Verifies the `message` against the `signature`. A signature mismatch is signalled
    /// with `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Verification`] only if the cryptographic engine itself fails.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, Error> {
        match self {
            Self::Hmac(hmac) => hmac.verify(message, signature),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.verify(message, signature),
        }
    }

    /// Returns the bit length of the key material (the secret for `HS*` algorithms,
    /// the modulus for `RS*` ones).
    pub fn key_bits(&self) -> usize {
        match self {
            Self::Hmac(hmac) => hmac.key().as_ref().len() * 8,
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.modulus_bits(),
        }
    }

    /// Returns the minimum key length in bits considered strong for this algorithm.
    ///
    /// For `HS*` algorithms, the secret must be at least as long as the hash output
    /// (e.g., 256 bits for `HS256`). For `RS*` algorithms, the modulus must be at least
    /// 2,048, 3,072 or 4,096 bits for `RS256`, `RS384` and `RS512` respectively.
    pub fn min_key_bits(&self) -> usize {
        match self {
            Self::Hmac(hmac) => hmac.hash_alg().bits(),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => ModulusBits::min_for(rsa.hash_alg()).bits(),
        }
    }

    /// Checks that the key material of this algorithm has sufficient strength.
    ///
    /// The check is opt-in, since short keys are sometimes needed for compatibility.
    /// It is meant to be chained directly to the algorithm constructor, so that weak keys
    /// are rejected before any signing takes place.
    ///
    /// # Examples
    ///
    /// ```
    /// # use jwt_lite::Algorithm;
    /// let weak = Algorithm::hs256("too short!");
    /// assert!(weak.ensure_strong().is_err());
    ///
    /// let strong = Algorithm::hs256([7_u8; 32]).ensure_strong();
    /// assert!(strong.is_ok());
    /// ```
    pub fn ensure_strong(self) -> Result<Self, WeakKeyError> {
        let (actual_bits, required_bits) = (self.key_bits(), self.min_key_bits());
        if actual_bits >= required_bits {
            Ok(self)
        } else {
            Err(WeakKeyError {
                algorithm: self,
                actual_bits,
                required_bits,
            })
        }
    }
}

/// Error returned by [`Algorithm::ensure_strong()`].
///
/// The error wraps around the algorithm with a weak key, which can be extracted for further use.
#[derive(Debug)]
pub struct WeakKeyError {
    /// Algorithm with the weak key.
    pub algorithm: Algorithm,
    /// Actual key length in bits.
    pub actual_bits: usize,
    /// Minimum supported key length in bits.
    pub required_bits: usize,
}

impl fmt::Display for WeakKeyError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Weak cryptographic key for {}: {} bits, while at least {} bits are required",
            self.algorithm.name(),
            self.actual_bits,
            self.required_bits
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WeakKeyError {}
