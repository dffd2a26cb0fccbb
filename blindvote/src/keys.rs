use crate::*;
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Width the blinded mark is left-padded to before hashing for the liveness proof
pub const LIVENESS_ENCODING_LEN: usize = 256;

/// Bytes of OAEP-SHA256 overhead per encrypted block
pub const OAEP_SHA256_OVERHEAD: usize = 2 * 32 + 2;

/// The election authority's RSA keypair.
///
/// The private exponent is only ever used through `signing_parts` and
/// `decrypt_block`, both crate-private.
pub struct ElectionKeyPair {
    secret: RsaPrivateKey,
}

impl ElectionKeyPair {
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<Self, Error> {
        let secret = RsaPrivateKey::new(rng, bits)?;
        Ok(ElectionKeyPair { secret })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.secret.to_public_key()
    }

    pub fn public_parts(&self) -> PublicParts {
        PublicParts::from(&self.public_key())
    }

    /// Size of the modulus in bytes
    pub fn size(&self) -> usize {
        self.secret.size()
    }

    pub(crate) fn signing_parts(&self) -> SigningParts {
        SigningParts::from(&self.secret)
    }

    pub(crate) fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, Error> {
        self.secret
            .decrypt(Oaep::new::<Sha256>(), block)
            .map_err(|_| Error::Decryption)
    }
}

impl From<RsaPrivateKey> for ElectionKeyPair {
    fn from(secret: RsaPrivateKey) -> Self {
        ElectionKeyPair { secret }
    }
}

/// A voter's own keypair, used only to prove liveness when requesting a credential
pub struct VoterKeyPair {
    secret: RsaPrivateKey,
}

impl VoterKeyPair {
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<Self, Error> {
        let secret = RsaPrivateKey::new(rng, bits)?;
        Ok(VoterKeyPair { secret })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.secret.to_public_key()
    }

    /// PKCS#1 v1.5 signature over the SHA-256 digest of the blinded mark
    pub fn sign_liveness(&self, blinded: &BigUint) -> Result<Vec<u8>, Error> {
        let digest = liveness_digest(blinded);
        Ok(self.secret.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?)
    }
}

impl From<RsaPrivateKey> for VoterKeyPair {
    fn from(secret: RsaPrivateKey) -> Self {
        VoterKeyPair { secret }
    }
}

/// Check a liveness signature made by `key` over `blinded`
pub fn verify_liveness(key: &RsaPublicKey, blinded: &BigUint, signature: &[u8]) -> bool {
    let digest = liveness_digest(blinded);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .is_ok()
}

/// SHA-256 over the big-endian encoding of `blinded`, left-padded to `LIVENESS_ENCODING_LEN`
pub fn liveness_digest(blinded: &BigUint) -> Vec<u8> {
    let bytes = blinded.to_bytes_be();
    let mut encoded = vec![0u8; LIVENESS_ENCODING_LEN.saturating_sub(bytes.len())];
    encoded.extend_from_slice(&bytes);
    Sha256::digest(&encoded).to_vec()
}

/// Largest plaintext block a key of `key_bytes` can carry under OAEP-SHA256
pub fn max_block_size(key_bytes: usize) -> usize {
    key_bytes.saturating_sub(OAEP_SHA256_OVERHEAD)
}
