use crate::*;
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

/// Plaintext bytes per encrypted block unless the election says otherwise
pub const DEFAULT_BLOCK_SIZE: usize = 40;

/// A cast payload encrypted block-by-block under the authority's public key.
///
/// Blocks must be decrypted and concatenated in order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SealedBallot {
    pub blocks: Vec<Vec<u8>>,
}

/// Encrypt a payload in `block_size` chunks with RSA-OAEP(SHA-256)
pub fn seal<R: RngCore + CryptoRng>(
    payload: &str,
    authority: &RsaPublicKey,
    block_size: usize,
    rng: &mut R,
) -> Result<SealedBallot, Error> {
    let limit = max_block_size(authority.size());
    if block_size == 0 || block_size > limit {
        return Err(Error::InvalidConfig(format!(
            "block size {} outside 1..={} for a {}-byte key",
            block_size,
            limit,
            authority.size()
        )));
    }

    let blocks = payload
        .as_bytes()
        .chunks(block_size)
        .map(|chunk| authority.encrypt(&mut *rng, Oaep::new::<Sha256>(), chunk))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(blocks = blocks.len(), "sealed ballot");
    Ok(SealedBallot { blocks })
}

/// Decrypt every block and reassemble the payload text
pub fn open(sealed: &SealedBallot, authority: &ElectionKeyPair) -> Result<String, Error> {
    let mut plaintext = Vec::new();
    for block in sealed.blocks.iter() {
        plaintext.extend(authority.decrypt_block(block)?);
    }
    String::from_utf8(plaintext).map_err(|_| PayloadDefect::NotUtf8.into())
}
