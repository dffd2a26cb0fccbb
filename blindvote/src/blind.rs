//! Textbook RSA blind signatures over raw integers.
//!
//! The mark is used directly as the exponentiation base; nothing is hashed
//! before blinding. That keeps the credential a plain RSA signature on the
//! mark, which is what the ballot box checks with `verify`.

use crate::*;
use num_bigint_dig::{BigInt, ModInverse, Sign};
use num_traits::Zero;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// The election modulus and public exponent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicParts {
    pub n: BigUint,
    pub e: BigUint,
}

impl PublicParts {
    pub fn new(n: BigUint, e: BigUint) -> Self {
        PublicParts { n, e }
    }
}

impl From<&RsaPublicKey> for PublicParts {
    fn from(key: &RsaPublicKey) -> Self {
        PublicParts::new(key.n().clone(), key.e().clone())
    }
}

/// The election modulus and private exponent.
///
/// Only the credential issuer ever builds one of these from a real key.
#[derive(Clone)]
pub struct SigningParts {
    n: BigUint,
    d: BigUint,
}

impl SigningParts {
    pub fn new(n: BigUint, d: BigUint) -> Self {
        SigningParts { n, d }
    }
}

impl From<&RsaPrivateKey> for SigningParts {
    fn from(key: &RsaPrivateKey) -> Self {
        SigningParts::new(key.n().clone(), key.d().clone())
    }
}

/// Blind a mark: `(r^e mod N) * mark mod N`
pub fn blind(mark: &BigUint, r: &BigUint, public: &PublicParts) -> BigUint {
    let blinder = r.modpow(&public.e, &public.n);
    (blinder * mark) % &public.n
}

/// Sign a blinded mark: `blinded^d mod N`
pub fn raw_sign(blinded: &BigUint, signer: &SigningParts) -> BigUint {
    blinded.modpow(&signer.d, &signer.n)
}

/// Remove the blinding factor from a raw signature: `r^-1 * signature mod N`
pub fn unblind(signature: &BigUint, r: &BigUint, public: &PublicParts) -> Result<BigUint, Error> {
    let r_inv = mod_inverse(r, &public.n).ok_or(Error::NoInverse)?;
    Ok((r_inv * signature) % &public.n)
}

/// Check a credential against a mark: `credential^e mod N == mark`
pub fn verify(credential: &BigUint, mark: &BigUint, public: &PublicParts) -> bool {
    credential.modpow(&public.e, &public.n) == *mark
}

/// Multiplicative inverse of `a` modulo `n`, normalised into `[0, n)`.
///
/// Returns `None` when `a` and `n` are not coprime.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    if n.is_zero() || a.is_zero() {
        return None;
    }
    let inverse: BigInt = a.clone().mod_inverse(n)?;
    let modulus = BigInt::from_biguint(Sign::Plus, n.clone());
    ((inverse % &modulus + &modulus) % &modulus).to_biguint()
}

#[cfg(test)]
mod tests {
    use super::*;

    // p = 61, q = 53
    fn toy_key() -> (PublicParts, SigningParts) {
        let n = BigUint::from(3233u32);
        (
            PublicParts::new(n.clone(), BigUint::from(17u32)),
            SigningParts::new(n, BigUint::from(2753u32)),
        )
    }

    #[test]
    fn blind_sign_unblind_with_small_numbers() {
        let (public, signer) = toy_key();
        let mark = BigUint::from(1234u32);
        let r = BigUint::from(7u32);

        let blinded = blind(&mark, &r, &public);
        assert_ne!(blinded, mark);
        // 7^17 mod 3233 = 2369, 2369 * 1234 mod 3233 = 714
        assert_eq!(blinded, BigUint::from(714u32));

        let signature = raw_sign(&blinded, &signer);
        let credential = unblind(&signature, &r, &public).unwrap();
        assert!(verify(&credential, &mark, &public));

        // Signing the mark directly gives the same credential
        assert_eq!(credential, raw_sign(&mark, &signer));

        // forged credential
        let forged = (&credential + BigUint::from(1u32)) % &public.n;
        assert!(!verify(&forged, &mark, &public));
    }

    #[test]
    fn unblind_rejects_factor_sharing_a_prime_with_n() {
        let (public, signer) = toy_key();
        let r = BigUint::from(61u32 * 2);
        let blinded = blind(&BigUint::from(99u32), &r, &public);
        let signature = raw_sign(&blinded, &signer);

        assert!(matches!(
            unblind(&signature, &r, &public),
            Err(Error::NoInverse)
        ));
    }

    #[test]
    fn inverse_is_normalised() {
        let n = BigUint::from(3233u32);
        for a in [2u32, 7, 17, 3232].iter() {
            let a = BigUint::from(*a);
            let inv = mod_inverse(&a, &n).unwrap();
            assert!(inv < n);
            assert_eq!((a * inv) % &n, BigUint::from(1u32));
        }
        assert!(mod_inverse(&BigUint::from(53u32), &n).is_none());
        assert!(mod_inverse(&BigUint::from(0u32), &n).is_none());
    }
}
