use crate::*;
use rand::{CryptoRng, Rng, RngCore};
use rsa::RsaPublicKey;
use tracing::warn;

/// Draws of the blinding factor before giving up on finding one invertible mod N
pub const MAX_BLINDING_ATTEMPTS: usize = 64;

/// The secret mark and the factor that hides it from the issuer.
///
/// Lives from the start of a credential attempt until the signature is unblinded.
pub struct BlindingState {
    r: BigUint,
    mark: BigUint,
}

impl BlindingState {
    /// Sample a mark and an invertible blinding factor from `range`.
    ///
    /// Non-invertible factors are redrawn here, before anything is sent, since
    /// the issuer will only ever sign once per voter.
    pub fn sample<R: Rng>(
        range: &MarkRange,
        authority: &PublicParts,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let mark = range.sample(rng)?;
        for _ in 0..MAX_BLINDING_ATTEMPTS {
            let r = range.sample(rng)?;
            if mod_inverse(&r, &authority.n).is_some() {
                return Ok(BlindingState { r, mark });
            }
        }
        Err(Error::NoInverse)
    }

    pub fn mark(&self) -> &BigUint {
        &self.mark
    }
}

/// An unblinded authority signature over a mark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub mark: BigUint,
    pub signature: BigUint,
}

/// One voter's side of the protocol
pub struct VoterAgent {
    id: VoterId,
    keys: VoterKeyPair,
    authority: RsaPublicKey,
    authority_parts: PublicParts,
    blinding: Option<BlindingState>,
    credential: Option<Credential>,
}

impl VoterAgent {
    /// Create a voter and draw its mark and blinding factor
    pub fn new<R: Rng>(
        id: VoterId,
        keys: VoterKeyPair,
        authority: RsaPublicKey,
        range: &MarkRange,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let authority_parts = PublicParts::from(&authority);
        let blinding = BlindingState::sample(range, &authority_parts, rng)?;

        Ok(VoterAgent {
            id,
            keys,
            authority,
            authority_parts,
            blinding: Some(blinding),
            credential: None,
        })
    }

    pub fn id(&self) -> VoterId {
        self.id
    }

    pub fn verification_key(&self) -> RsaPublicKey {
        self.keys.public_key()
    }

    /// The mark this voter votes under, whether or not it has been signed yet
    pub fn mark(&self) -> Option<&BigUint> {
        match (&self.credential, &self.blinding) {
            (Some(credential), _) => Some(&credential.mark),
            (None, Some(blinding)) => Some(&blinding.mark),
            (None, None) => None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Blind the mark and prove control of the verification key
    pub fn credential_request(&self) -> Result<CredentialRequest, Error> {
        let blinding = self
            .blinding
            .as_ref()
            .ok_or(Error::DuplicateRequest(self.id))?;

        let blinded_mark = blind(&blinding.mark, &blinding.r, &self.authority_parts);
        let liveness_signature = self.keys.sign_liveness(&blinded_mark)?;

        Ok(CredentialRequest {
            id: self.id,
            blinded_mark,
            liveness_signature,
            verification_key: self.keys.public_key(),
        })
    }

    /// Unblind the issuer's raw signature and keep the resulting credential.
    ///
    /// A signature that does not unblind to a valid credential is refused and
    /// the blinding state is kept.
    pub fn accept_signature(&mut self, raw: &BigUint) -> Result<&Credential, Error> {
        let blinding = self
            .blinding
            .as_ref()
            .ok_or(Error::DuplicateRequest(self.id))?;

        let signature = unblind(raw, &blinding.r, &self.authority_parts)?;
        if !verify(&signature, &blinding.mark, &self.authority_parts) {
            return Err(Error::InvalidSignature);
        }

        let mark = blinding.mark.clone();
        self.blinding = None;
        Ok(self.credential.insert(Credential { mark, signature }))
    }

    /// Run the whole issuance exchange against an issuer
    pub fn obtain_credential<D: IdentityDirectory>(
        &mut self,
        issuer: &CredentialIssuer<D>,
    ) -> Result<&Credential, Error> {
        let request = self.credential_request()?;
        match issuer.request_credential(&request) {
            Ok(raw) => self.accept_signature(&raw),
            Err(e) => {
                warn!(voter = self.id, error = %e, "voter dropped out of issuance");
                Err(e)
            }
        }
    }

    /// Build the plaintext record for a vote.
    ///
    /// A voter that never got a credential still produces a record, with the
    /// credential field absent.
    pub fn ballot(&self, candidate: CandidateId, mode: CastMode) -> Result<CastPayload, Error> {
        let mark = self
            .mark()
            .cloned()
            .ok_or(PayloadDefect::MissingField("mark"))?;

        Ok(CastPayload {
            mark,
            credential: self.credential.as_ref().map(|c| c.signature.clone()),
            candidate,
            mode,
        })
    }

    /// Build and encrypt a vote for the authority
    pub fn cast<R: RngCore + CryptoRng>(
        &self,
        candidate: CandidateId,
        mode: CastMode,
        block_size: usize,
        rng: &mut R,
    ) -> Result<SealedBallot, Error> {
        let ballot = self.ballot(candidate, mode)?;
        seal(&ballot.to_string(), &self.authority, block_size, rng)
    }
}
