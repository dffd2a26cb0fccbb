use crate::*;
use indexmap::IndexMap;
use rsa::RsaPublicKey;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Where a voter id stands in the issuance exchange
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    Unregistered,

    /// Key bound, signature not yet handed out. Binding and signing share one
    /// roster lock, so outside the issuer a served id only ever reads `Served`.
    Registered,
    Served,
}

/// One eligible voter id on the roster
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub id: VoterId,

    /// Bound on first valid contact and never replaced afterwards
    pub verification_key: Option<RsaPublicKey>,
    pub status: RosterStatus,
}

impl RosterEntry {
    fn new(id: VoterId) -> Self {
        RosterEntry {
            id,
            verification_key: None,
            status: RosterStatus::Unregistered,
        }
    }
}

/// What a voter sends to get a blind signature
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    pub id: VoterId,
    pub blinded_mark: BigUint,

    /// Signature by `verification_key` over the digest of `blinded_mark`
    pub liveness_signature: Vec<u8>,
    pub verification_key: RsaPublicKey,
}

/// The authority that signs blinded marks for eligible voters.
///
/// Holds the election keypair, so it is also where cast ballots get decrypted
/// before being handed to the ballot box.
pub struct CredentialIssuer<D: IdentityDirectory> {
    keys: ElectionKeyPair,
    roster: Mutex<IndexMap<VoterId, RosterEntry>>,
    directory: D,
}

impl<D: IdentityDirectory> CredentialIssuer<D> {
    pub fn new<I>(keys: ElectionKeyPair, eligible: I, directory: D) -> Self
    where
        I: IntoIterator<Item = VoterId>,
    {
        let roster = eligible
            .into_iter()
            .map(|id| (id, RosterEntry::new(id)))
            .collect();

        CredentialIssuer {
            keys,
            roster: Mutex::new(roster),
            directory,
        }
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.keys.public_key()
    }

    pub fn public_parts(&self) -> PublicParts {
        self.keys.public_parts()
    }

    /// Issue a raw signature over a blinded mark.
    ///
    /// The roster lock is held from the status check through the bind, so two
    /// requests for the same id can never both be served. A rejected request
    /// leaves the roster untouched.
    pub fn request_credential(&self, request: &CredentialRequest) -> Result<BigUint, Error> {
        let id = request.id;
        let mut roster = self.lock_roster();

        let entry = match roster.get_mut(&id) {
            Some(entry) => entry,
            None => return Err(reject(ineligible(id, IneligibleReason::NotOnRoster))),
        };

        if entry.status != RosterStatus::Unregistered {
            return Err(reject(Error::DuplicateRequest(id)));
        }

        if let Some(listed) = self.directory.verification_key(id) {
            if listed != request.verification_key {
                return Err(reject(ineligible(id, IneligibleReason::KeyMismatch)));
            }
        }

        if !verify_liveness(
            &request.verification_key,
            &request.blinded_mark,
            &request.liveness_signature,
        ) {
            return Err(reject(ineligible(id, IneligibleReason::BadLivenessProof)));
        }

        let signature = raw_sign(&request.blinded_mark, &self.keys.signing_parts());
        entry.verification_key = Some(request.verification_key.clone());
        entry.status = RosterStatus::Served;

        info!(voter = id, "issued blind signature");
        Ok(signature)
    }

    /// Decrypt a sealed ballot and parse the record inside
    pub fn open_ballot(&self, sealed: &SealedBallot) -> Result<CastPayload, Error> {
        open(sealed, &self.keys)?.parse()
    }

    /// Decrypt a sealed ballot and cast it into the ballot box
    pub fn finalize_vote(
        &self,
        sealed: &SealedBallot,
        ballot_box: &BallotBox,
    ) -> Result<CastOutcome, Error> {
        match self.open_ballot(sealed) {
            Ok(payload) => ballot_box.cast_vote(&payload),
            Err(e) => {
                ballot_box.record_rejection(&e);
                Err(e)
            }
        }
    }

    /// Get the roster entry for a voter id
    pub fn roster_entry(&self, id: VoterId) -> Option<RosterEntry> {
        self.lock_roster().get(&id).cloned()
    }

    /// All eligible ids in roster order
    pub fn eligible_ids(&self) -> Vec<VoterId> {
        self.lock_roster().keys().copied().collect()
    }

    /// Number of ids that have been issued a signature
    pub fn served(&self) -> usize {
        self.lock_roster()
            .values()
            .filter(|entry| entry.status == RosterStatus::Served)
            .count()
    }

    fn lock_roster(&self) -> MutexGuard<'_, IndexMap<VoterId, RosterEntry>> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ineligible(id: VoterId, reason: IneligibleReason) -> Error {
    Error::IneligibleVoter { id, reason }
}

fn reject(err: Error) -> Error {
    warn!(error = %err, "credential request rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(
        id: VoterId,
        voter: &VoterKeyPair,
        blinded_mark: BigUint,
    ) -> CredentialRequest {
        CredentialRequest {
            id,
            liveness_signature: voter.sign_liveness(&blinded_mark).unwrap(),
            verification_key: voter.public_key(),
            blinded_mark,
        }
    }

    #[test]
    fn issues_exactly_once_per_id() {
        let mut rng = rand::thread_rng();
        let keys = ElectionKeyPair::generate(512, &mut rng).unwrap();
        let public = keys.public_parts();
        let issuer = CredentialIssuer::new(keys, vec![1, 2], ());
        let voter = VoterKeyPair::generate(512, &mut rng).unwrap();

        let mark = BigUint::from(20_000u32);
        let r = BigUint::from(12_345u32);
        let blinded = blind(&mark, &r, &public);

        let signature = issuer
            .request_credential(&request_for(1, &voter, blinded.clone()))
            .unwrap();
        let credential = unblind(&signature, &r, &public).unwrap();
        assert!(verify(&credential, &mark, &public));

        let entry = issuer.roster_entry(1).unwrap();
        assert_eq!(entry.status, RosterStatus::Served);
        assert_eq!(entry.verification_key, Some(voter.public_key()));

        // Same id again, even with a different payload
        let again = issuer.request_credential(&request_for(1, &voter, BigUint::from(5u32)));
        assert!(matches!(again, Err(Error::DuplicateRequest(1))));
        assert_eq!(issuer.served(), 1);
    }

    #[test]
    fn unknown_id_is_ineligible() {
        let mut rng = rand::thread_rng();
        let keys = ElectionKeyPair::generate(512, &mut rng).unwrap();
        let issuer = CredentialIssuer::new(keys, vec![1, 2], ());
        let voter = VoterKeyPair::generate(512, &mut rng).unwrap();

        let result = issuer.request_credential(&request_for(9, &voter, BigUint::from(77u32)));
        assert!(matches!(
            result,
            Err(Error::IneligibleVoter {
                id: 9,
                reason: IneligibleReason::NotOnRoster
            })
        ));
        assert_eq!(issuer.eligible_ids(), vec![1, 2]);
    }

    #[test]
    fn bad_liveness_proof_leaves_roster_unchanged() {
        let mut rng = rand::thread_rng();
        let keys = ElectionKeyPair::generate(512, &mut rng).unwrap();
        let issuer = CredentialIssuer::new(keys, vec![1], ());
        let voter = VoterKeyPair::generate(512, &mut rng).unwrap();
        let spoofer = VoterKeyPair::generate(512, &mut rng).unwrap();

        // Signed by one key, claims another
        let mut request = request_for(1, &spoofer, BigUint::from(4242u32));
        request.verification_key = voter.public_key();

        let result = issuer.request_credential(&request);
        assert!(matches!(
            result,
            Err(Error::IneligibleVoter {
                reason: IneligibleReason::BadLivenessProof,
                ..
            })
        ));

        let entry = issuer.roster_entry(1).unwrap();
        assert_eq!(entry.status, RosterStatus::Unregistered);
        assert!(entry.verification_key.is_none());

        // The real voter can still be served
        assert!(issuer
            .request_credential(&request_for(1, &voter, BigUint::from(4242u32)))
            .is_ok());
    }

    #[test]
    fn claimed_key_must_match_directory() {
        let mut rng = rand::thread_rng();
        let keys = ElectionKeyPair::generate(512, &mut rng).unwrap();
        let directory = MemDirectory::default();
        let issuer = CredentialIssuer::new(keys, vec![1], directory.clone());
        let voter = VoterKeyPair::generate(512, &mut rng).unwrap();
        let impostor = VoterKeyPair::generate(512, &mut rng).unwrap();
        directory.publish(1, voter.public_key()).unwrap();

        let result = issuer.request_credential(&request_for(1, &impostor, BigUint::from(99u32)));
        assert!(matches!(
            result,
            Err(Error::IneligibleVoter {
                reason: IneligibleReason::KeyMismatch,
                ..
            })
        ));
        assert!(issuer
            .request_credential(&request_for(1, &voter, BigUint::from(99u32)))
            .is_ok());
    }
}
