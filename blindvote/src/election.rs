use crate::*;
use rand::{CryptoRng, Rng, RngCore};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Bit size for the election and voter keys unless configured otherwise
pub const DEFAULT_KEY_BITS: usize = 1024;

/// Smallest voter key that can hold a PKCS#1 v1.5 SHA-256 signature
pub const MIN_VOTER_KEY_BITS: usize = 512;

/// Half-open range `[low, high)` marks and blinding factors are drawn from.
///
/// The default is far too small for a real election: marks collide across
/// voters long before the roster gets large, and a mark can be guessed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarkRange {
    pub low: u64,
    pub high: u64,
}

impl MarkRange {
    /// Non-empty and starting at 2 or above; 0 and 1 are their own RSA signatures
    pub fn validate(&self) -> Result<(), Error> {
        if self.low < 2 || self.low >= self.high {
            return Err(Error::InvalidConfig(format!(
                "mark range [{}, {}) must be non-empty and start at 2 or above",
                self.low, self.high
            )));
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BigUint, Error> {
        self.validate()?;
        Ok(BigUint::from(rng.gen_range(self.low..self.high)))
    }

    pub fn contains(&self, mark: &BigUint) -> bool {
        *mark >= BigUint::from(self.low) && *mark < BigUint::from(self.high)
    }
}

impl Default for MarkRange {
    fn default() -> Self {
        MarkRange {
            low: 10_000,
            high: 50_000,
        }
    }
}

/// Election settings, usually read from a JSON file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ElectionConfig {
    /// Eligible voter ids
    pub voters: Vec<VoterId>,

    /// Candidate ids on the ballot
    pub candidates: Vec<CandidateId>,

    #[serde(default)]
    pub mark_range: MarkRange,

    #[serde(default = "default_key_bits")]
    pub authority_key_bits: usize,

    #[serde(default = "default_key_bits")]
    pub voter_key_bits: usize,

    /// Plaintext bytes per encrypted block of a cast ballot
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            voters: (1..=8).collect(),
            candidates: (1..=6).collect(),
            mark_range: MarkRange::default(),
            authority_key_bits: DEFAULT_KEY_BITS,
            voter_key_bits: DEFAULT_KEY_BITS,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ElectionConfig {
    /// Read and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        let config: ElectionConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Make sure the settings can actually run an election
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.voters.is_empty() {
            return invalid("roster is empty".to_owned());
        }
        if self.candidates.is_empty() {
            return invalid("no candidates".to_owned());
        }
        if has_duplicates(&self.voters) {
            return invalid("duplicate voter id on the roster".to_owned());
        }
        if has_duplicates(&self.candidates) {
            return invalid("duplicate candidate id".to_owned());
        }
        self.mark_range.validate()?;
        if self.voter_key_bits < MIN_VOTER_KEY_BITS {
            return invalid(format!(
                "voter keys need at least {} bits",
                MIN_VOTER_KEY_BITS
            ));
        }

        let limit = max_block_size(self.authority_key_bits / 8);
        if self.block_size == 0 || self.block_size > limit {
            return invalid(format!(
                "block size {} outside 1..={} for a {}-bit authority key",
                self.block_size, limit, self.authority_key_bits
            ));
        }
        Ok(())
    }
}

fn has_duplicates(ids: &[u32]) -> bool {
    ids.iter().collect::<BTreeSet<_>>().len() != ids.len()
}

/// One election run: the authority's issuer and ballot box, plus the identity
/// directory voters publish their keys to.
pub struct Election {
    config: ElectionConfig,
    directory: MemDirectory,
    issuer: CredentialIssuer<MemDirectory>,
    ballot_box: BallotBox,
}

impl Election {
    /// Generate an authority key and open the election
    pub fn new<R: RngCore + CryptoRng>(config: ElectionConfig, rng: &mut R) -> Result<Self, Error> {
        config.validate()?;
        let keys = ElectionKeyPair::generate(config.authority_key_bits, rng)?;
        Election::with_keys(config, keys)
    }

    /// Open the election with an existing authority key
    pub fn with_keys(config: ElectionConfig, keys: ElectionKeyPair) -> Result<Self, Error> {
        config.validate()?;
        if max_block_size(keys.size()) < config.block_size {
            return Err(Error::InvalidConfig(format!(
                "authority key of {} bytes cannot carry {}-byte blocks",
                keys.size(),
                config.block_size
            )));
        }

        let directory = MemDirectory::default();
        let ballot_box = BallotBox::new(
            config.candidates.iter().copied(),
            keys.public_parts(),
            config.mark_range.clone(),
        );
        let issuer = CredentialIssuer::new(keys, config.voters.iter().copied(), directory.clone());

        info!(voters = ?config.voters, candidates = ?config.candidates, "election opened");

        Ok(Election {
            config,
            directory,
            issuer,
            ballot_box,
        })
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn issuer(&self) -> &CredentialIssuer<MemDirectory> {
        &self.issuer
    }

    pub fn ballot_box(&self) -> &BallotBox {
        &self.ballot_box
    }

    /// Create a voter agent and publish its verification key.
    ///
    /// Ids that are not on the roster can enroll; they are turned away at issuance.
    pub fn enroll<R: RngCore + CryptoRng>(&self, id: VoterId, rng: &mut R) -> Result<VoterAgent, Error> {
        let keys = VoterKeyPair::generate(self.config.voter_key_bits, rng)?;
        let verification_key = keys.public_key();
        let voter = VoterAgent::new(id, keys, self.issuer.public_key(), &self.config.mark_range, rng)?;
        self.directory.publish(id, verification_key)?;
        Ok(voter)
    }

    /// Run the credential exchange for a voter
    pub fn issue(&self, voter: &mut VoterAgent) -> Result<(), Error> {
        voter.obtain_credential(&self.issuer).map(|_| ())
    }

    /// Seal a voter's ballot and submit it
    pub fn cast<R: RngCore + CryptoRng>(
        &self,
        voter: &VoterAgent,
        candidate: CandidateId,
        mode: CastMode,
        rng: &mut R,
    ) -> Result<CastOutcome, Error> {
        let sealed = voter.cast(candidate, mode, self.config.block_size, rng)?;
        self.submit(&sealed)
    }

    /// Decrypt and count a sealed ballot
    pub fn submit(&self, sealed: &SealedBallot) -> Result<CastOutcome, Error> {
        self.issuer.finalize_vote(sealed, &self.ballot_box)
    }

    pub fn results(&self) -> TallyResult {
        self.ballot_box.results()
    }
}
