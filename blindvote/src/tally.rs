use crate::*;
use indexmap::IndexMap;
use num_traits::One;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// What an accepted ballot did to the tally
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CastOutcome {
    Counted { candidate: CandidateId },
    Revised { from: CandidateId, to: CandidateId },
}

/// Published state of the ballot box.
///
/// Keyed by candidate and by mark only; no voter id appears anywhere in here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TallyResult {
    pub num_ballots: usize,
    pub accepted: u64,
    pub rejected: u64,
    pub totals: IndexMap<CandidateId, u64>,

    /// Mark (decimal) -> currently recorded candidate
    pub ledger: IndexMap<String, CandidateId>,

    /// Candidates sharing the highest non-zero total
    pub winners: Vec<CandidateId>,
}

#[derive(Default)]
struct BoxState {
    tally: IndexMap<CandidateId, u64>,
    ledger: IndexMap<BigUint, CandidateId>,
    accepted: u64,
    rejected: u64,
}

impl BoxState {
    fn apply(
        &mut self,
        payload: &CastPayload,
        authority: &PublicParts,
        marks: &MarkRange,
    ) -> Result<CastOutcome, Error> {
        let credential = payload
            .credential
            .as_ref()
            .ok_or(PayloadDefect::MissingCredential)?;

        if !self.tally.contains_key(&payload.candidate) {
            return Err(Error::UnknownCandidate(payload.candidate));
        }

        if !marks.contains(&payload.mark) || !outside_fixed_points(&payload.mark, authority) {
            return Err(PayloadDefect::MarkOutOfRange.into());
        }

        // Nothing is counted for a credential that does not verify
        if !verify(credential, &payload.mark, authority) {
            return Err(Error::InvalidSignature);
        }

        let outcome = match payload.mode {
            CastMode::Initial => {
                if self.ledger.contains_key(&payload.mark) {
                    return Err(PayloadDefect::AlreadyCast.into());
                }
                CastOutcome::Counted {
                    candidate: payload.candidate,
                }
            }
            CastMode::Revision => {
                let previous = *self
                    .ledger
                    .get(&payload.mark)
                    .ok_or(PayloadDefect::NoPriorBallot)?;
                if let Some(count) = self.tally.get_mut(&previous) {
                    *count = count.saturating_sub(1);
                }
                CastOutcome::Revised {
                    from: previous,
                    to: payload.candidate,
                }
            }
        };

        self.ledger.insert(payload.mark.clone(), payload.candidate);
        *self.tally.entry(payload.candidate).or_insert(0) += 1;
        Ok(outcome)
    }
}

/// 0, 1 and N-1 sign to themselves under any exponent
fn outside_fixed_points(mark: &BigUint, authority: &PublicParts) -> bool {
    *mark > BigUint::one() && mark.clone() + BigUint::one() < authority.n
}

/// Verifies cast ballots and keeps the tally and the mark ledger.
///
/// All mutation happens under one lock, so the read of a mark's previous
/// choice and the decrement/increment of a revision are atomic.
pub struct BallotBox {
    authority: PublicParts,
    marks: MarkRange,
    state: Mutex<BoxState>,
}

impl BallotBox {
    /// A box for a fixed candidate set, every count starting at zero.
    ///
    /// Only marks drawn from `marks` are accepted.
    pub fn new<I>(candidates: I, authority: PublicParts, marks: MarkRange) -> Self
    where
        I: IntoIterator<Item = CandidateId>,
    {
        let state = BoxState {
            tally: candidates.into_iter().map(|c| (c, 0)).collect(),
            ..Default::default()
        };

        BallotBox {
            authority,
            marks,
            state: Mutex::new(state),
        }
    }

    /// Verify a decrypted ballot and apply it to the tally
    pub fn cast_vote(&self, payload: &CastPayload) -> Result<CastOutcome, Error> {
        let mut state = self.lock_state();
        let outcome = state.apply(payload, &self.authority, &self.marks);

        match &outcome {
            Ok(CastOutcome::Counted { candidate }) => {
                state.accepted += 1;
                info!(mark = %payload.mark, candidate, "vote counted");
            }
            Ok(CastOutcome::Revised { from, to }) => {
                state.accepted += 1;
                info!(mark = %payload.mark, from, to, "vote revised");
            }
            Err(e) => {
                state.rejected += 1;
                warn!(error = %e, "ballot rejected");
            }
        }
        outcome
    }

    /// Count a ballot that never made it as far as `cast_vote`
    pub fn record_rejection(&self, err: &Error) {
        self.lock_state().rejected += 1;
        warn!(error = %err, "ballot rejected");
    }

    /// Current count for a candidate
    pub fn count(&self, candidate: CandidateId) -> Option<u64> {
        self.lock_state().tally.get(&candidate).copied()
    }

    /// Current recorded choice for a mark
    pub fn recorded_choice(&self, mark: &BigUint) -> Option<CandidateId> {
        self.lock_state().ledger.get(mark).copied()
    }

    pub fn ledger(&self) -> IndexMap<BigUint, CandidateId> {
        self.lock_state().ledger.clone()
    }

    pub fn results(&self) -> TallyResult {
        let state = self.lock_state();

        let top = state.tally.values().copied().max().unwrap_or(0);
        let winners = match top {
            0 => vec![],
            _ => state
                .tally
                .iter()
                .filter(|(_, count)| **count == top)
                .map(|(candidate, _)| *candidate)
                .collect(),
        };

        TallyResult {
            num_ballots: state.ledger.len(),
            accepted: state.accepted,
            rejected: state.rejected,
            totals: state.tally.clone(),
            ledger: state
                .ledger
                .iter()
                .map(|(mark, candidate)| (mark.to_string(), *candidate))
                .collect(),
            winners,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BoxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
