use crate::*;

use std::fmt;
use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("blindvote: voter {id} is not an eligible voter: {reason}")]
    IneligibleVoter { id: VoterId, reason: IneligibleReason },

    #[error("blindvote: voter {0} has already been issued a credential")]
    DuplicateRequest(VoterId),

    #[error("blindvote: blinding factor is not invertible modulo N")]
    NoInverse,

    #[error("blindvote: candidate {0} is not on the ballot")]
    UnknownCandidate(CandidateId),

    #[error("blindvote: malformed ballot: {0}")]
    MalformedPayload(PayloadDefect),

    #[error("blindvote: credential does not verify against the mark")]
    InvalidSignature,

    #[error("blindvote: failed to decrypt ballot")]
    Decryption,

    #[error("blindvote: invalid election config: {0}")]
    InvalidConfig(String),

    #[error("blindvote: RSA error: {0}")]
    RSAError(#[from] rsa::Error),

    #[error("blindvote: JSON error reading config: {0}")]
    JSONDeserialization(#[from] serde_json::Error),

    #[error("blindvote: io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a credential request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    NotOnRoster,
    BadLivenessProof,
    KeyMismatch,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IneligibleReason::NotOnRoster => write!(f, "id is not on the roster"),
            IneligibleReason::BadLivenessProof => write!(f, "liveness signature did not verify"),
            IneligibleReason::KeyMismatch => {
                write!(f, "claimed key does not match the identity directory")
            }
        }
    }
}

/// What was wrong with a decrypted cast payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadDefect {
    NotUtf8,
    MissingField(&'static str),
    BadNumber(&'static str),
    BadMode(String),
    TrailingFields,
    MissingCredential,
    MarkOutOfRange,
    NoPriorBallot,
    AlreadyCast,
}

impl fmt::Display for PayloadDefect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PayloadDefect::NotUtf8 => write!(f, "payload is not valid UTF-8"),
            PayloadDefect::MissingField(field) => write!(f, "missing field `{}`", field),
            PayloadDefect::BadNumber(field) => write!(f, "field `{}` is not a number", field),
            PayloadDefect::BadMode(mode) => write!(f, "unknown mode `{}`", mode),
            PayloadDefect::TrailingFields => write!(f, "unexpected trailing fields"),
            PayloadDefect::MissingCredential => write!(f, "voter is not on the list"),
            PayloadDefect::MarkOutOfRange => write!(f, "mark was not drawn from the election's range"),
            PayloadDefect::NoPriorBallot => write!(f, "revision for a mark with no recorded vote"),
            PayloadDefect::AlreadyCast => write!(f, "initial vote for a mark that already voted"),
        }
    }
}

impl From<PayloadDefect> for Error {
    fn from(defect: PayloadDefect) -> Self {
        Error::MalformedPayload(defect)
    }
}
