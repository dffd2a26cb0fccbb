#[macro_use]
extern crate serde;

mod ballot;
mod blind;
mod directory;
mod election;
mod envelope;
mod error;
mod issuer;
mod keys;
mod tally;
mod voter;

pub use ballot::*;
pub use blind::*;
pub use directory::*;
pub use election::*;
pub use envelope::*;
pub use error::*;
pub use issuer::*;
pub use keys::*;
pub use tally::*;
pub use voter::*;

pub use num_bigint_dig::BigUint;
