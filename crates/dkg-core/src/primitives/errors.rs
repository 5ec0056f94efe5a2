use thiserror::Error;
use threshold_bls::{dleq::DleqError, poly::Idx, poly::PolyError};

use crate::primitives::dkg::Phase;

/// Result type alias which returns `DkgError`
pub type DkgResult<A> = Result<A, DkgError>;

#[derive(Debug, Error, PartialEq)]
/// Errors which may occur during the DKG
pub enum DkgError {
    /// Raised when the private key given to the DKG constructor does not
    /// yield a public key that is included in the group.
    #[error("public key not found in list of participants")]
    PublicKeyNotFound,

    /// Raised when creating a group with an invalid threshold. Either the
    /// threshold is too low (below `minimum_threshold()`) or too large
    /// (larger than the number of nodes).
    #[error("threshold {0} is not in range [{1},{2}]")]
    InvalidThreshold(usize, usize, usize),

    /// Raised when a deal fails its verification equation. The dealer is
    /// either malicious or made a mistake; the recipient must not accumulate
    /// a protected share from it.
    #[error(
        "deal from dealer {dealer} to recipient {recipient} does not satisfy the verification equation"
    )]
    InvalidDeal { dealer: Idx, recipient: Idx },

    /// Raised by polynomial recovery: not enough shares, a duplicate index,
    /// or public polynomials that cannot be combined.
    #[error(transparent)]
    Poly(#[from] PolyError),

    /// Raised by proof verification inside the DKG.
    #[error(transparent)]
    Dleq(#[from] DleqError),

    /// Raised when a partial value references a participant index outside
    /// the group.
    #[error("index {0} is not a participant in this DKG")]
    UnknownIndex(Idx),

    /// Raised by `verify_signatures` when a single partial signature does
    /// not satisfy its pairing check.
    #[error("partial signature from index {0} does not verify")]
    InvalidPartialSignature(Idx),

    /// Raised when the recovered aggregate signature does not verify against
    /// the collective public key.
    #[error("aggregated signature does not verify")]
    InvalidAggregate,

    /// Raised when an operation is invoked out of order with respect to the
    /// DKG's phase progression.
    #[error("cannot call {op}: expected phase {expected:?}, got {actual:?}")]
    StateError {
        op: &'static str,
        expected: Phase,
        actual: Phase,
    },

    /// Wraps failures from collaborators outside this crate's control, e.g.
    /// (de)serialization of a bundle received from the network.
    #[error("{0}")]
    Group(String),
}
