//! # Threshold BLS
//!
//! Building blocks for distributed-key-generation and threshold BLS signing
//! protocols over a pairing-friendly curve: group/scalar traits generic over
//! the concrete curve, polynomials and their group commitments for Shamir
//! secret sharing, non-interactive discrete-log-equality proofs, and plain
//! BLS signatures.
//!
//! ```rust
//! use threshold_bls::{
//!     schemes::bls12_381::G1Scheme as SigScheme,
//!     sig::{Scheme, SignatureScheme},
//! };
//!
//! let (private, public) = SigScheme::keypair(&mut rand::thread_rng());
//! let msg = b"hello";
//! let sig = SigScheme::sign(&private, &msg[..]).unwrap();
//! SigScheme::verify(&public, &msg[..], &sig).expect("signature should be verified");
//! ```

/// Curve implementations for the traits defined in the [`group`] module.
pub mod curve;

/// Non-interactive discrete-log-equality proofs.
pub mod dleq;

/// Definitions of generic traits with scalars of prime fields and points on elliptic curves.
pub mod group;

/// Implementation of a polynomial suitable to be used for secret sharing schemes and DKG
/// protocols. It can evaluate and interpolate private and public shares to their corresponding
/// polynomial.
pub mod poly;

/// Plain BLS signature implementation.
pub mod sig;

/// Pre-instantiated signature schemes for each curve.
pub mod schemes {
    use crate::sig::{G1Scheme, G2Scheme};

    /// BLS12-381 Schemes
    pub mod bls12_381 {
        use crate::curve::bls12381::PairingCurve;
        pub use crate::curve::bls12381::{G1Curve, G2Curve};

        /// Public Keys on G1, Signatures on G2
        pub type G1Scheme = super::G1Scheme<PairingCurve>;
        /// Public Keys on G2, Signatures on G1
        pub type G2Scheme = super::G2Scheme<PairingCurve>;
    }
}
