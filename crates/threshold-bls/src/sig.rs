//! Plain (non-threshold) BLS signatures over a pairing-friendly curve.
use crate::group::{Element, PairingCurve, Point, Scalar};
use rand_core::RngCore;
use std::fmt::Debug;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlsError {
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("could not hash message to the curve: {0}")]
    HashingError(String),
}

/// A keypair-capable signature scheme: a private key type and its
/// corresponding public key type.
pub trait Scheme: Clone + Debug {
    type Private: Scalar<RHS = Self::Private>;
    type Public: Point<RHS = Self::Private>;

    /// Generates a fresh keypair using the given RNG.
    fn keypair<R: RngCore>(rng: &mut R) -> (Self::Private, Self::Public) {
        let private = Self::Private::rand(rng);
        let mut public = Self::Public::one();
        public.mul(&private);
        (private, public)
    }
}

/// A BLS signature scheme: signs and verifies messages, hashing them onto
/// the curve first.
pub trait SignatureScheme: Scheme {
    type Signature: Point<RHS = Self::Private>;

    fn sign(private: &Self::Private, msg: &[u8]) -> Result<Self::Signature, BlsError>;

    fn verify(public: &Self::Public, msg: &[u8], sig: &Self::Signature) -> Result<(), BlsError>;
}

/// Binds a pairing curve's scalar field and G1/G2 groups to a `Scheme`
/// assigning public keys to one group and signatures to the other.
#[derive(Clone, Debug)]
pub struct G1Scheme<C: PairingCurve>(PhantomData<C>);

#[derive(Clone, Debug)]
pub struct G2Scheme<C: PairingCurve>(PhantomData<C>);

impl<C: PairingCurve> Scheme for G1Scheme<C> {
    type Private = C::Scalar;
    type Public = C::G1;
}

impl<C: PairingCurve> Scheme for G2Scheme<C> {
    type Private = C::Scalar;
    type Public = C::G2;
}

impl<C: PairingCurve> SignatureScheme for G1Scheme<C> {
    type Signature = C::G2;

    fn sign(private: &Self::Private, msg: &[u8]) -> Result<Self::Signature, BlsError> {
        let mut h = C::G2::new();
        h.map(msg)
            .map_err(|e| BlsError::HashingError(format!("{:?}", e)))?;
        h.mul(private);
        Ok(h)
    }

    fn verify(public: &Self::Public, msg: &[u8], sig: &Self::Signature) -> Result<(), BlsError> {
        let mut h = C::G2::new();
        h.map(msg)
            .map_err(|e| BlsError::HashingError(format!("{:?}", e)))?;

        // e(g1, sig) == e(public, H(m))
        let lhs = C::pair(&C::G1::one(), sig);
        let rhs = C::pair(public, &h);

        if lhs == rhs {
            Ok(())
        } else {
            Err(BlsError::InvalidSignature)
        }
    }
}

impl<C: PairingCurve> SignatureScheme for G2Scheme<C> {
    type Signature = C::G1;

    fn sign(private: &Self::Private, msg: &[u8]) -> Result<Self::Signature, BlsError> {
        let mut h = C::G1::new();
        h.map(msg)
            .map_err(|e| BlsError::HashingError(format!("{:?}", e)))?;
        h.mul(private);
        Ok(h)
    }

    fn verify(public: &Self::Public, msg: &[u8], sig: &Self::Signature) -> Result<(), BlsError> {
        let mut h = C::G1::new();
        h.map(msg)
            .map_err(|e| BlsError::HashingError(format!("{:?}", e)))?;

        // e(sig, g2) == e(H(m), public)
        let lhs = C::pair(sig, &C::G2::one());
        let rhs = C::pair(&h, public);

        if lhs == rhs {
            Ok(())
        } else {
            Err(BlsError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::bls12381::PairingCurve as Bls12381;
    use rand::prelude::*;

    fn roundtrip<S: SignatureScheme>() {
        let rng = &mut thread_rng();
        let (private, public) = S::keypair(rng);
        let msg = b"hello threshold world";

        let sig = S::sign(&private, msg).unwrap();
        S::verify(&public, msg, &sig).unwrap();
    }

    fn rejects_wrong_message<S: SignatureScheme>() {
        let rng = &mut thread_rng();
        let (private, public) = S::keypair(rng);

        let sig = S::sign(&private, b"hello").unwrap();
        assert_eq!(
            S::verify(&public, b"goodbye", &sig),
            Err(BlsError::InvalidSignature)
        );
    }

    #[test]
    fn g1_roundtrip() {
        roundtrip::<G1Scheme<Bls12381>>();
    }

    #[test]
    fn g2_roundtrip() {
        roundtrip::<G2Scheme<Bls12381>>();
    }

    #[test]
    fn g1_rejects_wrong_message() {
        rejects_wrong_message::<G1Scheme<Bls12381>>();
    }

    #[test]
    fn g2_rejects_wrong_message() {
        rejects_wrong_message::<G2Scheme<Bls12381>>();
    }
}
