//! Traits for operating on Groups and Elliptic Curves.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::marker::PhantomData;

/// Element represents an element of a group with the additive notation
/// which is also equipped with a multiplication transformation.
/// Two implementations are for Scalar which forms a ring so RHS is the same
/// and Point which can be multiplied by a scalar of its prime field.
pub trait Element:
    Clone + Display + Debug + Eq + Serialize + for<'a> Deserialize<'a> + PartialEq + Send + Sync
{
    /// The right-hand-side argument for multiplication
    type RHS;

    /// Returns the zero element of the group
    fn new() -> Self;

    /// Returns the one element of the group
    fn one() -> Self;

    /// Adds the RHS  element to the LHS element in place
    fn add(&mut self, s2: &Self);

    /// Multiplies the LHS element by the RHS element in place
    fn mul(&mut self, mul: &Self::RHS);

    /// Samples a random element using the provided RNG
    fn rand<R: RngCore>(rng: &mut R) -> Self;

    /// Returns the zero element of the group
    fn zero() -> Self {
        Self::new()
    }
}

/// Checks inclusion in prime order subgroup. Only needed when underlying trait
/// does not enforce this already
pub trait PrimeOrder: Element {
    /// Checks the provided element is in the correct prime-order subgroup
    fn in_correct_subgroup(&self) -> bool;
}

/// Scalar can be multiplied by only a Scalar, no other elements.
pub trait Scalar: Element {
    fn set_int(&mut self, i: u64);
    fn inverse(&self) -> Option<Self>;
    fn negate(&mut self);
    fn sub(&mut self, other: &Self);
    fn from_random_bytes(bytes: &[u8]) -> Option<Self>;
    fn serialized_size(&self) -> usize;
}

/// Basic point functionality that can be multiplied by a scalar
pub trait Point: Element {
    /// Error which may occur while mapping to the group
    type Error: Debug;

    /// Maps the provided data to a group element
    fn map(&mut self, data: &[u8]) -> Result<(), <Self as Point>::Error>;
}

/// A group holds functionalities to create scalar and points related; it is
/// similar to the Engine definition, just much more simpler.
pub trait Curve: Clone + Debug + Send + Sync {
    /// The curve's scalar
    type Scalar: Scalar<RHS = Self::Scalar>;

    /// The curve's point
    type Point: Point<RHS = Self::Scalar>;

    /// scalar returns the identity element of the field.
    fn scalar() -> Self::Scalar {
        Self::Scalar::new()
    }

    /// point returns the default additive generator of the group.
    fn point() -> Self::Point {
        Self::Point::one()
    }
}

/// A curve equipped with a bilinear pairing operation.
pub trait PairingCurve: Debug {
    /// Secret-sharing scalars flow into DKG polynomial coefficients, which
    /// must be wipeable on drop, so the scalar field of a pairing suite is
    /// required to implement [`zeroize::Zeroize`].
    type Scalar: Scalar<RHS = Self::Scalar> + zeroize::Zeroize;

    type G1: Point<RHS = Self::Scalar>;

    /// Protected shares (`xS`) live in `G2` and are secret until unblinded,
    /// so `G2` must be wipeable on drop too.
    type G2: Point<RHS = Self::Scalar> + zeroize::Zeroize;

    type GT: Element<RHS = Self::Scalar>;

    /// Perfors a pairing operation between the 2 group elements
    fn pair(a: &Self::G1, b: &Self::G2) -> Self::GT;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Helper which binds together a scalar with a group type to form a curve
pub struct CurveFrom<S: Scalar, P: Point> {
    s: PhantomData<S>,
    p: PhantomData<P>,
}

impl<S, P> Curve for CurveFrom<S, P>
where
    S: Scalar<RHS = S>,
    P: Point<RHS = S>,
{
    type Scalar = S;
    type Point = P;
}

/// The `Curve` formed by a pairing suite's scalar field together with its G1 group.
pub type G1Curve<C> = CurveFrom<<C as PairingCurve>::Scalar, <C as PairingCurve>::G1>;
/// The `Curve` formed by a pairing suite's scalar field together with its G2 group.
pub type G2Curve<C> = CurveFrom<<C as PairingCurve>::Scalar, <C as PairingCurve>::G2>;

/// Hashes arbitrary, domain-separated bytes down to a scalar. Retries with an
/// appended counter on the rare occasion a digest doesn't land in the
/// scalar field, so this never panics.
pub fn hash_to_scalar<S: Scalar>(domain: &[u8], bytes: &[u8]) -> S {
    use sha2::{Digest, Sha256};

    for counter in 0u32.. {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(counter.to_le_bytes());
        hasher.update(bytes);
        let digest = hasher.finalize();
        if let Some(scalar) = S::from_random_bytes(&digest) {
            return scalar;
        }
    }
    unreachable!("a 256 bit digest eventually maps into the scalar field")
}
