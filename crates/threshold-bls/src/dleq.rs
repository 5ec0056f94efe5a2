//! Non-interactive zero-knowledge proofs of discrete-log equality: given two
//! group points `G` and `H` and a witness scalar `x`, a prover can convince a
//! verifier that `xG` and `xH` were produced from the same `x`, without
//! revealing `x`. Both single proofs and batched proofs over several
//! `(G, H, x)` triples sharing one challenge are supported.
use crate::group::{hash_to_scalar, Element, Point, Scalar};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DleqError {
    #[error("mismatched input lengths: {0} and {1}, expected {2}")]
    LengthMismatch(usize, usize, usize),
    #[error("empty batch")]
    EmptyBatch,
    #[error("dleq proof did not verify")]
    InvalidProof,
}

const DOMAIN: &[u8] = b"DLEQ-PROOF";

/// A non-interactive proof that `xG` and `xH` share the same discrete log `x`
/// with respect to bases `G` and `H`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DleqProof<S, P> {
    c: S,
    r: S,
    v_g: P,
    v_h: P,
}

impl<S, P> DleqProof<S, P>
where
    S: Scalar<RHS = S>,
    P: Point<RHS = S>,
{
    /// Proves that `xg = x * g` and `xh = x * h` for the same `x`, without
    /// revealing `x`.
    pub fn new<R: RngCore>(rng: &mut R, g: &P, h: &P, x: &S, xg: &P, xh: &P) -> Self {
        let v = S::rand(rng);

        let mut v_g = g.clone();
        v_g.mul(&v);

        let mut v_h = h.clone();
        v_h.mul(&v);

        let c = challenge(&[g, h, xg, xh, &v_g, &v_h]);

        // r = v - c * x
        let mut r = v;
        let mut cx = c.clone();
        cx.mul(x);
        r.sub(&cx);

        Self { c, r, v_g, v_h }
    }

    /// Verifies the proof against the claimed images `xg` and `xh`.
    pub fn verify(&self, g: &P, h: &P, xg: &P, xh: &P) -> Result<(), DleqError> {
        // v_g == r*g + c*xg
        let mut rg = g.clone();
        rg.mul(&self.r);
        let mut cxg = xg.clone();
        cxg.mul(&self.c);
        rg.add(&cxg);

        // v_h == r*h + c*xh
        let mut rh = h.clone();
        rh.mul(&self.r);
        let mut cxh = xh.clone();
        cxh.mul(&self.c);
        rh.add(&cxh);

        if rg == self.v_g && rh == self.v_h {
            Ok(())
        } else {
            Err(DleqError::InvalidProof)
        }
    }
}

/// A batched proof: one challenge shared across several `(g, h, x)` triples,
/// with a separate response per triple. Cheaper to verify than an equivalent
/// number of individual [`DleqProof`]s since the challenge is derived once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDleqProof<S, P> {
    c: S,
    responses: Vec<S>,
    v_g: Vec<P>,
    v_h: Vec<P>,
}

impl<S, P> BatchDleqProof<S, P>
where
    S: Scalar<RHS = S>,
    P: Point<RHS = S>,
{
    /// Proves discrete-log equality jointly for every `(xg_i, xh_i)` produced
    /// from `xs[i]` under the per-statement bases `g[i]`/`h[i]`. `g`, `h`,
    /// `xs`, `xgs` and `xhs` must all have the same length -- unlike a single
    /// [`DleqProof`], a batch does not require every statement to share one
    /// base pair.
    pub fn new<R: RngCore>(
        rng: &mut R,
        g: &[P],
        h: &[P],
        xs: &[S],
        xgs: &[P],
        xhs: &[P],
    ) -> Result<Self, DleqError> {
        if xs.is_empty() {
            return Err(DleqError::EmptyBatch);
        }
        if g.len() != xs.len() || h.len() != xs.len() {
            return Err(DleqError::LengthMismatch(g.len(), h.len(), xs.len()));
        }
        if xs.len() != xgs.len() || xs.len() != xhs.len() {
            return Err(DleqError::LengthMismatch(xgs.len(), xhs.len(), xs.len()));
        }

        let vs: Vec<S> = (0..xs.len()).map(|_| S::rand(rng)).collect();

        let v_g: Vec<P> = vs
            .iter()
            .zip(g.iter())
            .map(|(v, g_i)| {
                let mut p = g_i.clone();
                p.mul(v);
                p
            })
            .collect();
        let v_h: Vec<P> = vs
            .iter()
            .zip(h.iter())
            .map(|(v, h_i)| {
                let mut p = h_i.clone();
                p.mul(v);
                p
            })
            .collect();

        let mut points: Vec<&P> = Vec::with_capacity(6 * xs.len());
        points.extend(g.iter());
        points.extend(h.iter());
        points.extend(xgs.iter());
        points.extend(xhs.iter());
        points.extend(v_g.iter());
        points.extend(v_h.iter());
        let c = challenge(&points);

        let responses: Vec<S> = vs
            .iter()
            .zip(xs.iter())
            .map(|(v, x)| {
                let mut r = v.clone();
                let mut cx = c.clone();
                cx.mul(x);
                r.sub(&cx);
                r
            })
            .collect();

        Ok(Self {
            c,
            responses,
            v_g,
            v_h,
        })
    }

    /// Verifies the batch against the claimed bases and images.
    pub fn verify(&self, g: &[P], h: &[P], xgs: &[P], xhs: &[P]) -> Result<(), DleqError> {
        let n = self.responses.len();
        if n != g.len() || n != h.len() {
            return Err(DleqError::LengthMismatch(g.len(), h.len(), n));
        }
        if n != xgs.len() || n != xhs.len() || n != self.v_g.len() || n != self.v_h.len() {
            return Err(DleqError::LengthMismatch(xgs.len(), xhs.len(), n));
        }

        for i in 0..n {
            let mut rg = g[i].clone();
            rg.mul(&self.responses[i]);
            let mut cxg = xgs[i].clone();
            cxg.mul(&self.c);
            rg.add(&cxg);

            let mut rh = h[i].clone();
            rh.mul(&self.responses[i]);
            let mut cxh = xhs[i].clone();
            cxh.mul(&self.c);
            rh.add(&cxh);

            if rg != self.v_g[i] || rh != self.v_h[i] {
                return Err(DleqError::InvalidProof);
            }
        }

        Ok(())
    }
}

/// Derives the Fiat-Shamir challenge for a DLEQ proof from the ordered list
/// of points involved.
fn challenge<S: Scalar, P: Element>(points: &[&P]) -> S {
    let mut bytes = Vec::new();
    for p in points {
        bytes.extend(bincode::serialize(p).expect("serialization of group elements succeeds"));
    }
    hash_to_scalar(DOMAIN, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::bls12381::{Scalar as Sc, G1};
    use rand::prelude::*;

    #[test]
    fn single_proof_round_trip() {
        let rng = &mut thread_rng();
        let g = G1::one();
        let h = G1::rand(rng);
        let x = Sc::rand(rng);

        let mut xg = g.clone();
        xg.mul(&x);
        let mut xh = h.clone();
        xh.mul(&x);

        let proof = DleqProof::new(rng, &g, &h, &x, &xg, &xh);
        proof.verify(&g, &h, &xg, &xh).unwrap();
    }

    #[test]
    fn single_proof_rejects_mismatched_witness() {
        let rng = &mut thread_rng();
        let g = G1::one();
        let h = G1::rand(rng);
        let x = Sc::rand(rng);
        let y = Sc::rand(rng);

        let mut xg = g.clone();
        xg.mul(&x);
        // xh is computed with a *different* witness than the one proven
        let mut xh = h.clone();
        xh.mul(&y);

        let proof = DleqProof::new(rng, &g, &h, &x, &xg, &xh);
        assert_eq!(
            proof.verify(&g, &h, &xg, &xh),
            Err(DleqError::InvalidProof)
        );
    }

    #[test]
    fn single_proof_rejects_tampered_image() {
        let rng = &mut thread_rng();
        let g = G1::one();
        let h = G1::rand(rng);
        let x = Sc::rand(rng);

        let mut xg = g.clone();
        xg.mul(&x);
        let mut xh = h.clone();
        xh.mul(&x);

        let proof = DleqProof::new(rng, &g, &h, &x, &xg, &xh);

        let tampered_xg = G1::rand(rng);
        assert_eq!(
            proof.verify(&g, &h, &tampered_xg, &xh),
            Err(DleqError::InvalidProof)
        );
    }

    #[test]
    fn batch_proof_round_trip() {
        let rng = &mut thread_rng();
        // Each statement gets its own base pair, not one shared (g, h).
        let g: Vec<G1> = (0..5).map(|_| G1::rand(rng)).collect();
        let h: Vec<G1> = (0..5).map(|_| G1::rand(rng)).collect();

        let xs: Vec<Sc> = (0..5).map(|_| Sc::rand(rng)).collect();
        let xgs: Vec<G1> = xs
            .iter()
            .zip(g.iter())
            .map(|(x, g_i)| {
                let mut p = g_i.clone();
                p.mul(x);
                p
            })
            .collect();
        let xhs: Vec<G1> = xs
            .iter()
            .zip(h.iter())
            .map(|(x, h_i)| {
                let mut p = h_i.clone();
                p.mul(x);
                p
            })
            .collect();

        let proof = BatchDleqProof::new(rng, &g, &h, &xs, &xgs, &xhs).unwrap();
        proof.verify(&g, &h, &xgs, &xhs).unwrap();
    }

    #[test]
    fn batch_proof_rejects_length_mismatch() {
        let rng = &mut thread_rng();
        let g = G1::one();
        let h = G1::rand(rng);

        let xs: Vec<Sc> = (0..3).map(|_| Sc::rand(rng)).collect();
        let xgs: Vec<G1> = xs
            .iter()
            .map(|x| {
                let mut p = g.clone();
                p.mul(x);
                p
            })
            .collect();
        let xhs: Vec<G1> = xgs.clone();
        let gs = vec![g.clone(); 3];
        let hs = vec![h.clone(); 3];

        assert_eq!(
            BatchDleqProof::new(rng, &gs, &hs, &xs, &xgs[..2], &xhs),
            Err(DleqError::LengthMismatch(2, 3, 3))
        );
    }

    /// Scenario: `G = [P1, P2]`, `H = [Q1]`, `x = [x1, x2]` -- mismatched base
    /// vector lengths are rejected before any scalar work happens.
    #[test]
    fn batch_proof_rejects_mismatched_base_vectors() {
        let rng = &mut thread_rng();
        let g = vec![G1::rand(rng), G1::rand(rng)];
        let h = vec![G1::rand(rng)];
        let xs = vec![Sc::rand(rng), Sc::rand(rng)];
        let xgs: Vec<G1> = xs
            .iter()
            .zip(g.iter())
            .map(|(x, g_i)| {
                let mut p = g_i.clone();
                p.mul(x);
                p
            })
            .collect();
        let xhs = xgs.clone();

        assert_eq!(
            BatchDleqProof::new(rng, &g, &h, &xs, &xgs, &xhs),
            Err(DleqError::LengthMismatch(2, 1, 2))
        );
    }

    #[test]
    fn batch_proof_rejects_one_tampered_entry() {
        let rng = &mut thread_rng();
        let g: Vec<G1> = (0..4).map(|_| G1::rand(rng)).collect();
        let h: Vec<G1> = (0..4).map(|_| G1::rand(rng)).collect();

        let xs: Vec<Sc> = (0..4).map(|_| Sc::rand(rng)).collect();
        let xgs: Vec<G1> = xs
            .iter()
            .zip(g.iter())
            .map(|(x, g_i)| {
                let mut p = g_i.clone();
                p.mul(x);
                p
            })
            .collect();
        let mut xhs: Vec<G1> = xs
            .iter()
            .zip(h.iter())
            .map(|(x, h_i)| {
                let mut p = h_i.clone();
                p.mul(x);
                p
            })
            .collect();

        let proof = BatchDleqProof::new(rng, &g, &h, &xs, &xgs, &xhs).unwrap();

        xhs[2] = G1::rand(rng);
        assert_eq!(
            proof.verify(&g, &h, &xgs, &xhs),
            Err(DleqError::InvalidProof)
        );
    }
}
