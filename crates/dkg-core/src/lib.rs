//! # DKG Core
//!
//! A distributed key generation protocol over a pairing-friendly curve,
//! coupled with threshold BLS-style signing over the recovered collective
//! public key. Each participant deals shares of two random polynomials to
//! every other participant, blinded under the recipient's long-term public
//! key; a receiver verifies every deal it gets via a pairing equation and
//! accumulates its own protected share. Once enough participants have
//! revealed their partial public value, any `t` of them recover the
//! collective public key by Lagrange interpolation in `GT`, and likewise for
//! aggregating partial BLS signatures.
//!
//! This crate has no notion of a network: callers are responsible for
//! getting a [`primitives::Deals`] bundle, [`primitives::PartialPublic`], or
//! [`primitives::PartialBls`] from one participant to another.

/// Low level primitives and datatypes for implementing DKGs
pub mod primitives;
