//! Test polynomials: the lookup tables blind rotation reads from.
//!
//! After blind rotation by `k ∈ [0, 2N)` the constant coefficient of
//! `X^k · TP` is `TP[0]` for `k = 0` and `−TP[N − k]` for `0 < k < N`, and
//! the negation of the same for `k ≥ N`. Only the half `[0, N)` can be
//! chosen freely; the other half is its negation.

use crate::error::{ensure, Result};
use crate::lwe::Encoding;
use crate::math::{Modulus, Poly};

/// Lookup table polynomial plus the two scalar offsets applied around it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPolynomial {
    poly: Poly,
    /// Added to the key-switched output, in the LWE modulus.
    output_offset: u64,
    /// Added to the rotation amount `b̃` before blind rotation.
    rotation_offset: usize,
}

impl TestPolynomial {
    /// Build the polynomial whose rotation by `k ∈ [0, N)` yields `f(k)` in
    /// its constant coefficient: `TP[0] = f(0)`, `TP[N − k] = −f(k)`.
    pub fn from_fn<F>(ring_dim: usize, modulus: Modulus, f: F) -> Self
    where
        F: Fn(usize) -> u64,
    {
        let mut poly = Poly::zero(ring_dim, modulus);
        for k in 0..ring_dim {
            let value = modulus.reduce(f(k));
            if k == 0 {
                poly.set_coeff(0, value);
            } else {
                poly.set_coeff(ring_dim - k, modulus.neg(value));
            }
        }
        Self {
            poly,
            output_offset: 0,
            rotation_offset: 0,
        }
    }

    /// Sign test polynomial for gate bootstrapping.
    ///
    /// Rotation by `k` gives `+v` for `k ∈ [N/2, 3N/2)` and `−v` elsewhere,
    /// with `v = Δ/2` of `encoding` in the ring modulus. The output offset
    /// `Δ/2` in the LWE modulus maps `±v` onto `{0, Δ}`, so a phase in
    /// `[q/4, 3q/4)` refreshes to an encryption of 1.
    pub fn sign(ring_dim: usize, ring_q: Modulus, lwe_q: &Modulus, encoding: Encoding) -> Self {
        let v = encoding.half_delta(&ring_q);
        let minus_v = ring_q.neg(v);
        let half = ring_dim / 2;
        Self::from_fn(ring_dim, ring_q, |k| if k < half { minus_v } else { v })
            .with_output_offset(encoding.half_delta(lwe_q))
    }

    /// Programmable bootstrapping table over `p = table.len()` messages.
    ///
    /// Inputs encode `m ∈ [0, p)` as `m·q/(2p)`; the output encodes
    /// `table[m]` the same way. The rotation offset `N/(2p)` centers each
    /// message in its window of `N/p` rotations.
    pub fn lookup(ring_dim: usize, ring_q: Modulus, table: &[u64]) -> Result<Self> {
        let p = table.len();
        ensure!(p >= 2, "lookup table needs at least two entries");
        ensure!(
            2 * p <= ring_dim && ring_dim % (2 * p) == 0,
            "lookup table of size {p} does not divide ring dimension {ring_dim} into windows"
        );
        ensure!(
            table.iter().all(|&t| (t as usize) < p),
            "lookup table outputs must lie in [0, {p})"
        );
        let two_p = 2 * p as u64;
        Ok(Self::from_fn(ring_dim, ring_q, |k| {
            let m = k * p / ring_dim;
            ring_q.fraction(table[m], two_p)
        })
        .with_rotation_offset(ring_dim / (2 * p)))
    }

    pub fn with_output_offset(mut self, offset: u64) -> Self {
        self.output_offset = offset;
        self
    }

    pub fn with_rotation_offset(mut self, offset: usize) -> Self {
        self.rotation_offset = offset;
        self
    }

    pub fn poly(&self) -> &Poly {
        &self.poly
    }

    pub fn output_offset(&self) -> u64 {
        self.output_offset
    }

    pub fn rotation_offset(&self) -> usize {
        self.rotation_offset
    }

    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    /// Constant coefficient of `X^k · TP`, for checking a table by hand.
    pub fn rotated_constant(&self, k: usize) -> u64 {
        self.poly.mul_monomial(k).coeff(0)
    }
}
