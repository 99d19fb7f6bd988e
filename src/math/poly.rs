//! Polynomial operations over R_q = Z_q[X]/(X^N + 1).
//!
//! Polynomials live either in the coefficient domain or in the NTT domain
//! (Montgomery form, see [`NttContext`]). Additive operations work in both;
//! rotations and automorphisms need the coefficient domain.
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::{Modulus, Poly};
//!
//! let q = Modulus::new(17).unwrap();
//! let p = Poly::from_coeffs(vec![1, 2, 3, 4], q);
//! // X · (1 + 2X + 3X² + 4X³) = -4 + X + 2X² + 3X³
//! assert_eq!(p.mul_monomial(1).coeffs(), &[13, 1, 2, 3]);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::modulus::Modulus;
use super::ntt::NttContext;
use crate::error::{ensure, Result};

/// Polynomial in R_q = Z_q[X]/(X^N + 1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Poly {
    /// Coefficients in coefficient or NTT domain.
    coeffs: Vec<u64>,
    modulus: Modulus,
    /// Whether coefficients are in NTT domain.
    is_ntt: bool,
}

impl Poly {
    /// Create zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, modulus: Modulus) -> Self {
        Self {
            coeffs: vec![0; dim],
            modulus,
            is_ntt: false,
        }
    }

    /// Zero polynomial tagged as NTT domain, for accumulators.
    pub fn zero_ntt(dim: usize, modulus: Modulus) -> Self {
        Self {
            coeffs: vec![0; dim],
            modulus,
            is_ntt: true,
        }
    }

    /// Create polynomial from coefficients, reducing each one.
    pub fn from_coeffs(mut coeffs: Vec<u64>, modulus: Modulus) -> Self {
        for c in coeffs.iter_mut() {
            *c = modulus.reduce(*c);
        }
        Self {
            coeffs,
            modulus,
            is_ntt: false,
        }
    }

    /// Create polynomial from small signed coefficients.
    pub fn from_signed(coeffs: &[i64], modulus: Modulus) -> Self {
        Self {
            coeffs: coeffs.iter().map(|&c| modulus.from_signed(c)).collect(),
            modulus,
            is_ntt: false,
        }
    }

    /// Create constant polynomial
    pub fn constant(value: u64, dim: usize, modulus: Modulus) -> Self {
        let mut poly = Self::zero(dim, modulus);
        if dim > 0 {
            poly.coeffs[0] = modulus.reduce(value);
        }
        poly
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    pub fn set_coeff(&mut self, i: usize, value: u64) {
        self.coeffs[i] = self.modulus.reduce(value);
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    pub(crate) fn coeffs_mut(&mut self) -> &mut [u64] {
        &mut self.coeffs
    }

    /// Whether every coefficient is a canonical residue.
    pub fn is_reduced(&self) -> bool {
        let q = self.modulus.value();
        self.coeffs.iter().all(|&c| c < q)
    }

    /// Convert to NTT domain in place
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        if self.is_ntt {
            return;
        }
        debug_assert_eq!(ctx.modulus(), &self.modulus, "NTT modulus mismatch");
        ctx.forward(&mut self.coeffs);
        self.is_ntt = true;
    }

    /// Convert from NTT domain in place
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        if !self.is_ntt {
            return;
        }
        debug_assert_eq!(ctx.modulus(), &self.modulus, "NTT modulus mismatch");
        ctx.inverse(&mut self.coeffs);
        self.is_ntt = false;
    }

    /// Multiply by a scalar
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let m = &self.modulus;
        let scalar = m.reduce(scalar);
        Self {
            coeffs: self.coeffs.iter().map(|&c| m.mul(c, scalar)).collect(),
            modulus: self.modulus,
            is_ntt: self.is_ntt,
        }
    }

    /// Multiply two coefficient-domain polynomials through the NTT.
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert!(
            !self.is_ntt && !other.is_ntt,
            "mul_ntt expects coefficient-domain inputs"
        );
        assert_eq!(self.dimension(), other.dimension(), "Dimension mismatch");

        let mut a = self.clone();
        let mut b = other.clone();
        a.to_ntt(ctx);
        b.to_ntt(ctx);

        let mut result = Self::zero_ntt(self.dimension(), self.modulus);
        ctx.pointwise_mul(&a.coeffs, &b.coeffs, &mut result.coeffs);
        result.from_ntt(ctx);
        result
    }

    /// `self += a ⊙ b`, all three in the NTT domain.
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ctx: &NttContext) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "All polynomials must be in NTT domain"
        );
        ctx.pointwise_mul_acc(&mut self.coeffs, &a.coeffs, &b.coeffs);
    }

    /// Multiply by `X^k`. `k` is taken mod 2N and `X^N = -1`, so
    /// coefficients that wrap past degree N-1 change sign, and `k ≥ N`
    /// negates everything once more.
    pub fn mul_monomial(&self, k: usize) -> Self {
        assert!(!self.is_ntt, "mul_monomial expects coefficient domain");
        let n = self.dimension();
        let m = &self.modulus;
        let k = k % (2 * n);
        let (shift, flip) = if k >= n { (k - n, true) } else { (k, false) };

        let mut coeffs = vec![0u64; n];
        for (i, &c) in self.coeffs.iter().enumerate() {
            let j = i + shift;
            if j < n {
                coeffs[j] = if flip { m.neg(c) } else { c };
            } else {
                coeffs[j - n] = if flip { c } else { m.neg(c) };
            }
        }

        Self {
            coeffs,
            modulus: self.modulus,
            is_ntt: false,
        }
    }

    /// Apply the ring automorphism `X ↦ X^k` for odd `k`.
    ///
    /// Coefficient `j` moves to `j·k mod 2N`, negated when that index lands
    /// in `[N, 2N)`.
    pub fn automorphism(&self, k: usize) -> Result<Self> {
        ensure!(k % 2 == 1, "automorphism exponent {k} must be odd");
        ensure!(!self.is_ntt, "automorphism expects coefficient domain");
        let n = self.dimension();
        let two_n = 2 * n;
        let m = &self.modulus;

        let mut coeffs = vec![0u64; n];
        for (j, &c) in self.coeffs.iter().enumerate() {
            let target = (j * (k % two_n)) % two_n;
            if target < n {
                coeffs[target] = c;
            } else {
                coeffs[target - n] = m.neg(c);
            }
        }

        Ok(Self {
            coeffs,
            modulus: self.modulus,
            is_ntt: false,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Largest centered coefficient magnitude.
    pub fn linf_norm(&self) -> u64 {
        self.coeffs
            .iter()
            .map(|&c| self.modulus.to_signed(c).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    fn assert_compatible(&self, other: &Self) {
        assert_eq!(self.dimension(), other.dimension(), "Dimension mismatch");
        assert_eq!(self.modulus, other.modulus, "Modulus mismatch");
        assert_eq!(self.is_ntt, other.is_ntt, "NTT domain mismatch");
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs == other.coeffs && self.modulus == other.modulus && self.is_ntt == other.is_ntt
    }
}

impl Eq for Poly {}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        self.assert_compatible(rhs);
        let m = &self.modulus;
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(&a, &b)| m.add(a, b))
                .collect(),
            modulus: self.modulus,
            is_ntt: self.is_ntt,
        }
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Self) {
        self.assert_compatible(rhs);
        let m = self.modulus;
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *a = m.add(*a, b);
        }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        self.assert_compatible(rhs);
        let m = &self.modulus;
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(&a, &b)| m.sub(a, b))
                .collect(),
            modulus: self.modulus,
            is_ntt: self.is_ntt,
        }
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Self) {
        self.assert_compatible(rhs);
        let m = self.modulus;
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *a = m.sub(*a, b);
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        let m = &self.modulus;
        Poly {
            coeffs: self.coeffs.iter().map(|&c| m.neg(c)).collect(),
            modulus: self.modulus,
            is_ntt: self.is_ntt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ntt::negacyclic_schoolbook;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const RING_Q: u64 = 134215681;

    fn ring_q() -> Modulus {
        Modulus::new(RING_Q).unwrap()
    }

    fn random_poly(rng: &mut ChaCha20Rng, n: usize) -> Poly {
        Poly::from_coeffs((0..n).map(|_| rng.gen_range(0..RING_Q)).collect(), ring_q())
    }

    #[test]
    fn test_addition_and_subtraction() {
        let q = Modulus::new(17).unwrap();
        let a = Poly::from_coeffs(vec![1, 2, 3, 16], q);
        let b = Poly::from_coeffs(vec![5, 6, 7, 8], q);

        assert_eq!((&a + &b).coeffs(), &[6, 8, 10, 7]);
        assert_eq!((&a - &b).coeffs(), &[13, 13, 13, 8]);

        let mut c = a.clone();
        c += &b;
        c -= &b;
        assert_eq!(c, a);
    }

    #[test]
    fn test_negation() {
        let q = Modulus::new(16).unwrap();
        let a = Poly::from_signed(&[1, -2, 0, 7], q);
        let neg_a = -&a;
        assert_eq!(neg_a.coeffs(), &[15, 2, 0, 9]);
        assert!((&a + &neg_a).is_zero());
    }

    #[test]
    fn test_mul_ntt_matches_schoolbook() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let ctx = NttContext::new(64, RING_Q).unwrap();
        let a = random_poly(&mut rng, 64);
        let b = random_poly(&mut rng, 64);

        let product = a.mul_ntt(&b, &ctx);
        assert!(!product.is_ntt());
        assert_eq!(
            product.coeffs(),
            negacyclic_schoolbook(a.coeffs(), b.coeffs(), &ring_q()).as_slice()
        );
    }

    #[test]
    fn test_ntt_roundtrip_preserves_poly() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let ctx = NttContext::new(128, RING_Q).unwrap();
        let original = random_poly(&mut rng, 128);
        let mut p = original.clone();
        p.to_ntt(&ctx);
        assert!(p.is_ntt());
        p.from_ntt(&ctx);
        assert_eq!(p, original);
    }

    #[test]
    fn test_mul_monomial_matches_multiplication() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let n = 32;
        let ctx = NttContext::new(n, RING_Q).unwrap();
        let a = random_poly(&mut rng, n);

        for k in [0, 1, 5, n - 1, n, n + 3, 2 * n - 1, 2 * n, 3 * n + 2] {
            let mut monomial = Poly::zero(n, ring_q());
            let reduced = k % (2 * n);
            if reduced < n {
                monomial.set_coeff(reduced, 1);
            } else {
                monomial.set_coeff(reduced - n, RING_Q - 1);
            }
            assert_eq!(a.mul_monomial(k), a.mul_ntt(&monomial, &ctx), "k = {k}");
        }
    }

    #[test]
    fn test_mul_monomial_full_turn_is_identity() {
        let q = Modulus::new(17).unwrap();
        let a = Poly::from_coeffs(vec![1, 2, 3, 4], q);
        assert_eq!(a.mul_monomial(4), -&a);
        assert_eq!(a.mul_monomial(8), a);
    }

    #[test]
    fn test_automorphism() {
        let q = Modulus::new(17).unwrap();
        // X ↦ X^3 on 1 + X + X^2 + X^3 over X^4 + 1:
        // X^3 ↦ X^9 = X, X^2 ↦ X^6 = -X^2, X ↦ X^3
        let a = Poly::from_coeffs(vec![1, 1, 1, 1], q);
        let b = a.automorphism(3).unwrap();
        assert_eq!(b.coeffs(), &[1, 1, 16, 1]);

        assert!(a.automorphism(2).is_err());
        // X ↦ X^(2N+1) is the identity
        assert_eq!(a.automorphism(9).unwrap(), a);
    }

    #[test]
    fn test_linf_norm() {
        let q = Modulus::new(16).unwrap();
        let a = Poly::from_signed(&[3, -5, 1, 0], q);
        assert_eq!(a.linf_norm(), 5);
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn test_add_dimension_mismatch_panics() {
        let q = Modulus::new(17).unwrap();
        let _ = &Poly::zero(4, q) + &Poly::zero(8, q);
    }
}
