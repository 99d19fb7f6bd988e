//! Number-Theoretic Transform (NTT) for negacyclic polynomial multiplication.
//!
//! Implements Cooley-Tukey (forward) and Gentleman-Sande (inverse) radix-2
//! transforms over R_q = Z_q[X]/(X^N + 1). Multiplication by `ψ^i`, with `ψ`
//! a primitive 2N-th root of unity (`ψ^N = -1`), is merged into the
//! butterflies so no separate pre/post twisting pass is needed.
//!
//! # Requirements
//!
//! `q` must be a prime with `q ≡ 1 (mod 2N)` and `N` a power of two.
//!
//! # Layout
//!
//! The forward transform takes coefficients in natural order and leaves the
//! evaluations in bit-reversed order, in Montgomery form; the inverse
//! undoes both. Pointwise products are order-agnostic, so the bit-reversal
//! permutation is never materialized.
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::NttContext;
//!
//! let ctx = NttContext::new(4, 17).unwrap();
//! let mut coeffs = vec![1, 2, 3, 4];
//! ctx.forward(&mut coeffs);
//! ctx.inverse(&mut coeffs);
//! assert_eq!(coeffs, vec![1, 2, 3, 4]);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::modulus::{is_prime, Modulus, Reduction};
use crate::error::{config_err, ensure, Result};

/// How butterfly stages are scheduled.
///
/// Both strategies perform the same butterflies on the same inputs and give
/// bit-identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NttStrategy {
    /// One butterfly at a time.
    #[default]
    Sequential,
    /// Each stage's independent butterflies are split across rayon workers.
    Parallel,
}

/// Precomputed NTT context with twiddle factors.
///
/// Create once per (N, q, ψ) and reuse; twiddles are never recomputed.
#[derive(Clone, Debug)]
pub struct NttContext {
    /// Ring dimension (power of two).
    n: usize,
    modulus: Modulus,
    /// The primitive 2N-th root of unity.
    psi: u64,
    /// `ψ^bitrev(k)` in Montgomery form.
    psi_powers: Vec<u64>,
    /// `ψ^-bitrev(k)` in Montgomery form.
    psi_inv_powers: Vec<u64>,
    /// `N^-1 mod q` in standard form; the final Montgomery multiply by it
    /// both scales and leaves Montgomery form.
    n_inv: u64,
    strategy: NttStrategy,
}

impl NttContext {
    /// Creates an NTT context, searching for a primitive 2N-th root of unity.
    ///
    /// # Errors
    ///
    /// Configuration error if `n` is not a power of two, `q` is not prime,
    /// or `q ≢ 1 (mod 2n)`.
    pub fn new(n: usize, q: u64) -> Result<Self> {
        let modulus = Self::check(n, q)?;
        let psi = Self::find_primitive_root(n, &modulus)
            .ok_or_else(|| config_err!("no primitive {}-th root of unity mod {q}", 2 * n))?;
        Ok(Self::build(n, modulus, psi))
    }

    /// Creates an NTT context from a caller-chosen root `ψ`.
    ///
    /// `ψ` must satisfy `ψ^N ≡ -1 (mod q)`, which makes it a primitive 2N-th
    /// root of unity.
    pub fn with_root(n: usize, q: u64, psi: u64) -> Result<Self> {
        let modulus = Self::check(n, q)?;
        ensure!(psi < q, "root {psi} is not reduced mod {q}");
        ensure!(
            modulus.pow(psi, n as u64) == q - 1,
            "{psi} is not a primitive {}-th root of unity mod {q}",
            2 * n
        );
        Ok(Self::build(n, modulus, psi))
    }

    /// Select the butterfly scheduling strategy.
    pub fn with_strategy(mut self, strategy: NttStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    /// The primitive 2N-th root of unity in use.
    pub fn root(&self) -> u64 {
        self.psi
    }

    pub fn strategy(&self) -> NttStrategy {
        self.strategy
    }

    fn check(n: usize, q: u64) -> Result<Modulus> {
        ensure!(
            n >= 2 && n.is_power_of_two(),
            "ring dimension {n} must be a power of two >= 2"
        );
        ensure!(is_prime(q), "NTT modulus {q} is not prime");
        let modulus = Modulus::new(q)?;
        ensure!(
            modulus.reduction() == Reduction::Montgomery,
            "NTT modulus {q} must be odd"
        );
        ensure!(
            q % (2 * n as u64) == 1,
            "NTT modulus {q} is not 1 mod {}",
            2 * n
        );
        Ok(modulus)
    }

    fn build(n: usize, modulus: Modulus, psi: u64) -> Self {
        let log_n = n.trailing_zeros();
        // ψ is a unit mod a prime, as is N < q
        let psi_inv = modulus.pow(psi, modulus.value() - 2);
        let n_inv = modulus.pow(n as u64, modulus.value() - 2);

        let twiddles = |root: u64| -> Vec<u64> {
            (0..n)
                .map(|k| {
                    let exp = bit_reverse(k, log_n) as u64;
                    modulus.to_montgomery(modulus.pow(root, exp))
                })
                .collect()
        };

        Self {
            n,
            modulus,
            psi,
            psi_powers: twiddles(psi),
            psi_inv_powers: twiddles(psi_inv),
            n_inv,
            strategy: NttStrategy::default(),
        }
    }

    /// Forward NTT in place. Input in standard form, output in Montgomery
    /// form (bit-reversed evaluation order).
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != N`.
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");
        let m = &self.modulus;
        match self.strategy {
            NttStrategy::Sequential => {
                for c in coeffs.iter_mut() {
                    *c = m.to_montgomery(*c);
                }
            }
            NttStrategy::Parallel => {
                coeffs.par_iter_mut().for_each(|c| *c = m.to_montgomery(*c));
            }
        }
        self.forward_inplace(coeffs);
    }

    /// Forward NTT on coefficients already in Montgomery form.
    pub fn forward_inplace(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");
        let n = self.n;
        let mut t = n;
        let mut m = 1;
        while m < n {
            t >>= 1;
            match self.strategy {
                NttStrategy::Sequential => {
                    for i in 0..m {
                        let w = self.psi_powers[m + i];
                        let block = &mut coeffs[2 * i * t..2 * (i + 1) * t];
                        let (lo, hi) = block.split_at_mut(t);
                        for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                            self.ct_butterfly(x, y, w);
                        }
                    }
                }
                NttStrategy::Parallel => {
                    let twiddles = &self.psi_powers[m..2 * m];
                    if m >= t {
                        coeffs
                            .par_chunks_mut(2 * t)
                            .zip(twiddles.par_iter())
                            .for_each(|(block, &w)| {
                                let (lo, hi) = block.split_at_mut(t);
                                for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                                    self.ct_butterfly(x, y, w);
                                }
                            });
                    } else {
                        for (block, &w) in coeffs.chunks_mut(2 * t).zip(twiddles) {
                            let (lo, hi) = block.split_at_mut(t);
                            lo.par_iter_mut()
                                .zip(hi.par_iter_mut())
                                .for_each(|(x, y)| self.ct_butterfly(x, y, w));
                        }
                    }
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place. Input in Montgomery form, output in standard
    /// form, scaled by `N^-1`.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");
        let n = self.n;
        let mut t = 1;
        let mut m = n;
        while m > 1 {
            m >>= 1;
            match self.strategy {
                NttStrategy::Sequential => {
                    for i in 0..m {
                        let w = self.psi_inv_powers[m + i];
                        let block = &mut coeffs[2 * i * t..2 * (i + 1) * t];
                        let (lo, hi) = block.split_at_mut(t);
                        for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                            self.gs_butterfly(x, y, w);
                        }
                    }
                }
                NttStrategy::Parallel => {
                    let twiddles = &self.psi_inv_powers[m..2 * m];
                    if m >= t {
                        coeffs
                            .par_chunks_mut(2 * t)
                            .zip(twiddles.par_iter())
                            .for_each(|(block, &w)| {
                                let (lo, hi) = block.split_at_mut(t);
                                for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                                    self.gs_butterfly(x, y, w);
                                }
                            });
                    } else {
                        for (block, &w) in coeffs.chunks_mut(2 * t).zip(twiddles) {
                            let (lo, hi) = block.split_at_mut(t);
                            lo.par_iter_mut()
                                .zip(hi.par_iter_mut())
                                .for_each(|(x, y)| self.gs_butterfly(x, y, w));
                        }
                    }
                }
            }
            t <<= 1;
        }

        let modulus = &self.modulus;
        let n_inv = self.n_inv;
        match self.strategy {
            NttStrategy::Sequential => {
                for c in coeffs.iter_mut() {
                    *c = modulus.montgomery_mul(*c, n_inv);
                }
            }
            NttStrategy::Parallel => {
                coeffs
                    .par_iter_mut()
                    .for_each(|c| *c = modulus.montgomery_mul(*c, n_inv));
            }
        }
    }

    /// `(x, y) -> (x + w·y, x - w·y)`
    #[inline]
    fn ct_butterfly(&self, x: &mut u64, y: &mut u64, w: u64) {
        let m = &self.modulus;
        let u = *x;
        let v = m.montgomery_mul(*y, w);
        *x = m.add(u, v);
        *y = m.sub(u, v);
    }

    /// `(x, y) -> (x + y, w·(x - y))`
    #[inline]
    fn gs_butterfly(&self, x: &mut u64, y: &mut u64, w: u64) {
        let m = &self.modulus;
        let u = *x;
        let v = *y;
        *x = m.add(u, v);
        *y = m.montgomery_mul(m.sub(u, v), w);
    }

    /// Pointwise product of two forward-transformed vectors.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");
        assert_eq!(result.len(), self.n, "Input length must match dimension");
        let m = &self.modulus;
        for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
            *r = m.montgomery_mul(x, y);
        }
    }

    /// `acc += a ⊙ b` in the NTT domain.
    pub fn pointwise_mul_acc(&self, acc: &mut [u64], a: &[u64], b: &[u64]) {
        assert_eq!(acc.len(), self.n, "Input length must match dimension");
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");
        let m = &self.modulus;
        for ((r, &x), &y) in acc.iter_mut().zip(a).zip(b) {
            *r = m.add(*r, m.montgomery_mul(x, y));
        }
    }

    /// `INTT(NTT(a) ⊙ NTT(b))`: the product of `a` and `b` mod `X^N + 1`.
    ///
    /// Inputs and output are coefficient vectors in standard form.
    pub fn poly_multiply(&self, a: &[u64], b: &[u64]) -> Result<Vec<u64>> {
        ensure!(
            a.len() == self.n && b.len() == self.n,
            "operands of length {} and {} do not match ring dimension {}",
            a.len(),
            b.len(),
            self.n
        );
        let q = self.modulus.value();
        ensure!(
            a.iter().chain(b).all(|&c| c < q),
            "operand coefficients must be reduced mod {q}"
        );

        let mut a_ntt = a.to_vec();
        let mut b_ntt = b.to_vec();
        self.forward(&mut a_ntt);
        self.forward(&mut b_ntt);

        let mut product = vec![0u64; self.n];
        self.pointwise_mul(&a_ntt, &b_ntt, &mut product);
        self.inverse(&mut product);
        Ok(product)
    }

    /// Find a primitive 2n-th root of unity modulo a prime q
    fn find_primitive_root(n: usize, modulus: &Modulus) -> Option<u64> {
        let q = modulus.value();
        let exp = (q - 1) / (2 * n as u64);
        // ψ = g^((q-1)/2n) has order 2n exactly when ψ^n = -1
        (2..q)
            .map(|g| modulus.pow(g, exp))
            .find(|&candidate| modulus.pow(candidate, n as u64) == q - 1)
    }
}

/// Reverse the low `bits` bits of `k`.
pub fn bit_reverse(k: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    k.reverse_bits() >> (usize::BITS - bits)
}

/// Direct O(N²) product mod `(X^N + 1, q)`. Reference for the NTT path.
pub fn negacyclic_schoolbook(a: &[u64], b: &[u64], modulus: &Modulus) -> Vec<u64> {
    assert_eq!(a.len(), b.len(), "operands must have equal length");
    let n = a.len();
    let mut result = vec![0u64; n];
    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            let prod = modulus.mul(x, y);
            let k = i + j;
            if k < n {
                result[k] = modulus.add(result[k], prod);
            } else {
                // X^N = -1
                result[k - n] = modulus.sub(result[k - n], prod);
            }
        }
    }
    result
}
