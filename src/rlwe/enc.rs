//! RLWE encryption and decryption
//!
//! Implements encryption: b = a·s + e + M
//! where M carries one bit per coefficient as `bit·Q/2`.

use crate::error::{ensure, Result};
use crate::lwe::{Encoding, LweCiphertext};
use crate::math::{Modulus, NttContext, Poly};

use super::types::{RlweCiphertext, RlweSecretKey};

impl RlweCiphertext {
    /// Encrypt one bit per coefficient: `M_i = bits_i · Q/2`.
    ///
    /// # Arguments
    /// * `sk` - Secret key
    /// * `a` - Caller-sampled mask polynomial in R_Q
    /// * `noise` - Per-coefficient noise terms
    /// * `bits` - Message bits, one per coefficient
    /// * `ctx` - NTT context for R_Q
    pub fn encrypt(
        sk: &RlweSecretKey,
        a: Poly,
        noise: &[i64],
        bits: &[u8],
        ctx: &NttContext,
    ) -> Result<Self> {
        ensure!(
            bits.iter().all(|&b| b <= 1),
            "plaintext bits must be 0 or 1"
        );
        ensure!(
            bits.len() == ctx.dimension(),
            "expected {} message bits, got {}",
            ctx.dimension(),
            bits.len()
        );
        let modulus = *ctx.modulus();
        let message = Poly::from_coeffs(
            bits.iter()
                .map(|&bit| Encoding::Bit.encode(bit, &modulus))
                .collect(),
            modulus,
        );
        Self::encrypt_plaintext(sk, a, noise, &message, ctx)
    }

    /// Encrypt an already scaled plaintext polynomial `M`.
    ///
    /// Computes: (a, b) where b = a·s + e + M
    pub fn encrypt_plaintext(
        sk: &RlweSecretKey,
        a: Poly,
        noise: &[i64],
        message: &Poly,
        ctx: &NttContext,
    ) -> Result<Self> {
        check_ring(sk, ctx)?;
        ensure!(
            a.dimension() == ctx.dimension() && a.modulus() == ctx.modulus() && !a.is_ntt(),
            "mask polynomial does not live in the context ring"
        );
        ensure!(a.is_reduced(), "mask coefficients must be reduced");
        ensure!(
            noise.len() == ctx.dimension(),
            "expected {} noise terms, got {}",
            ctx.dimension(),
            noise.len()
        );
        ensure!(
            message.dimension() == ctx.dimension()
                && message.modulus() == ctx.modulus()
                && !message.is_ntt(),
            "plaintext polynomial does not live in the context ring"
        );

        let modulus = *ctx.modulus();
        let a_s = a.mul_ntt(&sk.poly(modulus), ctx);
        let error = Poly::from_signed(noise, modulus);

        // b = a·s + e + M
        let b = &(&a_s + &error) + message;

        Ok(Self { a, b })
    }

    /// Trivial encryption `(0, M)`: decrypts correctly under any key.
    pub fn trivial(message: Poly) -> Self {
        let a = Poly::zero(message.dimension(), *message.modulus());
        Self { a, b: message }
    }

    /// Create an encryption of zero with zero error
    pub fn zero(dim: usize, modulus: Modulus) -> Self {
        Self::trivial(Poly::zero(dim, modulus))
    }

    /// `b − a·s = M + e`
    pub fn phase(&self, sk: &RlweSecretKey, ctx: &NttContext) -> Result<Poly> {
        check_ring(sk, ctx)?;
        ensure!(
            self.ring_dim() == ctx.dimension() && self.modulus() == ctx.modulus(),
            "ciphertext does not live in the context ring"
        );
        let a_s = self.a.mul_ntt(&sk.poly(*ctx.modulus()), ctx);
        Ok(&self.b - &a_s)
    }

    /// Decrypt one bit per coefficient using the window `[Q/4, 3Q/4)`.
    pub fn decrypt(&self, sk: &RlweSecretKey, ctx: &NttContext) -> Result<Vec<u8>> {
        let phase = self.phase(sk, ctx)?;
        let modulus = phase.modulus();
        Ok(phase
            .coeffs()
            .iter()
            .map(|&c| Encoding::Bit.decode(c, modulus))
            .collect())
    }

    fn check_compatible(&self, other: &RlweCiphertext) -> Result<()> {
        ensure!(
            self.ring_dim() == other.ring_dim(),
            "ring dimensions differ: {} vs {}",
            self.ring_dim(),
            other.ring_dim()
        );
        ensure!(
            self.modulus() == other.modulus(),
            "ring moduli differ: {} vs {}",
            self.modulus().value(),
            other.modulus().value()
        );
        Ok(())
    }

    /// Homomorphic addition of two ciphertexts
    ///
    /// (a1, b1) + (a2, b2) = (a1 + a2, b1 + b2)
    pub fn add(&self, other: &RlweCiphertext) -> Result<RlweCiphertext> {
        self.check_compatible(other)?;
        Ok(RlweCiphertext {
            a: &self.a + &other.a,
            b: &self.b + &other.b,
        })
    }

    /// Homomorphic subtraction of two ciphertexts
    ///
    /// (a1, b1) - (a2, b2) = (a1 - a2, b1 - b2)
    pub fn sub(&self, other: &RlweCiphertext) -> Result<RlweCiphertext> {
        self.check_compatible(other)?;
        Ok(RlweCiphertext {
            a: &self.a - &other.a,
            b: &self.b - &other.b,
        })
    }

    /// Multiply both components by `X^k`, rotating the plaintext.
    ///
    /// `k` is taken mod 2N; `k ≥ N` negates once more since `X^N = -1`.
    pub fn mul_by_monomial(&self, k: usize) -> RlweCiphertext {
        RlweCiphertext {
            a: self.a.mul_monomial(k),
            b: self.b.mul_monomial(k),
        }
    }

    /// Extract an LWE ciphertext encrypting coefficient `k` of the plaintext.
    ///
    /// For `i ≤ k` the mask entry `a_i` lands at `k − i`; for `i > k` it
    /// wraps to `k − i + N` with a sign flip. The body is `b_k`. The result
    /// decrypts under [`RlweSecretKey::as_lwe_key`].
    pub fn sample_extract(&self, k: usize) -> Result<LweCiphertext> {
        let n = self.ring_dim();
        ensure!(k < n, "extraction index {k} out of range for N = {n}");

        let modulus = *self.modulus();
        let mut a = vec![0u64; n];
        for (i, &a_i) in self.a.coeffs().iter().enumerate() {
            if i <= k {
                a[k - i] = a_i;
            } else {
                a[k + n - i] = modulus.neg(a_i);
            }
        }

        Ok(LweCiphertext {
            a,
            b: self.b.coeff(k),
            modulus,
        })
    }
}

fn check_ring(sk: &RlweSecretKey, ctx: &NttContext) -> Result<()> {
    ensure!(
        sk.ring_dim() == ctx.dimension(),
        "secret key dimension {} does not match ring dimension {}",
        sk.ring_dim(),
        ctx.dimension()
    );
    Ok(())
}
