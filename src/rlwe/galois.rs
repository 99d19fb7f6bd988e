//! Galois automorphisms for RLWE
//!
//! Automorphisms τ_k: R → R are defined by τ_k(X) = X^k for odd k. For
//! R = Z[X]/(X^N + 1) every odd k in [1, 2N) is a unit mod 2N, so the odd
//! exponents are exactly the Galois group.

use crate::error::{ensure, Result};

use super::types::{RlweCiphertext, RlweSecretKey};

impl RlweCiphertext {
    /// Apply τ_k to both components.
    ///
    /// The result encrypts τ_k(M) under τ_k(s) rather than s; see
    /// [`RlweSecretKey::automorphism`].
    pub fn automorphism(&self, k: usize) -> Result<RlweCiphertext> {
        Ok(RlweCiphertext {
            a: self.a.automorphism(k)?,
            b: self.b.automorphism(k)?,
        })
    }
}

impl RlweSecretKey {
    /// The key τ_k(s) that decrypts an automorphism-mapped ciphertext.
    pub fn automorphism(&self, k: usize) -> Result<RlweSecretKey> {
        ensure!(k % 2 == 1, "automorphism exponent {k} must be odd");
        let n = self.ring_dim();
        let two_n = 2 * n;

        let mut coeffs = vec![0i64; n];
        for (j, &s) in self.coeffs.iter().enumerate() {
            let target = (j * (k % two_n)) % two_n;
            if target < n {
                coeffs[target] = s;
            } else {
                coeffs[target - n] = -s;
            }
        }
        Ok(RlweSecretKey { coeffs })
    }
}

/// Exponent `k⁻¹ mod 2N`, so that τ_{k⁻¹} undoes τ_k.
pub fn inverse_automorphism(k: usize, n: usize) -> Result<usize> {
    ensure!(k % 2 == 1, "automorphism exponent {k} must be odd");
    let two_n = 2 * n;
    let k = k % two_n;
    // the group has order N, so k^(N-1) is the inverse
    let mut result = 1usize;
    for _ in 1..n {
        result = (result * k) % two_n;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{NttContext, Poly};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const N: usize = 32;
    const Q: u64 = 134215681;

    fn setup(seed: u64) -> (NttContext, RlweSecretKey, Vec<u8>, RlweCiphertext) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ctx = NttContext::new(N, Q).unwrap();
        let bits: Vec<u8> = (0..N).map(|_| rng.gen_range(0..=1)).collect();
        let sk = RlweSecretKey::from_bits(&bits).unwrap();

        let msg: Vec<u8> = (0..N).map(|_| rng.gen_range(0..=1)).collect();
        let a = Poly::from_coeffs((0..N).map(|_| rng.gen_range(0..Q)).collect(), *ctx.modulus());
        let noise: Vec<i64> = (0..N).map(|_| rng.gen_range(-3..=3)).collect();
        let ct = RlweCiphertext::encrypt(&sk, a, &noise, &msg, &ctx).unwrap();
        (ctx, sk, msg, ct)
    }

    #[test]
    fn test_automorphism_permutes_plaintext() {
        let (ctx, sk, msg, ct) = setup(21);

        for k in [3usize, 5, 2 * N - 1] {
            let mapped = ct.automorphism(k).unwrap();
            let mapped_key = sk.automorphism(k).unwrap();
            let decrypted = mapped.decrypt(&mapped_key, &ctx).unwrap();

            // X^j ↦ ±X^{jk mod N}; a sign flip leaves Q/2 decoding as 1
            for (j, &bit) in msg.iter().enumerate() {
                assert_eq!(decrypted[(j * k) % (2 * N) % N], bit, "k={k} j={j}");
            }
        }
    }

    #[test]
    fn test_inverse_automorphism_roundtrip() {
        let (ctx, sk, msg, ct) = setup(22);
        let k = 5;
        let k_inv = inverse_automorphism(k, N).unwrap();
        assert_eq!((k * k_inv) % (2 * N), 1);

        let back = ct.automorphism(k).unwrap().automorphism(k_inv).unwrap();
        assert_eq!(back, ct);
        assert_eq!(back.decrypt(&sk, &ctx).unwrap(), msg);
    }

    #[test]
    fn test_even_exponent_rejected() {
        let (_, sk, _, ct) = setup(23);
        assert!(ct.automorphism(4).is_err());
        assert!(sk.automorphism(2).is_err());
        assert!(inverse_automorphism(6, N).is_err());
    }
}
