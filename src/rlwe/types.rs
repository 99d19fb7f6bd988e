//! RLWE ciphertext and key types.
//!
//! Ring-LWE over R_Q = Z_Q[X]/(X^N + 1).

use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};
use crate::lwe::LweSecretKey;
use crate::math::{Modulus, Poly};

/// RLWE secret key: a polynomial with binary or small signed coefficients.
///
/// Coefficients are kept as signed integers so the same key can be lifted
/// into any ring modulus, and read as an LWE key after sample extraction.
///
/// # Example
///
/// ```
/// use tfhe_engine::rlwe::RlweSecretKey;
///
/// let sk = RlweSecretKey::from_bits(&[1, 0, 0, 1]).unwrap();
/// assert_eq!(sk.ring_dim(), 4);
/// assert_eq!(sk.as_lwe_key().coeffs, vec![1, 0, 0, 1]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweSecretKey {
    /// Secret coefficients, `s_0 .. s_{N-1}`.
    pub coeffs: Vec<i64>,
}

/// RLWE ciphertext: (a, b) ∈ R_Q × R_Q where b = a·s + e + M.
///
/// Both components are kept in the coefficient domain.
///
/// # Decryption
///
/// The phase `b − a·s = M + e`; each coefficient is decoded with the bit
/// window `[Q/4, 3Q/4)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    /// Mask polynomial.
    pub a: Poly,
    /// Body polynomial: b = a·s + e + M.
    pub b: Poly,
}

impl RlweSecretKey {
    /// Creates a binary key, rejecting anything other than 0/1.
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        ensure!(
            bits.iter().all(|&b| b <= 1),
            "secret key bits must be 0 or 1"
        );
        Ok(Self {
            coeffs: bits.iter().map(|&b| i64::from(b)).collect(),
        })
    }

    /// Creates a key from small signed coefficients.
    pub fn from_coeffs(coeffs: Vec<i64>) -> Self {
        Self { coeffs }
    }

    /// Returns the ring dimension N.
    pub fn ring_dim(&self) -> usize {
        self.coeffs.len()
    }

    /// The key as a polynomial in R_Q.
    pub fn poly(&self, modulus: Modulus) -> Poly {
        Poly::from_signed(&self.coeffs, modulus)
    }

    /// The key read as an N-dimensional LWE key in natural coefficient
    /// order, which is the key of every extracted sample.
    pub fn as_lwe_key(&self) -> LweSecretKey {
        LweSecretKey::from_coeffs(self.coeffs.clone())
    }
}

impl RlweCiphertext {
    /// Creates a ciphertext from component polynomials.
    ///
    /// # Errors
    ///
    /// Configuration error if the components differ in dimension or
    /// modulus, or either is in the NTT domain.
    pub fn from_parts(a: Poly, b: Poly) -> Result<Self> {
        ensure!(
            a.dimension() == b.dimension(),
            "ciphertext polynomials must have the same dimension"
        );
        ensure!(
            a.modulus() == b.modulus(),
            "ciphertext polynomials must have the same modulus"
        );
        ensure!(
            !a.is_ntt() && !b.is_ntt(),
            "ciphertext polynomials must be in the coefficient domain"
        );
        Ok(Self { a, b })
    }

    /// Returns the ring dimension N.
    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    /// Returns the ring modulus Q.
    pub fn modulus(&self) -> &Modulus {
        self.a.modulus()
    }
}
