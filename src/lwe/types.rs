//! LWE ciphertext, key and plaintext encoding types

use serde::{Deserialize, Serialize};

use crate::math::Modulus;

/// LWE secret key: `n` binary or small signed coefficients.
///
/// Stored as signed integers so one key can be read under any modulus; the
/// ring key reused as an extraction key is an example.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LweSecretKey {
    /// Secret key coefficients
    pub coeffs: Vec<i64>,
}

/// LWE ciphertext `(a, b)` with `b = ⟨a, s⟩ + e + μ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LweCiphertext {
    /// Mask vector in Z_q^n
    pub a: Vec<u64>,
    /// Body in Z_q
    pub b: u64,
    /// Ciphertext modulus
    pub modulus: Modulus,
}

/// How a plaintext bit is placed on Z_q.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// `0 ↦ 0`, `1 ↦ q/2`. Fresh ciphertexts, decryption, gate outputs.
    #[default]
    Bit,
    /// `0 ↦ 0`, `1 ↦ q/4`. Operands of the gate linear combinations.
    Gate,
}

impl Encoding {
    /// Scaling factor Δ for this encoding
    pub fn delta(&self, modulus: &Modulus) -> u64 {
        match self {
            Self::Bit => modulus.fraction(1, 2),
            Self::Gate => modulus.fraction(1, 4),
        }
    }

    /// Δ/2: the value a sign test polynomial carries and the offset that
    /// recenters a bootstrapped ±Δ/2 onto {0, Δ}.
    pub fn half_delta(&self, modulus: &Modulus) -> u64 {
        match self {
            Self::Bit => modulus.fraction(1, 4),
            Self::Gate => modulus.fraction(1, 8),
        }
    }

    /// `bit · Δ`
    pub fn encode(&self, bit: u8, modulus: &Modulus) -> u64 {
        if bit == 0 {
            0
        } else {
            self.delta(modulus)
        }
    }

    /// Decode a phase: `1` iff it lies in `[Δ/2, 3Δ/2)`.
    ///
    /// For [`Encoding::Bit`] this is the window `[q/4, 3q/4)`.
    pub fn decode(&self, phase: u64, modulus: &Modulus) -> u8 {
        let q = modulus.value() as u128;
        let scaled = phase as u128
            * match self {
                Self::Bit => 4,
                Self::Gate => 8,
            };
        u8::from(scaled >= q && scaled < 3 * q)
    }
}
