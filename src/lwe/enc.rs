//! LWE encryption, decryption and linear homomorphic operations

use super::types::{Encoding, LweCiphertext, LweSecretKey};
use crate::error::{ensure, Result};
use crate::math::Modulus;

impl LweSecretKey {
    /// Create a binary secret key, rejecting anything other than 0/1
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        ensure!(
            bits.iter().all(|&b| b <= 1),
            "secret key bits must be 0 or 1"
        );
        Ok(Self {
            coeffs: bits.iter().map(|&b| i64::from(b)).collect(),
        })
    }

    /// Create a secret key from small signed coefficients
    pub fn from_coeffs(coeffs: Vec<i64>) -> Self {
        Self { coeffs }
    }

    /// Key dimension n
    pub fn dim(&self) -> usize {
        self.coeffs.len()
    }

    /// `⟨a, s⟩ mod q`
    pub fn inner_product(&self, a: &[u64], modulus: &Modulus) -> u64 {
        debug_assert_eq!(a.len(), self.coeffs.len());
        a.iter()
            .zip(&self.coeffs)
            .fold(0u64, |acc, (&x, &s)| match s {
                0 => acc,
                1 => modulus.add(acc, x),
                _ => modulus.add(acc, modulus.mul(x, modulus.from_signed(s))),
            })
    }
}

impl LweCiphertext {
    /// Encrypt a bit: `b = ⟨a, s⟩ + noise + bit·q/2`.
    ///
    /// The mask `a` and `noise` are supplied by the caller.
    ///
    /// # Errors
    ///
    /// Configuration error if `bit` is not 0/1, `a` has the wrong length, or
    /// an entry of `a` is not reduced mod q.
    pub fn encrypt(
        sk: &LweSecretKey,
        a: Vec<u64>,
        noise: i64,
        bit: u8,
        modulus: Modulus,
    ) -> Result<Self> {
        Self::encrypt_encoded(sk, a, noise, bit, Encoding::Bit, modulus)
    }

    /// Encrypt a bit under a chosen [`Encoding`].
    pub fn encrypt_encoded(
        sk: &LweSecretKey,
        a: Vec<u64>,
        noise: i64,
        bit: u8,
        encoding: Encoding,
        modulus: Modulus,
    ) -> Result<Self> {
        ensure!(bit <= 1, "plaintext bit must be 0 or 1, got {bit}");
        let message = encoding.encode(bit, &modulus);
        Self::encrypt_phase(sk, a, noise, message, modulus)
    }

    /// Encrypt an arbitrary residue `μ`: `b = ⟨a, s⟩ + noise + μ`.
    pub fn encrypt_phase(
        sk: &LweSecretKey,
        a: Vec<u64>,
        noise: i64,
        message: u64,
        modulus: Modulus,
    ) -> Result<Self> {
        ensure!(
            a.len() == sk.dim(),
            "mask has length {} but the key has dimension {}",
            a.len(),
            sk.dim()
        );
        let q = modulus.value();
        ensure!(
            a.iter().all(|&x| x < q),
            "mask entries must be reduced mod {q}"
        );

        let inner = sk.inner_product(&a, &modulus);
        let b = modulus.add(
            inner,
            modulus.add(modulus.from_signed(noise), modulus.reduce(message)),
        );
        Ok(Self { a, b, modulus })
    }

    /// Noiseless encryption of `μ` under any key: `(0, μ)`.
    pub fn trivial(dim: usize, message: u64, modulus: Modulus) -> Self {
        Self {
            a: vec![0; dim],
            b: modulus.reduce(message),
            modulus,
        }
    }

    /// Create a ciphertext encrypting zero
    pub fn zero(dim: usize, modulus: Modulus) -> Self {
        Self::trivial(dim, 0, modulus)
    }

    pub fn dimension(&self) -> usize {
        self.a.len()
    }

    /// `b − ⟨a, s⟩ mod q`
    pub fn phase(&self, sk: &LweSecretKey) -> Result<u64> {
        ensure!(
            self.dimension() == sk.dim(),
            "ciphertext dimension {} does not match key dimension {}",
            self.dimension(),
            sk.dim()
        );
        Ok(self
            .modulus
            .sub(self.b, sk.inner_product(&self.a, &self.modulus)))
    }

    /// Decrypt a bit-encoded ciphertext: `1` iff the phase is in `[q/4, 3q/4)`.
    pub fn decrypt(&self, sk: &LweSecretKey) -> Result<u8> {
        self.decrypt_encoded(sk, Encoding::Bit)
    }

    /// Decrypt under a chosen [`Encoding`].
    pub fn decrypt_encoded(&self, sk: &LweSecretKey, encoding: Encoding) -> Result<u8> {
        let phase = self.phase(sk)?;
        Ok(encoding.decode(phase, &self.modulus))
    }

    /// Check that `other` can be combined with `self`.
    pub fn check_compatible(&self, other: &LweCiphertext) -> Result<()> {
        ensure!(
            self.modulus == other.modulus,
            "ciphertext moduli differ: {} vs {}",
            self.modulus.value(),
            other.modulus.value()
        );
        ensure!(
            self.dimension() == other.dimension(),
            "ciphertext dimensions differ: {} vs {}",
            self.dimension(),
            other.dimension()
        );
        Ok(())
    }

    /// Homomorphic addition of two ciphertexts
    pub fn add(&self, other: &LweCiphertext) -> Result<Self> {
        self.check_compatible(other)?;
        let m = &self.modulus;
        Ok(Self {
            a: self
                .a
                .iter()
                .zip(&other.a)
                .map(|(&x, &y)| m.add(x, y))
                .collect(),
            b: m.add(self.b, other.b),
            modulus: self.modulus,
        })
    }

    /// Homomorphic subtraction of two ciphertexts
    pub fn sub(&self, other: &LweCiphertext) -> Result<Self> {
        self.check_compatible(other)?;
        let m = &self.modulus;
        Ok(Self {
            a: self
                .a
                .iter()
                .zip(&other.a)
                .map(|(&x, &y)| m.sub(x, y))
                .collect(),
            b: m.sub(self.b, other.b),
            modulus: self.modulus,
        })
    }

    pub fn neg(&self) -> Self {
        let m = &self.modulus;
        Self {
            a: self.a.iter().map(|&x| m.neg(x)).collect(),
            b: m.neg(self.b),
            modulus: self.modulus,
        }
    }

    /// Multiply by a small integer scalar
    pub fn scalar_mul(&self, scalar: i64) -> Self {
        let m = &self.modulus;
        let s = m.from_signed(scalar);
        Self {
            a: self.a.iter().map(|&x| m.mul(x, s)).collect(),
            b: m.mul(self.b, s),
            modulus: self.modulus,
        }
    }

    /// Add a public constant to the body, shifting the phase by `μ`.
    pub fn add_constant(&self, message: u64) -> Self {
        Self {
            a: self.a.clone(),
            b: self.modulus.add(self.b, self.modulus.reduce(message)),
            modulus: self.modulus,
        }
    }

    /// Rescale every component from q to `to`, rounding to nearest.
    pub fn mod_switch(&self, to: Modulus) -> Self {
        let from = &self.modulus;
        Self {
            a: self.a.iter().map(|&x| from.switch(x, &to)).collect(),
            b: from.switch(self.b, &to),
            modulus: to,
        }
    }

    /// Whether every component is a canonical residue.
    pub fn is_reduced(&self) -> bool {
        let q = self.modulus.value();
        self.b < q && self.a.iter().all(|&x| x < q)
    }
}
