//! Parameter sets for the engine
//!
//! A [`Params`] value is fixed when a [`Bootstrapper`](crate::bootstrap::Bootstrapper)
//! or [`Dispatcher`](crate::dispatch::Dispatcher) is built. The presets are
//! functional test parameters, not a security recommendation.

use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};
use crate::lwe::LweCiphertext;
use crate::math::{Gadget, Modulus, NttContext};

/// NTT-friendly prime below 2^27: `Q ≡ 1 (mod 2048)`, valid for N ≤ 1024.
pub const RING_MODULUS_27: u64 = 134215681;

/// Core cryptographic parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// LWE dimension n
    pub lwe_dim: usize,

    /// LWE modulus q (power of two or odd)
    pub lwe_q: u64,

    /// Ring dimension N (power of two)
    pub ring_dim: usize,

    /// Ring modulus Q
    /// Must be an NTT-friendly prime: Q ≡ 1 (mod 2N)
    pub ring_q: u64,

    /// Gadget decomposition base B for RGSW rows (power of two)
    pub gadget_base: u64,

    /// Number of digits ℓ in the RGSW gadget
    pub gadget_len: usize,

    /// Key-switching base (power of two)
    pub ks_base: u64,

    /// Number of key-switching digits
    pub ks_len: usize,
}

impl Params {
    /// Small parameters for unit and integration tests: n = 16, N = 256.
    pub fn toy() -> Self {
        Self {
            lwe_dim: 16,
            lwe_q: 1 << 16,
            ring_dim: 256,
            ring_q: RING_MODULUS_27,
            gadget_base: 1 << 7,
            gadget_len: 4,
            ks_base: 1 << 4,
            ks_len: 4,
        }
    }

    /// Larger demonstration parameters: n = 64, N = 1024.
    pub fn demo() -> Self {
        Self {
            lwe_dim: 64,
            ring_dim: 1024,
            ..Self::toy()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "toy" => Some(Self::toy()),
            "demo" => Some(Self::demo()),
            _ => None,
        }
    }

    /// Check if parameters are valid
    ///
    /// Builds every derived object once, so a parameter set that passes can
    /// be used by every component without further errors.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.lwe_dim > 0, "lwe_dim must be positive");
        ensure!(
            self.ring_dim >= 2 && self.ring_dim.is_power_of_two(),
            "ring_dim {} must be a power of two >= 2",
            self.ring_dim
        );
        ensure!(
            self.lwe_q >= 8,
            "lwe_q {} is too small to hold the gate encoding",
            self.lwe_q
        );
        self.lwe_modulus()?;
        self.ntt_context()?;
        self.gadget()?;
        self.ks_gadget()?;
        Ok(())
    }

    /// LWE modulus q
    pub fn lwe_modulus(&self) -> Result<Modulus> {
        Modulus::new(self.lwe_q)
    }

    /// Ring modulus Q
    pub fn ring_modulus(&self) -> Result<Modulus> {
        Modulus::new(self.ring_q)
    }

    /// NTT context for R_Q; fails unless Q is a prime ≡ 1 (mod 2N)
    pub fn ntt_context(&self) -> Result<NttContext> {
        NttContext::new(self.ring_dim, self.ring_q)
    }

    /// RGSW gadget over the ring modulus
    pub fn gadget(&self) -> Result<Gadget> {
        Gadget::new(self.gadget_base, self.gadget_len, self.ring_modulus()?)
    }

    /// Key-switching gadget over the LWE modulus
    pub fn ks_gadget(&self) -> Result<Gadget> {
        Gadget::new(self.ks_base, self.ks_len, self.lwe_modulus()?)
    }

    /// Check that `ct` is an n-dimensional ciphertext under q with
    /// canonical components.
    pub fn check_ciphertext(&self, ct: &LweCiphertext) -> Result<()> {
        ensure!(
            ct.dimension() == self.lwe_dim,
            "ciphertext dimension {} does not match n = {}",
            ct.dimension(),
            self.lwe_dim
        );
        ensure!(
            ct.modulus.value() == self.lwe_q,
            "ciphertext modulus {} does not match q = {}",
            ct.modulus.value(),
            self.lwe_q
        );
        ensure!(ct.is_reduced(), "ciphertext components must be reduced mod q");
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::toy()
    }
}
