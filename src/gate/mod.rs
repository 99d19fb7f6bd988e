//! Homomorphic Boolean gates
//!
//! Gates are linear combinations of LWE ciphertexts followed, where needed,
//! by a bootstrap that maps the combined phase back onto a clean bit.
//! [`linear`] holds the combinations on gate-encoded operands (`1 ↦ q/4`);
//! [`GateEvaluator`] works on bit-encoded ciphertexts (`1 ↦ q/2`) and
//! handles the encoding changes.

pub mod linear;
mod eval;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FheError, Result};

pub use eval::GateEvaluator;

/// Boolean gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    Not,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    /// `sel ? c1 : c0`, operands ordered `[sel, c0, c1]`
    Mux,
}

impl Gate {
    pub const ALL: [Gate; 8] = [
        Gate::Not,
        Gate::And,
        Gate::Or,
        Gate::Xor,
        Gate::Nand,
        Gate::Nor,
        Gate::Xnor,
        Gate::Mux,
    ];

    /// Number of operands
    pub fn arity(&self) -> usize {
        match self {
            Gate::Not => 1,
            Gate::Mux => 3,
            _ => 2,
        }
    }

    /// Whether evaluating the gate on bit-encoded operands needs a bootstrap
    pub fn needs_bootstrap(&self) -> bool {
        !matches!(self, Gate::Not | Gate::Xor | Gate::Xnor)
    }

    /// Plaintext reference evaluation.
    pub fn truth(&self, inputs: &[u8]) -> Result<u8> {
        if inputs.len() != self.arity() {
            return Err(FheError::config(format!(
                "{self} takes {} inputs, got {}",
                self.arity(),
                inputs.len()
            )));
        }
        let bit = |i: usize| inputs[i] & 1;
        Ok(match self {
            Gate::Not => 1 - bit(0),
            Gate::And => bit(0) & bit(1),
            Gate::Or => bit(0) | bit(1),
            Gate::Xor => bit(0) ^ bit(1),
            Gate::Nand => 1 - (bit(0) & bit(1)),
            Gate::Nor => 1 - (bit(0) | bit(1)),
            Gate::Xnor => 1 - (bit(0) ^ bit(1)),
            Gate::Mux => {
                if bit(0) == 1 {
                    bit(2)
                } else {
                    bit(1)
                }
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gate::Not => "not",
            Gate::And => "and",
            Gate::Or => "or",
            Gate::Xor => "xor",
            Gate::Nand => "nand",
            Gate::Nor => "nor",
            Gate::Xnor => "xnor",
            Gate::Mux => "mux",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gate {
    type Err = FheError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Gate::ALL
            .into_iter()
            .find(|g| g.name() == lower)
            .ok_or_else(|| FheError::config(format!("unknown gate '{s}'")))
    }
}
