//! Request and response types of the command surface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bootstrap::KeySet;
use crate::gate::Gate;
use crate::lwe::LweCiphertext;

/// Command opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Encrypt,
    Decrypt,
    Gate(Gate),
    Bootstrap,
    LoadKey,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Encrypt => write!(f, "ENCRYPT"),
            Opcode::Decrypt => write!(f, "DECRYPT"),
            Opcode::Gate(gate) => write!(f, "GATE_{}", gate.name().to_ascii_uppercase()),
            Opcode::Bootstrap => write!(f, "BOOTSTRAP"),
            Opcode::LoadKey => write!(f, "LOAD_KEY"),
        }
    }
}

/// A command with its payload.
#[derive(Debug, Clone)]
pub enum Request {
    /// Encrypt `bit` under the loaded secret key with caller-supplied
    /// randomness: `n` mask entries plus one noise term.
    Encrypt { bit: u8, mask: Vec<u64>, noise: i64 },
    /// Decrypt one ciphertext to a bit
    Decrypt { ciphertext: LweCiphertext },
    /// Evaluate a gate on bit-encoded operands
    Gate {
        gate: Gate,
        operands: Vec<LweCiphertext>,
    },
    /// Refresh one bit-encoded ciphertext
    Bootstrap { ciphertext: LweCiphertext },
    /// Publish a new key set
    LoadKey { keys: Box<KeySet> },
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::Encrypt { .. } => Opcode::Encrypt,
            Request::Decrypt { .. } => Opcode::Decrypt,
            Request::Gate { gate, .. } => Opcode::Gate(*gate),
            Request::Bootstrap { .. } => Opcode::Bootstrap,
            Request::LoadKey { .. } => Opcode::LoadKey,
        }
    }
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ciphertext(LweCiphertext),
    Bit(u8),
    KeyLoaded,
}

impl Response {
    pub fn into_ciphertext(self) -> Option<LweCiphertext> {
        match self {
            Response::Ciphertext(ct) => Some(ct),
            _ => None,
        }
    }

    pub fn bit(&self) -> Option<u8> {
        match self {
            Response::Bit(bit) => Some(*bit),
            _ => None,
        }
    }
}
