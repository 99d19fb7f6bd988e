//! Linear parts of the gates, on gate-encoded operands (`1 ↦ q/4`).
//!
//! | Gate | Combination             | Output encoding      |
//! |------|-------------------------|----------------------|
//! | NOT  | `(0, q/4) − c`          | gate                 |
//! | AND  | `c1 + c2 − q/8`         | sign (bootstrap)     |
//! | OR   | `c1 + c2 + q/8`         | sign (bootstrap)     |
//! | XOR  | `2·(c1 + c2)`           | bit                  |
//! | NAND | `(0, 5q/8) − c1 − c2`   | sign (bootstrap)     |
//! | XNOR | `(0, q/2) − 2·(c1 + c2)`| bit                  |
//!
//! "Sign" outputs have phase `±q/8` around the bit window edge and must go
//! through a sign bootstrap before they decrypt.

use crate::error::Result;
use crate::lwe::{Encoding, LweCiphertext};

/// `(0, Δ) − c`: flips the bit of `c` under `encoding`.
pub fn complement(c: &LweCiphertext, encoding: Encoding) -> LweCiphertext {
    c.neg().add_constant(encoding.delta(&c.modulus))
}

/// `(0, q/4) − c`
pub fn not(c: &LweCiphertext) -> LweCiphertext {
    complement(c, Encoding::Gate)
}

/// `c1 + c2 − q/8`
pub fn and(c1: &LweCiphertext, c2: &LweCiphertext) -> Result<LweCiphertext> {
    let m = c1.modulus;
    Ok(c1.add(c2)?.add_constant(m.neg(m.fraction(1, 8))))
}

/// `c1 + c2 + q/8`
pub fn or(c1: &LweCiphertext, c2: &LweCiphertext) -> Result<LweCiphertext> {
    let m = c1.modulus;
    Ok(c1.add(c2)?.add_constant(m.fraction(1, 8)))
}

/// `2·(c1 + c2)`, bit-encoded
pub fn xor(c1: &LweCiphertext, c2: &LweCiphertext) -> Result<LweCiphertext> {
    Ok(c1.add(c2)?.scalar_mul(2))
}

/// `(0, 5q/8) − c1 − c2`
pub fn nand(c1: &LweCiphertext, c2: &LweCiphertext) -> Result<LweCiphertext> {
    let m = c1.modulus;
    Ok(c1.add(c2)?.neg().add_constant(m.fraction(5, 8)))
}

/// `(0, q/2) − xor(c1, c2)`, bit-encoded
pub fn xnor(c1: &LweCiphertext, c2: &LweCiphertext) -> Result<LweCiphertext> {
    Ok(complement(&xor(c1, c2)?, Encoding::Bit))
}
