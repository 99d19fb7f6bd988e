//! Gate bootstrapping
//!
//! Refreshes the noise of an LWE ciphertext by evaluating its decryption
//! homomorphically:
//!
//! 1. Rescale `(a, b)` to rotation amounts in `[0, 2N)`
//! 2. Blind rotation: `acc ← CMUX(BSK_i, acc, X^{−ã_i}·acc)` for every key
//!    coordinate, starting from `X^{b̃}·TP`
//! 3. Sample extraction of the constant coefficient
//! 4. Modulus switch Q → q and key switch back to the n-dimensional key
//!
//! The test polynomial `TP` decides what is computed: a sign table for
//! gate bootstrapping, an arbitrary table for programmable bootstrapping.

mod engine;
mod keys;
mod test_poly;

pub use engine::{BootstrapRun, BootstrapStage, Bootstrapper};
pub use keys::{BootstrappingKey, EvaluationKeys, KeySet};
pub use test_poly::TestPolynomial;
