//! LWE key switching
//!
//! Moves an LWE ciphertext from one secret key to another, typically from
//! the ring key reused as an extraction key (dimension N) back down to the
//! small LWE key (dimension n) at the end of bootstrapping.
//!
//! # Key-Switching Key
//!
//! For every source coordinate `z_j` and digit position `d`:
//! ```text
//! K[j][d] = LWE_s(z_j · B^d)
//! ```
//!
//! # Algorithm
//!
//! To switch (a, b) from `z` to `s`:
//! 1. Decompose each `a_j` into signed digits `d_{j,0}, ..., d_{j,t-1}`
//! 2. Compute: (a', b') = (0, b) - Σ_j Σ_d d_{j,d} · K[j][d]

mod setup;
mod switch;

pub use setup::KeySwitchingKey;
pub use switch::key_switch;
