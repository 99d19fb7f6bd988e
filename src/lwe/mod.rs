//! LWE (Learning With Errors) encryption of single bits.
//!
//! A ciphertext `(a, b)` under secret key `s` satisfies
//!
//! ```text
//! b = ⟨a, s⟩ + e + μ
//! ```
//!
//! where `μ = bit·Δ` with `Δ = q/2` for the bit encoding (or `q/4` for the
//! gate encoding, see [`Encoding`]). Decryption computes the phase
//! `b − ⟨a, s⟩` and decodes `1` iff it falls in `[q/4, 3q/4)`, so any noise
//! with `|e| < q/4` is tolerated.
//!
//! Randomness is always an input: callers pass the mask `a` and noise `e`.
//! Key switching lives in [`crate::ks`]; sample extraction from ring
//! ciphertexts in [`crate::rlwe`].
//!
//! # Example
//!
//! ```
//! use tfhe_engine::lwe::{LweCiphertext, LweSecretKey};
//! use tfhe_engine::math::Modulus;
//!
//! let q = Modulus::new(16).unwrap();
//! let sk = LweSecretKey::from_bits(&[1, 0, 1, 0]).unwrap();
//! let ct = LweCiphertext::encrypt(&sk, vec![3, 5, 2, 7], 0, 1, q).unwrap();
//! assert_eq!(ct.b, 13);
//! assert_eq!(ct.decrypt(&sk).unwrap(), 1);
//! ```

mod enc;
mod types;

pub use types::{Encoding, LweCiphertext, LweSecretKey};
