//! RLWE (Ring Learning With Errors) encryption module
//!
//! This module implements RLWE encryption over the ring R_Q = Z_Q[X]/(X^N + 1).
//!
//! # Overview
//!
//! - Secret key s is a polynomial with binary or small coefficients
//! - Ciphertext (a, b) encrypts plaintext M as b = a·s + e + M
//! - Bits are placed at `Q/2` per coefficient
//!
//! Besides encryption this module carries the ring operations blind
//! rotation relies on: multiplication by a monomial `X^k`, Galois
//! automorphisms and sample extraction of one coefficient as an LWE
//! ciphertext.
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::{NttContext, Poly};
//! use tfhe_engine::rlwe::{RlweCiphertext, RlweSecretKey};
//!
//! let ctx = NttContext::new(4, 17).unwrap();
//! let sk = RlweSecretKey::from_bits(&[1, 0, 1, 1]).unwrap();
//! let a = Poly::from_coeffs(vec![3, 9, 1, 16], *ctx.modulus());
//! let ct = RlweCiphertext::encrypt(&sk, a, &[0, 1, 0, -1], &[1, 0, 0, 1], &ctx).unwrap();
//! assert_eq!(ct.decrypt(&sk, &ctx).unwrap(), vec![1, 0, 0, 1]);
//!
//! let lwe = ct.sample_extract(3).unwrap();
//! assert_eq!(lwe.decrypt(&sk.as_lwe_key()).unwrap(), 1);
//! ```

mod enc;
mod galois;
mod types;

pub use galois::inverse_automorphism;
pub use types::{RlweCiphertext, RlweSecretKey};
