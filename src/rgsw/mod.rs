//! RGSW (Ring-GSW) encryption module
//!
//! This module implements RGSW encryption, which enables homomorphic
//! multiplication of RLWE ciphertexts via the external product operation.
//!
//! # Overview
//!
//! An RGSW ciphertext encrypting message m is a 2ℓ × 2 matrix where:
//! - Each row is an RLWE ciphertext
//! - The gadget vector g = [1, B, B², ..., B^(ℓ-1)]^T allows decomposition
//!
//! # External Product
//!
//! RLWE(m₀) ⊡ RGSW(m₁) → RLWE(m₀·m₁). With m₁ a secret bit this gives
//! [`cmux`], the selection step of blind rotation.
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::{Gadget, NttContext, Poly};
//! use tfhe_engine::rgsw::{external_product, RgswCiphertext};
//! use tfhe_engine::rlwe::{RlweCiphertext, RlweSecretKey};
//!
//! let ctx = NttContext::new(8, 17).unwrap();
//! let q = *ctx.modulus();
//! let gadget = Gadget::new(4, 3, q).unwrap();
//! let sk = RlweSecretKey::from_bits(&[1, 0, 1, 1, 0, 0, 1, 0]).unwrap();
//!
//! // noiseless rows keep the toy ring exact
//! let one = RgswCiphertext::encrypt_constant(&sk, 1, gadget, &ctx, |row| {
//!     (Poly::from_coeffs(vec![row as u64 + 1; 8], q), vec![0; 8])
//! })
//! .unwrap();
//!
//! let bits = [1, 0, 0, 1, 1, 0, 1, 0];
//! let a = Poly::from_coeffs(vec![5, 3, 11, 0, 7, 2, 9, 16], q);
//! let ct = RlweCiphertext::encrypt(&sk, a, &[0; 8], &bits, &ctx).unwrap();
//! let product = external_product(&ct, &one, &ctx).unwrap();
//! assert_eq!(product.decrypt(&sk, &ctx).unwrap(), bits.to_vec());
//! ```

mod external_product;
mod types;

pub use external_product::{cmux, decompose_poly, external_product};
pub use types::RgswCiphertext;
