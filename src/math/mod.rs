//! Arithmetic foundations: residues, gadget digits, NTT and ring elements.
//!
//! - [`Modulus`]: arithmetic over Z_q, masking for `q = 2^k`, Montgomery
//!   reduction for odd `q`
//! - [`Gadget`]: signed base-`2^k` decomposition
//! - [`NttContext`]: negacyclic NTT over Z_q[X]/(X^N + 1)
//! - [`Poly`]: ring elements in coefficient or NTT domain
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::{Modulus, NttContext, Poly};
//!
//! let ctx = NttContext::new(256, 134215681).unwrap();
//! let q = *ctx.modulus();
//! let a = Poly::constant(3, 256, q);
//! let b = Poly::constant(5, 256, q);
//! assert_eq!(a.mul_ntt(&b, &ctx).coeff(0), 15);
//! ```

pub mod gadget;
pub mod modulus;
pub mod ntt;
pub mod poly;

pub use gadget::{gadget_decompose, Gadget};
pub use modulus::{is_prime, Modulus, Reduction, MAX_MODULUS};
pub use ntt::{negacyclic_schoolbook, NttContext, NttStrategy};
pub use poly::Poly;
