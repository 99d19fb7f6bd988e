//! tfhe-engine: TFHE-style gate bootstrapping over LWE, RLWE and RGSW
//!
//! This crate encrypts single bits, evaluates Boolean gates on them and
//! refreshes ciphertext noise by bootstrapping, so gates can be chained
//! without bound.
//!
//! Key components:
//! - Modular and signed gadget arithmetic, negacyclic NTT
//! - LWE and RLWE encryption, RGSW external product and CMUX
//! - Blind rotation, sample extraction and key switching
//! - Gate layer and a single-flight command dispatcher
//!
//! Randomness is never generated here: masks and noise terms are inputs,
//! and key generation belongs to the caller.

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod ks;
pub mod lwe;
pub mod math;
pub mod params;
pub mod rgsw;
pub mod rlwe;

pub use bootstrap::{
    BootstrapRun, BootstrapStage, Bootstrapper, BootstrappingKey, EvaluationKeys, KeySet,
    TestPolynomial,
};
pub use dispatch::{Dispatcher, Opcode, Request, Response};
pub use error::{FheError, Result};
pub use gate::{Gate, GateEvaluator};
pub use ks::{key_switch, KeySwitchingKey};
pub use lwe::{Encoding, LweCiphertext, LweSecretKey};
pub use math::{Gadget, Modulus, NttContext, NttStrategy, Poly};
pub use params::Params;
pub use rgsw::{cmux, external_product, RgswCiphertext};
pub use rlwe::{RlweCiphertext, RlweSecretKey};
