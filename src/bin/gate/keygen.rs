//! Seeded toy key material. This is the caller's side of the contract: the
//! library never samples randomness itself.

use eyre::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::info;

use tfhe_engine::bootstrap::{BootstrappingKey, EvaluationKeys, KeySet};
use tfhe_engine::ks::KeySwitchingKey;
use tfhe_engine::lwe::LweSecretKey;
use tfhe_engine::math::Poly;
use tfhe_engine::params::Params;
use tfhe_engine::rlwe::RlweSecretKey;

/// Half-width of the uniform noise used for every key component
const NOISE_BOUND: i64 = 2;

pub fn generate(params: &Params, rng: &mut ChaCha20Rng) -> Result<KeySet> {
    let lwe_bits: Vec<u8> = (0..params.lwe_dim).map(|_| rng.gen_range(0..=1)).collect();
    let ring_bits: Vec<u8> = (0..params.ring_dim).map(|_| rng.gen_range(0..=1)).collect();
    let lwe_sk = LweSecretKey::from_bits(&lwe_bits)?;
    let ring_sk = RlweSecretKey::from_bits(&ring_bits)?;

    let ctx = params.ntt_context()?;
    let ring_q = *ctx.modulus();
    let n = params.ring_dim;

    let bsk = BootstrappingKey::encrypt(&lwe_sk, &ring_sk, params.gadget()?, &ctx, |_, _| {
        let mask = (0..n).map(|_| rng.gen_range(0..ring_q.value())).collect();
        let noise = (0..n).map(|_| rng.gen_range(-NOISE_BOUND..=NOISE_BOUND)).collect();
        (Poly::from_coeffs(mask, ring_q), noise)
    })
    .wrap_err("failed to encrypt bootstrapping key")?;
    info!(entries = bsk.len(), "bootstrapping key ready");

    let lwe_q = params.lwe_q;
    let ksk = KeySwitchingKey::encrypt(&ring_sk.as_lwe_key(), &lwe_sk, params.ks_gadget()?, |_, _| {
        let mask = (0..params.lwe_dim).map(|_| rng.gen_range(0..lwe_q)).collect();
        (mask, rng.gen_range(-NOISE_BOUND..=NOISE_BOUND))
    })
    .wrap_err("failed to encrypt key-switching key")?;
    info!(rows = ksk.input_dim(), "key-switching key ready");

    KeySet::new(*params, lwe_sk, EvaluationKeys::new(bsk, ksk)).wrap_err("invalid key set")
}

pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}
