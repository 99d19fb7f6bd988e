//! Shared toy key material for integration tests and benches.

#![allow(dead_code)]

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use tfhe_engine::bootstrap::{Bootstrapper, BootstrappingKey, EvaluationKeys, KeySet};
use tfhe_engine::ks::KeySwitchingKey;
use tfhe_engine::lwe::{Encoding, LweCiphertext, LweSecretKey};
use tfhe_engine::math::Poly;
use tfhe_engine::params::Params;
use tfhe_engine::rlwe::RlweSecretKey;

pub const KEY_SEED: u64 = 0x7f4e_5a11;
const KEY_NOISE: i64 = 2;
const FRESH_NOISE: i64 = 16;

pub struct Fixture {
    pub params: Params,
    pub lwe_sk: LweSecretKey,
    pub ring_sk: RlweSecretKey,
    pub keys: KeySet,
    pub engine: Bootstrapper,
}

impl Fixture {
    pub fn evaluation(&self) -> &EvaluationKeys {
        self.keys.evaluation()
    }

    /// Fresh bit-encoded encryption
    pub fn encrypt<R: Rng>(&self, rng: &mut R, bit: u8) -> LweCiphertext {
        self.encrypt_encoded(rng, bit, Encoding::Bit)
    }

    pub fn encrypt_encoded<R: Rng>(&self, rng: &mut R, bit: u8, encoding: Encoding) -> LweCiphertext {
        let q = self.params.lwe_modulus().unwrap();
        let a = random_mask(rng, self.params.lwe_dim, self.params.lwe_q);
        LweCiphertext::encrypt_encoded(
            &self.lwe_sk,
            a,
            rng.gen_range(-FRESH_NOISE..=FRESH_NOISE),
            bit,
            encoding,
            q,
        )
        .unwrap()
    }

    /// Encrypt an arbitrary phase `μ`
    pub fn encrypt_phase<R: Rng>(&self, rng: &mut R, message: u64) -> LweCiphertext {
        let q = self.params.lwe_modulus().unwrap();
        let a = random_mask(rng, self.params.lwe_dim, self.params.lwe_q);
        LweCiphertext::encrypt_phase(&self.lwe_sk, a, rng.gen_range(-FRESH_NOISE..=FRESH_NOISE), message, q)
            .unwrap()
    }

    pub fn decrypt(&self, ct: &LweCiphertext) -> u8 {
        ct.decrypt(&self.lwe_sk).unwrap()
    }
}

pub fn random_mask<R: Rng>(rng: &mut R, dim: usize, q: u64) -> Vec<u64> {
    (0..dim).map(|_| rng.gen_range(0..q)).collect()
}

pub fn random_bits<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..=1)).collect()
}

/// Build a complete key set for `params` from `seed`.
pub fn build(params: Params, seed: u64) -> Fixture {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let lwe_sk = LweSecretKey::from_bits(&random_bits(&mut rng, params.lwe_dim)).unwrap();
    let ring_sk = RlweSecretKey::from_bits(&random_bits(&mut rng, params.ring_dim)).unwrap();

    let ctx = params.ntt_context().unwrap();
    let ring_q = *ctx.modulus();
    let n = params.ring_dim;

    let bsk = BootstrappingKey::encrypt(&lwe_sk, &ring_sk, params.gadget().unwrap(), &ctx, |_, _| {
        let mask = random_mask(&mut rng, n, ring_q.value());
        let noise = (0..n).map(|_| rng.gen_range(-KEY_NOISE..=KEY_NOISE)).collect();
        (Poly::from_coeffs(mask, ring_q), noise)
    })
    .unwrap();

    let ksk = KeySwitchingKey::encrypt(
        &ring_sk.as_lwe_key(),
        &lwe_sk,
        params.ks_gadget().unwrap(),
        |_, _| {
            let mask = random_mask(&mut rng, params.lwe_dim, params.lwe_q);
            (mask, rng.gen_range(-KEY_NOISE..=KEY_NOISE))
        },
    )
    .unwrap();

    let keys = KeySet::new(params, lwe_sk.clone(), EvaluationKeys::new(bsk, ksk)).unwrap();
    Fixture {
        params,
        lwe_sk,
        ring_sk,
        keys,
        engine: Bootstrapper::new(params).unwrap(),
    }
}

/// Toy fixture, built once per test binary.
pub fn toy() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| build(Params::toy(), KEY_SEED))
}
