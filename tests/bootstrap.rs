//! Bootstrapping with real keys: stage order, refresh, lookup tables and
//! key material handling.

mod common;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use tfhe_engine::bootstrap::{BootstrapStage, Bootstrapper, BootstrappingKey, EvaluationKeys, KeySet};
use tfhe_engine::lwe::{Encoding, LweCiphertext, LweSecretKey};
use tfhe_engine::math::{Gadget, NttStrategy};
use tfhe_engine::params::Params;
use tfhe_engine::rlwe::RlweCiphertext;
use tfhe_engine::FheError;

/// Centered distance of `phase` from `target` in Z_q
fn distance(phase: u64, target: u64, q: u64) -> u64 {
    let d = (phase + q - target % q) % q;
    d.min(q - d)
}

#[test]
fn test_stage_sequence_with_real_keys() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(200);
    let ct = fx.encrypt(&mut rng, 1);
    let tp = fx.engine.sign_test_polynomial(Encoding::Bit);

    let mut run = fx.engine.start(&ct, tp, fx.evaluation()).unwrap();
    assert_eq!(run.stage(), BootstrapStage::Idle);
    let (body, masks) = run.rotations();
    assert!(body < 2 * fx.params.ring_dim);
    assert_eq!(masks.len(), fx.params.lwe_dim);

    let mut stages = Vec::new();
    while run.stage() != BootstrapStage::Done {
        stages.push(run.step().unwrap());
    }

    let mut expected = vec![BootstrapStage::Init];
    expected.extend((0..fx.params.lwe_dim).map(|round| BootstrapStage::BlindRotate { round }));
    expected.extend([
        BootstrapStage::Extract,
        BootstrapStage::KeySwitch,
        BootstrapStage::Done,
    ]);
    assert_eq!(stages, expected);

    let output = run.output().cloned().unwrap();
    assert_eq!(output.dimension(), fx.params.lwe_dim);
    assert_eq!(fx.decrypt(&output), 1);

    assert_eq!(run.step().unwrap(), BootstrapStage::Idle);
    assert!(run.output().is_none());
}

#[test]
fn test_refresh_recenters_noisy_inputs() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(201);
    let q = fx.params.lwe_q;

    // phases well inside each window but far from the encoded value
    for (phase, bit) in [
        (q / 8 - q / 32, 0u8),
        (q - q / 8 + q / 32, 0),
        (q / 2 + q / 8 + q / 32, 1),
        (q / 2 - q / 8 - q / 32, 1),
    ] {
        let ct = fx.encrypt_phase(&mut rng, phase);
        assert_eq!(fx.decrypt(&ct), bit);

        let refreshed = fx.engine.bootstrap(&ct, fx.evaluation()).unwrap();
        let out_phase = refreshed.phase(&fx.lwe_sk).unwrap();
        assert!(
            distance(out_phase, u64::from(bit) * q / 2, q) < q / 16,
            "phase {phase} refreshed to {out_phase}"
        );
    }
}

#[test]
fn test_bootstrap_to_gate_encoding() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(202);
    for bit in [0u8, 1] {
        let ct = fx.encrypt(&mut rng, bit);
        let lifted = fx.engine.bootstrap_to(&ct, Encoding::Gate, fx.evaluation()).unwrap();
        assert_eq!(lifted.decrypt_encoded(&fx.lwe_sk, Encoding::Gate).unwrap(), bit);
    }
}

#[test]
fn test_repeated_bootstraps_stay_correct() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(203);
    let mut ct = fx.encrypt(&mut rng, 1);
    for _ in 0..8 {
        ct = fx.engine.bootstrap(&ct, fx.evaluation()).unwrap();
        assert_eq!(fx.decrypt(&ct), 1);
    }
}

#[test]
fn test_programmable_lookup_table() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(204);
    let q = fx.params.lwe_q;

    let table = [2u64, 3, 0, 1];
    let p = table.len() as u64;
    let tp = fx.engine.lookup_table(&table).unwrap();

    for m in 0..p {
        let ct = fx.encrypt_phase(&mut rng, m * q / (2 * p));
        let out = fx.engine.programmable_bootstrap(&ct, &tp, fx.evaluation()).unwrap();
        let phase = out.phase(&fx.lwe_sk).unwrap();
        let decoded = ((phase as u128 * 2 * p as u128 + q as u128 / 2) / q as u128) as u64 % (2 * p);
        assert_eq!(decoded, table[m as usize], "message {m}");
    }

    assert!(fx.engine.lookup_table(&[0, 1, 2]).is_err());
    assert!(fx.engine.lookup_table(&[0, 4, 1, 2]).is_err());
}

#[test]
fn test_parallel_ntt_gives_identical_output() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(205);
    let parallel = Bootstrapper::new(fx.params)
        .unwrap()
        .with_strategy(NttStrategy::Parallel);

    for bit in [0u8, 1] {
        let ct = fx.encrypt(&mut rng, bit);
        let sequential = fx.engine.bootstrap(&ct, fx.evaluation()).unwrap();
        assert_eq!(parallel.bootstrap(&ct, fx.evaluation()).unwrap(), sequential);
    }
}

#[test]
fn test_mismatched_keys_fail_before_rotation() {
    let fx = common::toy();
    let mut rng = ChaCha20Rng::seed_from_u64(206);
    let ct = fx.encrypt(&mut rng, 0);
    let tp = fx.engine.sign_test_polynomial(Encoding::Bit);

    let short = BootstrappingKey::new(
        fx.evaluation()
            .bootstrapping
            .iter()
            .take(fx.params.lwe_dim - 1)
            .cloned()
            .collect(),
    )
    .unwrap();
    let keys = EvaluationKeys::new(short, fx.evaluation().key_switching.clone());

    let err = fx.engine.start(&ct, tp, &keys).unwrap_err();
    assert!(matches!(err, FheError::Configuration(_)));
    assert!(fx.engine.bootstrap(&ct, &keys).is_err());
}

#[test]
fn test_wrong_ciphertext_shape_is_rejected() {
    let fx = common::toy();
    let q = fx.params.lwe_modulus().unwrap();
    let wide = tfhe_engine::lwe::LweCiphertext::zero(fx.params.ring_dim, q);
    assert!(fx.engine.bootstrap(&wide, fx.evaluation()).is_err());
}

#[test]
fn test_key_set_bytes_round_trip() {
    let fx = common::toy();
    let bytes = fx.keys.to_bytes().unwrap();
    let decoded = KeySet::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, fx.keys);
    assert!(decoded.evaluation().bootstrapping.is_prepared());

    let truncated = KeySet::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(truncated, FheError::Serialization(_)));
}

/// Field-for-field image of the encoded key set, so tests can write bytes
/// that the validating constructors would never produce.
#[derive(Serialize)]
struct RawKeySet {
    params: Params,
    secret_key: LweSecretKey,
    evaluation: RawEvaluationKeys,
}

#[derive(Serialize)]
struct RawEvaluationKeys {
    bootstrapping: Vec<RawRgsw>,
    key_switching: RawKeySwitchingKey,
}

#[derive(Serialize)]
struct RawRgsw {
    rows: Vec<RlweCiphertext>,
    gadget: Gadget,
}

#[derive(Serialize)]
struct RawKeySwitchingKey {
    entries: Vec<LweCiphertext>,
    input_dim: usize,
    output_dim: usize,
    gadget: Gadget,
}

fn raw_key_set(keys: &KeySet) -> RawKeySet {
    let eval = keys.evaluation();
    let ksk = &eval.key_switching;
    let digits = ksk.gadget().digits();
    RawKeySet {
        params: *keys.params(),
        secret_key: keys.secret_key().clone(),
        evaluation: RawEvaluationKeys {
            bootstrapping: eval
                .bootstrapping
                .iter()
                .map(|rgsw| RawRgsw {
                    rows: rgsw.rows().to_vec(),
                    gadget: *rgsw.gadget(),
                })
                .collect(),
            key_switching: RawKeySwitchingKey {
                entries: (0..ksk.input_dim())
                    .flat_map(|j| (0..digits).map(move |d| (j, d)))
                    .map(|(j, d)| ksk.entry(j, d).clone())
                    .collect(),
                input_dim: ksk.input_dim(),
                output_dim: ksk.output_dim(),
                gadget: *ksk.gadget(),
            },
        },
    }
}

#[test]
fn test_tampered_key_bytes_are_rejected() {
    let fx = common::toy();
    let encode = |raw: &RawKeySet| bincode::serialize(raw).unwrap();

    // the image encodes exactly like the real key set
    assert_eq!(encode(&raw_key_set(&fx.keys)), fx.keys.to_bytes().unwrap());

    let mut truncated_ksk = raw_key_set(&fx.keys);
    truncated_ksk.evaluation.key_switching.entries.truncate(10);

    let mut empty_entry = raw_key_set(&fx.keys);
    empty_entry.evaluation.bootstrapping[3].rows.clear();

    let mut short_rows = raw_key_set(&fx.keys);
    for rgsw in &mut short_rows.evaluation.bootstrapping {
        rgsw.rows.truncate(2);
    }

    let mut missing_entry = raw_key_set(&fx.keys);
    missing_entry.evaluation.bootstrapping.pop();

    for (case, raw) in [
        ("truncated key-switching key", truncated_ksk),
        ("empty bootstrapping entry", empty_entry),
        ("two-row bootstrapping entries", short_rows),
        ("missing bootstrapping entry", missing_entry),
    ] {
        let err = KeySet::from_bytes(&encode(&raw)).unwrap_err();
        assert!(
            matches!(err, FheError::Serialization(_) | FheError::Configuration(_)),
            "{case}: {err}"
        );
    }
}
