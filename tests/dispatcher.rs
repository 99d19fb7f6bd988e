//! End-to-end command flows through the dispatcher.

mod common;

use std::sync::Barrier;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use tfhe_engine::dispatch::{Dispatcher, Opcode, Request, Response};
use tfhe_engine::gate::Gate;
use tfhe_engine::lwe::LweCiphertext;
use tfhe_engine::params::Params;
use tfhe_engine::FheError;

fn loaded() -> Dispatcher {
    let fx = common::toy();
    let dispatcher = Dispatcher::new(fx.params).unwrap();
    let response = dispatcher
        .dispatch(Request::LoadKey {
            keys: Box::new(fx.keys.clone()),
        })
        .unwrap();
    assert_eq!(response, Response::KeyLoaded);
    dispatcher
}

fn encrypt(dispatcher: &Dispatcher, rng: &mut ChaCha20Rng, bit: u8) -> LweCiphertext {
    let params = dispatcher.params();
    let request = Request::Encrypt {
        bit,
        mask: common::random_mask(rng, params.lwe_dim, params.lwe_q),
        noise: rng.gen_range(-8..=8),
    };
    dispatcher.dispatch(request).unwrap().into_ciphertext().unwrap()
}

fn decrypt(dispatcher: &Dispatcher, ciphertext: LweCiphertext) -> u8 {
    dispatcher
        .dispatch(Request::Decrypt { ciphertext })
        .unwrap()
        .bit()
        .unwrap()
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let dispatcher = loaded();
    let mut rng = ChaCha20Rng::seed_from_u64(300);
    for bit in [0u8, 1, 1, 0] {
        let ct = encrypt(&dispatcher, &mut rng, bit);
        assert_eq!(decrypt(&dispatcher, ct), bit);
    }
}

#[test]
fn test_gate_and_bootstrap_commands() {
    let dispatcher = loaded();
    let mut rng = ChaCha20Rng::seed_from_u64(301);

    for (gate, inputs) in [
        (Gate::Nand, vec![1u8, 1]),
        (Gate::Or, vec![0, 1]),
        (Gate::Xor, vec![1, 1]),
        (Gate::Not, vec![0]),
        (Gate::Mux, vec![0, 1, 0]),
    ] {
        let operands = inputs.iter().map(|&b| encrypt(&dispatcher, &mut rng, b)).collect();
        let out = dispatcher
            .dispatch(Request::Gate { gate, operands })
            .unwrap()
            .into_ciphertext()
            .unwrap();
        let refreshed = dispatcher
            .dispatch(Request::Bootstrap { ciphertext: out })
            .unwrap()
            .into_ciphertext()
            .unwrap();
        assert_eq!(decrypt(&dispatcher, refreshed), gate.truth(&inputs).unwrap(), "{gate}");
    }
}

#[test]
fn test_commands_before_key_load_fail() {
    let dispatcher = Dispatcher::new(Params::toy()).unwrap();
    let err = dispatcher
        .dispatch(Request::Encrypt {
            bit: 1,
            mask: vec![0; 16],
            noise: 0,
        })
        .unwrap_err();
    assert!(matches!(err, FheError::Configuration(_)));
    assert!(dispatcher.keys().unwrap().is_none());
}

#[test]
fn test_load_key_rejects_other_parameter_sets() {
    let fx = common::toy();
    let dispatcher = Dispatcher::new(Params::demo()).unwrap();
    let err = dispatcher
        .dispatch(Request::LoadKey {
            keys: Box::new(fx.keys.clone()),
        })
        .unwrap_err();
    assert!(matches!(err, FheError::Configuration(_)));
    assert!(dispatcher.keys().unwrap().is_none());
}

#[test]
fn test_payload_shapes_are_validated() {
    let dispatcher = loaded();
    let params = *dispatcher.params();
    let q = params.lwe_modulus().unwrap();

    let short_mask = Request::Encrypt {
        bit: 0,
        mask: vec![0; params.lwe_dim - 1],
        noise: 0,
    };
    assert!(dispatcher.dispatch(short_mask).is_err());

    let bad_bit = Request::Encrypt {
        bit: 2,
        mask: vec![0; params.lwe_dim],
        noise: 0,
    };
    assert!(dispatcher.dispatch(bad_bit).is_err());

    let wide = LweCiphertext::zero(params.lwe_dim + 3, q);
    assert!(dispatcher
        .dispatch(Request::Decrypt { ciphertext: wide.clone() })
        .is_err());
    assert!(dispatcher
        .dispatch(Request::Bootstrap { ciphertext: wide })
        .is_err());

    let missing_operand = Request::Gate {
        gate: Gate::And,
        operands: vec![LweCiphertext::zero(params.lwe_dim, q)],
    };
    assert_eq!(missing_operand.opcode(), Opcode::Gate(Gate::And));
    assert!(dispatcher.dispatch(missing_operand).is_err());

    // failed requests release the in-flight slot
    let trivial = LweCiphertext::trivial(params.lwe_dim, q.value() / 2, q);
    assert_eq!(decrypt(&dispatcher, trivial), 1);
}

#[test]
fn test_concurrent_requests_are_served_or_rejected() {
    const THREADS: usize = 6;
    let dispatcher = loaded();
    let barrier = Barrier::new(THREADS);
    let mut rng = ChaCha20Rng::seed_from_u64(302);
    let inputs: Vec<_> = (0..THREADS)
        .map(|i| {
            let bit = (i % 2) as u8;
            (bit, encrypt(&dispatcher, &mut rng, bit))
        })
        .collect();

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|(bit, ct)| {
                let (dispatcher, barrier) = (&dispatcher, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    let result = dispatcher.dispatch(Request::Bootstrap {
                        ciphertext: ct.clone(),
                    });
                    (*bit, result)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (bit, result) in outcomes {
        match result {
            Ok(response) => {
                let ct = response.into_ciphertext().unwrap();
                assert_eq!(decrypt(&dispatcher, ct), bit);
            }
            Err(err) => {
                assert_eq!(err, FheError::Busy);
                assert!(err.is_retryable());
            }
        }
    }
}
