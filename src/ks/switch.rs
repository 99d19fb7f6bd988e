//! Key-switching operation

use super::setup::KeySwitchingKey;
use crate::error::{ensure, Result};
use crate::lwe::LweCiphertext;

/// Switch `ct` from the key-switching key's source key to its destination
/// key.
///
/// # Algorithm
///
/// Start from `(0, b)`. For every coordinate `a_j` and every digit `d_{j,k}`
/// of its signed base-B decomposition, least significant first, subtract
/// `d_{j,k} · K[j][k]`. Since `a_j ≡ Σ_k d_{j,k}·B^k`, the accumulated
/// bodies cancel `⟨a, z⟩` up to the key-switching noise.
pub fn key_switch(ct: &LweCiphertext, ksk: &KeySwitchingKey) -> Result<LweCiphertext> {
    ensure!(
        ct.dimension() == ksk.input_dim(),
        "ciphertext dimension {} does not match key-switching input dimension {}",
        ct.dimension(),
        ksk.input_dim()
    );
    ensure!(
        ct.modulus == *ksk.modulus(),
        "ciphertext modulus {} does not match key-switching modulus {}",
        ct.modulus.value(),
        ksk.modulus().value()
    );

    let m = ct.modulus;
    let gadget = ksk.gadget();
    let mut result = LweCiphertext::trivial(ksk.output_dim(), ct.b, m);
    let mut digits = vec![0i64; gadget.digits()];

    for (j, &a_j) in ct.a.iter().enumerate() {
        gadget.decompose_into(a_j, &mut digits)?;
        for (k, &digit) in digits.iter().enumerate() {
            if digit == 0 {
                continue;
            }
            let entry = ksk.entry(j, k);
            let scalar = m.from_signed(digit);
            for (acc, &x) in result.a.iter_mut().zip(&entry.a) {
                *acc = m.sub(*acc, m.mul(scalar, x));
            }
            result.b = m.sub(result.b, m.mul(scalar, entry.b));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::LweSecretKey;
    use crate::math::{Gadget, Modulus};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const Q: u64 = 1 << 16;

    fn gen_key<R: Rng>(rng: &mut R, dim: usize) -> LweSecretKey {
        let bits: Vec<u8> = (0..dim).map(|_| rng.gen_range(0..=1)).collect();
        LweSecretKey::from_bits(&bits).unwrap()
    }

    fn build_ksk(
        rng: &mut ChaCha20Rng,
        from: &LweSecretKey,
        to: &LweSecretKey,
        noise: i64,
    ) -> KeySwitchingKey {
        let gadget = Gadget::new(16, 4, Modulus::new(Q).unwrap()).unwrap();
        let out = to.dim();
        KeySwitchingKey::encrypt(from, to, gadget, |_, _| {
            let mask = (0..out).map(|_| rng.gen_range(0..Q)).collect();
            (mask, rng.gen_range(-noise..=noise))
        })
        .unwrap()
    }

    fn encrypt(rng: &mut ChaCha20Rng, sk: &LweSecretKey, bit: u8) -> LweCiphertext {
        let a = (0..sk.dim()).map(|_| rng.gen_range(0..Q)).collect();
        LweCiphertext::encrypt(sk, a, rng.gen_range(-8..=8), bit, Modulus::new(Q).unwrap())
            .unwrap()
    }

    #[test]
    fn test_switch_to_smaller_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let from = gen_key(&mut rng, 128);
        let to = gen_key(&mut rng, 16);
        let ksk = build_ksk(&mut rng, &from, &to, 2);
        assert_eq!(ksk.input_dim(), 128);
        assert_eq!(ksk.output_dim(), 16);

        for _ in 0..20 {
            let bit = rng.gen_range(0..=1u8);
            let ct = encrypt(&mut rng, &from, bit);
            let switched = key_switch(&ct, &ksk).unwrap();
            assert_eq!(switched.dimension(), 16);
            assert_eq!(switched.decrypt(&to).unwrap(), bit);
        }
    }

    #[test]
    fn test_identity_switch_preserves_bit() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let sk = gen_key(&mut rng, 32);
        let ksk = build_ksk(&mut rng, &sk, &sk, 0);

        for bit in [0, 1] {
            let ct = encrypt(&mut rng, &sk, bit);
            let switched = key_switch(&ct, &ksk).unwrap();
            assert_eq!(switched.decrypt(&sk).unwrap(), bit);
            // a noiseless key switches the phase exactly
            assert_eq!(switched.phase(&sk).unwrap(), ct.phase(&sk).unwrap());
        }
    }

    #[test]
    fn test_entry_layout() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let from = gen_key(&mut rng, 4);
        let to = gen_key(&mut rng, 8);
        let ksk = build_ksk(&mut rng, &from, &to, 0);

        for j in 0..4 {
            for d in 0..4 {
                let expected = from.coeffs[j] as u64 * (1u64 << (4 * d));
                assert_eq!(ksk.entry(j, d).phase(&to).unwrap(), expected % Q);
            }
        }
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let from = gen_key(&mut rng, 8);
        let to = gen_key(&mut rng, 4);
        let ksk = build_ksk(&mut rng, &from, &to, 0);

        let wrong = encrypt(&mut rng, &to, 1);
        assert!(key_switch(&wrong, &ksk).is_err());

        let other_q = LweCiphertext::zero(8, Modulus::new(1 << 12).unwrap());
        assert!(key_switch(&other_q, &ksk).is_err());
    }

    #[test]
    fn test_from_entries_validates_shape() {
        let gadget = Gadget::new(16, 4, Modulus::new(Q).unwrap()).unwrap();
        let q = *gadget.modulus();
        let short_row = vec![vec![LweCiphertext::zero(4, q); 3]];
        assert!(KeySwitchingKey::from_entries(short_row, gadget).is_err());

        let ragged = vec![
            vec![LweCiphertext::zero(4, q); 4],
            vec![LweCiphertext::zero(5, q); 4],
        ];
        assert!(KeySwitchingKey::from_entries(ragged, gadget).is_err());
        assert!(KeySwitchingKey::from_entries(Vec::new(), gadget).is_err());
    }

    #[test]
    fn test_decode_validates_entries() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let from = gen_key(&mut rng, 6);
        let to = gen_key(&mut rng, 4);
        let ksk = build_ksk(&mut rng, &from, &to, 1);
        assert_eq!(ksk.len(), 6 * 4);

        let value = serde_json::to_value(&ksk).unwrap();
        let decoded: KeySwitchingKey = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(decoded, ksk);

        let mut truncated = value.clone();
        truncated["entries"].as_array_mut().unwrap().truncate(10);
        assert!(serde_json::from_value::<KeySwitchingKey>(truncated).is_err());

        let mut wider = value.clone();
        wider["input_dim"] = serde_json::json!(7);
        assert!(serde_json::from_value::<KeySwitchingKey>(wider).is_err());

        let mut relabeled = value.clone();
        relabeled["output_dim"] = serde_json::json!(5);
        assert!(serde_json::from_value::<KeySwitchingKey>(relabeled).is_err());

        let mut ragged = value;
        ragged["entries"][5]["a"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<KeySwitchingKey>(ragged).is_err());
    }
}
