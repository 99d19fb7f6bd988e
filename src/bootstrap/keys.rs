//! Evaluation key material: bootstrapping key, key-switching key, key sets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure, FheError, Result};
use crate::ks::KeySwitchingKey;
use crate::lwe::LweSecretKey;
use crate::math::{Gadget, NttContext, Poly};
use crate::params::Params;
use crate::rgsw::RgswCiphertext;
use crate::rlwe::RlweSecretKey;

/// Bootstrapping key: one RGSW encryption of each LWE key coefficient under
/// the ring key, in key order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BootstrappingKeyRepr", into = "BootstrappingKeyRepr")]
pub struct BootstrappingKey {
    keys: Vec<RgswCiphertext>,
}

#[derive(Serialize, Deserialize)]
struct BootstrappingKeyRepr {
    keys: Vec<RgswCiphertext>,
}

impl TryFrom<BootstrappingKeyRepr> for BootstrappingKey {
    type Error = FheError;

    fn try_from(repr: BootstrappingKeyRepr) -> Result<Self> {
        Self::new(repr.keys)
    }
}

impl From<BootstrappingKey> for BootstrappingKeyRepr {
    fn from(bsk: BootstrappingKey) -> Self {
        Self { keys: bsk.keys }
    }
}

impl BootstrappingKey {
    /// Wrap RGSW ciphertexts `BSK_0 .. BSK_{n-1}`.
    pub fn new(keys: Vec<RgswCiphertext>) -> Result<Self> {
        ensure!(!keys.is_empty(), "bootstrapping key has no entries");
        let first = &keys[0];
        for (i, key) in keys.iter().enumerate() {
            ensure!(
                key.ring_dim() == first.ring_dim() && key.gadget() == first.gadget(),
                "bootstrapping key entry {i} does not match entry 0"
            );
        }
        Ok(Self { keys })
    }

    /// Encrypt every coefficient of `lwe_sk` under `ring_sk`.
    ///
    /// `sample(i, row)` supplies mask and noise for row `row` of entry `i`.
    /// The result is already prepared for the NTT domain.
    pub fn encrypt<F>(
        lwe_sk: &LweSecretKey,
        ring_sk: &RlweSecretKey,
        gadget: Gadget,
        ctx: &NttContext,
        mut sample: F,
    ) -> Result<Self>
    where
        F: FnMut(usize, usize) -> (Poly, Vec<i64>),
    {
        let keys = lwe_sk
            .coeffs
            .iter()
            .enumerate()
            .map(|(i, &s_i)| {
                RgswCiphertext::encrypt_constant(ring_sk, s_i, gadget, ctx, |row| sample(i, row))
                    .map(|rgsw| rgsw.prepared(ctx))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys)
    }

    /// Move every entry to the NTT domain. Idempotent.
    pub fn prepare(&mut self, ctx: &NttContext) {
        for key in &mut self.keys {
            key.prepare(ctx);
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.keys.iter().all(RgswCiphertext::is_prepared)
    }

    /// Number of entries, which must equal the LWE dimension n
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entry `BSK_i`
    pub fn get(&self, i: usize) -> Option<&RgswCiphertext> {
        self.keys.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RgswCiphertext> {
        self.keys.iter()
    }

    pub fn ring_dim(&self) -> usize {
        self.keys[0].ring_dim()
    }

    pub fn gadget(&self) -> &Gadget {
        self.keys[0].gadget()
    }
}

/// Public material needed to bootstrap: shared read-only by every gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationKeys {
    pub bootstrapping: BootstrappingKey,
    pub key_switching: KeySwitchingKey,
}

impl EvaluationKeys {
    pub fn new(bootstrapping: BootstrappingKey, key_switching: KeySwitchingKey) -> Self {
        Self {
            bootstrapping,
            key_switching,
        }
    }

    /// Check every key dimension against `params`.
    ///
    /// Runs before any rotation so that a mismatched key fails fast.
    pub fn validate(&self, params: &Params) -> Result<()> {
        let bsk = &self.bootstrapping;
        ensure!(
            bsk.len() == params.lwe_dim,
            "bootstrapping key has {} entries, expected n = {}",
            bsk.len(),
            params.lwe_dim
        );
        let gadget = params.gadget()?;
        for (i, entry) in bsk.iter().enumerate() {
            ensure!(
                entry.ring_dim() == params.ring_dim,
                "bootstrapping key entry {i} has ring dimension {}, expected N = {}",
                entry.ring_dim(),
                params.ring_dim
            );
            ensure!(
                *entry.gadget() == gadget && entry.rows().len() == 2 * params.gadget_len,
                "bootstrapping key entry {i} does not match the gadget of the parameter set"
            );
        }

        let ksk = &self.key_switching;
        ensure!(
            ksk.input_dim() == params.ring_dim,
            "key-switching key input dimension {} does not match N = {}",
            ksk.input_dim(),
            params.ring_dim
        );
        ensure!(
            ksk.output_dim() == params.lwe_dim,
            "key-switching key output dimension {} does not match n = {}",
            ksk.output_dim(),
            params.lwe_dim
        );
        ensure!(
            *ksk.gadget() == params.ks_gadget()?,
            "key-switching key gadget does not match the parameter set"
        );
        ensure!(
            ksk.len() == params.ring_dim * params.ks_len,
            "key-switching key has {} entries, expected N·ℓ = {}",
            ksk.len(),
            params.ring_dim * params.ks_len
        );
        Ok(())
    }
}

/// Everything one engine instance serves requests with: the parameter set,
/// the LWE secret key for ENCRYPT/DECRYPT, and the evaluation keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    params: Params,
    secret_key: LweSecretKey,
    evaluation: EvaluationKeys,
}

impl KeySet {
    /// Validate and assemble a key set. The bootstrapping key is moved to
    /// the NTT domain here, once.
    pub fn new(params: Params, secret_key: LweSecretKey, mut evaluation: EvaluationKeys) -> Result<Self> {
        params.validate()?;
        ensure!(
            secret_key.dim() == params.lwe_dim,
            "secret key dimension {} does not match n = {}",
            secret_key.dim(),
            params.lwe_dim
        );
        evaluation.validate(&params)?;
        evaluation.bootstrapping.prepare(&params.ntt_context()?);
        Ok(Self {
            params,
            secret_key,
            evaluation,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn secret_key(&self) -> &LweSecretKey {
        &self.secret_key
    }

    pub fn evaluation(&self) -> &EvaluationKeys {
        &self.evaluation
    }

    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode with bincode and re-run the checks of [`KeySet::new`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: KeySet = bincode::deserialize(bytes)?;
        debug!(
            lwe_dim = raw.params.lwe_dim,
            ring_dim = raw.params.ring_dim,
            "decoded key set"
        );
        Self::new(raw.params, raw.secret_key, raw.evaluation)
    }
}
