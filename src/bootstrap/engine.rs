//! Bootstrapping engine: blind rotation, sample extraction, key switching.
//!
//! A bootstrap is a sequence of stages:
//!
//! ```text
//! Idle → Init → BlindRotate{0} → … → BlindRotate{n-1} → Extract → KeySwitch → Done → Idle
//! ```
//!
//! [`BootstrapRun`] exposes the sequence one [`step`](BootstrapRun::step)
//! at a time; [`Bootstrapper::bootstrap`] drives it to completion. Each
//! rotation reads the accumulator the previous one wrote, so the rounds are
//! strictly sequential. Parallelism lives inside the NTT and across
//! independent gates.

use std::fmt;

use tracing::{debug, trace};

use super::keys::EvaluationKeys;
use super::test_poly::TestPolynomial;
use crate::error::{config_err, ensure, Result};
use crate::ks::key_switch;
use crate::lwe::{Encoding, LweCiphertext};
use crate::math::{Modulus, NttContext, NttStrategy};
use crate::params::Params;
use crate::rgsw::cmux;
use crate::rlwe::RlweCiphertext;

/// Observable stage of a [`BootstrapRun`], named after the last completed
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// Nothing computed yet
    Idle,
    /// Accumulator holds `X^{b̃} · TP`
    Init,
    /// Rotation `round` (0-based) has been applied
    BlindRotate { round: usize },
    /// Constant coefficient extracted as an N-dimensional LWE ciphertext
    Extract,
    /// Modulus switched, key switched and offset
    KeySwitch,
    /// Result available
    Done,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Init => write!(f, "init"),
            Self::BlindRotate { round } => write!(f, "blind-rotate[{round}]"),
            Self::Extract => write!(f, "extract"),
            Self::KeySwitch => write!(f, "key-switch"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Data carried between stages.
#[derive(Debug)]
enum RunState {
    Idle,
    Init { acc: RlweCiphertext },
    BlindRotate { round: usize, acc: RlweCiphertext },
    Extract { extracted: LweCiphertext },
    KeySwitch { output: LweCiphertext },
    Done { output: LweCiphertext },
}

/// Parameter-bound bootstrapping engine.
///
/// Holds the parameter set, the ring NTT context and one sign test
/// polynomial per [`Encoding`]. Key material is passed per call and only
/// read.
#[derive(Clone, Debug)]
pub struct Bootstrapper {
    params: Params,
    ctx: NttContext,
    lwe_q: Modulus,
    sign_bit: TestPolynomial,
    sign_gate: TestPolynomial,
}

impl Bootstrapper {
    /// Validate `params` and precompute the NTT twiddles and sign tables.
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        let ctx = params.ntt_context()?;
        let lwe_q = params.lwe_modulus()?;
        let ring_q = *ctx.modulus();
        Ok(Self {
            sign_bit: TestPolynomial::sign(params.ring_dim, ring_q, &lwe_q, Encoding::Bit),
            sign_gate: TestPolynomial::sign(params.ring_dim, ring_q, &lwe_q, Encoding::Gate),
            params,
            ctx,
            lwe_q,
        })
    }

    /// Select the NTT strategy used by every external product.
    pub fn with_strategy(self, strategy: NttStrategy) -> Self {
        Self {
            ctx: self.ctx.with_strategy(strategy),
            ..self
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn ntt_context(&self) -> &NttContext {
        &self.ctx
    }

    pub fn lwe_modulus(&self) -> &Modulus {
        &self.lwe_q
    }

    /// Sign table refreshing to `encoding`
    pub fn sign_test_polynomial(&self, encoding: Encoding) -> &TestPolynomial {
        match encoding {
            Encoding::Bit => &self.sign_bit,
            Encoding::Gate => &self.sign_gate,
        }
    }

    /// Lookup table for programmable bootstrapping over this ring.
    pub fn lookup_table(&self, table: &[u64]) -> Result<TestPolynomial> {
        TestPolynomial::lookup(self.params.ring_dim, *self.ctx.modulus(), table)
    }

    /// Fail-fast check of `keys` against the parameter set.
    pub fn check_keys(&self, keys: &EvaluationKeys) -> Result<()> {
        keys.validate(&self.params)
    }

    /// Begin a bootstrap of `ct` with `test_poly`, validating every input
    /// before the first rotation.
    pub fn start<'a>(
        &'a self,
        ct: &LweCiphertext,
        test_poly: &'a TestPolynomial,
        keys: &'a EvaluationKeys,
    ) -> Result<BootstrapRun<'a>> {
        self.params.check_ciphertext(ct)?;
        self.check_keys(keys)?;
        ensure!(
            test_poly.ring_dim() == self.params.ring_dim
                && test_poly.poly().modulus() == self.ctx.modulus(),
            "test polynomial does not live in the ring of this parameter set"
        );

        let two_n = 2 * self.params.ring_dim as u64;
        let body_rotation = ((self.lwe_q.scale_to(ct.b, two_n)
            + test_poly.rotation_offset() as u64)
            % two_n) as usize;
        let mask_rotations = ct
            .a
            .iter()
            .map(|&a_i| self.lwe_q.scale_to(a_i, two_n) as usize)
            .collect();

        debug!(
            lwe_dim = self.params.lwe_dim,
            ring_dim = self.params.ring_dim,
            body_rotation,
            "starting bootstrap"
        );

        Ok(BootstrapRun {
            engine: self,
            keys,
            test_poly,
            body_rotation,
            mask_rotations,
            state: RunState::Idle,
        })
    }

    /// Refresh a bit-encoded ciphertext; the output is bit-encoded.
    pub fn bootstrap(&self, ct: &LweCiphertext, keys: &EvaluationKeys) -> Result<LweCiphertext> {
        self.bootstrap_to(ct, Encoding::Bit, keys)
    }

    /// Refresh a ciphertext, decoding its phase with the bit window
    /// `[q/4, 3q/4)` and re-encoding the result under `encoding`.
    pub fn bootstrap_to(
        &self,
        ct: &LweCiphertext,
        encoding: Encoding,
        keys: &EvaluationKeys,
    ) -> Result<LweCiphertext> {
        self.start(ct, self.sign_test_polynomial(encoding), keys)?
            .finish()
    }

    /// Evaluate an arbitrary test polynomial on the phase of `ct`.
    pub fn programmable_bootstrap(
        &self,
        ct: &LweCiphertext,
        test_poly: &TestPolynomial,
        keys: &EvaluationKeys,
    ) -> Result<LweCiphertext> {
        self.start(ct, test_poly, keys)?.finish()
    }
}

/// One bootstrap invocation, advanced a stage at a time.
///
/// The accumulator is owned by the run and never shared.
#[derive(Debug)]
pub struct BootstrapRun<'a> {
    engine: &'a Bootstrapper,
    keys: &'a EvaluationKeys,
    test_poly: &'a TestPolynomial,
    /// `b̃ = round(b·2N/q) + rotation offset, mod 2N`
    body_rotation: usize,
    /// `ã_i = round(a_i·2N/q)`
    mask_rotations: Vec<usize>,
    state: RunState,
}

impl BootstrapRun<'_> {
    /// Current stage
    pub fn stage(&self) -> BootstrapStage {
        match &self.state {
            RunState::Idle => BootstrapStage::Idle,
            RunState::Init { .. } => BootstrapStage::Init,
            RunState::BlindRotate { round, .. } => BootstrapStage::BlindRotate { round: *round },
            RunState::Extract { .. } => BootstrapStage::Extract,
            RunState::KeySwitch { .. } => BootstrapStage::KeySwitch,
            RunState::Done { .. } => BootstrapStage::Done,
        }
    }

    /// Result, once the run is [`Done`](BootstrapStage::Done)
    pub fn output(&self) -> Option<&LweCiphertext> {
        match &self.state {
            RunState::Done { output } => Some(output),
            _ => None,
        }
    }

    /// Rotation amounts `(b̃, [ã_0, …, ã_{n-1}])` derived from the input
    pub fn rotations(&self) -> (usize, &[usize]) {
        (self.body_rotation, &self.mask_rotations)
    }

    /// Perform the next stage and return it. A step from `Done` discards
    /// the output and returns to `Idle`. A failed step leaves the run at
    /// the stage it was in.
    pub fn step(&mut self) -> Result<BootstrapStage> {
        let next = match &self.state {
            RunState::Idle => RunState::Init {
                acc: self.init_accumulator(),
            },
            RunState::Init { acc } => RunState::BlindRotate {
                round: 0,
                acc: self.rotate(0, acc)?,
            },
            RunState::BlindRotate { round, acc } if round + 1 < self.mask_rotations.len() => {
                RunState::BlindRotate {
                    round: round + 1,
                    acc: self.rotate(round + 1, acc)?,
                }
            }
            RunState::BlindRotate { acc, .. } => RunState::Extract {
                extracted: acc.sample_extract(0)?,
            },
            RunState::Extract { extracted } => RunState::KeySwitch {
                output: self.switch_keys(extracted)?,
            },
            RunState::KeySwitch { output } => RunState::Done {
                output: output.clone(),
            },
            RunState::Done { .. } => RunState::Idle,
        };
        self.state = next;

        let stage = self.stage();
        trace!(%stage, "bootstrap step");
        Ok(stage)
    }

    /// Run the remaining stages and return the result.
    pub fn finish(mut self) -> Result<LweCiphertext> {
        while self.stage() != BootstrapStage::Done {
            self.step()?;
        }
        match self.state {
            RunState::Done { output } => Ok(output),
            _ => Err(config_err!("bootstrap run stopped before producing output")),
        }
    }

    /// `(0, X^{b̃} · TP)`
    fn init_accumulator(&self) -> RlweCiphertext {
        RlweCiphertext::trivial(self.test_poly.poly().mul_monomial(self.body_rotation))
    }

    /// `acc ← CMUX(BSK_i, acc, X^{−ã_i} · acc)`
    fn rotate(&self, i: usize, acc: &RlweCiphertext) -> Result<RlweCiphertext> {
        let ctx = self.engine.ntt_context();
        let two_n = 2 * ctx.dimension();
        let bsk_i = self
            .keys
            .bootstrapping
            .get(i)
            .ok_or_else(|| config_err!("bootstrapping key has no entry {i}"))?;
        let rotated = acc.mul_by_monomial((two_n - self.mask_rotations[i]) % two_n);
        cmux(bsk_i, acc, &rotated, ctx)
    }

    /// Modulus switch Q → q, key switch N → n, add the output offset.
    fn switch_keys(&self, extracted: &LweCiphertext) -> Result<LweCiphertext> {
        let lwe_q = *self.engine.lwe_modulus();
        let switched = key_switch(&extracted.mod_switch(lwe_q), &self.keys.key_switching)?;
        Ok(switched.add_constant(self.test_poly.output_offset()))
    }
}
