//! Gate evaluation on bit-encoded ciphertexts.

use rayon::prelude::*;
use tracing::debug;

use super::{linear, Gate};
use crate::bootstrap::{Bootstrapper, EvaluationKeys};
use crate::error::{ensure, Result};
use crate::lwe::{Encoding, LweCiphertext};

/// Evaluates gates over shared read-only keys.
///
/// Inputs and outputs are bit-encoded (`1 ↦ q/2`), so every result
/// decrypts with [`LweCiphertext::decrypt`] and can feed the next gate.
/// Bootstrap gates first lift their operands into the gate encoding with a
/// sign bootstrap, apply the [`linear`] combination, then refresh the
/// result back to the bit encoding.
#[derive(Clone, Copy, Debug)]
pub struct GateEvaluator<'a> {
    bootstrapper: &'a Bootstrapper,
    keys: &'a EvaluationKeys,
}

impl<'a> GateEvaluator<'a> {
    /// Bind an engine to its keys, checking the keys once up front.
    pub fn new(bootstrapper: &'a Bootstrapper, keys: &'a EvaluationKeys) -> Result<Self> {
        bootstrapper.check_keys(keys)?;
        Ok(Self { bootstrapper, keys })
    }

    pub fn bootstrapper(&self) -> &'a Bootstrapper {
        self.bootstrapper
    }

    /// Refresh a bit-encoded ciphertext.
    pub fn bootstrap(&self, ct: &LweCiphertext) -> Result<LweCiphertext> {
        self.bootstrapper.bootstrap(ct, self.keys)
    }

    /// Evaluate `gate` on `operands` (`[sel, c0, c1]` for MUX).
    pub fn apply(&self, gate: Gate, operands: &[LweCiphertext]) -> Result<LweCiphertext> {
        ensure!(
            operands.len() == gate.arity(),
            "{gate} takes {} operands, got {}",
            gate.arity(),
            operands.len()
        );
        let params = self.bootstrapper.params();
        for ct in operands {
            params.check_ciphertext(ct)?;
        }

        match gate {
            Gate::Not => Ok(self.not(&operands[0])),
            Gate::Xor => operands[0].add(&operands[1]),
            Gate::Xnor => Ok(linear::complement(
                &operands[0].add(&operands[1])?,
                Encoding::Bit,
            )),
            Gate::And => self.sign_gate(&operands[0], &operands[1], linear::and),
            Gate::Or => self.sign_gate(&operands[0], &operands[1], linear::or),
            Gate::Nand => self.sign_gate(&operands[0], &operands[1], linear::nand),
            Gate::Nor => Ok(linear::complement(
                &self.sign_gate(&operands[0], &operands[1], linear::or)?,
                Encoding::Bit,
            )),
            Gate::Mux => self.mux(&operands[0], &operands[1], &operands[2]),
        }
    }

    /// `(0, q/2) − c`; no bootstrap.
    pub fn not(&self, c: &LweCiphertext) -> LweCiphertext {
        linear::complement(c, Encoding::Bit)
    }

    /// `sel ? c1 : c0` as `AND(sel, c1) + AND(NOT sel, c0)`.
    ///
    /// Both AND terms are refreshed into the gate encoding; at most one of
    /// them is `q/4`, so doubling their sum gives a bit-encoded result.
    pub fn mux(
        &self,
        sel: &LweCiphertext,
        c0: &LweCiphertext,
        c1: &LweCiphertext,
    ) -> Result<LweCiphertext> {
        let lifted = [sel, c0, c1]
            .par_iter()
            .map(|ct| self.lift(ct))
            .collect::<Result<Vec<_>>>()?;
        let (s, a0, a1) = (&lifted[0], &lifted[1], &lifted[2]);

        let (t1, t0) = rayon::join(
            || self.refresh(&linear::and(s, a1)?, Encoding::Gate),
            || self.refresh(&linear::and(&linear::not(s), a0)?, Encoding::Gate),
        );
        Ok(t0?.add(&t1?)?.scalar_mul(2))
    }

    /// Evaluate independent gates in parallel.
    pub fn apply_batch(
        &self,
        requests: &[(Gate, Vec<LweCiphertext>)],
    ) -> Result<Vec<LweCiphertext>> {
        debug!(gates = requests.len(), "evaluating gate batch");
        requests
            .par_iter()
            .map(|(gate, operands)| self.apply(*gate, operands))
            .collect()
    }

    /// Lift both operands, combine, refresh to the bit encoding.
    fn sign_gate<F>(&self, c1: &LweCiphertext, c2: &LweCiphertext, combine: F) -> Result<LweCiphertext>
    where
        F: Fn(&LweCiphertext, &LweCiphertext) -> Result<LweCiphertext>,
    {
        let (l1, l2) = rayon::join(|| self.lift(c1), || self.lift(c2));
        self.refresh(&combine(&l1?, &l2?)?, Encoding::Bit)
    }

    /// Bit encoding → gate encoding
    fn lift(&self, ct: &LweCiphertext) -> Result<LweCiphertext> {
        self.refresh(ct, Encoding::Gate)
    }

    fn refresh(&self, ct: &LweCiphertext, encoding: Encoding) -> Result<LweCiphertext> {
        self.bootstrapper.bootstrap_to(ct, encoding, self.keys)
    }
}
