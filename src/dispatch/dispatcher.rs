//! Single-flight command dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use super::command::{Opcode, Request, Response};
use crate::bootstrap::{Bootstrapper, KeySet};
use crate::error::{config_err, ensure, FheError, Result};
use crate::gate::GateEvaluator;
use crate::lwe::LweCiphertext;
use crate::params::Params;

/// Routes requests to the engine, one at a time.
///
/// A request that arrives while another is in flight is rejected with
/// [`FheError::Busy`] rather than queued. Keys are published as an
/// immutable `Arc<KeySet>`; a request holds its own `Arc` for its whole
/// duration, so a concurrent key load never changes keys mid-computation.
#[derive(Debug)]
pub struct Dispatcher {
    bootstrapper: Bootstrapper,
    keys: RwLock<Option<Arc<KeySet>>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the request finishes, including on error.
#[derive(Debug)]
pub(crate) struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(params: Params) -> Result<Self> {
        Ok(Self {
            bootstrapper: Bootstrapper::new(params)?,
            keys: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Build a dispatcher around an existing engine, e.g. one with a
    /// parallel NTT strategy.
    pub fn with_bootstrapper(bootstrapper: Bootstrapper) -> Self {
        Self {
            bootstrapper,
            keys: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn params(&self) -> &Params {
        self.bootstrapper.params()
    }

    /// Currently published key set, if any
    ///
    /// # Errors
    ///
    /// Configuration error if the key store lock was poisoned by a panic.
    pub fn keys(&self) -> Result<Option<Arc<KeySet>>> {
        let slot = self
            .keys
            .read()
            .map_err(|_| config_err!("key store lock poisoned"))?;
        Ok(slot.clone())
    }

    /// Execute one request.
    ///
    /// # Errors
    ///
    /// - [`FheError::Busy`] if another request is in flight
    /// - [`FheError::Configuration`] if no key set is loaded yet, or the
    ///   payload does not fit the parameter set
    pub fn dispatch(&self, request: Request) -> Result<Response> {
        let opcode = request.opcode();
        let _guard = self.try_acquire().inspect_err(|_| {
            warn!(%opcode, "rejected: request already in flight");
        })?;
        debug!(%opcode, "dispatching request");

        match request {
            Request::LoadKey { keys } => self.load_keys(*keys),
            Request::Encrypt { bit, mask, noise } => {
                let keys = self.current_keys(opcode)?;
                ensure!(
                    mask.len() == self.params().lwe_dim,
                    "ENCRYPT mask has {} entries, expected n = {}",
                    mask.len(),
                    self.params().lwe_dim
                );
                let ct = LweCiphertext::encrypt(
                    keys.secret_key(),
                    mask,
                    noise,
                    bit,
                    *self.bootstrapper.lwe_modulus(),
                )?;
                Ok(Response::Ciphertext(ct))
            }
            Request::Decrypt { ciphertext } => {
                let keys = self.current_keys(opcode)?;
                self.params().check_ciphertext(&ciphertext)?;
                Ok(Response::Bit(ciphertext.decrypt(keys.secret_key())?))
            }
            Request::Gate { gate, operands } => {
                let keys = self.current_keys(opcode)?;
                let evaluator = GateEvaluator::new(&self.bootstrapper, keys.evaluation())?;
                Ok(Response::Ciphertext(evaluator.apply(gate, &operands)?))
            }
            Request::Bootstrap { ciphertext } => {
                let keys = self.current_keys(opcode)?;
                let refreshed = self
                    .bootstrapper
                    .bootstrap(&ciphertext, keys.evaluation())?;
                Ok(Response::Ciphertext(refreshed))
            }
        }
    }

    /// Claim the single in-flight slot.
    pub(crate) fn try_acquire(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| FheError::Busy)?;
        Ok(InFlight {
            flag: &self.in_flight,
        })
    }

    fn current_keys(&self, opcode: Opcode) -> Result<Arc<KeySet>> {
        self.keys()?
            .ok_or_else(|| config_err!("{opcode} before any key set was loaded"))
    }

    fn load_keys(&self, keys: KeySet) -> Result<Response> {
        ensure!(
            keys.params() == self.params(),
            "key set parameters do not match the dispatcher's parameter set"
        );
        self.bootstrapper.check_keys(keys.evaluation())?;

        let mut slot = self
            .keys
            .write()
            .map_err(|_| config_err!("key store lock poisoned"))?;
        *slot = Some(Arc::new(keys));
        info!(
            lwe_dim = self.params().lwe_dim,
            ring_dim = self.params().ring_dim,
            "key set loaded"
        );
        Ok(Response::KeyLoaded)
    }
}
