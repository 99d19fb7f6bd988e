//! tfhe-gate: evaluate homomorphic gates end to end
//!
//! Builds seeded toy keys, loads them through the dispatcher, encrypts the
//! input bits, evaluates one gate (or all of them), decrypts and prints a
//! JSON report.

mod keygen;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use eyre::{Context, Result};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tfhe_engine::bootstrap::Bootstrapper;
use tfhe_engine::dispatch::{Dispatcher, Request};
use tfhe_engine::gate::Gate;
use tfhe_engine::lwe::LweCiphertext;
use tfhe_engine::math::NttStrategy;
use tfhe_engine::params::Params;

#[derive(Parser)]
#[command(name = "tfhe-gate")]
#[command(about = "Evaluate homomorphic Boolean gates with bootstrapping")]
#[command(version)]
struct Args {
    /// Gate to evaluate (not, and, or, xor, nand, nor, xnor, mux)
    #[arg(long, default_value = "and")]
    gate: Gate,

    /// Evaluate every gate on the same inputs
    #[arg(long)]
    all: bool,

    /// First input bit
    #[arg(long, default_value_t = 1)]
    lhs: u8,

    /// Second input bit
    #[arg(long, default_value_t = 0)]
    rhs: u8,

    /// Selector bit for mux
    #[arg(long, default_value_t = 1)]
    sel: u8,

    /// Parameter preset (toy, demo)
    #[arg(long, default_value = "toy")]
    preset: String,

    /// JSON parameter file, overrides --preset
    #[arg(long)]
    params: Option<PathBuf>,

    /// Seed for key material and encryption randomness
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// NTT scheduling
    #[arg(long, value_enum, default_value_t = Strategy::Sequential)]
    strategy: Strategy,

    /// Write the generated key set (bincode) to this path
    #[arg(long)]
    save_keys: Option<PathBuf>,

    /// Log every bootstrap stage
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Sequential,
    Parallel,
}

impl From<Strategy> for NttStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Sequential => NttStrategy::Sequential,
            Strategy::Parallel => NttStrategy::Parallel,
        }
    }
}

#[derive(Serialize)]
struct GateReport {
    gate: String,
    inputs: Vec<u8>,
    expected: u8,
    decrypted: u8,
    millis: f64,
}

#[derive(Serialize)]
struct Report {
    params: Params,
    seed: u64,
    results: Vec<GateReport>,
    all_correct: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::TRACE } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let params = load_params(&args)?;
    params
        .validate()
        .map_err(|e| eyre::eyre!("Invalid parameters: {}", e))?;
    info!(
        "Parameters: n={}, q={}, N={}, Q={}",
        params.lwe_dim, params.lwe_q, params.ring_dim, params.ring_q
    );

    for bit in [args.lhs, args.rhs, args.sel] {
        if bit > 1 {
            return Err(eyre::eyre!("Input bits must be 0 or 1, got {}", bit));
        }
    }

    let mut rng = keygen::seeded_rng(args.seed);
    let keygen_start = Instant::now();
    let keys = keygen::generate(&params, &mut rng)?;
    info!("Key generation time: {:.2?}", keygen_start.elapsed());

    if let Some(path) = &args.save_keys {
        let bytes = keys.to_bytes()?;
        fs::write(path, &bytes)
            .with_context(|| format!("Failed to write keys to {}", path.display()))?;
        info!("Saved {} bytes of key material to {}", bytes.len(), path.display());
    }

    let engine = Bootstrapper::new(params)?.with_strategy(args.strategy.into());
    let dispatcher = Dispatcher::with_bootstrapper(engine);
    dispatcher.dispatch(Request::LoadKey {
        keys: Box::new(keys),
    })?;

    let gates: Vec<Gate> = if args.all {
        Gate::ALL.to_vec()
    } else {
        vec![args.gate]
    };

    let mut results = Vec::with_capacity(gates.len());
    for gate in gates {
        let inputs = match gate.arity() {
            1 => vec![args.lhs],
            2 => vec![args.lhs, args.rhs],
            _ => vec![args.sel, args.rhs, args.lhs],
        };
        let operands = inputs
            .iter()
            .map(|&bit| encrypt(&dispatcher, &mut rng, bit))
            .collect::<Result<Vec<_>>>()?;

        let start = Instant::now();
        let output = dispatcher
            .dispatch(Request::Gate { gate, operands })?
            .into_ciphertext()
            .ok_or_else(|| eyre::eyre!("{} returned no ciphertext", gate))?;
        let elapsed = start.elapsed();

        let decrypted = dispatcher
            .dispatch(Request::Decrypt { ciphertext: output })?
            .bit()
            .ok_or_else(|| eyre::eyre!("DECRYPT returned no bit"))?;
        let expected = gate.truth(&inputs)?;
        info!("{}({:?}) = {} in {:.2?}", gate, inputs, decrypted, elapsed);

        results.push(GateReport {
            gate: gate.to_string(),
            inputs,
            expected,
            decrypted,
            millis: elapsed.as_secs_f64() * 1e3,
        });
    }

    let report = Report {
        params,
        seed: args.seed,
        all_correct: results.iter().all(|r| r.expected == r.decrypted),
        results,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.all_correct {
        return Err(eyre::eyre!("Decrypted output differs from the truth table"));
    }
    Ok(())
}

fn load_params(args: &Args) -> Result<Params> {
    match &args.params {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse parameters in {}", path.display()))
        }
        None => Params::preset(&args.preset)
            .ok_or_else(|| eyre::eyre!("Unknown preset '{}'. Use toy or demo", args.preset)),
    }
}

fn encrypt(dispatcher: &Dispatcher, rng: &mut ChaCha20Rng, bit: u8) -> Result<LweCiphertext> {
    let params = dispatcher.params();
    let mask = (0..params.lwe_dim)
        .map(|_| rng.gen_range(0..params.lwe_q))
        .collect();
    let noise = rng.gen_range(-4..=4);
    dispatcher
        .dispatch(Request::Encrypt { bit, mask, noise })?
        .into_ciphertext()
        .ok_or_else(|| eyre::eyre!("ENCRYPT returned no ciphertext"))
}
