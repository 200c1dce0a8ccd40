use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use transformer_kernels::{
    rms_norm, self_attention, swiglu, AttentionScaling, ConfigError, KernelConfig, Matrix, MaxInit,
    SwiGluWeights,
};

#[derive(Parser, Debug)]
#[command(
    name = "transformer_kernels",
    version,
    about = "Run dense transformer kernels on random or JSON inputs"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Seed for randomly generated inputs
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,

    /// Kernel config (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read the kernel inputs from a JSON file instead of generating them
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Divide attention scores by sqrt(head_dim)
    #[arg(long, global = true)]
    scaled: bool,

    /// Start the softmax running max at 1.0, like the legacy kernel
    #[arg(long, global = true)]
    legacy_softmax: bool,

    /// RMSNorm epsilon
    #[arg(long, global = true)]
    epsilon: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// softmax(Q·Kᵀ)·V for a single head
    Attention {
        #[arg(long, default_value_t = 4)]
        seq_len: usize,
        #[arg(long, default_value_t = 8)]
        head_dim: usize,
    },
    /// Row-wise RMSNorm with one weight row per input row
    RmsNorm {
        #[arg(long, default_value_t = 2)]
        rows: usize,
        #[arg(long, default_value_t = 8)]
        cols: usize,
    },
    /// Swish(W1·x + b) ⊗ (V·x + c)
    Swiglu {
        #[arg(long, default_value_t = 8)]
        hidden: usize,
        #[arg(long, default_value_t = 16)]
        ffn: usize,
    },
}

#[derive(Deserialize)]
struct AttentionInput {
    q: Matrix,
    k: Matrix,
    v: Matrix,
}

#[derive(Deserialize)]
struct RmsNormInput {
    input: Matrix,
    weight: Matrix,
}

#[derive(Deserialize)]
struct SwigluInput {
    input: Vec<f32>,
    w1: Matrix,
    b: Vec<f32>,
    v: Matrix,
    c: Vec<f32>,
    beta: Vec<f32>,
}

#[derive(Serialize)]
struct Report<T: Serialize> {
    kernel: &'static str,
    config: KernelConfig,
    output: T,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli.common)?;
    let mut rng = StdRng::seed_from_u64(cli.common.seed);
    let input_path = cli.common.input.as_deref();

    match cli.command {
        Command::Attention { seq_len, head_dim } => {
            let AttentionInput { q, k, v } = match input_path {
                Some(path) => load_json(path)?,
                None => AttentionInput {
                    q: Matrix::random(seq_len, head_dim, &mut rng)?,
                    k: Matrix::random(seq_len, head_dim, &mut rng)?,
                    v: Matrix::random(seq_len, head_dim, &mut rng)?,
                },
            };
            info!("Running attention on Q {:?}", q.shape());
            let (rows, cols) = q.shape();
            let mut output = Matrix::zeros(rows, cols)?;
            self_attention(&q, &k, &v, &config, &mut output)?;
            print_report("attention", config, output)
        }
        Command::RmsNorm { rows, cols } => {
            let RmsNormInput { input, weight } = match input_path {
                Some(path) => load_json(path)?,
                None => RmsNormInput {
                    input: Matrix::random(rows, cols, &mut rng)?,
                    weight: Matrix::random(rows, cols, &mut rng)?,
                },
            };
            info!("Running rms_norm on {:?}", input.shape());
            let (rows, cols) = input.shape();
            let mut output = Matrix::zeros(rows, cols)?;
            rms_norm(&input, &weight, config.rms_epsilon, &mut output)?;
            print_report("rms_norm", config, output)
        }
        Command::Swiglu { hidden, ffn } => {
            let raw = match input_path {
                Some(path) => load_json(path)?,
                None => SwigluInput {
                    input: Matrix::random(1, hidden, &mut rng)?.into_vec(),
                    w1: Matrix::random(ffn, hidden, &mut rng)?,
                    b: Matrix::random(1, ffn, &mut rng)?.into_vec(),
                    v: Matrix::random(ffn, hidden, &mut rng)?,
                    c: Matrix::random(1, ffn, &mut rng)?.into_vec(),
                    // beta = 1 everywhere gives SiLU gating
                    beta: vec![1.0; ffn],
                },
            };
            let weights = SwiGluWeights::new(raw.w1, raw.b, raw.v, raw.c, raw.beta)?;
            info!("Running swiglu {} -> {}", weights.input_dim(), weights.output_dim());
            let mut output = vec![0.0f32; weights.output_dim()];
            swiglu(&raw.input, &weights, &mut output)?;
            print_report("swiglu", config, output)
        }
    }
}

/// Defaults, then the config file, then command-line overrides
fn resolve_config(args: &CommonArgs) -> Result<KernelConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => KernelConfig::from_json_file(path)?,
        None => KernelConfig::default(),
    };
    if args.scaled {
        config.attention_scaling = AttentionScaling::InverseSqrtHeadDim;
    }
    if args.legacy_softmax {
        config.softmax_max_init = MaxInit::LegacyOne;
    }
    if let Some(epsilon) = args.epsilon {
        config.rms_epsilon = epsilon;
    }
    config.validate()?;
    Ok(config)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read input {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse input {}: {}", path.display(), e))?;
    Ok(value)
}

fn print_report<T: Serialize>(
    kernel: &'static str,
    config: KernelConfig,
    output: T,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report { kernel, config, output };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
