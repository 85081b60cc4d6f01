use std::path::{Path, PathBuf};
use swaratone::core::config::read_params_json;
use swaratone::io::{decode_file, write_wav_file};
use swaratone::{BitDepth, HpssParams, MaskPolicy, Signal};

/// Options gathered from the command line.
#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    input: PathBuf,
    output_dir: PathBuf,
    binary: bool,
    config: Option<PathBuf>,
    threads: Option<usize>,
    bits: Option<BitDepth>,
    window: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Run(CliOptions),
    Help,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_usage();
            return;
        }
        Err(msg) => {
            log::error!("{}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    let params = match build_params(&options) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Invalid parameters: {}", e);
            std::process::exit(1);
        }
    };

    let buffer = match decode_file(&options.input) {
        Ok(b) => b,
        Err(e) => {
            log::error!("Failed to read {}: {}", options.input.display(), e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Input: {} frames, {} Hz, {:?}, {:.2}s",
        buffer.num_frames(),
        buffer.sample_rate,
        buffer.channels,
        buffer.duration_secs()
    );

    let start = std::time::Instant::now();
    let separation = match swaratone::separate_buffer(&buffer, &params) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Separation failed: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed().as_secs_f64();
    let realtime_factor = if elapsed > 0.0 {
        buffer.duration_secs() / elapsed
    } else {
        f64::INFINITY
    };
    log::info!(
        "Processing time: {:.3}s ({:.1}x realtime)",
        elapsed,
        realtime_factor
    );

    // Each output is written independently; one failure does not stop the other.
    let harmonic_ok = write_output(
        &options.output_dir,
        "harmonic.wav",
        separation.harmonic,
        params.output_bits,
    );
    let percussive_ok = write_output(
        &options.output_dir,
        "percussive.wav",
        separation.percussive,
        params.output_bits,
    );
    if !harmonic_ok && !percussive_ok {
        std::process::exit(1);
    }
}

fn write_output(dir: &Path, name: &str, signal: Signal, bits: BitDepth) -> bool {
    let path = dir.join(name);
    match write_wav_file(&path, &signal.into_buffer(), bits) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to write {}: {}", path.display(), e);
            false
        }
    }
}

/// Loads the config file if given, then applies command-line overrides.
fn build_params(options: &CliOptions) -> swaratone::Result<HpssParams> {
    let mut params = match &options.config {
        Some(path) => read_params_json(path)?,
        None => HpssParams::default(),
    };
    if let Some(window) = options.window {
        params.window_size = window;
    }
    if options.binary {
        params.mask = MaskPolicy::Binary;
    }
    if let Some(threads) = options.threads {
        params.max_threads = threads;
    }
    if let Some(bits) = options.bits {
        params.output_bits = bits;
    }
    params.validate()?;
    log::debug!("Parameters: {}", params);
    Ok(params)
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut input: Option<PathBuf> = None;
    let mut output_dir = PathBuf::from(".");
    let mut binary = false;
    let mut config: Option<PathBuf> = None;
    let mut threads: Option<usize> = None;
    let mut bits: Option<BitDepth> = None;
    let mut window: Option<usize> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-f" | "--file" => {
                i += 1;
                input = Some(PathBuf::from(value(args, i, "file")?));
            }
            "-o" | "--output" => {
                i += 1;
                output_dir = PathBuf::from(value(args, i, "output")?);
            }
            "--binary" => binary = true,
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(value(args, i, "config")?));
            }
            "--threads" => {
                i += 1;
                threads = Some(parse_usize(args, i, "threads")?);
            }
            "--window" => {
                i += 1;
                window = Some(parse_usize(args, i, "window")?);
            }
            "--bits" => {
                i += 1;
                bits = Some(parse_bits(value(args, i, "bits")?)?);
            }
            other => return Err(format!("Unrecognized argument '{}'", other)),
        }
        i += 1;
    }

    let input = input.ok_or_else(|| "An input file is required (-f <path>)".to_string())?;
    Ok(Command::Run(CliOptions {
        input,
        output_dir,
        binary,
        config,
        threads,
        bits,
        window,
    }))
}

fn value<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str, String> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| format!("--{} requires a value", name))
}

fn parse_usize(args: &[String], idx: usize, name: &str) -> Result<usize, String> {
    let raw = value(args, idx, name)?;
    raw.parse()
        .map_err(|_| format!("Invalid {}: {}", name, raw))
}

fn parse_bits(raw: &str) -> Result<BitDepth, String> {
    match raw {
        "8" => Ok(BitDepth::Eight),
        "16" => Ok(BitDepth::Sixteen),
        "32" => Ok(BitDepth::ThirtyTwo),
        other => Err(format!("Unsupported bit depth '{}' (use 8, 16 or 32)", other)),
    }
}

fn print_usage() {
    println!("Usage: swaratone -f <input> [options]");
    println!();
    println!("Splits an audio file into harmonic.wav and percussive.wav.");
    println!();
    println!("Options:");
    println!("  -f, --file <path>    Input audio (WAV, MP3, FLAC, Ogg Vorbis)");
    println!("  -o, --output <dir>   Output directory (default: .)");
    println!("  --binary             Use a binary mask instead of the soft mask");
    println!("  --config <json>      Load separation parameters from a JSON file");
    println!("  --window <n>         STFT window size, a power of two (default: 4096)");
    println!("  --threads <n>        Maximum worker threads (default: all cores)");
    println!("  --bits <8|16|32>     Output PCM bit depth (default: 16)");
    println!("  -h, --help           Show this help");
    println!();
    println!("Set RUST_LOG=debug for per-stage detail.");
}
