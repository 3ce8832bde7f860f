use clap::{Args, Parser, Subcommand};
use hound::WavSpec;
use log::{debug, warn};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tonelink_core::bits::{parse_bits, render_bits};
use tonelink_core::{Frame, FrameDecoder, FrameEncoder, FskConfig, Receiver, TonelinkError, Transmitter};

#[derive(Parser)]
#[command(name = "tonelink")]
#[command(about = "Send short addressed messages as FSK audio frames")]
struct Cli {
    /// Log decoder decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a message into a frame, printed as a 0/1 string
    Encode {
        source: u64,
        target: u64,
        message: String,
    },

    /// Decode a frame given as a 0/1 string
    Decode {
        bits: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode a message and write it as FSK audio to a WAV file
    Send {
        source: u64,
        target: u64,
        message: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        #[command(flatten)]
        fsk: FskArgs,
    },

    /// Recover a message from a WAV recording
    Receive {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        fsk: FskArgs,
    },
}

#[derive(Args)]
struct FskArgs {
    /// Bits per second (must divide the sample rate)
    #[arg(short = 't', long, default_value = "100")]
    bit_rate: u32,

    /// Tone for bit 0, in Hz
    #[arg(long, default_value = "1000")]
    f0: f32,

    /// Tone for bit 1, in Hz
    #[arg(long, default_value = "2000")]
    f1: f32,

    /// Sample rate for sending; receiving uses the WAV header
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Accepted frequency error in Hz (default: half an FFT bin)
    #[arg(long)]
    tolerance: Option<f32>,
}

impl FskArgs {
    fn to_config(&self) -> FskConfig {
        FskConfig {
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            f0: self.f0,
            f1: self.f1,
            tolerance: self.tolerance,
            ..FskConfig::default()
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("decoding message unsuccessful: {0}")]
    NoFrame(#[source] TonelinkError),
}

#[derive(Serialize)]
struct Decoded {
    source: u64,
    target: u64,
    message: String,
}

impl From<&Frame> for Decoded {
    fn from(frame: &Frame) -> Self {
        Self {
            source: frame.source,
            target: frame.target,
            message: frame.payload_text(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Encode {
            source,
            target,
            message,
        } => encode_command(source, target, &message)?,
        Commands::Decode { bits, json } => decode_command(&bits, json)?,
        Commands::Send {
            source,
            target,
            message,
            output,
            fsk,
        } => send_command(source, target, &message, &output, fsk.to_config())?,
        Commands::Receive { input, json, fsk } => receive_command(&input, json, fsk.to_config())?,
    }

    Ok(())
}

fn encode_command(source: u64, target: u64, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let frame = Frame::from_text(source, target, message)?;
    let bits = FrameEncoder::encode(&frame)?;
    println!("{}", render_bits(&bits));
    Ok(())
}

fn decode_command(text: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bits = parse_bits(text)?;
    let frame = FrameDecoder::decode(&bits).map_err(CliError::NoFrame)?;
    print_frame(&frame, json)
}

fn send_command(
    source: u64,
    target: u64,
    message: &str,
    output_path: &Path,
    config: FskConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let transmitter = Transmitter::new(config)?;
    let samples = transmitter.transmit_text(source, target, message)?;

    // Write WAV file (16-bit PCM)
    let spec = WavSpec {
        channels: 1,
        sample_rate: transmitter.config().sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let file = File::create(output_path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;

    for sample in &samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    println!("Wrote {} samples to {}", samples.len(), output_path.display());
    Ok(())
}

fn receive_command(input_path: &Path, json: bool, mut config: FskConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;

    let spec = reader.spec();
    debug!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    // Extract samples (handle both 16-bit and 32-bit float formats)
    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?.into_iter().map(|s| s as f32 / 32768.0).collect()
        }
        (hound::SampleFormat::Float, 32) => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        (_, bits) => return Err(CliError::UnsupportedBitDepth(bits).into()),
    };

    // first channel only
    let samples: Vec<f32> = interleaved
        .into_iter()
        .step_by(spec.channels.max(1) as usize)
        .collect();

    if spec.sample_rate != config.sample_rate {
        warn!(
            "using WAV sample rate {} Hz instead of {} Hz",
            spec.sample_rate, config.sample_rate
        );
        config.sample_rate = spec.sample_rate;
    }

    let receiver = Receiver::new(config)?;
    let frame = receiver.receive(&samples).map_err(CliError::NoFrame)?;
    print_frame(&frame, json)
}

fn print_frame(frame: &Frame, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&Decoded::from(frame))?);
    } else {
        println!("{} {} {}", frame.source, frame.target, frame.payload_text());
    }
    Ok(())
}
