//! UART Capture Toolkit Command-Line Interface
//!
//! This CLI provides tools for:
//! - Synthesizing UART captures from messages
//! - Decoding captured waveforms into words
//! - Injecting bit errors and checking what the decoder reports
//! - Generating the reference demo capture
//!
//! Captures are stored in the simple one-byte-per-sample format
//! implemented in [`capture_file`].

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uartscan_core::{
    format_word, BitOrder, CaptureBuffer, CaptureSource, DecodeStatus, FrameConfig, Inversion,
    Parity, SampleClock, StopBits, UartDecoder, UartEncoder, WordCollector, WordFormat,
};

mod capture_file;

/// Idle bit periods emitted before the first frame.
const LEAD_IN_PERIODS: u64 = 10;
/// Idle bit periods emitted after the last frame so its stop region and
/// the decoder's conservative sample budget are fully covered.
const TAIL_PERIODS: u64 = 10;

const DEMO_TEXT: &str = "Hello world, this is a test!";

#[derive(Parser)]
#[command(name = "uartscan")]
#[command(author, version, about = "UART capture decoder and waveform synthesizer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ParityArg {
    /// No parity bit
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl From<ParityArg> for Parity {
    fn from(value: ParityArg) -> Self {
        match value {
            ParityArg::None => Parity::None,
            ParityArg::Odd => Parity::Odd,
            ParityArg::Even => Parity::Even,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StopArg {
    /// One stop bit
    #[value(name = "1")]
    One,
    /// One and a half stop bits
    #[value(name = "1.5")]
    OneAndHalf,
    /// Two stop bits
    #[value(name = "2")]
    Two,
}

impl From<StopArg> for StopBits {
    fn from(value: StopArg) -> Self {
        match value {
            StopArg::One => StopBits::One,
            StopArg::OneAndHalf => StopBits::OneAndHalf,
            StopArg::Two => StopBits::Two,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    /// Least significant bit first
    Lsb,
    /// Most significant bit first
    Msb,
}

impl From<OrderArg> for BitOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Lsb => BitOrder::LsbFirst,
            OrderArg::Msb => BitOrder::MsbFirst,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InvertArg {
    /// Non-inverted logic
    None,
    /// All signals inverted
    All,
    /// Only data bits inverted
    Data,
}

impl From<InvertArg> for Inversion {
    fn from(value: InvertArg) -> Self {
        match value {
            InvertArg::None => Inversion::Normal,
            InvertArg::All => Inversion::AllInverted,
            InvertArg::Data => Inversion::DataOnlyInverted,
        }
    }
}

/// Framing parameters shared by every subcommand.
#[derive(Args, Clone, Copy, Debug)]
struct FramingArgs {
    /// Baud rate
    #[arg(long, default_value = "9600")]
    baud: u64,

    /// Bits per transfer (5-16)
    #[arg(long, default_value = "8")]
    width: u8,

    /// Parity bit
    #[arg(long, value_enum, default_value = "none")]
    parity: ParityArg,

    /// Stop bits
    #[arg(long, value_enum, default_value = "1")]
    stop: StopArg,

    /// Bit order
    #[arg(long, value_enum, default_value = "lsb")]
    order: OrderArg,

    /// Inverted logic
    #[arg(long, value_enum, default_value = "none")]
    invert: InvertArg,
}

impl FramingArgs {
    fn config(&self) -> Result<FrameConfig> {
        let config = FrameConfig::builder()
            .word_width(self.width)
            .parity(self.parity.into())
            .stop_bits(self.stop.into())
            .bit_order(self.order.into())
            .inversion(self.invert.into())
            .build()?;
        Ok(config)
    }
}

/// Output format flags shared by decode and simulate.
#[derive(Args, Clone, Copy, Debug)]
struct FormatArgs {
    /// Disable hexadecimal output
    #[arg(long)]
    no_hex: bool,

    /// Disable ASCII output
    #[arg(long)]
    no_ascii: bool,

    /// Add unsigned decimal output
    #[arg(long)]
    dec: bool,

    /// Add binary output
    #[arg(long)]
    bin: bool,
}

impl From<FormatArgs> for WordFormat {
    fn from(value: FormatArgs) -> Self {
        WordFormat {
            hex: !value.no_hex,
            ascii: !value.no_ascii,
            dec: value.dec,
            bin: value.bin,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a UART capture from a message
    Encode {
        /// Text to encode, one frame per character
        #[arg(short, long, conflicts_with = "hex")]
        message: Option<String>,

        /// Word values to encode, hex, separated by spaces or commas
        #[arg(long)]
        hex: Option<String>,

        /// Output capture file
        #[arg(short, long, default_value = "uart_capture.bin")]
        output: PathBuf,

        /// Capture sample rate in samples per second
        #[arg(long, default_value = "96000")]
        sample_rate: u64,

        /// Idle bit periods between frames
        #[arg(long, default_value = "1")]
        gap: u64,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Decode a UART capture into words
    Decode {
        /// Input capture file
        #[arg(short, long)]
        input: PathBuf,

        /// Emit words as JSON records
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Encode a message, inject bit errors, and decode the result
    Simulate {
        /// Text to encode
        #[arg(short, long)]
        message: String,

        /// Number of data bits to flip
        #[arg(long, default_value = "1")]
        flip_bits: u32,

        /// Seed for reproducible corruption
        #[arg(long)]
        seed: Option<u64>,

        /// Capture sample rate in samples per second
        #[arg(long, default_value = "96000")]
        sample_rate: u64,

        /// Idle bit periods between frames
        #[arg(long, default_value = "1")]
        gap: u64,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Write the reference demo capture (0xAA, 0x55, then a text banner)
    Demo {
        /// Output capture file
        #[arg(short, long, default_value = "uart_demo.bin")]
        output: PathBuf,

        /// Capture sample rate in samples per second
        #[arg(long, default_value = "96000")]
        sample_rate: u64,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Print framing and timing information
    Info {
        /// Capture sample rate in samples per second
        #[arg(long, default_value = "96000")]
        sample_rate: u64,

        #[command(flatten)]
        framing: FramingArgs,
    },
}

/// JSON record for one decoded word.
#[derive(Serialize)]
struct WordRecord {
    value: u16,
    text: String,
    parity_ok: bool,
    stop_ok: bool,
    start_sample: u64,
    end_sample: u64,
}

fn parse_hex_words(input: &str) -> Result<Vec<u16>> {
    input
        .split([' ', ','])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let digits = part.trim_start_matches("0x").trim_start_matches("0X");
            u16::from_str_radix(digits, 16)
                .with_context(|| format!("Invalid hex word '{part}'"))
        })
        .collect()
}

/// Encode `codes` with the standard lead-in, inter-frame gaps and tail.
fn encode_message(
    encoder: &UartEncoder,
    capture: &mut CaptureBuffer,
    codes: &[u16],
    gap: u64,
) {
    encoder.encode_idle(capture, LEAD_IN_PERIODS);
    for (i, &code) in codes.iter().enumerate() {
        if i > 0 && gap > 0 {
            encoder.encode_idle(capture, gap);
        }
        encoder.encode_word(capture, code);
    }
    encoder.encode_idle(capture, TAIL_PERIODS);
}

fn print_words(words: &WordCollector, config: &FrameConfig, format: WordFormat) {
    for word in &words.words {
        let mut flags = String::new();
        if !word.parity_ok {
            flags.push_str("  PARITY-ERROR");
        }
        if !word.stop_ok {
            flags.push_str("  NO-STOP");
        }
        println!(
            "{:>10} {:>10}  {}{}",
            word.start_sample,
            word.end_sample,
            format_word(word.value, config.word_width(), format),
            flags
        );
    }
}

fn error_counts(words: &WordCollector) -> (usize, usize) {
    let parity = words.words.iter().filter(|w| !w.parity_ok).count();
    let stop = words.words.iter().filter(|w| !w.stop_ok).count();
    (parity, stop)
}

fn cmd_encode(
    message: Option<String>,
    hex: Option<String>,
    output: PathBuf,
    sample_rate: u64,
    gap: u64,
    framing: FramingArgs,
) -> Result<()> {
    let config = framing.config()?;
    let clock = SampleClock::new(sample_rate, framing.baud)?;

    let codes: Vec<u16> = match (message, hex) {
        (Some(text), None) => text.chars().map(|c| c as u16).collect(),
        (None, Some(hex)) => parse_hex_words(&hex)?,
        _ => bail!("Provide a message with --message or word values with --hex"),
    };
    if codes.is_empty() {
        bail!("Nothing to encode");
    }

    info!("Encoding {} words: {}", codes.len(), config);
    let encoder = UartEncoder::new(config, clock);
    let mut capture = CaptureBuffer::new(sample_rate);
    encode_message(&encoder, &mut capture, &codes, gap);

    info!(
        "Generated {} samples ({:.3} ms at {} samples/s)",
        capture.available_samples(),
        capture.available_samples() as f64 / sample_rate as f64 * 1000.0,
        sample_rate
    );
    capture_file::write_capture(&output, sample_rate, capture.samples())?;
    info!("Wrote capture to {:?}", output);

    Ok(())
}

fn cmd_decode(input: PathBuf, json: bool, format: FormatArgs, framing: FramingArgs) -> Result<()> {
    let config = framing.config()?;
    let (sample_rate, levels) = capture_file::read_capture(&input)?;
    info!(
        "Read {} samples at {} samples/s from {:?}",
        levels.len(),
        sample_rate,
        input
    );
    let clock = SampleClock::new(sample_rate, framing.baud)?;

    let mut capture = CaptureBuffer::new(sample_rate);
    capture.push_samples(&levels);

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = abort.clone();
        ctrlc::set_handler(move || abort.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let mut decoder = UartDecoder::new(config, clock);
    let mut words = WordCollector::new();
    if decoder.poll(&mut capture, &mut words, &abort) == DecodeStatus::Aborted {
        warn!("Decode aborted at sample {}", decoder.cursor());
    }

    let word_format = WordFormat::from(format);
    if json {
        let records: Vec<WordRecord> = words
            .words
            .iter()
            .map(|w| WordRecord {
                value: w.value,
                text: format_word(w.value, config.word_width(), word_format),
                parity_ok: w.parity_ok,
                stop_ok: w.stop_ok,
                start_sample: w.start_sample,
                end_sample: w.end_sample,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_words(&words, &config, word_format);
    }

    let (parity_errors, stop_errors) = error_counts(&words);
    info!(
        "Decoded {} words ({} parity errors, {} stop errors)",
        words.words.len(),
        parity_errors,
        stop_errors
    );

    Ok(())
}

fn cmd_simulate(
    message: String,
    flip_bits: u32,
    seed: Option<u64>,
    sample_rate: u64,
    gap: u64,
    format: FormatArgs,
    framing: FramingArgs,
) -> Result<()> {
    let config = framing.config()?;
    let clock = SampleClock::new(sample_rate, framing.baud)?;

    let codes: Vec<u16> = message.chars().map(|c| c as u16).collect();
    if codes.is_empty() {
        bail!("Message is empty");
    }

    let encoder = UartEncoder::new(config, clock);
    let mut capture = CaptureBuffer::new(sample_rate);
    encode_message(&encoder, &mut capture, &codes, gap);
    let mut samples = capture.samples().to_vec();

    let mut rng: StdRng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let spb = clock.samples_per_bit();
    let frame_stride = clock.frame_samples(&config) + gap * spb;
    for _ in 0..flip_bits {
        let word = rng.gen_range(0..codes.len()) as u64;
        let bit = u64::from(rng.gen_range(0..config.word_width()));
        let start = (LEAD_IN_PERIODS * spb + word * frame_stride + spb * (1 + bit)) as usize;
        info!("Flipping data bit {} of word {}", bit, word);
        for sample in &mut samples[start..start + spb as usize] {
            *sample = !*sample;
        }
    }

    let mut rx_capture = CaptureBuffer::new(sample_rate);
    rx_capture.push_samples(&samples);
    let mut decoder = UartDecoder::new(config, clock);
    let mut words = WordCollector::new();
    decoder.run(&mut rx_capture, &mut words);

    print_words(&words, &config, WordFormat::from(format));

    let (parity_errors, stop_errors) = error_counts(&words);
    let intact = words.values() == codes;
    println!(
        "{} words sent, {} decoded ({} parity errors, {} stop errors), payload {}",
        codes.len(),
        words.words.len(),
        parity_errors,
        stop_errors,
        if intact { "intact" } else { "corrupted" }
    );

    Ok(())
}

fn cmd_demo(output: PathBuf, sample_rate: u64, framing: FramingArgs) -> Result<()> {
    let config = framing.config()?;
    let clock = SampleClock::new(sample_rate, framing.baud)?;

    let encoder = UartEncoder::new(config, clock);
    let mut capture = CaptureBuffer::new(sample_rate);
    encoder.encode_idle(&mut capture, 10);
    encoder.encode_word(&mut capture, 0xAA);
    encoder.encode_idle(&mut capture, 10);
    encoder.encode_word(&mut capture, 0x55);
    encoder.encode_idle(&mut capture, 10);
    encoder.encode_str(&mut capture, DEMO_TEXT);
    encoder.encode_idle(&mut capture, TAIL_PERIODS);

    capture_file::write_capture(&output, sample_rate, capture.samples())?;
    info!(
        "Wrote demo capture ({} samples) to {:?}",
        capture.available_samples(),
        output
    );

    Ok(())
}

fn cmd_info(sample_rate: u64, framing: FramingArgs) -> Result<()> {
    let config = framing.config()?;
    let clock = SampleClock::new(sample_rate, framing.baud)?;

    let frame_bits = config.frame_half_bits() as f64 / 2.0;
    println!("Framing:          {}", config);
    println!("Baud rate:        {}", clock.baud_rate());
    println!("Sample rate:      {} samples/s", clock.sample_rate());
    println!("Samples per bit:  {}", clock.samples_per_bit());
    println!("Span margin:      {} samples", clock.margin());
    println!(
        "Frame length:     {} bits ({} samples)",
        frame_bits,
        clock.frame_samples(&config)
    );
    println!(
        "Word rate:        {:.1} words/s",
        clock.baud_rate() as f64 / frame_bits
    );

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Encode {
            message,
            hex,
            output,
            sample_rate,
            gap,
            framing,
        } => cmd_encode(message, hex, output, sample_rate, gap, framing),

        Commands::Decode {
            input,
            json,
            format,
            framing,
        } => cmd_decode(input, json, format, framing),

        Commands::Simulate {
            message,
            flip_bits,
            seed,
            sample_rate,
            gap,
            format,
            framing,
        } => cmd_simulate(message, flip_bits, seed, sample_rate, gap, format, framing),

        Commands::Demo {
            output,
            sample_rate,
            framing,
        } => cmd_demo(output, sample_rate, framing),

        Commands::Info {
            sample_rate,
            framing,
        } => cmd_info(sample_rate, framing),
    }
}
