//! # TableCodec CLI - Legacy Encoding Converter
//!
//! Command-line front end for the indexed-table codec: converts files
//! through externally generated table blobs, inspects blob headers, and
//! validates that data decodes cleanly under a given table.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;

#[cfg(feature = "cli")]
use table_codec::{blob, Codec, Error as CodecError, ReplacementPolicy};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// TableCodec: legacy encoding converter driven by table blobs
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "table-codec")]
#[command(version, about, long_about = None)]
#[command(author = "TableCodec Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert data through a table blob
    Convert(ConvertArgs),

    /// Display a table blob's parameters
    Info(InfoArgs),

    /// Check that input decodes cleanly under a table
    Validate(ValidateArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Table blob; its direction tag decides whether input is decoded
    /// (legacy bytes -> UTF-8) or encoded (UTF-8 -> legacy bytes)
    #[arg(short = 'T', long = "table")]
    table: PathBuf,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Substitute a replacement for input that does not convert instead
    /// of failing
    #[arg(long)]
    lossy: bool,

    /// Replacement character for lossy encoding (default: ?)
    #[arg(long, default_value = "?")]
    replacement: String,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Table blob to describe
    table: PathBuf,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Decode-direction table blob
    #[arg(short = 'T', long = "table")]
    table: PathBuf,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Show position of first error
    #[arg(long)]
    show_errors: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    direction: &'static str,
    bytes_read: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    if let Some(path) = path {
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
    } else {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, data)
            .with_context(|| format!("Failed to write output file: {}", path.display()))
    } else {
        io::stdout()
            .write_all(data)
            .context("Failed to write to stdout")
    }
}

#[cfg(feature = "cli")]
fn load_codec(path: &PathBuf) -> Result<(Codec, &'static str)> {
    let raw =
        fs::read(path).with_context(|| format!("Failed to read table blob: {}", path.display()))?;
    let info = blob::probe(&raw)
        .with_context(|| format!("Failed to parse table blob: {}", path.display()))?;
    let codec = match info.direction {
        "decode" => Codec::from_decode_table(blob::read_decode_table(&raw)?),
        _ => Codec::from_encode_table(blob::read_encode_table(&raw)?),
    };
    Ok((codec, info.direction))
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    let (codec, direction) = load_codec(&args.table)?;

    if cli.verbose {
        eprintln!("Loaded {} table from {}", direction, args.table.display());
    }

    let input_data = read_input(args.input.as_ref())?;

    let output_data = if direction == "decode" {
        let text = if args.lossy {
            let units = codec.decode_lossy(&input_data, ReplacementPolicy::default())?;
            String::from_utf16_lossy(&units)
        } else {
            codec
                .decode_to_string(&input_data)
                .context("Decoding failed")?
        };
        text.into_bytes()
    } else {
        let text = std::str::from_utf8(&input_data).context("Input is not valid UTF-8")?;
        if args.lossy {
            let replacement = args
                .replacement
                .bytes()
                .next()
                .context("Invalid replacement character")?;
            codec.encode_lossy(text, replacement)?
        } else {
            codec.encode_str(text).context("Encoding failed")?
        }
    };

    write_output(args.output.as_ref(), &output_data)?;

    let processing_time = start_time.elapsed();

    if cli.verbose {
        eprintln!(
            "Processed {} bytes -> {} bytes in {:?}",
            input_data.len(),
            output_data.len(),
            processing_time
        );
    }

    if let OutputFormat::Json = cli.format {
        let result = ConversionResult {
            success: true,
            direction,
            bytes_read: input_data.len(),
            bytes_written: output_data.len(),
            processing_time_ms: processing_time.as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let raw = fs::read(&args.table)
        .with_context(|| format!("Failed to read table blob: {}", args.table.display()))?;
    let info = blob::probe(&raw)
        .with_context(|| format!("Failed to parse table blob: {}", args.table.display()))?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Table blob: {}", args.table.display());
            println!("Format version: {}", info.version);
            println!("Direction: {}", info.direction);
            println!("Index1 entries: {}", info.index1_entries);
            println!("Data entries: {}", info.data_entries);
            if let Some(n) = info.single_entries {
                println!("Single-byte entries: {}", n);
            }
            if let Some((start, end)) = info.trail_range {
                println!("Trail byte range: 0x{:02X}..=0x{:02X}", start, end);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, _cli: &Cli) -> Result<()> {
    let (codec, direction) = load_codec(&args.table)?;
    if direction != "decode" {
        anyhow::bail!("validate needs a decode-direction table blob");
    }

    let input_data = read_input(args.input.as_ref())?;

    match codec.decode_units(&input_data) {
        Ok(_) => {
            println!("✓ Input decodes cleanly");
            Ok(())
        }
        Err(e) => {
            println!("✗ Input does not decode cleanly");

            if args.show_errors {
                match e {
                    CodecError::Malformed { position, length } => {
                        println!(
                            "  Error at position {}: malformed sequence of {} byte(s)",
                            position, length
                        );
                    }
                    CodecError::Truncated { position } => {
                        println!(
                            "  Error at position {}: truncated double-byte sequence",
                            position
                        );
                    }
                    _ => println!("  Error: {}", e),
                }
            }

            std::process::exit(1);
        }
    }
}
