use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use huffpack::huffman::code_string;
use huffpack::{FrequencyTable, HuffmanTree, Report};

#[derive(Debug, Parser)]
#[command(version, about = "Static Huffman compressor")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress INPUT into OUTPUT
    Compress { input: PathBuf, output: PathBuf },
    /// Decompress INPUT into OUTPUT
    Decompress { input: PathBuf, output: PathBuf },
    /// Print the code table built for INPUT
    Codes { input: PathBuf },
    /// Compress and decompress each INPUT, checking the result matches
    Roundtrip {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Compress { input, output } => {
            let report = huffpack::compress_file(&input, &output)
                .with_context(|| format!("compress {}", input.display()))?;
            print_report("compressed", &report);
        }
        Command::Decompress { input, output } => {
            let report = huffpack::decompress_file(&input, &output)
                .with_context(|| format!("decompress {}", input.display()))?;
            print_report("decompressed", &report);
        }
        Command::Codes { input } => {
            let data =
                fs::read(&input).with_context(|| format!("read {}", input.display()))?;
            let freqs = FrequencyTable::count(&data);
            let Some(tree) = HuffmanTree::build(&freqs) else {
                println!("{} is empty, no codes", input.display());
                return Ok(());
            };
            for (symbol, code) in tree.codes().iter() {
                println!(
                    "{:>6} {:>10} {}",
                    format!("{:?}", symbol as char),
                    freqs.get(symbol),
                    code_string(code)
                );
            }
        }
        Command::Roundtrip { inputs } => {
            let scratch = tempfile::tempdir().context("create scratch directory")?;
            for input in inputs {
                let packed = scratch.path().join("packed");
                let restored = scratch.path().join("restored");

                let report = huffpack::compress_file(&input, &packed)
                    .with_context(|| format!("compress {}", input.display()))?;
                huffpack::decompress_file(&packed, &restored)
                    .with_context(|| format!("decompress {}", input.display()))?;

                let original = fs::read(&input).context("re-read original")?;
                let roundtripped = fs::read(&restored).context("read restored output")?;
                ensure!(
                    original == roundtripped,
                    "{} did not survive the round trip",
                    input.display()
                );

                print!("{}: ", input.display());
                print_report("ok", &report);
            }
        }
    }

    Ok(())
}

fn print_report(verb: &str, report: &Report) {
    match report.ratio() {
        Some(ratio) => println!(
            "{verb} {} -> {} bytes ({:.1}%)",
            report.input_bytes,
            report.output_bytes,
            ratio * 100.0
        ),
        None => println!("{verb} empty input -> {} bytes", report.output_bytes),
    }
}
