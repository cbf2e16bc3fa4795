use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use psglog::ConvertConfig;
use psglog::chip::{Channel, ChannelMask, TargetChip};
use psglog::convert::OverflowPolicy;

mod vgm;
use vgm::{convert as vgm_convert, info as vgm_info, read_vgm_as_vec};

/// psglog command line tools
#[derive(Parser)]
#[command(
    name = "psglog",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize and retune a VGM file (accepts .vgm or .vgz; use '-' for stdin/stdout)
    Convert {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Output file to write (use '-' for stdout)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Gzip the output (.vgz)
        #[arg(long)]
        gzip: bool,
        #[command(flatten)]
        options: ConvertArgs,
    },
    /// Show header, tags and command statistics for a VGM file
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Also convert and show statistics for the result
        #[arg(long)]
        convert: bool,
        #[command(flatten)]
        options: ConvertArgs,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Output tick rate in Hz
    #[arg(long, value_name = "HZ", default_value_t = 50)]
    rate: u32,
    /// Sample rate of the source timestamps
    #[arg(long, value_name = "HZ", default_value_t = 44100)]
    sample_rate: u32,
    /// Target SN76489 clock (BBC Micro noise settings are used)
    #[arg(long, value_name = "HZ", conflicts_with = "keep_clock")]
    clock: Option<u32>,
    /// Keep the source clock and noise settings
    #[arg(long)]
    keep_clock: bool,
    /// Keep writes that are overwritten within the same tick
    #[arg(long)]
    no_optimize: bool,
    /// Do not retune tone dividers
    #[arg(long)]
    no_retune: bool,
    /// Do not apply the periodic noise bass correction
    #[arg(long)]
    no_periodic: bool,
    /// Remove all writes to a channel (0-3); may be repeated
    #[arg(long = "filter", value_name = "CH")]
    filter: Vec<usize>,
    /// Clamp out-of-range retuned dividers instead of failing
    #[arg(long)]
    clamp: bool,
    /// Keep writes for a second chip
    #[arg(long)]
    keep_dual_chip: bool,
}

impl ConvertArgs {
    fn to_config(&self) -> Result<ConvertConfig> {
        let mut channel_filter = ChannelMask::NONE;
        for &index in &self.filter {
            match Channel::from_index(index) {
                Some(ch) => channel_filter = channel_filter.with(ch),
                None => bail!("--filter {}: channel must be 0-3", index),
            }
        }

        let target = if self.keep_clock {
            None
        } else {
            Some(TargetChip {
                clock_hz: self.clock.unwrap_or(TargetChip::BBC_MICRO.clock_hz),
                ..TargetChip::BBC_MICRO
            })
        };

        Ok(ConvertConfig {
            source_sample_rate: self.sample_rate,
            target_tick_rate: self.rate,
            target,
            optimize_writes: !self.no_optimize,
            retune: !self.no_retune,
            retune_periodic_noise: !self.no_periodic,
            channel_filter,
            strip_dual_chip: !self.keep_dual_chip,
            overflow: if self.clamp {
                OverflowPolicy::Clamp
            } else {
                OverflowPolicy::Fail
            },
        })
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            gzip,
            options,
        } => {
            let bytes = read_vgm_as_vec(&input)?;
            vgm_convert(&input, bytes, &output, options.to_config()?, gzip)?;
        }
        Commands::Info {
            file,
            convert,
            options,
        } => {
            let bytes = read_vgm_as_vec(&file)?;
            let config = if convert {
                Some(options.to_config()?)
            } else {
                None
            };
            vgm_info(&file, bytes, config)?;
        }
    }

    Ok(())
}
