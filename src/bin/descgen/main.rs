//! Shupito descriptor generator
//!
//! Builds the capability descriptor tables embedded in the firmware and the DFU images the
//! bootloader consumes.

use std::path::PathBuf;

use anyhow::Result;
use bytes::Bytes;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use shupito_tools::{config::parse_hex, protocol::device::DeviceKind, LeafFormat};

mod handlers;

#[derive(Parser, Debug)]
#[command(version, author)]
struct Opts {
    /// Verbosity level. -v logs written files, -vv the encoding steps, -vvv every block and node
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Encode a TOML or JSON descriptor file
    Encode {
        file: PathBuf,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Encode the descriptor of a known firmware variant
    Preset {
        kind: DeviceKind,

        #[command(flatten)]
        build: BuildOpts,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Verify and pretty-print an existing descriptor table
    Decode {
        file: PathBuf,

        /// Leaf layout used by the firmware the table comes from
        #[arg(long, default_value = "flags_payload")]
        format: LeafFormat,

        #[arg(long, value_enum, default_value_t = InputKind::C)]
        input: InputKind,

        /// The table starts with a functional descriptor header
        #[arg(long)]
        functional: bool,

        /// Print a hex dump of the table before decoding it
        #[arg(long)]
        dump: bool,
    },

    /// Convert an Intel HEX firmware image into a DFU file
    Dfu {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// USB vendor id, in hex
        #[arg(long, default_value = "4a61", value_parser = parse_hex_u16)]
        vid: u16,

        /// USB product id, in hex
        #[arg(long, default_value = "679c", value_parser = parse_hex_u16)]
        pid: u16,

        /// Device release number, in hex
        #[arg(long, default_value = "0300", value_parser = parse_hex_u16)]
        bcd_device: u16,
    },

    /// Print the JSON schema of descriptor files
    Schema,
}

#[derive(Args, Debug)]
struct OutputOpts {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::C)]
    emit: Emit,

    /// Name of the emitted array
    #[arg(long, default_value = "yb_desc")]
    name: String,

    /// Wrap the table in a functional descriptor header
    #[arg(long)]
    functional: bool,
}

#[derive(Args, Debug)]
struct BuildOpts {
    /// Build time in seconds since the unix epoch, defaults to now
    #[arg(long, env = "SOURCE_DATE_EPOCH")]
    timestamp: Option<u32>,

    /// Local time zone offset in minutes, east of UTC
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    utc_offset: i16,

    /// Source revision hash, in hex
    #[arg(long, value_parser = parse_hex)]
    revision: Option<Bytes>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Rows of C byte literals
    C,
    /// A complete PROGMEM array declaration
    Array,
    /// Raw bytes
    Bin,
    /// A single line of hex
    Hex,
    /// The capability tree as a JSON descriptor file
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// C source holding 0x.. byte literals
    C,
    /// Raw bytes
    Bin,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();
    init_logging(opts.verbose);

    handlers::run_command(opts.subcmd)
}

fn parse_hex_u16(src: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(src.trim_start_matches("0x"), 16)
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Opts::command().debug_assert();
    }

    #[test]
    fn dfu_defaults() {
        let opts = Opts::parse_from(["shupito-descgen", "dfu", "fw.hex", "-o", "fw.dfu"]);
        let SubCommand::Dfu { vid, pid, bcd_device, .. } = opts.subcmd else {
            panic!("expected the dfu command");
        };
        assert_eq!((vid, pid, bcd_device), (0x4a61, 0x679c, 0x0300));
    }

    #[test]
    fn json_output() {
        let opts = Opts::parse_from(["shupito-descgen", "encode", "board.toml", "--emit", "json"]);
        let SubCommand::Encode { output, .. } = opts.subcmd else {
            panic!("expected the encode command");
        };
        assert_eq!(output.emit, Emit::Json);
        assert!(!output.functional);
    }

    #[test]
    fn preset_options() {
        let opts = Opts::parse_from([
            "shupito-descgen",
            "-vv",
            "preset",
            "shupito23",
            "--timestamp",
            "1700000000",
            "--utc-offset",
            "-60",
            "--revision",
            "deadbeef",
            "--emit",
            "array",
        ]);
        assert_eq!(opts.verbose, 2);
        let SubCommand::Preset { kind, build, output } = opts.subcmd else {
            panic!("expected the preset command");
        };
        assert_eq!(kind, DeviceKind::Shupito23);
        assert_eq!(build.timestamp, Some(1_700_000_000));
        assert_eq!(build.utc_offset, -60);
        assert_eq!(build.revision.unwrap()[..], [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(output.emit, Emit::Array);
        assert_eq!(output.name, "yb_desc");
    }
}
