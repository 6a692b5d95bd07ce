use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pesym - symbol tables and headers of Windows PE32 images
#[derive(Debug, Parser)]
#[command(name = "pesym", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print IMAGE_FILE_HEADER and IMAGE_OPTIONAL_HEADER.
    Info {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Hex dump of IMAGE_DOS_HEADER and the DOS stub.
    Dos {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Short summary of each section.
    Sections {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// List all exported symbols, names decoded where possible.
    Exports {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Render return type and calling convention of decorated names.
        #[arg(long)]
        full: bool,
    },

    /// List all imported dependencies and their symbols, names decoded where possible.
    Imports {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Render return type and calling convention of decorated names.
        #[arg(long)]
        full: bool,
    },

    /// Every report above, in order.
    All {
        /// Path to the PE image (DLL, EXE, SYS, EFI).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Render return type and calling convention of decorated names.
        #[arg(long)]
        full: bool,
    },

    /// Decode decorated symbol names given on the command line.
    Demangle {
        /// Decorated names, e.g. `?Foo@Widget@@QAEHXZ` or `_Sleep@4`.
        #[arg(value_name = "SYMBOL", required = true)]
        symbols: Vec<String>,

        /// Render return type and calling convention.
        #[arg(long)]
        full: bool,
    },
}
