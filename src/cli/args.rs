//! Command-line argument parsing for `vbsutil`.
//!
//! `vbsutil` is a small debug/inspection tool over the public `vbs` library
//! surface: it opens a recording, exercises the read/seek/close cycle, and
//! prints the result. It is not the out-of-scope "surrounding
//! command-interpreter that drives a physical recorder" — just
//! enough to exercise discovery and the I/O engine by hand.

use clap::{Parser, Subcommand, ValueEnum};

use crate::discovery::Layout;

/// Inspect scattered and block-header VLBI recordings.
#[derive(Debug, Parser)]
#[command(name = "vbsutil", version, about, long_about = None)]
pub struct Cli {
    /// Increase output verbosity (repeatable: -v, -vv, ...).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress warnings; only hard errors are printed.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// On-disk layout to assume when discovering a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Scattered,
    BlockHeader,
}

impl From<LayoutArg> for Layout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Scattered => Layout::Scattered,
            LayoutArg::BlockHeader => Layout::BlockHeader,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover a recording's chunks and print its total logical size.
    Ls {
        #[arg(short, long, value_enum, default_value_t = LayoutArg::Scattered)]
        layout: LayoutArg,
        /// Recording name to discover.
        recording: String,
        /// Mountpoints to search.
        #[arg(required = true)]
        mountpoints: Vec<String>,
    },
    /// Open a recording and stream its logical byte stream to stdout.
    Cat {
        #[arg(short, long, value_enum, default_value_t = LayoutArg::Scattered)]
        layout: LayoutArg,
        recording: String,
        #[arg(required = true)]
        mountpoints: Vec<String>,
    },
    /// Open a recording, print its size, and a short hex preview of its
    /// first bytes — a `stat(1)`-style summary.
    Stat {
        #[arg(short, long, value_enum, default_value_t = LayoutArg::Scattered)]
        layout: LayoutArg,
        recording: String,
        #[arg(required = true)]
        mountpoints: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ls_with_default_layout() {
        let cli = Cli::parse_from(["vbsutil", "ls", "rec_A", "/mp/disk0"]);
        match cli.command {
            Command::Ls { layout, recording, mountpoints } => {
                assert_eq!(layout, LayoutArg::Scattered);
                assert_eq!(recording, "rec_A");
                assert_eq!(mountpoints, vec!["/mp/disk0".to_string()]);
            }
            _ => panic!("expected Ls"),
        }
    }

    #[test]
    fn parses_cat_with_explicit_block_header_layout() {
        let cli = Cli::parse_from([
            "vbsutil",
            "cat",
            "--layout",
            "block-header",
            "rec_D",
            "/mp/disk0",
            "/mp/disk1",
        ]);
        match cli.command {
            Command::Cat { layout, mountpoints, .. } => {
                assert_eq!(layout, LayoutArg::BlockHeader);
                assert_eq!(mountpoints.len(), 2);
            }
            _ => panic!("expected Cat"),
        }
    }

    #[test]
    fn verbose_flag_is_repeatable() {
        let cli = Cli::parse_from(["vbsutil", "-vv", "stat", "rec_A", "/mp/disk0"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn rejects_missing_mountpoints() {
        let result = Cli::try_parse_from(["vbsutil", "ls", "rec_A"]);
        assert!(result.is_err());
    }
}
