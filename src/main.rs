//! Binary entry point for `vbsutil`: a debug/inspection tool over the `vbs`
//! library. Opens a recording via the selected layout,
//! exercises the read/seek/close cycle, and prints the result.

use std::io::Write;

use clap::Parser;

use vbs::cli::args::{Cli, Command};
use vbs::cli::constants::set_display_level;
use vbs::{close, open, read, seek, Handle, Whence};

/// Runs `body` against an open handle, always closing the handle afterwards
/// regardless of whether `body` succeeded, so a failing command never leaks
/// the handle.
fn with_open<F>(recording: &str, mountpoints: &[String], layout: vbs::Layout, body: F) -> anyhow::Result<()>
where
    F: FnOnce(Handle) -> anyhow::Result<()>,
{
    let handle = open(recording, mountpoints, layout)?;
    let result = body(handle);
    close(handle)?;
    result
}

fn ls(layout: vbs::Layout, recording: &str, mountpoints: &[String]) -> anyhow::Result<()> {
    with_open(recording, mountpoints, layout, |handle| {
        let size = seek(handle, 0, Whence::End)?;
        println!("{recording}\t{size} bytes");
        Ok(())
    })
}

fn stat(layout: vbs::Layout, recording: &str, mountpoints: &[String]) -> anyhow::Result<()> {
    with_open(recording, mountpoints, layout, |handle| {
        let size = seek(handle, 0, Whence::End)?;
        seek(handle, 0, Whence::Set)?;

        let mut preview = [0u8; 16];
        let n = read(handle, &mut preview)?;
        let hex: String = preview[..n].iter().map(|b| format!("{b:02x}")).collect();

        println!("{recording}");
        println!("  size: {size} bytes");
        println!("  first {n} bytes: {hex}");
        Ok(())
    })
}

fn cat(layout: vbs::Layout, recording: &str, mountpoints: &[String]) -> anyhow::Result<()> {
    with_open(recording, mountpoints, layout, |handle| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = read(handle, &mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
        }
        Ok(())
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let level = if cli.quiet { 0 } else { 1 + cli.verbose as u32 };
    set_display_level(level);

    match cli.command {
        Command::Ls { layout, recording, mountpoints } => ls(layout.into(), &recording, &mountpoints),
        Command::Stat { layout, recording, mountpoints } => stat(layout.into(), &recording, &mountpoints),
        Command::Cat { layout, recording, mountpoints } => cat(layout.into(), &recording, &mountpoints),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("vbsutil: {e}");
        std::process::exit(1);
    }
}
