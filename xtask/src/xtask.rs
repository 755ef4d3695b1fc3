use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use xshell::{Shell, cmd};

#[derive(Debug, Parser)]
struct XTask {
    #[clap(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Format, build, test, and lint every feature combination.
    CI,

    /// Run benchmarks.
    Bench {
        /// Compile out the hardware backends.
        #[clap(long, default_value = "false")]
        portable: bool,

        /// Additional arguments for criterion.
        #[clap(action(ArgAction::Append), allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a fuzz target with cargo-fuzz.
    Fuzz {
        /// The target to run: ecb, cbc, or lengths.
        target: String,

        /// Additional arguments for libFuzzer.
        #[clap(action(ArgAction::Append), allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let xtask = XTask::parse();

    let sh = Shell::new()?;
    sh.change_dir(project_root()?);

    match xtask.cmd.unwrap_or(Command::CI) {
        Command::CI => ci(&sh),
        Command::Bench { portable, args } => bench(&sh, portable, args),
        Command::Fuzz { target, args } => fuzz(&sh, &target, args),
    }
}

fn ci(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --check").run()?;
    cmd!(sh, "cargo build --no-default-features").run()?;
    cmd!(sh, "cargo build --all-targets --all-features").run()?;
    cmd!(sh, "cargo test").run()?;
    cmd!(sh, "cargo test --no-default-features").run()?;
    cmd!(sh, "cargo test --features=portable").run()?;
    cmd!(sh, "cargo clippy --all-features --tests --benches").run()?;

    Ok(())
}

fn bench(sh: &Shell, portable: bool, args: Vec<String>) -> Result<()> {
    let args = args.join(" ");
    if portable {
        cmd!(sh, "cargo criterion -p benchmarks --features=aes-rounds/portable {args}")
            .env("RUSTFLAGS", "-C target-cpu=native")
            .run()?;
    } else {
        cmd!(sh, "cargo criterion -p benchmarks {args}")
            .env("RUSTFLAGS", "-C target-cpu=native")
            .run()?;
    }

    Ok(())
}

fn fuzz(sh: &Shell, target: &str, args: Vec<String>) -> Result<()> {
    cmd!(sh, "cargo +nightly fuzz run {target} -- {args...}").run()?;

    Ok(())
}

fn project_root() -> Result<PathBuf> {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| env!("CARGO_MANIFEST_DIR").to_owned());
    Path::new(&manifest_dir)
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .context("xtask should live one directory below the project root")
}
