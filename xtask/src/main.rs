use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for roomscale")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand, Clone, Copy)]
enum Task {
    /// fmt, clippy, tests, docs, then a scripted session smoke run
    Check,
    /// cargo fmt --check
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// Tests for every crate
    Test,
    /// rustdoc without dependencies
    Doc,
    /// Run the CLI's scripted session and print the JSON summary
    Sim,
}

impl Task {
    fn args(self) -> &'static [&'static str] {
        match self {
            Task::Check => &[],
            Task::Fmt => &["fmt", "--all", "--", "--check"],
            Task::Clippy => &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            Task::Test => &["test", "--workspace"],
            Task::Doc => &["doc", "--workspace", "--no-deps"],
            Task::Sim => &["run", "-q", "-p", "roomscale-cli", "--", "simulate", "--json"],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Task::Check => {
            for task in [Task::Fmt, Task::Clippy, Task::Test, Task::Doc, Task::Sim] {
                cargo(task)?;
            }
        }
        task => cargo(task)?,
    }
    Ok(())
}

fn cargo(task: Task) -> Result<()> {
    let args = task.args();
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args[0]);
    }
    Ok(())
}
