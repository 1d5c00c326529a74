use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the sky realm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and doc in order
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates, warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Launch the desktop app in release mode
    Desktop {
        /// Extra arguments for skyrealm-desktop
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in [Step::Fmt, Step::Clippy, Step::Test, Step::Doc] {
                step.run()?;
            }
        }
        Commands::Fmt => Step::Fmt.run()?,
        Commands::Clippy => Step::Clippy.run()?,
        Commands::Test => Step::Test.run()?,
        Commands::Doc => Step::Doc.run()?,
        Commands::Build => Step::Build.run()?,
        Commands::Desktop { args } => {
            let mut full = vec!["run", "--release", "-p", "skyrealm-desktop", "--"];
            full.extend(args.iter().map(String::as_str));
            cargo("skyrealm-desktop", &full)?;
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Step {
    Fmt,
    Clippy,
    Test,
    Doc,
    Build,
}

impl Step {
    fn run(self) -> Result<()> {
        match self {
            Self::Fmt => cargo("cargo fmt check", &["fmt", "--all", "--", "--check"]),
            Self::Clippy => cargo(
                "cargo clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            ),
            Self::Test => cargo("cargo test", &["test", "--workspace"]),
            Self::Doc => cargo("cargo doc", &["doc", "--workspace", "--no-deps"]),
            Self::Build => cargo("cargo build", &["build", "--workspace"]),
        }
    }
}

fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}
