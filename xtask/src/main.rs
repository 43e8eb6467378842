use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Parser)]
#[command(author, version, about = "sgpick project automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite through cargo-nextest
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
        /// Restrict the run to one workspace package
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Check that the external tools named in the default config are installed
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest {
            profile,
            release,
            package,
        } => run_nextest(profile, release, package)?,
        Commands::Doctor => run_doctor()?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool, package: Option<String>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    match package {
        Some(package) => cmd.arg("--package").arg(package),
        None => cmd.arg("--workspace"),
    };
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status().context("failed to launch cargo nextest")?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("crates/sgpick/assets/default-config.toml")
}

fn required_tools() -> Result<Vec<String>> {
    let path = default_config_path();
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: toml::Table = raw
        .parse()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let tools = config
        .get("tools")
        .and_then(toml::Value::as_table)
        .context("default config has no [tools] table")?;
    Ok(tools
        .values()
        .filter_map(toml::Value::as_str)
        .map(str::to_owned)
        .collect())
}

fn run_doctor() -> Result<()> {
    let mut missing = Vec::new();
    for tool in required_tools()? {
        let found = Command::new(&tool)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        println!("{:<10} {}", tool, if found { "ok" } else { "missing" });
        if !found {
            missing.push(tool);
        }
    }
    if !missing.is_empty() {
        anyhow::bail!("missing tools: {}", missing.join(", "));
    }
    Ok(())
}
