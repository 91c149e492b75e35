use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

mod smoke;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the record store workspace",
    long_about = "A unified CLI for running the record server locally, packaging\n\
                  the Lambda handler, smoke testing deployments, and CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP record server locally (reads DYNAMODB_TABLE and PORT)
    Serve,
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package the Rust Lambda artifact for Terraform inputs
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Exercise deployed endpoints: home, put, get and get-all on the server,
    /// then a single get through the Lambda URL
    Smoke {
        /// Base URL of the record server (load balancer), e.g. http://host:3000
        #[arg(long, env = "ALB_URL")]
        server_url: Option<String>,
        /// API Gateway URL in front of the Lambda handler
        #[arg(long, env = "MY_GATEWAY_URL")]
        lambda_url: Option<String>,
        /// Identifier to write and read back
        #[arg(long, default_value = "mypk")]
        id: String,
        /// Bearer token sent to the Lambda endpoint
        #[arg(long, env = "SMOKE_JWT")]
        jwt: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check plus a release build of every binary
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> Result<()> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("failed to execute cargo")?;
    if !status.success() {
        bail!("cargo {} exited with {status}", args[0]);
    }
    Ok(())
}

// ── Lambda packaging ───────────────────────────────────────────────

/// The one deployable Lambda: `record_lambda`, shipped as a zip holding a
/// single executable named `bootstrap` for the `provided` runtimes.
struct LambdaArtifact<'a> {
    target: &'a str,
    profile: BuildProfile,
}

impl LambdaArtifact<'_> {
    const PACKAGE: &'static str = "record_store_aws";
    const BIN: &'static str = "record_lambda";
    const DIST_DIR: &'static str = "infra/record_store/dist";

    fn binary_path(&self) -> PathBuf {
        Path::new("target")
            .join(self.target)
            .join(self.profile.dir_name())
            .join(Self::BIN)
    }

    fn zip_path(&self) -> PathBuf {
        Path::new(Self::DIST_DIR).join(format!("{}.zip", Self::BIN))
    }

    fn build(&self) -> Result<()> {
        let mut args = vec![
            "build",
            "-p",
            Self::PACKAGE,
            "--bin",
            Self::BIN,
            "--target",
            self.target,
        ];
        args.extend(self.profile.as_cargo_flag());
        run_cargo(&args)
    }

    fn package(&self) -> Result<PathBuf> {
        let binary_path = self.binary_path();
        let binary = fs::read(&binary_path)
            .with_context(|| format!("expected lambda binary at {}", binary_path.display()))?;

        let zip_path = self.zip_path();
        fs::create_dir_all(Self::DIST_DIR)
            .with_context(|| format!("failed to create {}", Self::DIST_DIR))?;
        let file = fs::File::create(&zip_path)
            .with_context(|| format!("failed to create {}", zip_path.display()))?;

        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755);
        zip.start_file("bootstrap", options)?;
        zip.write_all(&binary)?;
        zip.finish()?;
        Ok(zip_path)
    }
}

/// Fails early with an install hint instead of a long cargo error when the
/// Lambda target triple has not been added to the toolchain. Skipped when
/// rustup is not on the PATH.
fn check_target_installed(target: &str) -> Result<()> {
    let Ok(output) = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    else {
        eprintln!("warning: rustup not found; skipping target check for {target}");
        return Ok(());
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && !installed.lines().any(|line| line.trim() == target) {
        bail!("rust target `{target}` is not installed; run `rustup target add {target}`");
    }
    Ok(())
}

fn serverless_package(target: &str, profile: BuildProfile) -> Result<()> {
    let artifact = LambdaArtifact { target, profile };
    check_target_installed(target)?;

    step("Build record_lambda");
    artifact.build()?;

    step("Package bootstrap zip");
    let zip_path = artifact.package()?;
    eprintln!("\nPackaged artifact: {}", zip_path.display());
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() -> Result<()> {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&["clippy", "--all-targets", "--", "-D", "warnings"])?;

    for package in ["record_store_core", "record_store_aws", "xtask"] {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package])?;
    }
    Ok(())
}

fn ci_build() -> Result<()> {
    step("Build release binaries");
    run_cargo(&["build", "-p", "record_store_aws", "--bins", "--release"])
}

fn ci(job: CiJob) -> Result<()> {
    ci_check()?;
    if let CiJob::All = job {
        ci_build()?;
    }
    eprintln!("\nCI job passed.");
    Ok(())
}

fn run_smoke(
    server_url: Option<String>,
    lambda_url: Option<String>,
    id: String,
    jwt: Option<String>,
) -> Result<()> {
    if server_url.is_none() && lambda_url.is_none() {
        bail!("smoke needs --server-url and/or --lambda-url");
    }
    let failures = smoke::run(smoke::SmokeTargets {
        server_url: server_url.as_deref(),
        lambda_url: lambda_url.as_deref(),
        id: &id,
        jwt: jwt.as_deref(),
    });
    if failures > 0 {
        bail!("{failures} smoke step(s) failed");
    }
    eprintln!("\nSmoke run passed.");
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => run_cargo(&["run", "-p", "record_store_aws", "--bin", "record_server"]),
        Commands::Ci { job } => ci(job),
        Commands::ServerlessPackage { target, profile } => serverless_package(&target, profile),
        Commands::Smoke {
            server_url,
            lambda_url,
            id,
            jwt,
        } => run_smoke(server_url, lambda_url, id, jwt),
    };

    if let Err(error) = result {
        eprintln!("\nerror: {error:#}");
        exit(1);
    }
}
