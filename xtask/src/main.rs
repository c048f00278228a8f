use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus, Stdio};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_CRATE: &str = "contact_relay_lambda";
const RUNTIME_BIN: &str = "contact_runtime";
const LOCAL_BIN: &str = "contact_local";
const DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the portfolio contact relay workspace",
    long_about = "A unified CLI for CI checks, Lambda packaging and local\n\
                  invocation of the contact form handler."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests, packaging)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package the contact Lambda as a `bootstrap` zip
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Run the handler locally on a synthetic API Gateway event (no email is sent)
    InvokeLocal {
        /// JSON request body posted to /contact
        #[arg(long)]
        body: String,
        /// HTTP method of the synthetic event
        #[arg(long, default_value = "POST")]
        method: String,
        /// Origin header of the synthetic event
        #[arg(long, default_value = "http://localhost:5173")]
        origin: String,
        /// Sender address used for rendering
        #[arg(long, env = "SENDER_EMAIL", default_value = "noreply@localhost.test")]
        sender: String,
        /// Receiver address used for rendering
        #[arg(long, env = "RECEIVER_EMAIL", default_value = "owner@localhost.test")]
        receiver: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build the Lambda package
    Package,
    /// Run check + package
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

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambda(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build contact lambda binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_CRATE,
        "--target",
        target,
        "--bin",
        RUNTIME_BIN,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join("contact-runtime.zip");
    package_lambda_zip(&target_dir.join(binary_name(RUNTIME_BIN, target)), &zip_path);

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let env_override_keys = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];

    for key in env_override_keys {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if !candidate.is_empty() && tool_works(candidate) {
                return;
            }
        }
    }

    let canonical = "x86_64-linux-gnu-gcc";
    if tool_works(canonical) {
        return;
    }

    panic!(
        "missing C cross-linker for target `{target}`. install `{canonical}` (or set CC_x86_64_unknown_linux_gnu) before running `cargo run -p xtask -- serverless-package`.\n\
         Tip: the AWS SDK's TLS stack (aws-lc-sys) needs a Linux C toolchain when cross-compiling from Windows."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

fn synthetic_event(method: &str, origin: &str, body: &str) -> serde_json::Value {
    json!({
        "resource": "/contact",
        "path": "/contact",
        "httpMethod": method.to_ascii_uppercase(),
        "headers": {
            "content-type": "application/json",
            "origin": origin,
        },
        "requestContext": {
            "requestId": "local-invoke",
            "stage": "local",
        },
        "body": body,
        "isBase64Encoded": false,
    })
}

fn invoke_local(method: &str, origin: &str, body: &str, sender: &str, receiver: &str) {
    step("Invoke contact handler locally");

    let event = synthetic_event(method, origin, body).to_string();
    let args = ["run", "-q", "-p", LAMBDA_CRATE, "--bin", LOCAL_BIN];
    eprintln!("+ cargo {}", args.join(" "));

    let mut child = Command::new("cargo")
        .args(args)
        .env("SENDER_EMAIL", sender)
        .env("RECEIVER_EMAIL", receiver)
        .stdin(Stdio::piped())
        .spawn()
        .expect("failed to execute cargo");

    child
        .stdin
        .take()
        .expect("child stdin should be piped")
        .write_all(event.as_bytes())
        .expect("failed to write event to local handler");

    let status = child.wait().expect("failed to wait for local handler");
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test contact_relay_core");
    run_cargo(&["test", "-p", "contact_relay_core"]);

    step("Test contact_relay_lambda");
    run_cargo(&["test", "-p", LAMBDA_CRATE]);
}

fn ci_package() {
    step("Build lambda binaries (host target)");
    run_cargo(&["build", "-p", LAMBDA_CRATE, "--bins"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Package => ci_package(),
                CiJob::All => {
                    ci_check();
                    ci_package();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambda(&target, profile);
        }
        Commands::InvokeLocal {
            body,
            method,
            origin,
            sender,
            receiver,
        } => {
            invoke_local(&method, &origin, &body, &sender, &receiver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_adds_exe_for_windows_targets() {
        assert_eq!(binary_name("contact_runtime", "x86_64-pc-windows-msvc"), "contact_runtime.exe");
        assert_eq!(binary_name("contact_runtime", "aarch64-unknown-linux-gnu"), "contact_runtime");
    }

    #[test]
    fn synthetic_event_mirrors_rest_proxy_shape() {
        let event = synthetic_event("post", "http://localhost:5173", "{}");
        assert_eq!(event["httpMethod"], "POST");
        assert_eq!(event["headers"]["origin"], "http://localhost:5173");
        assert_eq!(event["body"], "{}");
    }
}
