//! Playcheck CLI - validate and dry-run headless test scripts
//!
//! Thin adapter around the engine's `parse`/`execute` pair. Reads a script
//! from a file (or stdin via `-`), and either reports the validation
//! outcome or replays the script against the simulated driver.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use playcheck::{DriverCall, ExecOptions, ScriptParser, SimDriver, execute};

#[derive(Parser)]
#[command(name = "playcheck")]
#[command(about = "Headless script engine for canvas game builds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and report its step, frame, and snapshot totals
    Validate {
        /// Script file, or `-` for stdin
        script: PathBuf,
    },

    /// Replay a script against the simulated driver and print the call log
    DryRun {
        /// Script file, or `-` for stdin
        script: PathBuf,

        /// Directory to write capture bytes into (one file per capture)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_protocol(path: &Path) -> Result<playcheck::Protocol> {
    let parser = ScriptParser::new();
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading script from stdin")?;
        let raw: serde_json::Value =
            serde_json::from_str(&buf).context("script is not valid JSON")?;
        Ok(parser.parse(&raw)?)
    } else {
        Ok(parser.parse_file(path)?)
    }
}

/// File name for a capture's bytes. Labels are only guaranteed non-empty
/// by the parser, so anything that could escape or nest under the output
/// directory is mapped to `-`.
fn capture_file_name(label: &str) -> String {
    let safe: String = label
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let stem = safe.trim_matches('.');
    if stem.is_empty() {
        "capture.bin".to_string()
    } else {
        format!("{stem}.bin")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { script } => {
            let protocol = load_protocol(&script)?;
            println!(
                "valid: {} steps, {} frames, {} inputs, {} snaps",
                protocol.len(),
                protocol.total_frames(),
                protocol.input_count(),
                protocol.snap_count()
            );
        }

        Commands::DryRun { script, out } => {
            let protocol = load_protocol(&script)?;

            let mut driver = SimDriver::new();
            let result = execute(&protocol, &mut driver, ExecOptions::default()).await?;

            for call in driver.calls() {
                match call {
                    DriverCall::RunFrames { frames } => println!("runFrames({frames})"),
                    DriverCall::ApplyInput { event } => println!(
                        "applyInput({})",
                        serde_json::to_string(event).context("encoding pointer event")?
                    ),
                    DriverCall::CaptureSnapshot => println!("captureSnapshot()"),
                    DriverCall::ReadFrameCount => println!("readFrameCount()"),
                }
            }
            println!("frame count: {}", result.frame_count);

            for capture in &result.captures {
                match &out {
                    Some(dir) => {
                        std::fs::create_dir_all(dir)
                            .with_context(|| format!("creating {}", dir.display()))?;
                        let path = dir.join(capture_file_name(&capture.label));
                        std::fs::write(&path, &capture.image)
                            .with_context(|| format!("writing {}", path.display()))?;
                        println!(
                            "capture '{}' at frame {} -> {}",
                            capture.label,
                            capture.frame,
                            path.display()
                        );
                    }
                    None => println!("capture '{}' at frame {}", capture.label, capture.frame),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::capture_file_name;

    #[test]
    fn capture_names_stay_inside_the_output_directory() {
        assert_eq!(capture_file_name("after-input"), "after-input.bin");
        assert_eq!(capture_file_name("a/b"), "a-b.bin");
        assert_eq!(capture_file_name("..\\up"), "-up.bin");
        assert_eq!(capture_file_name("../../etc/passwd"), "-..-etc-passwd.bin");
        assert_eq!(capture_file_name(".."), "capture.bin");
    }
}
