//! Code actions that run the external `hledger` binary and render its
//! report output as a journal comment block.
//!
//! The subprocess sits behind [`SubprocessRuntime`] so tests never spawn
//! real processes, and the server degrades gracefully when the binary is
//! missing: failures come back as `Error:`-prefixed command output, never
//! as protocol errors.

#![deny(unsafe_code)]

mod runtime;

pub use runtime::{CliOutput, OsSubprocessRuntime, SubprocessError, SubprocessRuntime};

use lsp_types::{CodeActionOrCommand, Command};
use std::path::Path;
use std::time::Duration;

/// Report subcommands offered as code actions.
pub const REPORT_COMMANDS: [&str; 5] = ["bal", "reg", "is", "bs", "cf"];

/// CLI integration settings (`cli.*`).
#[derive(Debug, Clone)]
pub struct CliSettings {
    /// Master switch
    pub enabled: bool,
    /// Binary name or path
    pub path: String,
    /// Per-invocation timeout
    pub timeout: Duration,
}

impl Default for CliSettings {
    fn default() -> Self {
        CliSettings {
            enabled: true,
            path: "hledger".to_string(),
            timeout: Duration::from_millis(30_000),
        }
    }
}

/// The code actions offered for a journal file: one `hledger.run`
/// command per report.
pub fn available_actions(uri: &str, settings: &CliSettings) -> Vec<CodeActionOrCommand> {
    if !settings.enabled {
        return Vec::new();
    }
    REPORT_COMMANDS
        .iter()
        .map(|report| {
            CodeActionOrCommand::Command(Command {
                title: format!("hledger {report}"),
                command: "hledger.run".to_string(),
                arguments: Some(vec![
                    serde_json::Value::String((*report).to_string()),
                    serde_json::Value::String(uri.to_string()),
                ]),
            })
        })
        .collect()
}

/// Run one report against a journal file and return its output as a
/// journal comment block. Failures return `Error:`-prefixed text.
pub fn run_report(
    runtime: &dyn SubprocessRuntime,
    settings: &CliSettings,
    report: &str,
    file: &Path,
) -> String {
    if !settings.enabled {
        return "Error: CLI integration is disabled".to_string();
    }
    if !REPORT_COMMANDS.contains(&report) {
        return format!("Error: unknown report `{report}`");
    }

    let args =
        vec!["-f".to_string(), file.to_string_lossy().to_string(), report.to_string()];
    match runtime.run(&settings.path, &args, settings.timeout) {
        Ok(output) if output.success => comment_block(report, &output.stdout),
        Ok(output) => {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            format!("Error: hledger {report} failed: {}", detail.trim())
        }
        Err(SubprocessError::NotFound(program)) => {
            format!("Error: `{program}` was not found on PATH")
        }
        Err(SubprocessError::Timeout(limit)) => {
            format!("Error: hledger {report} timed out after {} ms", limit.as_millis())
        }
        Err(SubprocessError::Io(detail)) => format!("Error: {detail}"),
    }
}

/// Wrap report output in a journal comment block:
///
/// ```text
/// ; === hledger bal ===
/// ; <line>
/// ; ====================
/// ```
///
/// The trailing `=` run is as wide as the header minus its `; ` prefix.
fn comment_block(report: &str, output: &str) -> String {
    let header = format!("; === hledger {report} ===");
    let footer = format!("; {}", "=".repeat(header.len() - 2));
    let mut block = String::new();
    block.push_str(&header);
    block.push('\n');
    for line in output.lines() {
        if line.is_empty() {
            block.push_str(";\n");
        } else {
            block.push_str("; ");
            block.push_str(line);
            block.push('\n');
        }
    }
    block.push_str(&footer);
    block.push('\n');
    block
}
