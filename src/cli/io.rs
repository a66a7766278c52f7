//! JSON I/O handling for CLI
//!
//! - Input: one JSON request per line
//! - Output: one JSON response per line, flushed after each
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::api::ApiHandler;

use super::errors::CliResult;

/// How a serving loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Requests answered
    pub requests: u64,
    /// The loop stopped because the application halted
    pub halted: bool,
}

/// Answer every request line from `input` on `output` until EOF, or until
/// the application halts under a policy that answers nothing afterwards.
///
/// Blank lines are skipped.
pub fn serve_lines<R: BufRead, W: Write>(
    handler: &ApiHandler,
    input: R,
    mut output: W,
) -> CliResult<ServeSummary> {
    let mut summary = ServeSummary {
        requests: 0,
        halted: false,
    };

    for line in input.lines() {
        let line = line?;
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response = handler.handle(request);
        writeln!(output, "{}", response.to_json())?;
        output.flush()?;
        summary.requests += 1;

        if handler.should_stop() {
            summary.halted = true;
            break;
        }
    }

    Ok(summary)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write a raw JSON string to stdout
pub fn write_json(json_str: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", json_str)?;
    stdout.flush()?;

    Ok(())
}
