//! Output handling for the CLI
//!
//! - Command output goes to stdout
//! - Logs and errors go to stderr
//! - JSON output is one object per line unless pretty-printed

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;
use crate::record::Record;

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

/// Write an error line to stderr
pub fn write_error(code: &str, message: &str) {
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "{}: {}", code, message);
    let _ = stderr.flush();
}

/// Write records to stdout, one JSON object per line
pub fn write_records(records: &[Record]) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    for record in records {
        serde_json::to_writer(&mut stdout, record)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Write preformatted text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}
