//! Rendering of parse results as JSON or sourceable shell exports.

use crate::parser::ParsedArgs;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Default prefix for exported shell variables.
pub const DEFAULT_PREFIX: &str = "OPTWALK_";

/// How a parse result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON object with a `_` array for leftovers
    #[default]
    Json,
    /// `export` statements plus a `set --` line for leftovers
    Shell,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "shell" | "sh" => Ok(OutputFormat::Shell),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Quote a string as a single shell word.
///
/// Everything inside single quotes is literal; an embedded `'` becomes `'\''`.
fn quote_shell_word(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Convert an option name to a valid shell variable name.
///
/// Converts to uppercase and replaces anything outside `[A-Z0-9_]` with underscores.
fn to_shell_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Render the result as JSON.
pub fn generate_json_string(parsed: &ParsedArgs) -> Result<String> {
    let mut json = serde_json::to_string_pretty(parsed)?;
    json.push('\n');
    Ok(json)
}

/// Render the result as shell statements.
///
/// Keys come out sorted; leftover tokens become the positional parameters.
pub fn generate_shell_string(parsed: &ParsedArgs, prefix: &str) -> String {
    let mut output = String::new();

    for (name, value) in &parsed.values {
        let var_name = format!("{}{}", prefix, to_shell_var_name(name));
        let quoted_value = quote_shell_word(&value.to_string());
        output.push_str(&format!("export {}={}\n", var_name, quoted_value));
    }

    output.push_str("set --");
    for token in &parsed.unhandled {
        output.push(' ');
        output.push_str(&quote_shell_word(token));
    }
    output.push('\n');

    output
}

/// Render the result in `format`.
pub fn generate_output_string(
    parsed: &ParsedArgs,
    format: OutputFormat,
    prefix: &str,
) -> Result<String> {
    match format {
        OutputFormat::Json => generate_json_string(parsed),
        OutputFormat::Shell => Ok(generate_shell_string(parsed, prefix)),
    }
}

/// Write the shell rendering to a temporary file.
///
/// Returns the path to the file. The file persists until the process
/// sourcing it deletes it.
pub fn generate_output(parsed: &ParsedArgs, prefix: &str) -> Result<PathBuf> {
    write_temp_file(&generate_shell_string(parsed, prefix))
}

/// Write content to a temporary file and return its path.
fn write_temp_file(content: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    let path = file.into_temp_path().keep()?;
    Ok(path)
}
