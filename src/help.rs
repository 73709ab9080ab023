//! Usage text generation for a configured parser using Clap.

use crate::config::{OptionSchema, OptionType};
use crate::parser::Parser;
use clap::{Arg, ArgAction, Command};
use std::collections::HashSet;

/// Build a Clap Command mirroring the parser's option table (for help text only).
fn build_command(parser: &Parser, program_name: &str) -> Command {
    let mut cmd = Command::new(program_name.to_string())
        .disable_help_flag(true)
        .disable_version_flag(true);

    let mut used_shorts = HashSet::new();
    for (name, schema) in parser.options() {
        // Clap rejects empty longs and longs with a leading dash
        if name.is_empty() || name.starts_with('-') {
            continue;
        }
        cmd = cmd.arg(build_arg(name, schema, &mut used_shorts));
    }

    let mut notes = Vec::new();
    if parser
        .options()
        .values()
        .any(|schema| schema.option_type == OptionType::Boolean)
    {
        notes.push("Boolean options can be negated with --no-<name>.".to_string());
    }
    if let Some(token) = parser.stop_token() {
        notes.push(format!("Arguments after '{}' are not parsed.", token));
    }
    if !notes.is_empty() {
        cmd = cmd.after_help(notes.join("\n"));
    }

    cmd
}

/// Build a Clap Arg from an option schema.
fn build_arg(name: &str, schema: &OptionSchema, used_shorts: &mut HashSet<char>) -> Arg {
    let mut arg = Arg::new(name.to_string()).long(name.to_string());

    arg = match schema.option_type {
        OptionType::Boolean => arg.action(ArgAction::SetTrue),
        OptionType::String => arg.action(ArgAction::Set).value_name("VALUE"),
        OptionType::Number => arg.action(ArgAction::Set).value_name("NUMBER"),
    };

    // Only single-character aliases are reachable as -x
    if let Some(short) = schema.alias.as_deref().and_then(single_char) {
        if short != '-' && used_shorts.insert(short) {
            arg = arg.short(short);
        }
    }

    if let Some(ref description) = schema.description {
        arg = arg.help(description.clone());
    }

    arg
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Generate the full help text for a configured parser.
pub fn generate_help(parser: &Parser, program_name: &str) -> String {
    let mut cmd = build_command(parser, program_name);
    cmd.render_help().to_string()
}
