//! optwalk - single-pass GNU-style option parsing.
//!
//! This library parses an argument vector against a declarative table of
//! options (boolean, string or number, with optional short aliases),
//! reporting unknown and leftover tokens through the `_` bucket and an
//! event channel instead of failing, and renders results as JSON or
//! shell export statements.

pub mod config;
pub mod events;
pub mod help;
pub mod output;
pub mod parser;

pub use config::{
    ConfigError, OptionDescriptor, OptionSchema, OptionSpec, OptionType, ParserConfig,
    StopParsing, Value,
};
pub use events::{EventArg, EventEmitter, IGNORED, NON_OPTION, NOT_HANDLED};
pub use help::generate_help;
pub use output::{generate_output, generate_output_string, OutputFormat};
pub use parser::{parse_args, ParsedArgs, Parser};
