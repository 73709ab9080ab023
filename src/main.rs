//! optwalk - parse arguments against a JSON option table from the command line.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use optwalk::output::DEFAULT_PREFIX;
use optwalk::{
    generate_help, generate_output, generate_output_string, OutputFormat, Parser, ParserConfig,
    StopParsing,
};
use tracing_subscriber::EnvFilter;

/// Single-pass GNU-style option parsing.
#[derive(ClapParser, Debug)]
#[command(name = "optwalk", version, about, disable_help_subcommand = true)]
struct Cli {
    /// Log parse events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments and print the result
    Parse {
        /// JSON option table
        #[arg(long)]
        config: String,

        /// Output format: json, or shell (written to a sourceable temp file)
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Shell variable prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        /// Stop parsing at this token (overrides config; defaults to --)
        #[arg(long, num_args = 0..=1, default_missing_value = "--")]
        stop_parsing: Option<String>,

        /// Arguments to parse
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print help text for the option table
    Help {
        /// JSON option table
        #[arg(long)]
        config: String,

        /// Program name shown in the usage line
        #[arg(long, default_value = "program")]
        name: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("optwalk=debug")
    } else {
        EnvFilter::try_from_env("OPTWALK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(json: &str, stop_parsing: Option<String>) -> Result<ParserConfig> {
    let mut cfg = ParserConfig::from_json(json).context("failed to parse config JSON")?;
    if let Some(token) = stop_parsing {
        cfg.stop_parsing = StopParsing::Token(token);
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            config,
            format,
            prefix,
            stop_parsing,
            args,
        } => {
            let cfg = load_config(&config, stop_parsing)?;
            let mut parser = Parser::new(cfg).context("invalid option table")?;
            let parsed = parser.parse(&args);

            match format {
                OutputFormat::Json => {
                    let rendered = generate_output_string(&parsed, format, &prefix)
                        .context("failed to render result")?;
                    print!("{}", rendered);
                }
                OutputFormat::Shell => {
                    let path = generate_output(&parsed, &prefix)
                        .context("failed to generate output file")?;
                    println!("{}", path.display());
                }
            }
        }
        Commands::Help { config, name } => {
            let cfg = load_config(&config, None)?;
            let parser = Parser::new(cfg).context("invalid option table")?;
            print!("{}", generate_help(&parser, &name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_subcommand_parses_config() {
        let cli =
            Cli::try_parse_from(["optwalk", "parse", "--config", r#"{"options":{}}"#, "--"]).unwrap();

        match cli.command {
            Commands::Parse {
                config,
                format,
                prefix,
                stop_parsing,
                args,
            } => {
                assert_eq!(config, r#"{"options":{}}"#);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(prefix, DEFAULT_PREFIX);
                assert!(stop_parsing.is_none());
                assert!(args.is_empty());
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_parse_subcommand_parses_args() {
        let cli = Cli::try_parse_from([
            "optwalk",
            "parse",
            "--config",
            "{}",
            "--format",
            "shell",
            "--",
            "-v",
            "--output",
            "file.txt",
            "input.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { format, args, .. } => {
                assert_eq!(format, OutputFormat::Shell);
                assert_eq!(args, vec!["-v", "--output", "file.txt", "input.txt"]);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_stop_parsing_flag_defaults_to_double_dash() {
        let cli = Cli::try_parse_from([
            "optwalk",
            "parse",
            "--config",
            "{}",
            "--stop-parsing",
            "--",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { stop_parsing, .. } => {
                assert_eq!(stop_parsing, Some("--".to_string()));
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_stop_parsing_flag_overrides_config() {
        let cfg = load_config(r#"{"stopParsing": false}"#, Some("::".to_string())).unwrap();
        assert_eq!(cfg.stop_parsing.token(), Some("::"));
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let result =
            Cli::try_parse_from(["optwalk", "parse", "--config", "{}", "--format", "xml", "--"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_subcommand_requires_config() {
        let result = Cli::try_parse_from(["optwalk", "parse", "--"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_subcommand() {
        let cli = Cli::try_parse_from(["optwalk", "help", "--config", "{}", "--name", "tool"])
            .unwrap();

        match cli.command {
            Commands::Help { config, name } => {
                assert_eq!(config, "{}");
                assert_eq!(name, "tool");
            }
            _ => panic!("Expected Help command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["optwalk"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help() {
        // Verify the command can generate help without panicking
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_config_reports_bad_json() {
        assert!(load_config("{", None).is_err());
    }
}
