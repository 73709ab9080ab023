//! Single-pass option parsing engine.

use crate::config::{ConfigError, OptionSchema, OptionType, ParserConfig, Value};
use crate::events::{EventArg, EventEmitter, IGNORED, NON_OPTION, NOT_HANDLED};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Dash run, optional `no-` marker, name up to the first `=`, optional `=value`.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(--?)?((no-)?[^=]*)(?:=(.*))?$").expect("static regex must compile")
});

/// Outcome of a parse: option values plus the leftover tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedArgs {
    /// Non-option, ignored and not-handled tokens, in arrival order
    #[serde(rename = "_")]
    pub unhandled: Vec<String>,
    /// Coerced values keyed by option name
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl ParsedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Construct a parser from `config` and parse `args` in one step.
pub fn parse_args<I, S>(args: I, config: ParserConfig) -> Result<ParsedArgs, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = Parser::new(config)?;
    Ok(parser.parse(args))
}

/// A raw argument split along the option grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    raw: &'a str,
    dashes: usize,
    /// Name segment, including any `no-` marker
    name: &'a str,
    negated: bool,
    implicit_value: Option<&'a str>,
}

impl<'a> Token<'a> {
    fn new(raw: &'a str) -> Self {
        let Some(caps) = TOKEN_PATTERN.captures(raw) else {
            return Self {
                raw,
                dashes: 0,
                name: raw,
                negated: false,
                implicit_value: None,
            };
        };

        Self {
            raw,
            dashes: caps.get(1).map_or(0, |m| m.len()),
            name: caps.get(2).map_or("", |m| m.as_str()),
            negated: caps.get(3).is_some(),
            implicit_value: caps.get(4).map(|m| m.as_str()),
        }
    }

    fn is_option(&self) -> bool {
        self.dashes > 0
    }

    fn is_short(&self) -> bool {
        self.dashes == 1
    }

    /// Name segment with the `no-` marker removed.
    fn plain_name(&self) -> &'a str {
        if self.negated {
            self.name.strip_prefix("no-").unwrap_or(self.name)
        } else {
            self.name
        }
    }
}

/// Alias table entry pointing back at the canonical option.
#[derive(Debug, Clone)]
struct AliasEntry {
    name: String,
    schema: OptionSchema,
}

/// Option awaiting its value from the next token.
#[derive(Debug, Clone)]
struct PendingValue {
    token: String,
    id: String,
    schema: OptionSchema,
}

/// Stateful token-stream consumer.
///
/// State (`stopped`, the pending value and the result) lives on the instance
/// and carries over between `parse` calls; build a fresh parser per argument
/// list when isolation matters.
#[derive(Debug)]
pub struct Parser {
    options: BTreeMap<String, OptionSchema>,
    aliases: HashMap<String, AliasEntry>,
    stop_token: Option<String>,
    stopped: bool,
    pending: Option<PendingValue>,
    result: ParsedArgs,
    events: EventEmitter,
}

impl Parser {
    /// Build a parser, normalizing every option spec into a schema.
    ///
    /// Fails if any descriptor names an unknown option type.
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        let mut options = BTreeMap::new();
        for (name, spec) in config.options {
            let schema = OptionSchema::try_from(spec)?;
            options.insert(name, schema);
        }

        let mut aliases = HashMap::new();
        for (name, schema) in &options {
            if let Some(ref alias) = schema.alias {
                aliases.insert(
                    alias.clone(),
                    AliasEntry {
                        name: name.clone(),
                        schema: schema.clone(),
                    },
                );
            }
        }

        // Compared against trimmed tokens, so trim it the same way
        let stop_token = config
            .stop_parsing
            .token()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        debug!(
            options = options.len(),
            aliases = aliases.len(),
            stop_token = ?stop_token,
            "Parser configured"
        );

        Ok(Self {
            options,
            aliases,
            stop_token,
            stopped: false,
            pending: None,
            result: ParsedArgs::default(),
            events: EventEmitter::new(),
        })
    }

    /// Subscribe to a parse event channel: `"non-option"`, `"not-handled"`,
    /// `"ignored"`, or an option name.
    pub fn on<F>(&mut self, channel: impl Into<String>, listener: F)
    where
        F: FnMut(&EventArg<'_>) + 'static,
    {
        self.events.on(channel, listener);
    }

    /// Recognized options keyed by name.
    pub fn options(&self) -> &BTreeMap<String, OptionSchema> {
        &self.options
    }

    pub fn schema(&self, name: &str) -> Option<&OptionSchema> {
        self.options.get(name)
    }

    pub fn stop_token(&self) -> Option<&str> {
        self.stop_token.as_deref()
    }

    /// Whether the stop sentinel has been seen.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Name of the option currently waiting for a value, if any.
    pub fn pending_option(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.id.as_str())
    }

    /// Consume `args` and return the accumulated result.
    ///
    /// Tokens are trimmed and empty ones dropped before parsing. Unknown
    /// options and bad values never fail the parse; they land in `_`.
    pub fn parse<I, S>(&mut self, args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue: VecDeque<String> = args
            .into_iter()
            .map(|arg| arg.as_ref().trim().to_string())
            .filter(|arg| !arg.is_empty())
            .collect();

        while let Some(arg) = queue.pop_front() {
            self.process(&arg, &mut queue);
        }
        self.flush_pending();

        self.result.clone()
    }

    fn process(&mut self, arg: &str, queue: &mut VecDeque<String>) {
        trace!(arg, "Processing token");

        if self.stop_token.as_deref() == Some(arg) {
            self.stopped = true;
        }

        if self.stopped {
            self.flush_pending();
            self.ignored(arg);
            return;
        }

        let token = Token::new(arg);
        if token.is_option() {
            self.process_option(&token, queue);
        } else if let Some(pending) = self.pending.take() {
            match pending.schema.parsed_value(arg) {
                Some(value) => self.set_option(&pending.id, value),
                None => {
                    self.not_handled(&pending.token);
                    self.not_handled(arg);
                }
            }
        } else {
            self.non_option(arg);
        }
    }

    fn process_option(&mut self, token: &Token<'_>, queue: &mut VecDeque<String>) {
        self.flush_pending();

        if token.is_short() && token.name.chars().count() > 1 {
            for c in token.name.chars().rev() {
                queue.push_front(format!("-{}", c));
            }
            return;
        }

        let resolved = self.resolve(token.is_short(), token.name).or_else(|| {
            if !token.negated {
                return None;
            }
            self.resolve(token.is_short(), token.plain_name())
                .filter(|(_, schema)| schema.option_type == OptionType::Boolean)
        });

        let Some((id, schema)) = resolved else {
            self.not_handled(token.raw);
            return;
        };

        if schema.requires_value() {
            match token.implicit_value {
                Some(raw) => match schema.parsed_value(raw) {
                    Some(value) => self.set_option(&id, value),
                    None => self.not_handled(token.raw),
                },
                None => {
                    self.pending = Some(PendingValue {
                        token: token.raw.to_string(),
                        id,
                        schema,
                    });
                }
            }
        } else {
            // A name matched as written (e.g. an option literally called
            // `no-cache`) is set, not negated.
            let value = !token.negated || id == token.name;
            self.set_option(&id, Value::Bool(value));
        }
    }

    /// Short names go through the alias table, long names through the option table.
    fn resolve(&self, short: bool, name: &str) -> Option<(String, OptionSchema)> {
        if short {
            self.aliases
                .get(name)
                .map(|entry| (entry.name.clone(), entry.schema.clone()))
        } else {
            self.options
                .get(name)
                .map(|schema| (name.to_string(), schema.clone()))
        }
    }

    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(option = %pending.id, "Option received no value");
            self.not_handled(&pending.token);
        }
    }

    fn set_option(&mut self, id: &str, value: Value) {
        debug!(option = id, %value, "Option set");
        self.events.emit(id, EventArg::Value(&value));
        self.result.values.insert(id.to_string(), value);
    }

    fn not_handled(&mut self, arg: &str) {
        debug!(arg, "Token not handled");
        self.events.emit(NOT_HANDLED, EventArg::Token(arg));
        self.non_option(arg);
    }

    fn ignored(&mut self, arg: &str) {
        trace!(arg, "Token ignored after stop sentinel");
        self.events.emit(IGNORED, EventArg::Token(arg));
        self.non_option(arg);
    }

    fn non_option(&mut self, arg: &str) {
        self.events.emit(NON_OPTION, EventArg::Token(arg));
        self.result.unhandled.push(arg.to_string());
    }
}
