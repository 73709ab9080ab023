//! Listener registry for observable parse events.

use crate::config::Value;
use std::collections::HashMap;
use std::fmt;

/// Channel for tokens that end up in the unhandled bucket.
pub const NON_OPTION: &str = "non-option";
/// Channel for unknown options and options that got no valid value.
pub const NOT_HANDLED: &str = "not-handled";
/// Channel for tokens seen after the stop sentinel.
pub const IGNORED: &str = "ignored";

/// The datum delivered with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventArg<'a> {
    /// A raw argument token
    Token(&'a str),
    /// The coerced value of an option that was set
    Value(&'a Value),
}

impl<'a> EventArg<'a> {
    pub fn as_token(&self) -> Option<&'a str> {
        match *self {
            EventArg::Token(token) => Some(token),
            EventArg::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&'a Value> {
        match *self {
            EventArg::Value(value) => Some(value),
            EventArg::Token(_) => None,
        }
    }
}

type Listener = Box<dyn FnMut(&EventArg<'_>)>;

/// Register-by-name, synchronous fan-out event dispatch.
#[derive(Default)]
pub struct EventEmitter {
    listeners: HashMap<String, Vec<Listener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `channel`. Listeners run in registration order.
    pub fn on<F>(&mut self, channel: impl Into<String>, listener: F)
    where
        F: FnMut(&EventArg<'_>) + 'static,
    {
        self.listeners
            .entry(channel.into())
            .or_default()
            .push(Box::new(listener));
    }

    /// Deliver `arg` to every listener on `channel`.
    pub fn emit(&mut self, channel: &str, arg: EventArg<'_>) {
        if let Some(listeners) = self.listeners.get_mut(channel) {
            for listener in listeners.iter_mut() {
                listener(&arg);
            }
        }
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.get(channel).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<_> = self
            .listeners
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        channels.sort();
        f.debug_struct("EventEmitter")
            .field("listeners", &channels)
            .finish()
    }
}
