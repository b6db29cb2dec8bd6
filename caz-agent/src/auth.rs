//! In-band identity commands.
//!
//! `my name is <word>` sets the display name used in future prompts.
//! `set secret <rest of message>` stores a secret phrase and short-circuits
//! the reply. Both are case-insensitive and may appear anywhere in a message.

use regex::Regex;

use caz_core::CoreError;

/// Commands found in one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCommands {
    /// New display name.
    pub display_name: Option<String>,
    /// New secret phrase.
    pub secret_phrase: Option<String>,
}

impl AuthCommands {
    /// Whether the message carried no command.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.secret_phrase.is_none()
    }
}

/// Compiled command patterns.
#[derive(Debug, Clone)]
pub struct AuthParser {
    name: Regex,
    secret: Regex,
}

impl AuthParser {
    /// Compile the patterns.
    ///
    /// # Errors
    /// Only if a pattern fails to compile.
    pub fn new() -> Result<Self, CoreError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| CoreError::Config(e.to_string()));
        Ok(Self {
            name: compile(r"(?i)my name is\s+([a-zA-Z]+)")?,
            secret: compile(r"(?i)set secret\s+(.+)")?,
        })
    }

    /// Scan `message` for commands.
    #[must_use]
    pub fn parse(&self, message: &str) -> AuthCommands {
        let capture = |re: &Regex| {
            re.captures(message)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        AuthCommands {
            display_name: capture(&self.name),
            secret_phrase: capture(&self.secret),
        }
    }
}
