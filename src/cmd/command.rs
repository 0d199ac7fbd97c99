//! Route / clear directives and the line grammar of the command file.
//!
//! ```text
//! 7.31.44.92        route input 7 to outputs 31, 44 and 92
//! !7                clear every output desired by input 7
//! 3.1, 4.2  # note  several directives on one line, trailing comment
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::fabric::{InputId, PortId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add `outputs` to the desired fan-out of `input`.
    Route { input: InputId, outputs: Vec<PortId> },
    /// Release every output currently desired by `input`.
    Clear { input: InputId },
}

impl Command {
    pub fn input(&self) -> InputId {
        match self {
            Command::Route { input, .. } | Command::Clear { input } => *input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("blank line")]
    Empty,

    #[error("empty directive between separators")]
    EmptyDirective,

    #[error("`{token}` is not a non-negative integer")]
    NotInteger { token: String },

    #[error("route for input {input} lists no output ports")]
    MissingTargets { input: u32 },
}

fn parse_id(token: &str) -> Result<u32, ParseError> {
    let token = token.trim();
    let not_integer = || ParseError::NotInteger {
        token: token.to_string(),
    };
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_integer());
    }
    token.parse().map_err(|_| not_integer())
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::EmptyDirective);
        }

        if let Some(rest) = s.strip_prefix('!') {
            let input = InputId(parse_id(rest)?);
            return Ok(Command::Clear { input });
        }

        let mut tokens = s.split('.');
        let input = parse_id(tokens.next().unwrap_or_default())?;
        let outputs = tokens
            .map(|t| parse_id(t).map(PortId))
            .collect::<Result<Vec<_>, _>>()?;
        if outputs.is_empty() {
            return Err(ParseError::MissingTargets { input });
        }
        Ok(Command::Route {
            input: InputId(input),
            outputs,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Clear { input } => write!(f, "!{input}"),
            Command::Route { input, outputs } => {
                write!(f, "{input}")?;
                for port in outputs {
                    write!(f, ".{port}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse one line of the command file.
///
/// The whole line is parsed before anything is returned, so a malformed
/// directive anywhere on the line rejects all of it. A line holding only a
/// comment yields no directives; a blank line is an error.
pub fn parse_line(line: &str) -> Result<Vec<Command>, ParseError> {
    let (body, commented) = match line.split_once('#') {
        Some((body, _)) => (body, true),
        None => (line, false),
    };
    let body = body.trim();
    if body.is_empty() {
        return if commented {
            Ok(Vec::new())
        } else {
            Err(ParseError::Empty)
        };
    }
    body.split(',').map(str::parse).collect()
}
