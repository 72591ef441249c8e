//! # WT3000 command grammar
//!
//! Program messages sent to the analyzer follow a hierarchical, SCPI-like
//! grammar built from a closed vocabulary of mnemonics:
//!
//! - a **query** renders as `<group>[<header>]?`
//! - a **setting** renders as `<group>[<header>] <argument>`
//!
//! Common commands (`*CLS`, `*IDN`) are groups that take no header.
//! Validation happens in [`Command::build`], before anything reaches the wire.

use crate::constants::{MAX_INPUT_ELEMENT, MAX_STATUS_FILTER};
use crate::error::{Result, WTError};
use std::fmt;
use strum_macros::{AsRefStr, Display};

/// Appended to a program header to turn it into a query.
pub const QUERY_SUFFIX: char = '?';

/// Top level of the command tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Group {
    #[strum(serialize = "*CLS")]
    ClearStatus,
    #[strum(serialize = "*IDN")]
    Identify,
    #[strum(serialize = ":COMMunicate")]
    Communicate,
    #[strum(serialize = ":INPut")]
    Input,
    #[strum(serialize = ":NUMeric")]
    Numeric,
    #[strum(serialize = ":STATus")]
    Status,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::ClearStatus,
        Group::Identify,
        Group::Communicate,
        Group::Input,
        Group::Numeric,
        Group::Status,
    ];

    /// IEEE 488.2 common commands start with `*` and never carry a header.
    pub fn is_common(&self) -> bool {
        matches!(self, Group::ClearStatus | Group::Identify)
    }

    fn is_query_only(&self) -> bool {
        matches!(self, Group::Identify)
    }

    fn is_command_only(&self) -> bool {
        matches!(self, Group::ClearStatus)
    }
}

/// Second level of the command tree. Numbered headers carry their suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    /// `:COMMunicate:HEADer`, whether responses carry a header
    ResponseHeader,
    /// `:COMMunicate:OVERlap`
    Overlap,
    /// `:COMMunicate:REMote`
    Remote,
    /// `:COMMunicate:VERBose`, full or abbreviated spelling in responses
    Verbose,
    /// `:INPut:MODUle<n>`
    Module(u8),
    /// `:NUMeric:FORMat`
    Format,
    /// `:NUMeric:VALue`
    Value,
    /// `:STATus:EESE`
    ExtendedEventStatusEnable,
    /// `:STATus:FILTer<n>`
    Filter(u8),
}

impl Header {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Header::ResponseHeader => ":HEADer",
            Header::Overlap => ":OVERlap",
            Header::Remote => ":REMote",
            Header::Verbose => ":VERBose",
            Header::Module(_) => ":MODUle",
            Header::Format => ":FORMat",
            Header::Value => ":VALue",
            Header::ExtendedEventStatusEnable => ":EESE",
            Header::Filter(_) => ":FILTer",
        }
    }

    /// The group this header lives under.
    pub fn group(&self) -> Group {
        match self {
            Header::ResponseHeader | Header::Overlap | Header::Remote | Header::Verbose => Group::Communicate,
            Header::Module(_) => Group::Input,
            Header::Format | Header::Value => Group::Numeric,
            Header::ExtendedEventStatusEnable | Header::Filter(_) => Group::Status,
        }
    }

    /// Token set used when this header takes a boolean, if it takes one at all.
    pub fn switch_tokens(&self) -> Option<SwitchTokens> {
        match self {
            Header::ResponseHeader | Header::Overlap | Header::Remote | Header::Verbose => Some(SwitchTokens::OnOff),
            Header::ExtendedEventStatusEnable => Some(SwitchTokens::Numeric),
            _ => None,
        }
    }

    fn is_query_only(&self) -> bool {
        matches!(self, Header::Module(_) | Header::Value)
    }

    /// Checks the numeric suffix of numbered headers against the instrument's range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Header::Module(n) if !(1..=MAX_INPUT_ELEMENT).contains(&n) => Err(WTError::InvalidArgument(format!(
                "input element {n} out of range 1..={MAX_INPUT_ELEMENT}"
            ))),
            Header::Filter(n) if !(1..=MAX_STATUS_FILTER).contains(&n) => Err(WTError::InvalidArgument(format!(
                "status filter {n} out of range 1..={MAX_STATUS_FILTER}"
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Module(n) | Header::Filter(n) => write!(f, "{}{}", self.mnemonic(), n),
            _ => f.write_str(self.mnemonic()),
        }
    }
}

/// Literal tokens a header accepts for a boolean argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTokens {
    /// `ON` / `OFF`
    OnOff,
    /// `1` / `0`
    Numeric,
}

impl SwitchTokens {
    pub fn render(&self, on: bool) -> &'static str {
        match (self, on) {
            (SwitchTokens::OnOff, true) => "ON",
            (SwitchTokens::OnOff, false) => "OFF",
            (SwitchTokens::Numeric, true) => "1",
            (SwitchTokens::Numeric, false) => "0",
        }
    }
}

/// A single program message, not yet rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub group: Group,
    pub header: Option<Header>,
    pub argument: Option<String>,
    pub query: bool,
}

impl Command {
    /// A common command without header or argument, e.g. `*CLS`.
    pub fn common(group: Group) -> Self {
        Self {
            group,
            header: None,
            argument: None,
            query: false,
        }
    }

    pub fn query(group: Group, header: Option<Header>) -> Self {
        Self {
            group,
            header,
            argument: None,
            query: true,
        }
    }

    pub fn set(header: Header, argument: impl Into<String>) -> Self {
        Self {
            group: header.group(),
            header: Some(header),
            argument: Some(argument.into()),
            query: false,
        }
    }

    /// A boolean setting rendered with the header's own token set.
    pub fn switch(header: Header, on: bool) -> Result<Self> {
        let tokens = header
            .switch_tokens()
            .ok_or_else(|| WTError::MalformedCommand(format!("{header} does not take a boolean argument")))?;
        Ok(Self::set(header, tokens.render(on)))
    }

    /// Renders the exact ASCII program message, without terminator.
    pub fn build(&self) -> Result<String> {
        let argument = self.argument.as_deref().filter(|a| !a.is_empty());
        if let (true, Some(argument)) = (self.query, argument) {
            return Err(WTError::MalformedCommand(format!(
                "query on {} cannot carry argument {argument:?}",
                self.group
            )));
        }

        if let Some(header) = self.header {
            if self.group.is_common() {
                return Err(WTError::MalformedCommand(format!(
                    "common command {} takes no header, got {header}",
                    self.group
                )));
            }
            if header.group() != self.group {
                return Err(WTError::MalformedCommand(format!(
                    "{header} does not belong to {}",
                    self.group
                )));
            }
            header.validate()?;
        }

        let mut program = String::with_capacity(32);
        program.push_str(self.group.as_ref());
        if let Some(header) = self.header {
            program.push_str(&header.to_string());
        }

        if self.query {
            if self.group.is_command_only() {
                return Err(WTError::MalformedCommand(format!("{program} has no query form")));
            }
            program.push(QUERY_SUFFIX);
            return Ok(program);
        }

        if self.group.is_query_only() || self.header.is_some_and(|h| h.is_query_only()) {
            return Err(WTError::MalformedCommand(format!("{program} is query-only")));
        }
        match argument {
            Some(argument) => {
                program.push(' ');
                program.push_str(argument);
            }
            None if !self.group.is_common() => {
                return Err(WTError::MalformedCommand(format!("{program} requires an argument")));
            }
            None => {}
        }
        Ok(program)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build() {
            Ok(program) => f.write_str(&program),
            Err(_) => write!(f, "<malformed {:?}>", self),
        }
    }
}

/// SCPI mnemonic match: either the short form (the upper-case part) or the
/// whole long form, compared case-insensitively.
pub fn mnemonic_matches(long_form: &str, text: &str) -> bool {
    let text = text.trim();
    let short_form: String = long_form
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    text.eq_ignore_ascii_case(&short_form) || text.eq_ignore_ascii_case(long_form)
}
