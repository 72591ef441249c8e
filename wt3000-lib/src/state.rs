use crate::command::mnemonic_matches;
use crate::error::{Result, WTError};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum_macros::{Display, IntoStaticStr};

/// Transition that latches a status filter (`:STATus:FILTer<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum TransitionCondition {
    #[strum(serialize = "RISE")]
    Rise,
    #[strum(serialize = "FALL")]
    Fall,
    #[strum(serialize = "BOTH")]
    Both,
    #[strum(serialize = "NEVER")]
    Never,
}

impl TransitionCondition {
    pub const ALL: [TransitionCondition; 4] = [
        TransitionCondition::Rise,
        TransitionCondition::Fall,
        TransitionCondition::Both,
        TransitionCondition::Never,
    ];

    /// Argument token sent to the instrument.
    pub fn token(self) -> &'static str {
        self.into()
    }
}

impl FromStr for TransitionCondition {
    type Err = WTError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|condition| condition.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| WTError::InvalidArgument(format!("unknown transition condition {s:?}")))
    }
}

/// Wire representation of `:NUMeric:VALue?` data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum NumericFormat {
    /// Comma-separated ASCII decimals
    #[strum(serialize = "ASCii")]
    Ascii,
    /// IEEE single-precision floats
    #[strum(serialize = "FLOat")]
    Float,
}

impl NumericFormat {
    pub const ALL: [NumericFormat; 2] = [NumericFormat::Ascii, NumericFormat::Float];

    pub fn token(self) -> &'static str {
        self.into()
    }

    /// Recognises a format name given in short or long mnemonic form.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| mnemonic_matches(format.token(), text))
    }
}

/// Where a facade sits in its lifecycle. Informational only; no operation is
/// refused based on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connected,
    /// Connected, and a numeric format has been selected
    Configured,
}

/// Formatting and behaviour flags the instrument has been told to adopt.
///
/// Every field reflects a command that was confirmed sent; the facade only
/// mutates it after a successful transmission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationState {
    remote: bool,
    overlap: bool,
    verbose: bool,
    header: bool,
    extended_event_status_enable: bool,
    status_filter: BTreeMap<u8, TransitionCondition>,
    numeric_format: Option<NumericFormat>,
}

impl ConfigurationState {
    pub fn remote(&self) -> bool {
        self.remote
    }

    pub fn overlap(&self) -> bool {
        self.overlap
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn header(&self) -> bool {
        self.header
    }

    pub fn extended_event_status_enable(&self) -> bool {
        self.extended_event_status_enable
    }

    pub fn status_filter(&self, number: u8) -> Option<TransitionCondition> {
        self.status_filter.get(&number).copied()
    }

    pub fn status_filters(&self) -> &BTreeMap<u8, TransitionCondition> {
        &self.status_filter
    }

    /// `None` until a format is configured, or when an unchecked format name
    /// was not recognised.
    pub fn numeric_format(&self) -> Option<NumericFormat> {
        self.numeric_format
    }

    pub(crate) fn set_remote(&mut self, on: bool) {
        self.remote = on;
    }

    pub(crate) fn set_overlap(&mut self, on: bool) {
        self.overlap = on;
    }

    pub(crate) fn set_verbose(&mut self, on: bool) {
        self.verbose = on;
    }

    pub(crate) fn set_header(&mut self, on: bool) {
        self.header = on;
    }

    pub(crate) fn set_extended_event_status_enable(&mut self, on: bool) {
        self.extended_event_status_enable = on;
    }

    pub(crate) fn set_status_filter(&mut self, number: u8, condition: TransitionCondition) {
        self.status_filter.insert(number, condition);
    }

    pub(crate) fn set_numeric_format(&mut self, format: Option<NumericFormat>) {
        self.numeric_format = format;
    }
}
