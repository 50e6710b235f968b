//! Parsing failures and how they are reported
//!
//! Every failure quotes the switch exactly as it appeared on the command
//! line, prefix included, so the user can find the offending token without
//! guessing which spelling the parser normalized it to.

/// Unsuccessful command line parsing outcome
///
/// Produced by [`Parser::parse`](crate::Parser::parse) and friends. The
/// rendered message ([`Display`](std::fmt::Display)) is ready to show to a
/// user as-is.
#[derive(Debug, Clone)]
pub struct Error(pub(crate) Message);

#[derive(Debug, Clone)]
pub(crate) enum Message {
    /// A value parser failed to match; reason only, the switch context is
    /// attached later by the switch that invoked the parser
    Value(String),

    /// A numeric value parser matched but the value is outside the
    /// destination's range; reported as a syntax error once wrapped
    Range(String),

    /// A matched switch could not parse one of its arguments
    Syntax {
        switch: String,
        argument: String,
        reason: String,
    },

    /// Required argument absent
    MissingArgument { switch: String, argument: String },

    /// Long switch expects a separator before its value and none matched
    MissingSeparator { switch: String, argument: String },

    /// A short switch parsed but left text in the argument with nestling
    /// disabled
    ExtraText { switch: String, text: String },

    /// Token looks like a switch but no candidate matched
    UnknownSwitch { switch: String },

    /// A retention policy rejected an occurrence
    Retention {
        switch: String,
        key: String,
        reason: &'static str,
    },

    /// Arguments file could not be read or tokenized
    Inclusion {
        file: String,
        line: Option<usize>,
        reason: String,
    },

    /// The switch declaration itself is unusable, e.g. an unparseable
    /// default value
    Declaration(String),
}

impl Error {
    pub(crate) fn value<S: Into<String>>(reason: S) -> Self {
        Error(Message::Value(reason.into()))
    }

    pub(crate) fn range<S: Into<String>>(reason: S) -> Self {
        Error(Message::Range(reason.into()))
    }

    pub(crate) fn declaration<S: Into<String>>(reason: S) -> Self {
        Error(Message::Declaration(reason.into()))
    }

    /// True for errors a parser configured with
    /// [`skip_unknown_switches`](crate::Parser::skip_unknown_switches) may
    /// swallow. Once a switch name has matched, failures of its arguments
    /// abort the parse regardless of the skip setting.
    pub(crate) fn skippable(&self) -> bool {
        matches!(self.0, Message::UnknownSwitch { .. })
    }

    /// Takes the bare reason out of a value-parser error so a switch can
    /// re-wrap it with its own context.
    pub(crate) fn into_reason(self) -> String {
        match self.0 {
            Message::Value(reason) | Message::Range(reason) => reason,
            other => Error(other).to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Message::Value(reason) | Message::Range(reason) => write!(f, "{}", reason),
            Message::Syntax {
                switch,
                argument,
                reason,
            } => {
                write!(
                    f,
                    "switch \"{}\": {}: {}",
                    switch,
                    argument.to_uppercase(),
                    reason
                )
            }
            Message::MissingArgument { switch, argument } => {
                write!(
                    f,
                    "switch \"{}\": missing argument {}",
                    switch,
                    argument.to_uppercase()
                )
            }
            Message::MissingSeparator { switch, argument } => {
                write!(
                    f,
                    "switch \"{}\": expected separator before argument {}",
                    switch,
                    argument.to_uppercase()
                )
            }
            Message::ExtraText { switch, text } => {
                write!(
                    f,
                    "switch \"{}\": extra text \"{}\" after argument",
                    switch, text
                )
            }
            Message::UnknownSwitch { switch } => {
                write!(f, "unrecognized switch \"{}\"", switch)
            }
            Message::Retention {
                switch,
                key,
                reason,
            } => {
                write!(f, "switch \"{}\": key \"{}\" {}", switch, key, reason)
            }
            Message::Inclusion { file, line, reason } => match line {
                Some(line) => write!(f, "{}:{}: {}", file, line, reason),
                None => write!(f, "cannot read \"{}\": {}", file, reason),
            },
            Message::Declaration(reason) => {
                write!(f, "invalid switch declaration: {}", reason)
            }
        }
    }
}

impl std::error::Error for Error {}
