//! The parser driver: walks the command line and dispatches to switches

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use crate::cursor::{Cursor, Location};
use crate::error::{Error, Message};
use crate::include;
use crate::result::ParserResult;
use crate::switch::{ParsingProperties, Switch, SwitchGroup};
use crate::value::ParsedValue;

/// Side effect registered on a switch, run when an occurrence is retained
///
/// Value savers, in contrast, run only during
/// [`ParserResult::apply`](crate::ParserResult::apply).
pub trait SwitchAction {
    fn run(&self, parser: &Parser, result: &mut ParserResult) -> Result<(), Error>;
}

/// Prints the parser's version string to standard error
pub struct ShowVersion;

pub fn show_version() -> ShowVersion {
    ShowVersion
}

impl SwitchAction for ShowVersion {
    fn run(&self, parser: &Parser, _result: &mut ParserResult) -> Result<(), Error> {
        match parser.version_string() {
            Some(version) => eprintln!("{}", version),
            None => eprintln!("{}: version unknown", parser.display_program_name()),
        }
        Ok(())
    }
}

/// Renders the manual page and pipes it through the host pager
pub struct ShowHelp;

pub fn show_help() -> ShowHelp {
    ShowHelp
}

impl SwitchAction for ShowHelp {
    fn run(&self, parser: &Parser, _result: &mut ParserResult) -> Result<(), Error> {
        parser.emit_manual()
    }
}

/// Exits the process with `status` after the parser result is applied
pub struct ExitProgram(i32);

pub fn exit_program(status: i32) -> ExitProgram {
    ExitProgram(status)
}

impl SwitchAction for ExitProgram {
    fn run(&self, _parser: &Parser, result: &mut ParserResult) -> Result<(), Error> {
        result.request_exit(self.0);
        Ok(())
    }
}

/// Wraps an arbitrary closure as a switch action
pub struct UserAction<F>(F);

pub fn user_action<F>(f: F) -> UserAction<F>
where
    F: Fn(&Parser, &mut ParserResult) -> Result<(), Error>,
{
    UserAction(f)
}

impl<F> SwitchAction for UserAction<F>
where
    F: Fn(&Parser, &mut ParserResult) -> Result<(), Error>,
{
    fn run(&self, parser: &Parser, result: &mut ParserResult) -> Result<(), Error> {
        (self.0)(parser, result)
    }
}

pub(crate) type DocTagHandler = Rc<dyn Fn(&[String]) -> String>;

/// Root of a command line declaration
///
/// Holds the switch groups, the surface syntax settings, program metadata
/// and the documentation sections; immutable during a call to
/// [`parse`](Parser::parse).
pub struct Parser {
    groups: Vec<SwitchGroup>,
    properties: ParsingProperties,
    termination_switches: Vec<String>,
    inclusion_prefixes: Vec<String>,
    skip_unknown: bool,
    skip_nonswitches: bool,
    short_may_nestle: bool,
    program_name: Option<String>,
    purpose: Option<String>,
    version: Option<String>,
    chapter: (String, String),
    doc_sections: Vec<(String, String)>,
    doc_tags: BTreeMap<String, DocTagHandler>,
    exit_message: Option<String>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            groups: Vec::new(),
            properties: ParsingProperties::conventional(),
            termination_switches: vec!["--".to_string()],
            inclusion_prefixes: vec!["@".to_string()],
            skip_unknown: false,
            skip_nonswitches: false,
            short_may_nestle: true,
            program_name: None,
            purpose: None,
            version: None,
            chapter: ("1".to_string(), "User Commands".to_string()),
            doc_sections: Vec::new(),
            doc_tags: BTreeMap::new(),
            exit_message: None,
        }
    }

    pub fn with_group(mut self, group: SwitchGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn program_name<S: Into<String>>(mut self, name: S) -> Self {
        self.program_name = Some(name.into());
        self
    }

    /// One-line description shown in the NAME section of the manual
    pub fn purpose<S: Into<String>>(mut self, purpose: S) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Manual chapter: section number and title
    pub fn chapter<A: Into<String>, B: Into<String>>(mut self, number: A, title: B) -> Self {
        self.chapter = (number.into(), title.into());
        self
    }

    /// Add or replace a user-authored documentation section
    pub fn doc_section<A: Into<String>, B: Into<String>>(mut self, title: A, markup: B) -> Self {
        let title = title.into();
        match self.doc_sections.iter_mut().find(|(t, _)| *t == title) {
            Some((_, text)) => *text = markup.into(),
            None => self.doc_sections.push((title, markup.into())),
        }
        self
    }

    /// Register a custom documentation tag, expanded as `@name{arg}...`
    pub fn doc_tag<S, F>(mut self, name: S, handler: F) -> Self
    where
        S: Into<String>,
        F: Fn(&[String]) -> String + 'static,
    {
        self.doc_tags.insert(name.into(), Rc::new(handler));
        self
    }

    /// Replace the termination sentinels (default `--`)
    pub fn reset_termination_switches<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.termination_switches = sentinels.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the file-inclusion prefixes (default `@`)
    pub fn reset_inclusion_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inclusion_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Skip tokens that look like switches but match nothing
    pub fn skip_unknown_switches(mut self, skip: bool) -> Self {
        self.skip_unknown = skip;
        self
    }

    /// Skip tokens that do not look like switches instead of stopping
    pub fn skip_nonswitches(mut self, skip: bool) -> Self {
        self.skip_nonswitches = skip;
        self
    }

    /// Allow `-abc` to mean `-a -b -c`
    pub fn short_may_nestle(mut self, nestle: bool) -> Self {
        self.short_may_nestle = nestle;
        self
    }

    /// Message appended after a reported error by
    /// [`parse_or_exit`](Parser::parse_or_exit)
    pub fn exit_message<S: Into<String>>(mut self, message: S) -> Self {
        self.exit_message = Some(message.into());
        self
    }

    pub fn with_long_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.properties = self.properties.with_long_prefix(prefix);
        self
    }

    pub fn with_short_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.properties = self.properties.with_short_prefix(prefix);
        self
    }

    pub fn with_value_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.properties = self.properties.with_value_separator(separator);
        self
    }

    pub fn reset_long_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = self.properties.reset_long_prefixes(prefixes);
        self
    }

    pub fn reset_short_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = self.properties.reset_short_prefixes(prefixes);
        self
    }

    pub fn reset_value_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = self.properties.reset_value_separators(separators);
        self
    }

    pub fn groups(&self) -> &[SwitchGroup] {
        &self.groups
    }

    pub fn properties(&self) -> &ParsingProperties {
        &self.properties
    }

    pub fn termination_switches(&self) -> &[String] {
        &self.termination_switches
    }

    pub fn inclusion_prefixes(&self) -> &[String] {
        &self.inclusion_prefixes
    }

    pub fn get_program_name(&self) -> Option<&str> {
        self.program_name.as_deref()
    }

    pub fn get_purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn version_string(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get_chapter(&self) -> (&str, &str) {
        (&self.chapter.0, &self.chapter.1)
    }

    pub(crate) fn get_doc_sections(&self) -> &[(String, String)] {
        &self.doc_sections
    }

    pub(crate) fn get_doc_tag(&self, name: &str) -> Option<&DocTagHandler> {
        self.doc_tags.get(name)
    }

    pub(crate) fn display_program_name(&self) -> String {
        self.program_name
            .clone()
            .unwrap_or_else(|| "program".to_string())
    }

    /// Effective syntax settings at `switch` inside `group`
    pub(crate) fn effective_properties(
        &self,
        group: &SwitchGroup,
        switch: &Switch,
    ) -> ParsingProperties {
        let group_props = ParsingProperties::compose(&self.properties, group.get_properties());
        ParsingProperties::compose(&group_props, switch.get_properties())
    }

    /// Parse an explicit sequence of program arguments
    pub fn parse<I, S>(&self, args: I) -> Result<ParserResult, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cursor = Cursor::new(args.into_iter().map(Into::into).collect());
        let mut result = ParserResult::new(cursor);
        self.drive(&mut result)?;
        Ok(result)
    }

    /// Parse the process arguments, skipping the program name
    pub fn parse_argv(&self) -> Result<ParserResult, Error> {
        self.parse(std::env::args().skip(1))
    }

    /// Parse, and on failure report the error to standard error followed by
    /// the configured exit message or a hint at a declared `help` switch,
    /// then terminate with a non-zero status
    pub fn parse_or_exit<I, S>(&self, args: I) -> ParserResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.parse(args) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("{}: {}", self.display_program_name(), err);
                match &self.exit_message {
                    Some(message) => eprintln!("{}", message),
                    None => {
                        if let Some(token) = self.help_hint() {
                            eprintln!("invoke with \"{}\" to see usage information", token);
                        }
                    }
                }
                std::process::exit(1);
            }
        }
    }

    fn help_hint(&self) -> Option<String> {
        for group in &self.groups {
            for switch in group.switches() {
                if switch.get_key() == "help" {
                    let props = self.effective_properties(group, switch);
                    let prefix = props.long_prefixes().first()?.clone();
                    let name = switch.long_names().first()?.clone();
                    return Some(format!("{}{}", prefix, name));
                }
            }
        }
        None
    }

    fn drive(&self, result: &mut ParserResult) -> Result<(), Error> {
        loop {
            let Some(arg) = result.cursor().arg().map(str::to_string) else {
                return Ok(());
            };
            let idx = result.cursor().location().idx;

            // termination sentinel ends the parse, contributing no values
            if self.termination_switches.iter().any(|t| *t == arg) {
                result.record_terminator(idx);
                result.cursor_mut().consume_arg();
                return Ok(());
            }

            // file inclusion splices tokens in place and retries the same
            // position
            if let Some(prefix) = self
                .inclusion_prefixes
                .iter()
                .find(|p| arg.starts_with(p.as_str()) && arg.len() > p.len())
            {
                let path = arg[prefix.len()..].to_string();
                let tokens = include::read_arguments_file(Path::new(&path))?;
                result.cursor_mut().replace(tokens);
                continue;
            }

            if !self.looks_like_switch(&arg) {
                if self.skip_nonswitches {
                    result.record_skip(idx);
                    result.cursor_mut().consume_arg();
                    continue;
                }
                return Ok(());
            }

            match self.parse_one_switch(result) {
                Ok(()) => {}
                Err(err) if self.skip_unknown && err.skippable() => {
                    result.record_skip(idx);
                    result.cursor_mut().consume_arg();
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// A token is switch-looking when it starts with a prefix effective
    /// anywhere in the declaration and has at least one more character
    fn looks_like_switch(&self, arg: &str) -> bool {
        let check = |props: &ParsingProperties| {
            props
                .long_prefixes()
                .iter()
                .chain(props.short_prefixes())
                .any(|p| arg.len() > p.len() && arg.starts_with(p.as_str()))
        };
        if check(&self.properties) {
            return true;
        }
        for group in &self.groups {
            for switch in group.switches() {
                if check(&self.effective_properties(group, switch)) {
                    return true;
                }
            }
        }
        false
    }

    fn parse_one_switch(&self, result: &mut ParserResult) -> Result<(), Error> {
        let start_loc = result.cursor().location();
        let start_idx = start_loc.idx;
        let mut saved_error: Option<Error> = None;

        // long names first, groups and switches in declaration order
        for group in &self.groups {
            for switch in group.switches() {
                let props = self.effective_properties(group, switch);
                let attempt = result.cursor_mut().excursion(|cursor| {
                    match switch.match_long(cursor, &props) {
                        Some(token) => {
                            let values =
                                switch.parse_arguments(cursor, &props, &token, start_loc, true)?;
                            Ok(Some(values))
                        }
                        None => Ok(None),
                    }
                });
                match attempt {
                    Ok(Some(values)) => {
                        let end_idx = result.cursor().location().idx.max(start_idx + 1);
                        result.insert(self, switch, values)?;
                        result.record_parsed_range(start_idx, end_idx);
                        return Ok(());
                    }
                    Ok(None) => {}
                    Err(err) => {
                        saved_error.get_or_insert(err);
                    }
                }
            }
        }

        if self.short_may_nestle {
            if self.parse_short_run(result, start_loc, &mut saved_error)? {
                return Ok(());
            }
        } else {
            for group in &self.groups {
                for switch in group.switches() {
                    let props = self.effective_properties(group, switch);
                    let attempt = result.cursor_mut().excursion(|cursor| {
                        match switch.match_short(cursor, &props, true) {
                            Some((ch, prefix)) => {
                                let token = format!("{}{}", prefix.unwrap_or_default(), ch);
                                let values = switch
                                    .parse_arguments(cursor, &props, &token, start_loc, false)?;
                                if !(cursor.at_arg_begin() || cursor.at_end()) {
                                    return Err(Error(Message::ExtraText {
                                        switch: token,
                                        text: cursor.rest().to_string(),
                                    }));
                                }
                                Ok(Some(values))
                            }
                            None => Ok(None),
                        }
                    });
                    match attempt {
                        Ok(Some(values)) => {
                            let end_idx = result.cursor().location().idx.max(start_idx + 1);
                            result.insert(self, switch, values)?;
                            result.record_parsed_range(start_idx, end_idx);
                            return Ok(());
                        }
                        Ok(None) => {}
                        Err(err) => {
                            saved_error.get_or_insert(err);
                        }
                    }
                }
            }
        }

        if let Some(err) = saved_error {
            return Err(err);
        }
        let token = result.cursor().arg().unwrap_or_default().to_string();
        Err(Error(Message::UnknownSwitch { switch: token }))
    }

    /// Match short switches against one argument until it is exhausted;
    /// either the whole run commits or none of it does
    fn parse_short_run(
        &self,
        result: &mut ParserResult,
        start_loc: Location,
        saved_error: &mut Option<Error>,
    ) -> Result<bool, Error> {
        let start_idx = start_loc.idx;
        let saved_cursor = result.cursor().location();
        let mut pending: Vec<(&Switch, Vec<ParsedValue>)> = Vec::new();
        let mut at_begin = true;
        let mut run_prefix: Option<String> = None;

        loop {
            let mut advanced = false;
            'candidates: for group in &self.groups {
                for switch in group.switches() {
                    let props = self.effective_properties(group, switch);
                    let shown_prefix = run_prefix.clone();
                    let attempt = result.cursor_mut().excursion(|cursor| {
                        match switch.match_short(cursor, &props, at_begin) {
                            Some((ch, prefix)) => {
                                let shown = prefix
                                    .clone()
                                    .or(shown_prefix)
                                    .unwrap_or_default();
                                let token = format!("{}{}", shown, ch);
                                let values = switch
                                    .parse_arguments(cursor, &props, &token, start_loc, false)?;
                                Ok(Some((prefix, values)))
                            }
                            None => Ok(None),
                        }
                    });
                    match attempt {
                        Ok(Some((prefix, values))) => {
                            if prefix.is_some() {
                                run_prefix = prefix;
                            }
                            pending.push((switch, values));
                            advanced = true;
                            break 'candidates;
                        }
                        Ok(None) => {}
                        Err(err) => {
                            saved_error.get_or_insert(err);
                        }
                    }
                }
            }
            if !advanced {
                // nothing matched at this position: the whole run is off
                result.cursor_mut().seek(saved_cursor);
                return Ok(false);
            }
            at_begin = false;
            if result.cursor().at_arg_begin() || result.cursor().at_end() {
                break;
            }
        }

        if pending.is_empty() {
            result.cursor_mut().seek(saved_cursor);
            return Ok(false);
        }
        let end_idx = result.cursor().location().idx.max(start_idx + 1);
        for (switch, values) in pending {
            result.insert(self, switch, values)?;
        }
        result.record_parsed_range(start_idx, end_idx);
        Ok(true)
    }
}
