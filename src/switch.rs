//! Switch declarations: names, arguments, retention and documentation
//!
//! A [`Switch`] is a declarative record describing one logical command line
//! option. Switches are collected into [`SwitchGroup`]s, groups into a
//! [`Parser`](crate::Parser). Nothing here executes until the parser runs,
//! and the declarations stay immutable during a parse.

use std::rc::Rc;

use crate::cursor::{Cursor, Location};
use crate::error::{Error, Message};
use crate::parser::SwitchAction;
use crate::value::ParsedValue;
use crate::values::ValueParser;

/// Surface syntax settings, composable across scopes
///
/// Each of the three lists either replaces or extends the enclosing scope's
/// list, controlled by its inherit flag. The effective settings at a switch
/// are the parser's, overlaid by its group's, overlaid by its own.
#[derive(Debug, Clone)]
pub struct ParsingProperties {
    long_prefixes: Vec<String>,
    inherit_long_prefixes: bool,
    short_prefixes: Vec<String>,
    inherit_short_prefixes: bool,
    value_separators: Vec<String>,
    inherit_value_separators: bool,
}

impl Default for ParsingProperties {
    fn default() -> Self {
        ParsingProperties {
            long_prefixes: Vec::new(),
            inherit_long_prefixes: true,
            short_prefixes: Vec::new(),
            inherit_short_prefixes: true,
            value_separators: Vec::new(),
            inherit_value_separators: true,
        }
    }
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl ParsingProperties {
    /// The conventional GNU-ish surface: `--` long, `-` short, `=` or a
    /// following argument for values
    pub fn conventional() -> Self {
        ParsingProperties {
            long_prefixes: vec!["--".to_string()],
            inherit_long_prefixes: false,
            short_prefixes: vec!["-".to_string()],
            inherit_short_prefixes: false,
            value_separators: vec!["=".to_string(), " ".to_string()],
            inherit_value_separators: false,
        }
    }

    pub fn long_prefixes(&self) -> &[String] {
        &self.long_prefixes
    }

    pub fn short_prefixes(&self) -> &[String] {
        &self.short_prefixes
    }

    pub fn value_separators(&self) -> &[String] {
        &self.value_separators
    }

    pub(crate) fn space_separator_allowed(&self) -> bool {
        self.value_separators.iter().any(|s| s == " ")
    }

    pub fn with_long_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.long_prefixes.push(prefix.into());
        self
    }

    pub fn with_short_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.short_prefixes.push(prefix.into());
        self
    }

    pub fn with_value_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.value_separators.push(separator.into());
        self
    }

    /// Replace the long prefixes; inheritance from the enclosing scope is
    /// disabled
    pub fn reset_long_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.long_prefixes = strings(prefixes);
        self.inherit_long_prefixes = false;
        self
    }

    /// Replace the short prefixes; inheritance is disabled
    pub fn reset_short_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_prefixes = strings(prefixes);
        self.inherit_short_prefixes = false;
        self
    }

    /// Replace the value separators; inheritance is disabled
    pub fn reset_value_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_separators = strings(separators);
        self.inherit_value_separators = false;
        self
    }

    /// `base ⊕ override`: an inheriting list extends the base, otherwise it
    /// replaces it
    pub(crate) fn compose(base: &Self, over: &Self) -> Self {
        fn merge(base: &[String], over: &[String], inherit: bool) -> Vec<String> {
            if inherit {
                base.iter().chain(over.iter()).cloned().collect()
            } else {
                over.to_vec()
            }
        }
        ParsingProperties {
            long_prefixes: merge(
                &base.long_prefixes,
                &over.long_prefixes,
                over.inherit_long_prefixes,
            ),
            inherit_long_prefixes: base.inherit_long_prefixes && over.inherit_long_prefixes,
            short_prefixes: merge(
                &base.short_prefixes,
                &over.short_prefixes,
                over.inherit_short_prefixes,
            ),
            inherit_short_prefixes: base.inherit_short_prefixes && over.inherit_short_prefixes,
            value_separators: merge(
                &base.value_separators,
                &over.value_separators,
                over.inherit_value_separators,
            ),
            inherit_value_separators: base.inherit_value_separators
                && over.inherit_value_separators,
        }
    }
}

/// One declared argument slot of a switch
///
/// An argument without a default is required; one with a default is
/// optional, and an occurrence where it fails to match synthesizes a value
/// from the default text with no source position.
pub struct SwitchArgument {
    name: String,
    parser: Rc<dyn ValueParser>,
    default_text: Option<String>,
}

impl SwitchArgument {
    pub fn new<S: Into<String>, P: ValueParser + 'static>(name: S, parser: P) -> Self {
        SwitchArgument {
            name: name.into(),
            parser: Rc::new(parser),
            default_text: None,
        }
    }

    /// Make the argument optional with this literal default
    pub fn default_value<S: Into<String>>(mut self, text: S) -> Self {
        self.default_text = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.default_text.is_none()
    }
}

/// What happens when a key receives values more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Fail if any value is present
    None,
    /// Fail on a second occurrence of the key
    One,
    /// Keep the first occurrence, discard later ones
    First,
    /// Keep only the latest occurrence
    Last,
    /// Keep every occurrence
    All,
    /// Replace stored values with whatever the augmenter returns
    Augmented,
}

/// Combines previously stored values with a new occurrence under
/// [`Retention::Augmented`]
pub type Augmenter = Rc<dyn Fn(&[ParsedValue], Vec<ParsedValue>) -> Vec<ParsedValue>>;

/// Declarative description of one command line switch
pub struct Switch {
    key: String,
    long_names: Vec<String>,
    short_names: Vec<char>,
    arguments: Vec<SwitchArgument>,
    intrinsic: Option<(String, Rc<dyn ValueParser>)>,
    retention: Retention,
    augmenter: Option<Augmenter>,
    actions: Vec<Rc<dyn SwitchAction>>,
    hidden: bool,
    doc: Option<String>,
    synopsis: Option<String>,
    properties: ParsingProperties,
    explode: bool,
}

impl Switch {
    /// New switch whose key and first long name are both `name`
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Switch {
            key: name.clone(),
            long_names: vec![name],
            short_names: Vec::new(),
            arguments: Vec::new(),
            intrinsic: Some((
                "true".to_string(),
                Rc::new(crate::values::boolean_parser()),
            )),
            retention: Retention::Last,
            augmenter: None,
            actions: Vec::new(),
            hidden: false,
            doc: None,
            synopsis: None,
            properties: ParsingProperties::default(),
            explode: false,
        }
    }

    /// Override the key the switch's values are stored under
    pub fn key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = key.into();
        self
    }

    /// Add a long name
    pub fn long<S: Into<String>>(mut self, name: S) -> Self {
        self.long_names.push(name.into());
        self
    }

    /// Replace the long names
    pub fn reset_long_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.long_names = strings(names);
        self
    }

    /// Add a single-character name
    pub fn short(mut self, name: char) -> Self {
        if !self.short_names.contains(&name) {
            self.short_names.push(name);
        }
        self
    }

    /// Append an argument slot
    pub fn argument(mut self, argument: SwitchArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Value emitted when the switch declares no arguments; `text` is run
    /// through `parser` at each occurrence
    pub fn intrinsic_value<S: Into<String>, P: ValueParser + 'static>(
        mut self,
        text: S,
        parser: P,
    ) -> Self {
        self.intrinsic = Some((text.into(), Rc::new(parser)));
        self
    }

    /// Emit no value at all; useful with [`Retention::None`] for switches
    /// that exist only for their actions
    pub fn no_value(mut self) -> Self {
        self.intrinsic = None;
        self
    }

    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    pub fn augmenter<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ParsedValue], Vec<ParsedValue>) -> Vec<ParsedValue> + 'static,
    {
        self.augmenter = Some(Rc::new(f));
        self
    }

    /// Register an action to run when an occurrence is retained
    pub fn action<A: SwitchAction + 'static>(mut self, action: A) -> Self {
        self.actions.push(Rc::new(action));
        self
    }

    /// Omit the switch from generated documentation
    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Documentation text; may use the `@s`/`@v`/`@man`/`@prop`/`@em`/`@b`
    /// markup vocabulary
    pub fn doc<S: Into<String>>(mut self, doc: S) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Override the synthesized synopsis line
    pub fn synopsis<S: Into<String>>(mut self, synopsis: S) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    /// Explode list values into one stored value per element
    pub fn explosive_lists(mut self, explode: bool) -> Self {
        self.explode = explode;
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

    pub fn get_key(&self) -> &str {
        &self.key
    }

    pub fn long_names(&self) -> &[String] {
        &self.long_names
    }

    pub fn short_names(&self) -> &[char] {
        &self.short_names
    }

    pub fn arguments(&self) -> &[SwitchArgument] {
        &self.arguments
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn doc_text(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn synopsis_override(&self) -> Option<&str> {
        self.synopsis.as_deref()
    }

    pub(crate) fn has_names(&self) -> bool {
        !self.long_names.is_empty() || !self.short_names.is_empty()
    }

    pub(crate) fn get_retention(&self) -> Retention {
        self.retention
    }

    pub(crate) fn get_augmenter(&self) -> Option<&Augmenter> {
        self.augmenter.as_ref()
    }

    pub(crate) fn get_actions(&self) -> &[Rc<dyn SwitchAction>] {
        &self.actions
    }

    pub(crate) fn explodes(&self) -> bool {
        self.explode
    }

    pub(crate) fn get_properties(&self) -> &ParsingProperties {
        &self.properties
    }

    /// First long name if any, else the first short name
    pub fn preferred_name(&self) -> String {
        match self.long_names.first() {
            Some(name) => name.clone(),
            None => self
                .short_names
                .first()
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }

    /// Try to match one of the long names at the cursor. On success the
    /// cursor has consumed `prefix + name` and the literal token is
    /// returned; the value separator, if any, is left for argument
    /// matching. A name that matches but leaves an impossible follow-on
    /// position does not count, so a longer sibling can still win.
    pub(crate) fn match_long(
        &self,
        cursor: &mut Cursor,
        props: &ParsingProperties,
    ) -> Option<String> {
        if !cursor.at_arg_begin() {
            return None;
        }
        let rest = cursor.rest().to_string();
        for prefix in props.long_prefixes() {
            let Some(after_prefix) = rest.strip_prefix(prefix.as_str()) else {
                continue;
            };
            for name in &self.long_names {
                let Some(after) = after_prefix.strip_prefix(name.as_str()) else {
                    continue;
                };
                let matches = if after.is_empty() {
                    true
                } else if self.arguments.is_empty() {
                    // a switch without arguments cannot be followed by
                    // anything in the same token
                    false
                } else {
                    props
                        .value_separators()
                        .iter()
                        .any(|sep| sep != " " && after.starts_with(sep.as_str()))
                };
                if matches {
                    let token_len = prefix.len() + name.len();
                    let token = rest[..token_len].to_string();
                    cursor.consume_chars(token.chars().count());
                    return Some(token);
                }
            }
        }
        None
    }

    /// Try to match one short name at the cursor. At an argument boundary a
    /// short prefix is required; inside a nestled run it is optional. The
    /// cursor consumes the prefix, if present, plus one character.
    pub(crate) fn match_short(
        &self,
        cursor: &mut Cursor,
        props: &ParsingProperties,
        at_begin: bool,
    ) -> Option<(char, Option<String>)> {
        let rest = cursor.rest().to_string();
        for prefix in props.short_prefixes() {
            if let Some(after) = rest.strip_prefix(prefix.as_str()) {
                if let Some(ch) = after.chars().next() {
                    if self.short_names.contains(&ch) {
                        cursor.consume_chars(prefix.chars().count() + 1);
                        return Some((ch, Some(prefix.clone())));
                    }
                }
            }
        }
        if !at_begin {
            if let Some(ch) = rest.chars().next() {
                if self.short_names.contains(&ch) {
                    cursor.consume_chars(1);
                    return Some((ch, None));
                }
            }
        }
        None
    }

    /// Parse the declared arguments after a name matched at `switch_loc`;
    /// `token` is the switch as typed. For long switches every argument
    /// must end at an argument boundary and optional arguments never
    /// consume a separate program argument, which is what keeps trailing
    /// optionals unambiguous.
    pub(crate) fn parse_arguments(
        &self,
        cursor: &mut Cursor,
        props: &ParsingProperties,
        token: &str,
        switch_loc: Location,
        long: bool,
    ) -> Result<Vec<ParsedValue>, Error> {
        let mut values = Vec::new();

        if self.arguments.is_empty() {
            if let Some((text, parser)) = &self.intrinsic {
                let matched = parser.parse_str(text).map_err(|err| {
                    Error::declaration(format!(
                        "intrinsic value {:?}: {}",
                        text,
                        err.into_reason()
                    ))
                })?;
                let mut value = ParsedValue::new(matched.value)
                    .with_saver(parser.saver())
                    .with_value_source(Location::NOWHERE, text.clone());
                value.set_switch_context(&self.key, &self.preferred_name(), token, switch_loc);
                values.push(value);
            }
            return Ok(values);
        }

        for argument in &self.arguments {
            let arg_start = cursor.location();
            if cursor.at_end() {
                match self.default_for(argument, token, switch_loc)? {
                    Some(value) => values.push(value),
                    None => {
                        return Err(Error(Message::MissingArgument {
                            switch: token.to_string(),
                            argument: argument.name.clone(),
                        }))
                    }
                }
                continue;
            }

            let mut had_separator = false;
            if cursor.at_arg_begin() {
                // crossing into the next program argument is the implicit
                // space separator; optional arguments stay behind so a
                // trailing optional never swallows an unrelated token
                if !argument.is_required() {
                    match self.default_for(argument, token, switch_loc)? {
                        Some(value) => values.push(value),
                        None => {}
                    }
                    continue;
                }
                if !props.space_separator_allowed() {
                    return Err(Error(Message::MissingSeparator {
                        switch: token.to_string(),
                        argument: argument.name.clone(),
                    }));
                }
            } else {
                let rest = cursor.rest().to_string();
                let separator = props
                    .value_separators()
                    .iter()
                    .find(|sep| sep.as_str() != " " && rest.starts_with(sep.as_str()))
                    .cloned();
                match separator {
                    Some(sep) => {
                        cursor.consume_chars(sep.chars().count());
                        had_separator = true;
                    }
                    None if long => {
                        if argument.is_required() {
                            return Err(Error(Message::MissingSeparator {
                                switch: token.to_string(),
                                argument: argument.name.clone(),
                            }));
                        }
                        match self.default_for(argument, token, switch_loc)? {
                            Some(value) => values.push(value),
                            None => {}
                        }
                        continue;
                    }
                    // short form: the value may follow the name directly
                    None => {}
                }
            }

            let start = cursor.location();
            let parsed = cursor.excursion(|cursor| argument.parser.parse(cursor));
            match parsed {
                Ok(inner) => {
                    let end = cursor.location();
                    if long && !(cursor.at_arg_begin() || cursor.at_end()) {
                        return Err(Error(Message::ExtraText {
                            switch: token.to_string(),
                            text: cursor.rest().to_string(),
                        }));
                    }
                    let text = cursor.substring(start, end, " ");
                    let mut value = ParsedValue::new(inner)
                        .with_saver(argument.parser.saver())
                        .with_value_source(start, text);
                    value.set_switch_context(&self.key, &self.preferred_name(), token, switch_loc);
                    values.push(value);
                }
                Err(err) => {
                    // text explicitly attached with a separator belongs to
                    // this argument, so a parse failure there is final
                    if argument.is_required() || had_separator {
                        return Err(Error(Message::Syntax {
                            switch: token.to_string(),
                            argument: argument.name.clone(),
                            reason: err.into_reason(),
                        }));
                    }
                    cursor.seek(arg_start);
                    match self.default_for(argument, token, switch_loc)? {
                        Some(value) => values.push(value),
                        None => {}
                    }
                }
            }
        }
        Ok(values)
    }

    fn default_for(
        &self,
        argument: &SwitchArgument,
        token: &str,
        switch_loc: Location,
    ) -> Result<Option<ParsedValue>, Error> {
        let Some(text) = &argument.default_text else {
            return Ok(None);
        };
        let matched = argument.parser.parse_str(text).map_err(|err| {
            Error::declaration(format!(
                "default value {:?} for argument {}: {}",
                text,
                argument.name,
                err.into_reason()
            ))
        })?;
        let mut value = ParsedValue::new(matched.value)
            .with_saver(argument.parser.saver())
            .with_value_source(Location::NOWHERE, text.clone());
        value.set_switch_context(&self.key, &self.preferred_name(), token, switch_loc);
        Ok(Some(value))
    }
}

/// Ordered collection of switches with shared documentation and syntax
/// overrides
pub struct SwitchGroup {
    title: String,
    doc: Option<String>,
    switches: Vec<Switch>,
    properties: ParsingProperties,
}

impl SwitchGroup {
    pub fn new<S: Into<String>>(title: S) -> Self {
        SwitchGroup {
            title: title.into(),
            doc: None,
            switches: Vec::new(),
            properties: ParsingProperties::default(),
        }
    }

    pub fn doc<S: Into<String>>(mut self, doc: S) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_switch(mut self, switch: Switch) -> Self {
        assert!(
            switch.has_names(),
            "switch {:?} declares neither a long nor a short name",
            switch.key
        );
        self.switches.push(switch);
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

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn doc_text(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub(crate) fn get_properties(&self) -> &ParsingProperties {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{integer_parser, string_set_parser};

    fn cursor(args: &[&str]) -> Cursor {
        Cursor::new(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn composition_overlays_scopes() {
        let base = ParsingProperties::conventional();
        let group = ParsingProperties::default().with_long_prefix("-rose:");
        let effective = ParsingProperties::compose(&base, &group);
        assert_eq!(effective.long_prefixes(), &["--", "-rose:"]);

        let switch = ParsingProperties::default().reset_long_prefixes(["++"]);
        let effective = ParsingProperties::compose(&effective, &switch);
        assert_eq!(effective.long_prefixes(), &["++"]);
    }

    #[test]
    fn reset_disables_inheritance_on_every_list() {
        let p = ParsingProperties::default()
            .reset_long_prefixes(["++"])
            .reset_short_prefixes(["+"])
            .reset_value_separators([":"]);
        let base = ParsingProperties::conventional();
        let effective = ParsingProperties::compose(&base, &p);
        assert_eq!(effective.long_prefixes(), &["++"]);
        assert_eq!(effective.short_prefixes(), &["+"]);
        assert_eq!(effective.value_separators(), &[":"]);
    }

    #[test]
    fn long_name_matches_whole_token() {
        let sw = Switch::new("width")
            .argument(SwitchArgument::new("n", integer_parser()));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--width", "80"]);
        assert_eq!(sw.match_long(&mut c, &props), Some("--width".to_string()));
        assert!(c.at_arg_begin());
    }

    #[test]
    fn long_name_with_separator_leaves_separator() {
        let sw = Switch::new("width")
            .argument(SwitchArgument::new("n", integer_parser()));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--width=80"]);
        assert_eq!(sw.match_long(&mut c, &props), Some("--width".to_string()));
        assert_eq!(c.rest(), "=80");
    }

    #[test]
    fn argumentless_switch_rejects_inline_text() {
        let sw = Switch::new("verbose");
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--verbose=yes"]);
        assert_eq!(sw.match_long(&mut c, &props), None);
        assert_eq!(c.rest(), "--verbose=yes");
    }

    #[test]
    fn longer_name_wins_over_its_prefix() {
        let sw = Switch::new("width")
            .long("width-max")
            .argument(SwitchArgument::new("n", integer_parser()));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--width-max=3"]);
        assert_eq!(sw.match_long(&mut c, &props), Some("--width-max".to_string()));
    }

    #[test]
    fn short_name_requires_prefix_at_argument_start() {
        let sw = Switch::new("verbose").short('v');
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["v"]);
        assert_eq!(sw.match_short(&mut c, &props, true), None);
        let mut c = cursor(&["-v"]);
        assert_eq!(
            sw.match_short(&mut c, &props, true),
            Some(('v', Some("-".to_string())))
        );
    }

    #[test]
    fn short_name_inside_run_needs_no_prefix() {
        let sw = Switch::new("b-flag").reset_long_names(None::<String>).short('b');
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["-ab"]);
        c.consume_chars(2); // a previous short switch consumed "-a"
        assert_eq!(sw.match_short(&mut c, &props, false), Some(('b', None)));
        assert!(c.at_end());
    }

    #[test]
    fn separator_value_parses_inline() {
        let sw = Switch::new("width")
            .argument(SwitchArgument::new("n", integer_parser()));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--width=80"]);
        let token = sw.match_long(&mut c, &props).unwrap();
        let vs = sw
            .parse_arguments(&mut c, &props, &token, Location::new(0, 0), true)
            .unwrap();
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].as_integer().unwrap(), 80);
        assert_eq!(vs[0].value_string(), "80");
        assert!(c.at_end());
    }

    #[test]
    fn missing_required_argument() {
        let sw = Switch::new("width")
            .argument(SwitchArgument::new("n", integer_parser()));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--width"]);
        let token = sw.match_long(&mut c, &props).unwrap();
        let err = sw
            .parse_arguments(&mut c, &props, &token, Location::new(0, 0), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "switch \"--width\": missing argument N");
    }

    #[test]
    fn optional_argument_at_boundary_takes_default() {
        let sw = Switch::new("optimize").argument(
            SwitchArgument::new("level", integer_parser()).default_value("2"),
        );
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--optimize", "file.c"]);
        let token = sw.match_long(&mut c, &props).unwrap();
        let vs = sw
            .parse_arguments(&mut c, &props, &token, Location::new(0, 0), true)
            .unwrap();
        assert_eq!(vs[0].as_integer().unwrap(), 2);
        assert!(vs[0].value_location().is_nowhere());
        // the unrelated token was not swallowed
        assert_eq!(c.rest(), "file.c");
    }

    #[test]
    fn long_argument_must_fill_the_token() {
        let sw = Switch::new("color")
            .argument(SwitchArgument::new("when", string_set_parser(["auto", "never"])));
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--color=autopilot"]);
        let token = sw.match_long(&mut c, &props).unwrap();
        let err = sw
            .parse_arguments(&mut c, &props, &token, Location::new(0, 0), true)
            .unwrap_err();
        assert!(err.to_string().contains("extra text"));
    }

    #[test]
    fn intrinsic_value_for_argumentless_switch() {
        let sw = Switch::new("verbose");
        let props = ParsingProperties::conventional();
        let mut c = cursor(&["--verbose"]);
        let token = sw.match_long(&mut c, &props).unwrap();
        let vs = sw
            .parse_arguments(&mut c, &props, &token, Location::new(0, 0), true)
            .unwrap();
        assert_eq!(vs.len(), 1);
        assert!(vs[0].as_boolean().unwrap());
        assert!(vs[0].value_location().is_nowhere());
    }
}
