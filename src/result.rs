//! Indexed store of everything a parse produced
//!
//! Building a [`ParserResult`] has no side effects beyond the registered
//! switch actions; value savers only run when [`apply`](ParserResult::apply)
//! is called, so a command line can be validated and thrown away without
//! touching program state.

use std::collections::{BTreeMap, BTreeSet};

use crate::cursor::{Cursor, Location};
use crate::error::{Error, Message};
use crate::parser::Parser;
use crate::switch::{Retention, Switch};
use crate::value::ParsedValue;

/// Result of one parse: every stored value plus indexes to find them by
/// key, by preferred switch name or by source position
#[derive(Debug)]
pub struct ParserResult {
    cursor: Cursor,
    values: Vec<ParsedValue>,
    key_index: BTreeMap<String, Vec<usize>>,
    name_index: BTreeMap<String, Vec<usize>>,
    position_index: BTreeMap<Location, Vec<usize>>,
    skipped: Vec<usize>,
    terminators: Vec<usize>,
    parsed_ranges: Vec<(usize, usize)>,
    pending_exit: Option<i32>,
}

impl ParserResult {
    pub(crate) fn new(cursor: Cursor) -> Self {
        ParserResult {
            cursor,
            values: Vec::new(),
            key_index: BTreeMap::new(),
            name_index: BTreeMap::new(),
            position_index: BTreeMap::new(),
            skipped: Vec::new(),
            terminators: Vec::new(),
            parsed_ranges: Vec::new(),
            pending_exit: None,
        }
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// The cursor the parse ran over; its location is where parsing stopped
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub(crate) fn record_skip(&mut self, idx: usize) {
        self.skipped.push(idx);
    }

    pub(crate) fn record_terminator(&mut self, idx: usize) {
        self.terminators.push(idx);
    }

    pub(crate) fn record_parsed_range(&mut self, start: usize, end: usize) {
        if start < end {
            self.parsed_ranges.push((start, end));
        }
    }

    /// Ask for the process to exit with `status` once the result has been
    /// applied; used by the `exit_program` action
    pub fn request_exit(&mut self, status: i32) {
        self.pending_exit = Some(status);
    }

    /// Store one switch occurrence under the switch's retention policy and,
    /// if anything was stored, run its actions in declaration order
    pub(crate) fn insert(
        &mut self,
        parser: &Parser,
        switch: &Switch,
        mut values: Vec<ParsedValue>,
    ) -> Result<(), Error> {
        if switch.explodes() {
            values = explode(values);
        }
        let key = switch.get_key().to_string();
        let token = values
            .first()
            .map(|v| v.switch_string().to_string())
            .unwrap_or_else(|| switch.preferred_name());

        let mut stored_any = false;
        match switch.get_retention() {
            Retention::None => {
                if !values.is_empty() {
                    return Err(Error(Message::Retention {
                        switch: token,
                        key,
                        reason: "accepts no saved values",
                    }));
                }
            }
            Retention::One => {
                if self.has_key(&key) {
                    return Err(Error(Message::Retention {
                        switch: token,
                        key,
                        reason: "may be saved only once",
                    }));
                }
                stored_any = self.store_all(values);
            }
            Retention::First => {
                if !self.has_key(&key) {
                    stored_any = self.store_all(values);
                }
            }
            Retention::Last => {
                self.clear_key(&key);
                stored_any = self.store_all(values);
            }
            Retention::All => {
                stored_any = self.store_all(values);
            }
            Retention::Augmented => {
                let augmenter = switch.get_augmenter().ok_or_else(|| {
                    Error::declaration(format!(
                        "switch \"{}\" retains augmented values but has no augmenter",
                        key
                    ))
                })?;
                let prior = self.parsed(&key);
                let replacement = augmenter(&prior, values);
                self.clear_key(&key);
                stored_any = self.store_all(replacement);
            }
        }

        if stored_any {
            for action in switch.get_actions() {
                action.run(parser, self)?;
            }
        }
        Ok(())
    }

    fn has_key(&self, key: &str) -> bool {
        self.key_index.get(key).map_or(false, |v| !v.is_empty())
    }

    fn store_all(&mut self, values: Vec<ParsedValue>) -> bool {
        let any = !values.is_empty();
        for value in values {
            self.store_one(value);
        }
        any
    }

    fn store_one(&mut self, mut value: ParsedValue) {
        let key = value.key().to_string();
        let name = value.preferred_name().to_string();
        let key_sequence = self.key_index.get(&key).map_or(0, Vec::len);
        let switch_sequence = self.name_index.get(&name).map_or(0, Vec::len);
        value.set_sequences(key_sequence, switch_sequence);

        let pos = self.values.len();
        let location = value.switch_location();
        self.values.push(value);
        self.key_index.entry(key).or_default().push(pos);
        self.name_index.entry(name).or_default().push(pos);
        // NOWHERE never enters the position index
        if !location.is_nowhere() {
            self.position_index.entry(location).or_default().push(pos);
        }
    }

    fn clear_key(&mut self, key: &str) {
        let Some(positions) = self.key_index.remove(key) else {
            return;
        };
        for pos in positions {
            let name = self.values[pos].preferred_name().to_string();
            if let Some(list) = self.name_index.get_mut(&name) {
                list.retain(|p| *p != pos);
            }
            let location = self.values[pos].switch_location();
            if let Some(list) = self.position_index.get_mut(&location) {
                list.retain(|p| *p != pos);
            }
        }
    }

    /// Values stored under `key`, in command line order
    pub fn parsed(&self, key: &str) -> Vec<ParsedValue> {
        match self.key_index.get(key) {
            Some(positions) => positions.iter().map(|p| self.values[*p].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// The `i`-th value stored under `key`
    pub fn parsed_at(&self, key: &str, i: usize) -> Option<ParsedValue> {
        let pos = *self.key_index.get(key)?.get(i)?;
        Some(self.values[pos].clone())
    }

    /// Whether any value was stored under `key`
    pub fn have(&self, key: &str) -> bool {
        self.has_key(key)
    }

    /// Values stored under a preferred switch name
    pub fn parsed_by_name(&self, name: &str) -> Vec<ParsedValue> {
        match self.name_index.get(name) {
            Some(positions) => positions.iter().map(|p| self.values[*p].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Values whose switch token started at `location`
    pub fn parsed_at_location(&self, location: Location) -> Vec<ParsedValue> {
        match self.position_index.get(&location) {
            Some(positions) => positions.iter().map(|p| self.values[*p].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Input strings the driver skipped over
    pub fn skipped_args(&self) -> Vec<String> {
        self.args_at(self.skipped.iter().copied())
    }

    /// Input strings from the point where parsing stopped to the end
    pub fn unreached_args(&self) -> Vec<String> {
        let start = self.cursor.location().idx;
        self.args_at(start..self.cursor.strings().len())
    }

    /// Skipped and unreached strings together, optionally with the
    /// termination sentinels themselves
    pub fn unparsed_args(&self, include_terminators: bool) -> Vec<String> {
        let mut indices: BTreeSet<usize> = self.skipped.iter().copied().collect();
        indices.extend(self.cursor.location().idx..self.cursor.strings().len());
        if include_terminators {
            indices.extend(self.terminators.iter().copied());
        }
        self.args_at(indices)
    }

    /// Input strings that contributed to a stored value or a termination
    pub fn parsed_args(&self) -> Vec<String> {
        let mut indices: BTreeSet<usize> = self.terminators.iter().copied().collect();
        for (start, end) in &self.parsed_ranges {
            indices.extend(*start..*end);
        }
        self.args_at(indices)
    }

    fn args_at<I: IntoIterator<Item = usize>>(&self, indices: I) -> Vec<String> {
        let strings = self.cursor.strings();
        indices
            .into_iter()
            .filter_map(|i| strings.get(i).cloned())
            .collect()
    }

    /// Run every stored value's saver, in key-grouped command line order,
    /// then honor any pending exit request
    ///
    /// Keeping this separate from parsing lets a caller validate a command
    /// line and discard the result without mutating program state.
    pub fn apply(mut self) -> Result<Self, Error> {
        let order: Vec<usize> = self
            .key_index
            .values()
            .flat_map(|positions| positions.iter().copied())
            .collect();
        for pos in order {
            self.values[pos].save()?;
        }
        if let Some(status) = self.pending_exit.take() {
            std::process::exit(status);
        }
        Ok(self)
    }
}

fn explode(values: Vec<ParsedValue>) -> Vec<ParsedValue> {
    let mut out = Vec::new();
    for value in values {
        match value.value().as_list() {
            Some(elements) => {
                let elements = elements.to_vec();
                for element in elements {
                    let mut single = value.clone();
                    single.replace_value(element);
                    out.push(single);
                }
            }
            None => out.push(value),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::switch::Retention;
    use crate::value::{ParsedValue, Value};

    fn occurrence(key: &str, n: i64) -> Vec<ParsedValue> {
        let mut v = ParsedValue::new(Value::Integer(n));
        v.set_switch_context(key, key, &format!("--{}", key), Location::new(n as usize, 0));
        vec![v]
    }

    fn result() -> ParserResult {
        ParserResult::new(Cursor::new(Vec::new()))
    }

    fn switch(retention: Retention) -> Switch {
        Switch::new("x").retention(retention)
    }

    #[test]
    fn save_all_appends_in_order() {
        let parser = Parser::new();
        let sw = switch(Retention::All);
        let mut r = result();
        for n in 0..3 {
            r.insert(&parser, &sw, occurrence("x", n)).unwrap();
        }
        let vs = r.parsed("x");
        assert_eq!(vs.len(), 3);
        for (i, v) in vs.iter().enumerate() {
            assert_eq!(v.as_integer().unwrap(), i as i64);
            assert_eq!(v.key_sequence(), i);
            assert_eq!(v.switch_sequence(), i);
        }
    }

    #[test]
    fn save_one_rejects_duplicates() {
        let parser = Parser::new();
        let sw = switch(Retention::One);
        let mut r = result();
        r.insert(&parser, &sw, occurrence("x", 0)).unwrap();
        let err = r.insert(&parser, &sw, occurrence("x", 1)).unwrap_err();
        assert!(err.to_string().contains("\"x\""));
        assert_eq!(r.parsed("x").len(), 1);
    }

    #[test]
    fn save_first_discards_later_occurrences() {
        let parser = Parser::new();
        let sw = switch(Retention::First);
        let mut r = result();
        r.insert(&parser, &sw, occurrence("x", 7)).unwrap();
        r.insert(&parser, &sw, occurrence("x", 8)).unwrap();
        let vs = r.parsed("x");
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].as_integer().unwrap(), 7);
    }

    #[test]
    fn save_last_keeps_only_the_latest() {
        let parser = Parser::new();
        let sw = switch(Retention::Last);
        let mut r = result();
        r.insert(&parser, &sw, occurrence("x", 7)).unwrap();
        r.insert(&parser, &sw, occurrence("x", 8)).unwrap();
        let vs = r.parsed("x");
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].as_integer().unwrap(), 8);
        // the replacement restarts the key sequence
        assert_eq!(vs[0].key_sequence(), 0);
    }

    #[test]
    fn save_none_rejects_values() {
        let parser = Parser::new();
        let sw = switch(Retention::None);
        let mut r = result();
        let err = r.insert(&parser, &sw, occurrence("x", 0)).unwrap_err();
        assert!(err.to_string().contains("accepts no saved values"));
    }

    #[test]
    fn save_none_without_values_is_a_no_op() {
        let parser = Parser::new();
        let sw = switch(Retention::None);
        let mut r = result();
        r.insert(&parser, &sw, Vec::new()).unwrap();
        assert!(!r.have("x"));
    }

    #[test]
    fn augmenter_replaces_stored_values() {
        let parser = Parser::new();
        // keep whichever occurrence has the larger payload
        let sw = switch(Retention::Augmented).augmenter(|prior, fresh| {
            let best_prior = prior.iter().filter_map(|v| v.as_integer().ok()).max();
            let best_fresh = fresh.iter().filter_map(|v| v.as_integer().ok()).max();
            if best_fresh >= best_prior {
                fresh
            } else {
                prior.to_vec()
            }
        });
        let mut r = result();
        r.insert(&parser, &sw, occurrence("x", 9)).unwrap();
        r.insert(&parser, &sw, occurrence("x", 4)).unwrap();
        let vs = r.parsed("x");
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].as_integer().unwrap(), 9);
    }

    #[test]
    fn exploded_list_becomes_individual_values() {
        let parser = Parser::new();
        let sw = Switch::new("dirs")
            .retention(Retention::All)
            .explosive_lists(true);
        let mut v = ParsedValue::new(Value::List(vec![
            Value::Text("a".into()),
            Value::Text("b".into()),
        ]));
        v.set_switch_context("dirs", "dirs", "--dirs", Location::new(0, 0));
        let mut r = result();
        r.insert(&parser, &sw, vec![v]).unwrap();
        let vs = r.parsed("dirs");
        assert_eq!(vs.len(), 2);
        assert_eq!(vs[0].as_text(), "a");
        assert_eq!(vs[1].as_text(), "b");
        assert_eq!(vs[1].key_sequence(), 1);
    }

    #[test]
    fn position_index_ignores_nowhere() {
        let parser = Parser::new();
        let sw = switch(Retention::All);
        let mut v = ParsedValue::new(Value::Boolean(true));
        v.set_switch_context("x", "x", "--x", Location::NOWHERE);
        let mut r = result();
        r.insert(&parser, &sw, vec![v]).unwrap();
        assert!(r.parsed_at_location(Location::NOWHERE).is_empty());
    }
}
