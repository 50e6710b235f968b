//! Character-level position tracking over a sequence of program arguments

use crate::error::Error;

/// A character position within a sequence of program argument strings
///
/// `idx` selects one of the input strings, `offset` is a byte index within
/// that string. [`Location::NOWHERE`] marks values that have no source
/// position, such as defaults synthesized for absent optional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub idx: usize,
    pub offset: usize,
}

impl Location {
    /// "no source position"
    pub const NOWHERE: Location = Location {
        idx: usize::MAX,
        offset: usize::MAX,
    };

    pub fn new(idx: usize, offset: usize) -> Self {
        Location { idx, offset }
    }

    pub fn is_nowhere(&self) -> bool {
        *self == Location::NOWHERE
    }
}

/// Mutable position within an ordered sequence of program arguments
///
/// The location is kept normalized: whenever the offset reaches the end of
/// the current string the cursor advances to the start of the next one, so
/// a cursor either points at a real character or sits at the end of the
/// input. Argument boundaries (offset 0) are meaningful to switch parsing,
/// which is why consuming the last character of an argument lands on the
/// start of the next rather than one-past-the-end.
#[derive(Debug, Clone)]
pub struct Cursor {
    strings: Vec<String>,
    loc: Location,
}

impl Cursor {
    pub fn new(strings: Vec<String>) -> Self {
        let mut cursor = Cursor {
            strings,
            loc: Location::new(0, 0),
        };
        cursor.normalize();
        cursor
    }

    fn normalize(&mut self) {
        while self.loc.idx < self.strings.len()
            && self.loc.offset >= self.strings[self.loc.idx].len()
        {
            self.loc.idx += 1;
            self.loc.offset = 0;
        }
    }

    /// The input strings the cursor walks over
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn location(&self) -> Location {
        self.loc
    }

    /// Reposition the cursor; the location is re-normalized
    pub fn seek(&mut self, loc: Location) {
        self.loc = loc;
        self.normalize();
    }

    /// Past the last character of the last input string
    pub fn at_end(&self) -> bool {
        self.loc.idx >= self.strings.len()
    }

    /// At the first character of an input string
    pub fn at_arg_begin(&self) -> bool {
        !self.at_end() && self.loc.offset == 0
    }

    /// The whole current argument, `None` at the end of input
    pub fn arg(&self) -> Option<&str> {
        self.strings.get(self.loc.idx).map(String::as_str)
    }

    /// The unconsumed suffix of the current argument, empty at end of input
    pub fn rest(&self) -> &str {
        match self.strings.get(self.loc.idx) {
            Some(s) => &s[self.loc.offset..],
            None => "",
        }
    }

    /// Advance by `n` characters, wrapping into following strings as the
    /// current one is exhausted
    pub fn consume_chars(&mut self, n: usize) {
        for _ in 0..n {
            if self.at_end() {
                break;
            }
            let ch = match self.rest().chars().next() {
                Some(ch) => ch,
                None => break,
            };
            self.loc.offset += ch.len_utf8();
            self.normalize();
        }
    }

    /// Jump to the start of the next input string regardless of offset
    pub fn consume_arg(&mut self) {
        if !self.at_end() {
            self.loc.idx += 1;
            self.loc.offset = 0;
            self.normalize();
        }
    }

    /// Characters between two locations, with `separator` inserted at every
    /// string boundary crossed
    pub fn substring(&self, from: Location, to: Location, separator: &str) -> String {
        if from.is_nowhere() || to.is_nowhere() || to <= from {
            return String::new();
        }
        let mut out = String::new();
        let last = to.idx.min(self.strings.len().saturating_sub(1));
        for idx in from.idx..=last {
            let s = match self.strings.get(idx) {
                Some(s) => s,
                None => break,
            };
            let start = if idx == from.idx {
                from.offset.min(s.len())
            } else {
                0
            };
            let end = if idx == to.idx {
                to.offset.min(s.len())
            } else {
                s.len()
            };
            // a boundary landing exactly on the start of `to.idx`
            // contributes nothing, not a trailing separator
            if idx == to.idx && idx > from.idx && end == 0 {
                break;
            }
            if idx > from.idx {
                out.push_str(separator);
            }
            if start < end {
                out.push_str(&s[start..end]);
            }
        }
        out
    }

    /// Remove the current input string and splice `args` in its place; the
    /// cursor moves to the start of the first spliced string
    pub fn replace(&mut self, args: Vec<String>) {
        if self.at_end() {
            return;
        }
        let idx = self.loc.idx;
        self.strings.splice(idx..=idx, args);
        self.loc = Location::new(idx, 0);
        self.normalize();
    }

    /// Characters from the start of the input to the current offset
    ///
    /// Sub-cursors created over an extracted substring report through this
    /// how far they got, so the owning cursor can advance by the same
    /// amount.
    pub fn linear_distance(&self) -> usize {
        let mut chars = 0;
        for idx in 0..self.loc.idx.min(self.strings.len()) {
            chars += self.strings[idx].chars().count();
        }
        if let Some(s) = self.strings.get(self.loc.idx) {
            chars += s[..self.loc.offset.min(s.len())].chars().count();
        }
        chars
    }

    /// Run `f` with the location saved; an `Err` return rolls the location
    /// back, an `Ok` return keeps whatever `f` consumed
    pub fn excursion<T>(
        &mut self,
        f: impl FnOnce(&mut Cursor) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = self.loc;
        match f(self) {
            ok @ Ok(_) => ok,
            Err(err) => {
                self.loc = saved;
                Err(err)
            }
        }
    }
}
