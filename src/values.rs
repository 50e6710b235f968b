//! Value parsers: matchers that turn command line text into [`Value`]s
//!
//! A value parser consumes some prefix of the text at a [`Cursor`] and
//! produces a typed value, or fails without advancing. Most parsers only
//! need to look at a plain string, so the trait requires the string-facing
//! [`parse_str`](ValueParser::parse_str) and bridges the cursor-facing
//! [`parse`](ValueParser::parse) onto it; parsers that are naturally
//! cursor-shaped, like the list combinator, override `parse` instead.

use std::rc::Rc;

use regex::Regex;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::value::{Bind, NumericCell, RealCell, Value, ValueSaver};

/// Successful string-level match: the value and the matched byte length
#[derive(Debug, Clone)]
pub struct ValueMatch {
    pub value: Value,
    pub len: usize,
}

/// A matcher for one value on the command line
pub trait ValueParser {
    /// Match against a plain string, returning the value and how many bytes
    /// of `input` were consumed
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error>;

    /// Match at the cursor, advancing it past the matched text
    fn parse(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        if cursor.at_end() {
            return Err(Error::value("nothing to parse"));
        }
        let rest = cursor.rest().to_string();
        let matched = self.parse_str(&rest)?;
        let chars = rest[..matched.len].chars().count();
        cursor.consume_chars(chars);
        Ok(matched.value)
    }

    /// Storage slot the parsed value is written to during apply
    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        None
    }
}

/// Accepts the entire remainder of the current argument as a string
#[derive(Clone, Default)]
pub struct AnyParser {
    saver: Option<Rc<dyn ValueSaver>>,
}

/// Accepts anything, produces the text as-is
pub fn any_parser() -> AnyParser {
    AnyParser::default()
}

impl AnyParser {
    pub fn saving(mut self, cell: &Bind<String>) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }

    pub fn saving_all(mut self, cell: &Bind<Vec<String>>) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }
}

impl ValueParser for AnyParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        Ok(ValueMatch {
            value: Value::Text(input.to_string()),
            len: input.len(),
        })
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

// scanned magnitude plus how much text it covered; magnitude saturates just
// past u64::MAX so range checks against any real destination still fail
struct Scan {
    magnitude: u128,
    overflow: bool,
    negative: bool,
    len: usize,
}

fn scan_integer(input: &str, allow_minus: bool) -> Result<Scan, Error> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut negative = false;
    match bytes.first() {
        Some(b'+') => i += 1,
        Some(b'-') if allow_minus => {
            negative = true;
            i += 1;
        }
        _ => {}
    }

    // strtoll-style base detection: 0x/0X is hex when a hex digit follows,
    // a bare leading 0 selects octal and is itself the first digit
    let base: u32;
    if (input[i..].starts_with("0x") || input[i..].starts_with("0X"))
        && bytes.get(i + 2).map_or(false, u8::is_ascii_hexdigit)
    {
        base = 16;
        i += 2;
    } else if bytes.get(i) == Some(&b'0') {
        base = 8;
    } else {
        base = 10;
    }

    let digits_start = i;
    let mut magnitude: u128 = 0;
    let mut overflow = false;
    while let Some(d) = bytes.get(i).and_then(|b| (*b as char).to_digit(base)) {
        magnitude = magnitude * base as u128 + d as u128;
        if magnitude > u64::MAX as u128 {
            overflow = true;
            magnitude = u64::MAX as u128 + 1;
        }
        i += 1;
    }
    if i == digits_start {
        return Err(Error::value("integer expected"));
    }
    Ok(Scan {
        magnitude,
        overflow,
        negative,
        len: i,
    })
}

/// Signed and unsigned integer matcher with destination range enforcement
#[derive(Clone)]
pub struct IntegerParser {
    lo: i128,
    hi: i128,
    unsigned: bool,
    saver: Option<Rc<dyn ValueSaver>>,
}

/// Optionally signed integer in any C base, 64-bit signed result
pub fn integer_parser() -> IntegerParser {
    IntegerParser {
        lo: i64::MIN as i128,
        hi: i64::MAX as i128,
        unsigned: false,
        saver: None,
    }
}

/// Unsigned integer, 64-bit unsigned result
pub fn unsigned_integer_parser() -> IntegerParser {
    IntegerParser {
        lo: 0,
        hi: u64::MAX as i128,
        unsigned: true,
        saver: None,
    }
}

/// Signed integer restricted to zero and above
pub fn non_negative_integer_parser() -> IntegerParser {
    IntegerParser {
        lo: 0,
        hi: i64::MAX as i128,
        unsigned: false,
        saver: None,
    }
}

impl IntegerParser {
    /// Bind to a destination cell; the destination's own range becomes part
    /// of what the parser accepts, so overflow is reported at parse time
    pub fn saving<C: NumericCell>(mut self, cell: &C) -> Self {
        let (lo, hi) = C::bounds();
        self.lo = self.lo.max(lo);
        self.hi = self.hi.min(hi);
        self.saver = Some(Rc::new(cell.clone()));
        self
    }

    /// Append every occurrence to a vector cell without narrowing the range
    pub fn saving_all(mut self, cell: &Bind<Vec<i64>>) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }
}

impl ValueParser for IntegerParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        let scan = scan_integer(input, !self.unsigned)?;
        let text = &input[..scan.len];
        let value: i128 = if scan.overflow {
            if scan.negative {
                i128::MIN
            } else {
                i128::MAX
            }
        } else if scan.negative {
            -(scan.magnitude as i128)
        } else {
            scan.magnitude as i128
        };
        if value > self.hi {
            return Err(Error::range(format!(
                "{} is greater than the maximum {}",
                text, self.hi
            )));
        }
        if value < self.lo {
            return Err(Error::range(format!(
                "{} is less than the minimum {}",
                text, self.lo
            )));
        }
        let value = if self.unsigned {
            Value::Unsigned(value as u64)
        } else {
            Value::Integer(value as i64)
        };
        Ok(ValueMatch {
            value,
            len: scan.len,
        })
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

/// Floating-point literal matcher
#[derive(Clone, Default)]
pub struct RealNumberParser {
    saver: Option<Rc<dyn ValueSaver>>,
}

pub fn real_number_parser() -> RealNumberParser {
    RealNumberParser::default()
}

impl RealNumberParser {
    pub fn saving<C: RealCell>(mut self, cell: &C) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }
}

impl ValueParser for RealNumberParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        let bytes = input.as_bytes();
        let mut i = 0;
        if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let mut digits = 0;
        while bytes.get(i).map_or(false, u8::is_ascii_digit) {
            i += 1;
            digits += 1;
        }
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            while bytes.get(i).map_or(false, u8::is_ascii_digit) {
                i += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(Error::value("floating-point number expected"));
        }
        if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
                j += 1;
            }
            if bytes.get(j).map_or(false, u8::is_ascii_digit) {
                while bytes.get(j).map_or(false, u8::is_ascii_digit) {
                    j += 1;
                }
                i = j;
            }
        }
        let text = &input[..i];
        let value = text
            .parse::<f64>()
            .map_err(|_| Error::value("floating-point number expected"))?;
        Ok(ValueMatch {
            value: Value::Real(value),
            len: i,
        })
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

// longest first so "off" beats "o.." prefixes and "false" beats "f"
const BOOLEAN_WORDS: &[(&str, bool)] = &[
    ("false", false),
    ("true", true),
    ("yes", true),
    ("off", false),
    ("no", false),
    ("on", true),
    ("0", false),
    ("1", true),
    ("t", true),
    ("f", false),
    ("y", true),
    ("n", false),
];

/// Case-insensitive boolean word matcher
#[derive(Clone, Default)]
pub struct BooleanParser {
    saver: Option<Rc<dyn ValueSaver>>,
}

pub fn boolean_parser() -> BooleanParser {
    BooleanParser::default()
}

impl BooleanParser {
    pub fn saving(mut self, cell: &Bind<bool>) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }
}

impl ValueParser for BooleanParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        for (word, value) in BOOLEAN_WORDS {
            let prefix = input.get(..word.len());
            if prefix.map_or(false, |p| p.eq_ignore_ascii_case(word)) {
                return Ok(ValueMatch {
                    value: Value::Boolean(*value),
                    len: word.len(),
                });
            }
        }
        Err(Error::value("boolean expected"))
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

/// Matches one literal out of a fixed set, longest match wins
#[derive(Clone)]
pub struct StringSetParser {
    words: Vec<String>,
    saver: Option<Rc<dyn ValueSaver>>,
}

pub fn string_set_parser<I, S>(words: I) -> StringSetParser
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StringSetParser {
        words: words.into_iter().map(Into::into).collect(),
        saver: None,
    }
}

impl StringSetParser {
    pub fn with_word<S: Into<String>>(mut self, word: S) -> Self {
        self.words.push(word.into());
        self
    }

    pub fn saving(mut self, cell: &Bind<String>) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }
}

impl ValueParser for StringSetParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        let best = self
            .words
            .iter()
            .filter(|w| input.starts_with(w.as_str()))
            .max_by_key(|w| w.len());
        match best {
            Some(word) => Ok(ValueMatch {
                value: Value::Text(word.clone()),
                len: word.len(),
            }),
            None => Err(Error::value("specific word expected")),
        }
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

struct EnumSlot<T> {
    cell: Bind<T>,
}

impl<T: Clone + 'static> ValueSaver for EnumSlot<T> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        match value.downcast_ref::<T>() {
            Some(tag) => {
                self.cell.set(tag.clone());
                Ok(())
            }
            None => Err(Error::value("unexpected value type")),
        }
    }
}

/// String set whose match is mapped through a user table to an arbitrary tag
pub struct EnumParser<T> {
    table: Vec<(String, T)>,
    saver: Option<Rc<dyn ValueSaver>>,
}

pub fn enum_parser<T: Clone + 'static>() -> EnumParser<T> {
    EnumParser {
        table: Vec::new(),
        saver: None,
    }
}

impl<T: Clone + 'static> EnumParser<T> {
    pub fn with<S: Into<String>>(mut self, word: S, tag: T) -> Self {
        self.table.push((word.into(), tag));
        self
    }

    pub fn saving(mut self, cell: &Bind<T>) -> Self {
        self.saver = Some(Rc::new(EnumSlot { cell: cell.clone() }));
        self
    }
}

impl<T: Clone + 'static> ValueParser for EnumParser<T> {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        let best = self
            .table
            .iter()
            .filter(|(w, _)| input.starts_with(w.as_str()))
            .max_by_key(|(w, _)| w.len());
        match best {
            Some((word, tag)) => Ok(ValueMatch {
                value: Value::Opaque(Rc::new(tag.clone())),
                len: word.len(),
            }),
            None => Err(Error::value("specific word expected")),
        }
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

struct ListMember {
    parser: Rc<dyn ValueParser>,
    separator: Regex,
}

/// Parses a separated list of values
///
/// Each member pairs a value parser with the regular expression that
/// follows it; the last member repeats for any further elements. The parse
/// is all-or-nothing with respect to cursor position.
pub struct ListParser {
    members: Vec<ListMember>,
    min: usize,
    max: usize,
    saver: Option<Rc<dyn ValueSaver>>,
}

/// List of values recognized by `parser`, separated by matches of the
/// `separator` regular expression
///
/// # Panics
///
/// Panics if `separator` is not a valid regular expression; separators are
/// part of the parser declaration, not of its input.
pub fn list_parser<P: ValueParser + 'static>(parser: P, separator: &str) -> ListParser {
    ListParser {
        members: vec![ListMember {
            parser: Rc::new(parser),
            separator: compile_separator(separator),
        }],
        min: 1,
        max: usize::MAX,
        saver: None,
    }
}

fn compile_separator(separator: &str) -> Regex {
    match Regex::new(separator) {
        Ok(re) => re,
        Err(err) => panic!("invalid list separator regex {:?}: {}", separator, err),
    }
}

impl ListParser {
    /// Append another member descriptor; the final member repeats
    pub fn and_member<P: ValueParser + 'static>(mut self, parser: P, separator: &str) -> Self {
        self.members.push(ListMember {
            parser: Rc::new(parser),
            separator: compile_separator(separator),
        });
        self
    }

    /// Permitted element counts, both inclusive
    pub fn limits(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Require exactly `n` elements
    pub fn exactly(self, n: usize) -> Self {
        self.limits(n, n)
    }

    /// Saver invoked once per element when the owning switch explodes
    /// lists, or once with the whole list otherwise
    pub fn saving<C: ValueSaver + Clone + 'static>(mut self, cell: &C) -> Self {
        self.saver = Some(Rc::new(cell.clone()));
        self
    }

    fn count_error(&self, got: usize) -> Error {
        let msg = if self.min == self.max {
            format!("expected exactly {} values, got {}", self.min, got)
        } else if self.max == usize::MAX {
            format!("expected at least {} values, got {}", self.min, got)
        } else if self.max == self.min + 1 {
            format!("expected {} or {} values, got {}", self.min, self.max, got)
        } else {
            format!(
                "expected between {} and {} values, got {}",
                self.min, self.max, got
            )
        };
        Error::value(msg)
    }
}

impl ValueParser for ListParser {
    fn parse_str(&self, input: &str) -> Result<ValueMatch, Error> {
        let mut sub = Cursor::new(vec![input.to_string()]);
        let value = ValueParser::parse(self, &mut sub)?;
        let chars = sub.linear_distance();
        let len = input
            .char_indices()
            .nth(chars)
            .map_or(input.len(), |(byte, _)| byte);
        Ok(ValueMatch { value, len })
    }

    fn parse(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        cursor.excursion(|cursor| {
            let mut elems: Vec<Value> = Vec::new();
            while elems.len() < self.max {
                let i = elems.len();
                let element = cursor.excursion(|cursor| {
                    if i > 0 {
                        let sep = &self.members[(i - 1).min(self.members.len() - 1)].separator;
                        let rest = cursor.rest();
                        match sep
                            .find(rest)
                            .filter(|m| m.start() == 0 && !m.as_str().is_empty())
                        {
                            Some(m) => {
                                let chars = rest[..m.end()].chars().count();
                                cursor.consume_chars(chars);
                            }
                            None => return Err(Error::value("list separator expected")),
                        }
                    }
                    let member = &self.members[i.min(self.members.len() - 1)];
                    // the element's text runs up to the next separator or
                    // the end of the current argument
                    let rest = cursor.rest().to_string();
                    let end = member
                        .separator
                        .find(&rest)
                        .map_or(rest.len(), |m| m.start());
                    let mut sub = Cursor::new(vec![rest[..end].to_string()]);
                    let value = member.parser.parse(&mut sub)?;
                    let advanced = sub.linear_distance();
                    if advanced == 0 {
                        return Err(Error::value("empty list element"));
                    }
                    cursor.consume_chars(advanced);
                    Ok(value)
                });
                match element {
                    Ok(value) => elems.push(value),
                    Err(err) => {
                        if elems.len() >= self.min {
                            break;
                        }
                        return Err(err);
                    }
                }
            }
            if elems.len() < self.min || elems.len() > self.max {
                return Err(self.count_error(elems.len()));
            }
            Ok(Value::List(elems))
        })
    }

    fn saver(&self) -> Option<Rc<dyn ValueSaver>> {
        self.saver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Location;

    fn cursor(args: &[&str]) -> Cursor {
        Cursor::new(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn any_takes_whole_remainder() {
        let mut c = cursor(&["hello world"]);
        let v = any_parser().parse(&mut c).unwrap();
        assert_eq!(v, Value::Text("hello world".into()));
        assert!(c.at_end());
    }

    #[test]
    fn integer_bases() {
        let p = integer_parser();
        assert_eq!(p.parse_str("42").unwrap().value, Value::Integer(42));
        assert_eq!(p.parse_str("-17").unwrap().value, Value::Integer(-17));
        assert_eq!(p.parse_str("0x1f").unwrap().value, Value::Integer(31));
        assert_eq!(p.parse_str("010").unwrap().value, Value::Integer(8));
        assert_eq!(p.parse_str("0").unwrap().value, Value::Integer(0));
    }

    #[test]
    fn integer_stops_at_first_non_digit() {
        let m = integer_parser().parse_str("12,34").unwrap();
        assert_eq!(m.value, Value::Integer(12));
        assert_eq!(m.len, 2);
    }

    #[test]
    fn integer_without_digits_fails() {
        assert!(integer_parser().parse_str("abc").is_err());
        assert!(integer_parser().parse_str("-").is_err());
    }

    #[test]
    fn unsigned_rejects_minus() {
        assert!(unsigned_integer_parser().parse_str("-1").is_err());
        assert_eq!(
            unsigned_integer_parser().parse_str("18446744073709551615").unwrap().value,
            Value::Unsigned(u64::MAX)
        );
    }

    #[test]
    fn non_negative_rejects_negative() {
        let err = non_negative_integer_parser().parse_str("-5").unwrap_err();
        assert!(err.to_string().contains("minimum 0"));
    }

    #[test]
    fn bound_destination_narrows_the_range() {
        let width: Bind<u32> = Bind::new(0);
        let p = unsigned_integer_parser().saving(&width);
        let err = p.parse_str("5000000000").unwrap_err();
        assert!(err.to_string().contains("4294967295"), "{}", err);
    }

    #[test]
    fn huge_literal_overflow_names_the_limit() {
        let p = integer_parser();
        let err = p.parse_str("99999999999999999999999999").unwrap_err();
        assert!(err.to_string().contains(&i64::MAX.to_string()));
    }

    #[test]
    fn real_number_forms() {
        let p = real_number_parser();
        assert_eq!(p.parse_str("1.5").unwrap().value, Value::Real(1.5));
        assert_eq!(p.parse_str("-2e3").unwrap().value, Value::Real(-2000.0));
        assert_eq!(p.parse_str(".25").unwrap().value, Value::Real(0.25));
        // 'e' without digits is not an exponent
        let m = p.parse_str("2epsilon").unwrap();
        assert_eq!(m.len, 1);
    }

    #[test]
    fn boolean_words_longest_first() {
        let p = boolean_parser();
        assert_eq!(p.parse_str("yes").unwrap().value, Value::Boolean(true));
        assert_eq!(p.parse_str("OFF").unwrap().value, Value::Boolean(false));
        // "false" must win over the single-letter "f"
        let m = p.parse_str("false").unwrap();
        assert_eq!(m.len, 5);
        assert!(p.parse_str("maybe").is_err());
    }

    #[test]
    fn string_set_longest_wins() {
        let p = string_set_parser(["never", "neverland", "auto"]);
        let m = p.parse_str("neverland").unwrap();
        assert_eq!(m.value, Value::Text("neverland".into()));
        let err = p.parse_str("purple").unwrap_err();
        assert_eq!(err.to_string(), "specific word expected");
    }

    #[test]
    fn enum_maps_through_table() {
        #[derive(Debug, Clone, PartialEq)]
        enum When {
            Never,
            Always,
        }
        let when: Bind<When> = Bind::new(When::Never);
        let p = enum_parser()
            .with("never", When::Never)
            .with("always", When::Always)
            .saving(&when);
        let m = p.parse_str("always").unwrap();
        assert_eq!(m.value.downcast_ref::<When>(), Some(&When::Always));
        p.saver().unwrap().save(&m.value).unwrap();
        assert_eq!(when.get(), When::Always);
    }

    #[test]
    fn list_of_integers() {
        let mut c = cursor(&["1,2,3"]);
        let p = list_parser(integer_parser(), ",");
        let v = p.parse(&mut c).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ])
        );
        assert!(c.at_end());
    }

    #[test]
    fn list_stops_before_trailing_text() {
        let mut c = cursor(&["1,2;rest"]);
        let p = list_parser(integer_parser(), "[,;]");
        let v = p.parse(&mut c).unwrap();
        assert_eq!(v.as_list().unwrap().len(), 2);
        // the final separator was not consumed
        assert_eq!(c.rest(), ";rest");
    }

    #[test]
    fn failed_list_leaves_cursor_in_place() {
        let mut c = cursor(&["a,b"]);
        let p = list_parser(integer_parser(), ",").limits(1, usize::MAX);
        assert!(p.parse(&mut c).is_err());
        assert_eq!(c.location(), Location::new(0, 0));
        assert_eq!(c.rest(), "a,b");
    }

    #[test]
    fn list_count_limits() {
        let p = list_parser(integer_parser(), ",").exactly(3);
        let err = p.parse_str("1,2").unwrap_err();
        assert!(err.to_string().contains("exactly 3"));

        let p = list_parser(integer_parser(), ",").limits(2, 3);
        let err = p.parse_str("1").unwrap_err();
        assert!(err.to_string().contains("2 or 3"));

        let p = list_parser(integer_parser(), ",").limits(2, 5);
        let err = p.parse_str("1").unwrap_err();
        assert!(err.to_string().contains("between 2 and 5"));
    }

    #[test]
    fn list_members_repeat_the_last_descriptor() {
        // first member is an integer followed by ':', every further member
        // is a word followed by ','
        let p = list_parser(integer_parser(), ":")
            .and_member(string_set_parser(["a", "b"]), ",");
        let v = p.parse_str("7:a,b,a").unwrap().value;
        let elems = v.as_list().unwrap();
        assert_eq!(elems.len(), 4);
        assert_eq!(elems[0], Value::Integer(7));
        assert_eq!(elems[3], Value::Text("a".into()));
    }

    #[test]
    fn bridge_reports_byte_length() {
        let p = list_parser(integer_parser(), ",");
        let m = p.parse_str("1,2 tail").unwrap();
        assert_eq!(m.len, 3);
    }
}
