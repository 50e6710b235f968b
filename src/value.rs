//! Typed values extracted from the command line and where they end up
//!
//! Value parsers are heterogeneous, so their results are carried in the
//! [`Value`] tagged union. Each occurrence of a value on the command line
//! becomes a [`ParsedValue`] that remembers where it came from; applying a
//! parser result later funnels each value through its [`ValueSaver`] into a
//! caller-supplied [`Bind`] cell.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::cursor::Location;
use crate::error::Error;

/// A value produced by a value parser
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Unsigned(u64),
    Real(f64),
    Boolean(bool),
    Text(String),
    List(Vec<Value>),
    /// User-defined payload from a custom parser, e.g. an enum tag
    Opaque(Rc<dyn Any>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::Unsigned(v) => write!(f, "Unsigned({})", v),
            Value::Real(v) => write!(f, "Real({})", v),
            Value::Boolean(v) => write!(f, "Boolean({})", v),
            Value::Text(v) => write!(f, "Text({:?})", v),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Signed integer view; booleans convert to 0/1, text is parsed
    pub fn as_integer(&self) -> Result<i64, Error> {
        match self {
            Value::Integer(v) => Ok(*v),
            Value::Unsigned(v) => i64::try_from(*v)
                .map_err(|_| Error::range(format!("{} does not fit a signed integer", v))),
            Value::Boolean(v) => Ok(i64::from(*v)),
            Value::Real(v) => {
                if *v >= i64::MIN as f64 && *v <= i64::MAX as f64 {
                    Ok(*v as i64)
                } else {
                    Err(Error::range(format!("{} does not fit an integer", v)))
                }
            }
            Value::Text(s) => s
                .parse::<i64>()
                .map_err(|_| Error::value(format!("\"{}\" is not an integer", s))),
            Value::List(_) | Value::Opaque(_) => Err(Error::value("not an integer")),
        }
    }

    /// Unsigned integer view; an unsigned payload is returned as-is, a
    /// signed payload converts only when non-negative
    pub fn as_unsigned(&self) -> Result<u64, Error> {
        match self {
            Value::Unsigned(v) => Ok(*v),
            Value::Integer(v) => u64::try_from(*v)
                .map_err(|_| Error::range(format!("{} is negative", v))),
            Value::Boolean(v) => Ok(u64::from(*v)),
            Value::Real(v) => {
                if *v >= 0.0 && *v <= u64::MAX as f64 {
                    Ok(*v as u64)
                } else {
                    Err(Error::range(format!("{} does not fit an unsigned integer", v)))
                }
            }
            Value::Text(s) => s
                .parse::<u64>()
                .map_err(|_| Error::value(format!("\"{}\" is not an unsigned integer", s))),
            Value::List(_) | Value::Opaque(_) => Err(Error::value("not an unsigned integer")),
        }
    }

    pub fn as_real(&self) -> Result<f64, Error> {
        match self {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            Value::Unsigned(v) => Ok(*v as f64),
            Value::Boolean(v) => Ok(f64::from(u8::from(*v))),
            Value::Text(s) => s
                .parse::<f64>()
                .map_err(|_| Error::value(format!("\"{}\" is not a number", s))),
            Value::List(_) | Value::Opaque(_) => Err(Error::value("not a number")),
        }
    }

    pub fn as_boolean(&self) -> Result<bool, Error> {
        match self {
            Value::Boolean(v) => Ok(*v),
            Value::Integer(v) => Ok(*v != 0),
            Value::Unsigned(v) => Ok(*v != 0),
            Value::Text(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
                "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
                _ => Err(Error::value(format!("\"{}\" is not a boolean", s))),
            },
            Value::Real(_) | Value::List(_) | Value::Opaque(_) => {
                Err(Error::value("not a boolean"))
            }
        }
    }

    /// Display rendition; lists join their elements with commas
    pub fn as_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(v) => v.to_string(),
            Value::Unsigned(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::List(vs) => vs
                .iter()
                .map(Value::as_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Opaque(_) => String::from("<opaque>"),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(vs) => Some(vs),
            _ => None,
        }
    }

    /// Borrow the payload of an [`Value::Opaque`] as a concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Deferred write of a parsed value into caller storage
///
/// Savers run only when [`ParserResult::apply`](crate::ParserResult::apply)
/// is invoked, so building a result has no side effects on program state.
pub trait ValueSaver {
    fn save(&self, value: &Value) -> Result<(), Error>;
}

/// Shared storage cell a parser can be bound to
///
/// Cheap to clone; the caller keeps one clone and hands another to the
/// parser declaration.
#[derive(Debug, Default)]
pub struct Bind<T>(Rc<RefCell<T>>);

impl<T> Clone for Bind<T> {
    fn clone(&self) -> Self {
        Bind(Rc::clone(&self.0))
    }
}

impl<T> Bind<T> {
    pub fn new(init: T) -> Self {
        Bind(Rc::new(RefCell::new(init)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }
}

/// Destination whose numeric bounds a parser enforces at parse time
///
/// Bounds are inclusive and wide enough to express `u64::MAX`.
pub trait NumericCell: ValueSaver + Clone + 'static {
    fn bounds() -> (i128, i128);
}

macro_rules! signed_cell {
    ($($ty:ty),*) => {$(
        impl ValueSaver for Bind<$ty> {
            fn save(&self, value: &Value) -> Result<(), Error> {
                let wide = value.as_integer()?;
                let narrow = <$ty>::try_from(wide).map_err(|_| {
                    Error::range(format!(
                        "{} is outside the range {}..={}",
                        wide,
                        <$ty>::MIN,
                        <$ty>::MAX
                    ))
                })?;
                self.set(narrow);
                Ok(())
            }
        }
        impl NumericCell for Bind<$ty> {
            fn bounds() -> (i128, i128) {
                (<$ty>::MIN as i128, <$ty>::MAX as i128)
            }
        }
    )*};
}

macro_rules! unsigned_cell {
    ($($ty:ty),*) => {$(
        impl ValueSaver for Bind<$ty> {
            fn save(&self, value: &Value) -> Result<(), Error> {
                let wide = value.as_unsigned()?;
                let narrow = <$ty>::try_from(wide).map_err(|_| {
                    Error::range(format!(
                        "{} is greater than the maximum {}",
                        wide,
                        <$ty>::MAX
                    ))
                })?;
                self.set(narrow);
                Ok(())
            }
        }
        impl NumericCell for Bind<$ty> {
            fn bounds() -> (i128, i128) {
                (0, <$ty>::MAX as i128)
            }
        }
    )*};
}

signed_cell!(i8, i16, i32, i64);
unsigned_cell!(u8, u16, u32, u64);

/// Floating-point destination
pub trait RealCell: ValueSaver + Clone + 'static {}

impl ValueSaver for Bind<f64> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        self.set(value.as_real()?);
        Ok(())
    }
}
impl RealCell for Bind<f64> {}

impl ValueSaver for Bind<f32> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        self.set(value.as_real()? as f32);
        Ok(())
    }
}
impl RealCell for Bind<f32> {}

impl ValueSaver for Bind<bool> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        self.set(value.as_boolean()?);
        Ok(())
    }
}

impl ValueSaver for Bind<String> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        self.set(value.as_text());
        Ok(())
    }
}

impl ValueSaver for Bind<Vec<String>> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        self.0.borrow_mut().push(value.as_text());
        Ok(())
    }
}

impl ValueSaver for Bind<Vec<i64>> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        let v = value.as_integer()?;
        self.0.borrow_mut().push(v);
        Ok(())
    }
}

impl ValueSaver for Bind<Vec<u64>> {
    fn save(&self, value: &Value) -> Result<(), Error> {
        let v = value.as_unsigned()?;
        self.0.borrow_mut().push(v);
        Ok(())
    }
}

/// One occurrence of a value extracted from the command line
///
/// Remembers both the typed value and enough provenance to answer "which
/// switch, spelled how, at which position" later.
#[derive(Clone)]
pub struct ParsedValue {
    value: Value,
    key: String,
    preferred_name: String,
    switch_location: Location,
    value_location: Location,
    switch_string: String,
    value_string: String,
    key_sequence: usize,
    switch_sequence: usize,
    saver: Option<Rc<dyn ValueSaver>>,
}

impl std::fmt::Debug for ParsedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedValue")
            .field("value", &self.value)
            .field("key", &self.key)
            .field("switch_string", &self.switch_string)
            .field("value_string", &self.value_string)
            .field("key_sequence", &self.key_sequence)
            .field("switch_sequence", &self.switch_sequence)
            .finish()
    }
}

impl ParsedValue {
    pub(crate) fn new(value: Value) -> Self {
        ParsedValue {
            value,
            key: String::new(),
            preferred_name: String::new(),
            switch_location: Location::NOWHERE,
            value_location: Location::NOWHERE,
            switch_string: String::new(),
            value_string: String::new(),
            key_sequence: 0,
            switch_sequence: 0,
            saver: None,
        }
    }

    pub(crate) fn with_saver(mut self, saver: Option<Rc<dyn ValueSaver>>) -> Self {
        self.saver = saver;
        self
    }

    pub(crate) fn with_value_source(mut self, location: Location, text: String) -> Self {
        self.value_location = location;
        self.value_string = text;
        self
    }

    pub(crate) fn set_switch_context(
        &mut self,
        key: &str,
        preferred_name: &str,
        switch_string: &str,
        switch_location: Location,
    ) {
        self.key = key.to_string();
        self.preferred_name = preferred_name.to_string();
        self.switch_string = switch_string.to_string();
        self.switch_location = switch_location;
    }

    pub(crate) fn set_sequences(&mut self, key_sequence: usize, switch_sequence: usize) {
        self.key_sequence = key_sequence;
        self.switch_sequence = switch_sequence;
    }

    pub(crate) fn replace_value(&mut self, value: Value) {
        self.value = value;
    }

    pub(crate) fn save(&self) -> Result<(), Error> {
        match &self.saver {
            Some(saver) => saver.save(&self.value),
            None => Ok(()),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Key of the switch that produced this value
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Preferred display name of the producing switch
    pub fn preferred_name(&self) -> &str {
        &self.preferred_name
    }

    /// Where the switch token started
    pub fn switch_location(&self) -> Location {
        self.switch_location
    }

    /// Where the value text started, [`Location::NOWHERE`] for synthesized
    /// defaults and intrinsic values
    pub fn value_location(&self) -> Location {
        self.value_location
    }

    /// The switch token exactly as typed, prefix included
    pub fn switch_string(&self) -> &str {
        &self.switch_string
    }

    /// The literal matched value text
    pub fn value_string(&self) -> &str {
        &self.value_string
    }

    /// 0-based position among occurrences sharing this key
    pub fn key_sequence(&self) -> usize {
        self.key_sequence
    }

    /// 0-based position among occurrences sharing this preferred name
    pub fn switch_sequence(&self) -> usize {
        self.switch_sequence
    }

    pub fn as_integer(&self) -> Result<i64, Error> {
        self.value.as_integer()
    }

    pub fn as_unsigned(&self) -> Result<u64, Error> {
        self.value.as_unsigned()
    }

    pub fn as_real(&self) -> Result<f64, Error> {
        self.value.as_real()
    }

    pub fn as_boolean(&self) -> Result<bool, Error> {
        self.value.as_boolean()
    }

    pub fn as_text(&self) -> String {
        self.value.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_payload_stays_unsigned() {
        let v = Value::Unsigned(u64::MAX);
        assert_eq!(v.as_unsigned().unwrap(), u64::MAX);
        assert!(v.as_integer().is_err());
    }

    #[test]
    fn boolean_to_integer() {
        assert_eq!(Value::Boolean(true).as_integer().unwrap(), 1);
        assert_eq!(Value::Boolean(false).as_integer().unwrap(), 0);
    }

    #[test]
    fn text_conversions() {
        assert_eq!(Value::Text("42".into()).as_integer().unwrap(), 42);
        assert!(Value::Text("forty".into()).as_integer().is_err());
        assert!(Value::Text("yes".into()).as_boolean().unwrap());
    }

    #[test]
    fn list_text_joins_elements() {
        let v = Value::List(vec![Value::Integer(1), Value::Text("b".into())]);
        assert_eq!(v.as_text(), "1,b");
    }

    #[test]
    fn narrow_saver_rejects_overflow() {
        let cell: Bind<u32> = Bind::new(0);
        let err = cell.save(&Value::Unsigned(5_000_000_000)).unwrap_err();
        assert!(err.to_string().contains("4294967295"));
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn vector_saver_appends() {
        let cell: Bind<Vec<String>> = Bind::new(Vec::new());
        cell.save(&Value::Text("a".into())).unwrap();
        cell.save(&Value::Text("b".into())).unwrap();
        assert_eq!(cell.get(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn opaque_downcast() {
        #[derive(Debug, PartialEq)]
        struct Tag(u8);
        let v = Value::Opaque(Rc::new(Tag(3)));
        assert_eq!(v.downcast_ref::<Tag>(), Some(&Tag(3)));
        assert_eq!(v.downcast_ref::<String>(), None);
    }
}
