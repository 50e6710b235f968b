#![doc = include_str!("../README.md")]

pub mod cursor;
pub mod error;
mod include;
mod manual;
pub mod parser;
pub mod result;
pub mod switch;
pub mod value;
pub mod values;

pub use crate::cursor::{Cursor, Location};
pub use crate::error::Error;
pub use crate::parser::{
    exit_program, show_help, show_version, user_action, Parser, SwitchAction,
};
pub use crate::result::ParserResult;
pub use crate::switch::{
    Augmenter, ParsingProperties, Retention, Switch, SwitchArgument, SwitchGroup,
};
pub use crate::value::{Bind, NumericCell, ParsedValue, RealCell, Value, ValueSaver};
pub use crate::values::{
    any_parser, boolean_parser, enum_parser, integer_parser, list_parser,
    non_negative_integer_parser, real_number_parser, string_set_parser,
    unsigned_integer_parser, AnyParser, BooleanParser, EnumParser, IntegerParser, ListParser,
    RealNumberParser, StringSetParser, ValueMatch, ValueParser,
};
