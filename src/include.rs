//! Reading extra program arguments from a file
//!
//! A command line token like `@more-args` splices in the tokens read from
//! the file `more-args`. The file is line oriented: blank lines and `#`
//! comment lines are ignored, everything else is split on whitespace with
//! shell-style single/double quoting and backslash escapes.

use std::path::Path;

use crate::error::{Error, Message};

/// Read `path` and tokenize its contents
pub(crate) fn read_arguments_file(path: &Path) -> Result<Vec<String>, Error> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error(Message::Inclusion {
            file: display.clone(),
            line: None,
            reason: err.to_string(),
        })
    })?;
    tokenize(&text, &display)
}

pub(crate) fn tokenize(text: &str, file: &str) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        tokenize_line(line, file, lineno + 1, &mut tokens)?;
    }
    Ok(tokens)
}

fn tokenize_line(
    line: &str,
    file: &str,
    lineno: usize,
    tokens: &mut Vec<String>,
) -> Result<(), Error> {
    let mut chars = line.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            return Ok(());
        }
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            match c {
                c if c.is_whitespace() => break,
                '\'' | '"' => {
                    let quote = c;
                    chars.next();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == quote {
                            closed = true;
                            break;
                        }
                        token.push(c);
                    }
                    if !closed {
                        return Err(Error(Message::Inclusion {
                            file: file.to_string(),
                            line: Some(lineno),
                            reason: format!("unterminated {} quote", quote),
                        }));
                    }
                }
                '\\' => {
                    chars.next();
                    match chars.peek() {
                        // backslash only escapes quotes, backslashes and
                        // whitespace; anything else keeps it literal
                        Some(&next)
                            if next == '\''
                                || next == '"'
                                || next == '\\'
                                || next.is_whitespace() =>
                        {
                            token.push(next);
                            chars.next();
                        }
                        _ => token.push('\\'),
                    }
                }
                _ => {
                    token.push(c);
                    chars.next();
                }
            }
        }
        tokens.push(token);
    }
}
