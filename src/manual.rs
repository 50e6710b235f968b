//! Manual page generation from the same declarations that drive parsing
//!
//! Every visible switch contributes a synthesized synopsis and its
//! documentation text to the OPTIONS section. Documentation strings use a
//! small markup vocabulary expanded against the owning parser:
//!
//! - `@s{name}`: a switch reference, rendered with the best prefix
//! - `@v{name}`: a variable, rendered in italics
//! - `@man{page}{chapter}`: a cross reference, accumulated into SEE ALSO
//! - `@prop{key}`: a parser-level property such as `programName`
//! - `@em{...}` / `@b{...}`: emphasis and bold
//!
//! Custom tags registered with [`Parser::doc_tag`] extend the vocabulary;
//! the registry is per-parser, never process-global.

use roff::{Inline, Roff};

use crate::error::Error;
use crate::parser::Parser;
use crate::switch::{Switch, SwitchGroup};

fn norm<S: Into<String>>(s: S) -> Inline {
    Inline::Roman(s.into())
}

fn bold<S: Into<String>>(s: S) -> Inline {
    Inline::Bold(s.into())
}

fn italic<S: Into<String>>(s: S) -> Inline {
    Inline::Italic(s.into())
}

/// Splits `@tag{arg}{arg}` markup into literal runs and tag invocations
struct MarkupScanner<'a> {
    text: &'a str,
    pos: usize,
}

enum Piece {
    Literal(String),
    Tag(String, Vec<String>),
}

impl<'a> MarkupScanner<'a> {
    fn new(text: &'a str) -> Self {
        MarkupScanner { text, pos: 0 }
    }

    fn next_piece(&mut self) -> Option<Piece> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if let Some(after) = rest.strip_prefix('@') {
            // "@@" is a literal at-sign
            if after.starts_with('@') {
                self.pos += 2;
                return Some(Piece::Literal("@".to_string()));
            }
            let name_len = after
                .char_indices()
                .take_while(|(_, c)| c.is_ascii_alphanumeric())
                .map(|(i, c)| i + c.len_utf8())
                .last()
                .unwrap_or(0);
            if name_len > 0 {
                let name = after[..name_len].to_string();
                self.pos += 1 + name_len;
                let mut args = Vec::new();
                while self.text[self.pos..].starts_with('{') {
                    match self.scan_braced() {
                        Some(arg) => args.push(arg),
                        None => break,
                    }
                }
                return Some(Piece::Tag(name, args));
            }
            self.pos += 1;
            return Some(Piece::Literal("@".to_string()));
        }
        let next_at = rest.find('@').unwrap_or(rest.len());
        self.pos += next_at;
        Some(Piece::Literal(rest[..next_at].to_string()))
    }

    fn scan_braced(&mut self) -> Option<String> {
        let rest = &self.text[self.pos..];
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = rest[1..i].to_string();
                        self.pos += i + 1;
                        return Some(inner);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Cross references collected while expanding markup
#[derive(Default)]
struct SeeAlso {
    pages: Vec<(String, String)>,
}

impl SeeAlso {
    fn add(&mut self, page: &str, chapter: &str) {
        let entry = (page.to_string(), chapter.to_string());
        if !self.pages.contains(&entry) {
            self.pages.push(entry);
        }
    }
}

fn expand_markup(parser: &Parser, text: &str, see_also: &mut SeeAlso) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut scanner = MarkupScanner::new(text);
    while let Some(piece) = scanner.next_piece() {
        match piece {
            Piece::Literal(s) => out.push(norm(s)),
            Piece::Tag(name, args) => expand_tag(parser, &name, &args, see_also, &mut out),
        }
    }
    out
}

fn first_arg(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("")
}

fn expand_tag(
    parser: &Parser,
    name: &str,
    args: &[String],
    see_also: &mut SeeAlso,
    out: &mut Vec<Inline>,
) {
    match name {
        "s" => out.push(bold(switch_reference(parser, first_arg(args)))),
        "v" => out.push(italic(first_arg(args).to_string())),
        "em" => out.push(italic(first_arg(args).to_string())),
        "b" => out.push(bold(first_arg(args).to_string())),
        "man" => {
            let page = first_arg(args);
            let chapter = args.get(1).map(String::as_str).unwrap_or("1");
            see_also.add(page, chapter);
            out.push(norm(format!("{}({})", page, chapter)));
        }
        "prop" => out.push(norm(property_text(parser, first_arg(args)))),
        _ => match parser.get_doc_tag(name) {
            Some(handler) => out.push(norm(handler(args))),
            None => {
                // unknown tag: reproduce it literally so the mistake is
                // visible in the output
                let mut literal = format!("@{}", name);
                for arg in args {
                    literal.push('{');
                    literal.push_str(arg);
                    literal.push('}');
                }
                out.push(norm(literal));
            }
        },
    }
}

/// Render a switch name with the best prefix effective for it
fn switch_reference(parser: &Parser, name: &str) -> String {
    for group in parser.groups() {
        for switch in group.switches() {
            let props = parser.effective_properties(group, switch);
            if switch.long_names().iter().any(|n| n == name) {
                if let Some(prefix) = props.long_prefixes().first() {
                    return format!("{}{}", prefix, name);
                }
            }
            let mut chars = name.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if switch.short_names().contains(&c) {
                    if let Some(prefix) = props.short_prefixes().first() {
                        return format!("{}{}", prefix, name);
                    }
                }
            }
        }
    }
    match parser.properties().long_prefixes().first() {
        Some(prefix) => format!("{}{}", prefix, name),
        None => name.to_string(),
    }
}

fn property_text(parser: &Parser, key: &str) -> String {
    match key {
        "programName" => parser.display_program_name(),
        "versionString" => parser.version_string().unwrap_or("").to_string(),
        "purpose" => parser.get_purpose().unwrap_or("").to_string(),
        "chapterNumber" => parser.get_chapter().0.to_string(),
        "chapterName" => parser.get_chapter().1.to_string(),
        "inclusionPrefix" => parser
            .inclusion_prefixes()
            .first()
            .cloned()
            .unwrap_or_default(),
        "terminationSwitch" => parser
            .termination_switches()
            .first()
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Full option label for the OPTIONS section: every name, then the
/// argument slots
fn switch_label(parser: &Parser, group: &SwitchGroup, switch: &Switch) -> Vec<Inline> {
    if let Some(text) = switch.synopsis_override() {
        return vec![norm(text.to_string())];
    }
    let props = parser.effective_properties(group, switch);
    let short_prefix = props
        .short_prefixes()
        .first()
        .cloned()
        .unwrap_or_else(|| "-".to_string());
    let long_prefix = props
        .long_prefixes()
        .first()
        .cloned()
        .unwrap_or_else(|| "--".to_string());

    let mut line = Vec::new();
    let mut first = true;
    for c in switch.short_names() {
        if !first {
            line.push(norm(", "));
        }
        line.push(bold(format!("{}{}", short_prefix, c)));
        first = false;
    }
    for name in switch.long_names() {
        if !first {
            line.push(norm(", "));
        }
        line.push(bold(format!("{}{}", long_prefix, name)));
        first = false;
    }
    for (i, argument) in switch.arguments().iter().enumerate() {
        let attach = if i == 0 && !switch.long_names().is_empty() {
            "="
        } else {
            " "
        };
        if argument.is_required() {
            line.push(norm(attach.to_string()));
            line.push(italic(argument.name().to_uppercase()));
        } else {
            line.push(norm(format!("[{}", attach.trim())));
            line.push(italic(argument.name().to_uppercase()));
            line.push(norm("]"));
        }
    }
    line
}

/// Compact usage form for the SYNOPSIS line: the preferred name only
fn switch_usage(parser: &Parser, group: &SwitchGroup, switch: &Switch) -> Vec<Inline> {
    let props = parser.effective_properties(group, switch);
    let mut line = vec![norm("[")];
    match (switch.short_names().first(), switch.long_names().first()) {
        (Some(c), _) => {
            let prefix = props
                .short_prefixes()
                .first()
                .cloned()
                .unwrap_or_else(|| "-".to_string());
            line.push(bold(format!("{}{}", prefix, c)));
        }
        (None, Some(name)) => {
            let prefix = props
                .long_prefixes()
                .first()
                .cloned()
                .unwrap_or_else(|| "--".to_string());
            line.push(bold(format!("{}{}", prefix, name)));
        }
        (None, None) => {}
    }
    for argument in switch.arguments().iter().take(1) {
        line.push(norm(" "));
        line.push(italic(argument.name().to_uppercase()));
    }
    line.push(norm("] "));
    line
}

fn paragraphs<'a>(text: &'a str) -> impl Iterator<Item = &'a str> {
    text.split("\n\n").filter(|p| !p.trim().is_empty())
}

impl Parser {
    /// Render the manual page as roff source
    pub fn manual_roff(&self) -> String {
        let mut see_also = SeeAlso::default();
        let mut roff = Roff::new();
        let program = self.display_program_name();
        let (chapter_number, chapter_name) = self.get_chapter();

        roff.control(
            "TH",
            [
                program.as_str(),
                chapter_number,
                self.version_string().unwrap_or("-"),
                "-",
                chapter_name,
            ],
        );

        roff.control("SH", ["NAME"]);
        match self.get_purpose() {
            Some(purpose) => {
                let mut line = vec![norm(program.clone()), norm(" - ")];
                line.extend(expand_markup(self, purpose, &mut see_also));
                roff.text(line);
            }
            None => {
                roff.text([norm(program.clone())]);
            }
        }

        roff.control("SH", ["SYNOPSIS"]);
        let mut synopsis = vec![bold(program.clone()), norm(" ")];
        for group in self.groups() {
            for switch in group.switches() {
                if switch.is_hidden() {
                    continue;
                }
                synopsis.extend(switch_usage(self, group, switch));
            }
        }
        roff.text(synopsis);

        for (title, markup) in self.get_doc_sections() {
            roff.control("SH", [title.to_uppercase().as_str()]);
            for paragraph in paragraphs(markup) {
                roff.control("PP", []);
                roff.text(expand_markup(self, paragraph, &mut see_also));
            }
        }

        roff.control("SH", ["OPTIONS"]);
        for group in self.groups() {
            if !group.title().is_empty() {
                roff.control("SS", [group.title()]);
            }
            if let Some(doc) = group.doc_text() {
                for paragraph in paragraphs(doc) {
                    roff.control("PP", []);
                    roff.text(expand_markup(self, paragraph, &mut see_also));
                }
            }
            for switch in group.switches() {
                if switch.is_hidden() {
                    continue;
                }
                roff.control("TP", []);
                roff.text(switch_label(self, group, switch));
                match switch.doc_text() {
                    Some(doc) => {
                        roff.text(expand_markup(self, doc, &mut see_also));
                    }
                    None => {
                        roff.text([norm("")]);
                    }
                }
            }
        }

        if !see_also.pages.is_empty() {
            roff.control("SH", ["SEE ALSO"]);
            let mut line = Vec::new();
            for (i, (page, chapter)) in see_also.pages.iter().enumerate() {
                if i > 0 {
                    line.push(norm(", "));
                }
                line.push(bold(page.clone()));
                line.push(norm(format!("({})", chapter)));
            }
            roff.text(line);
        }

        roff.render()
    }

    /// Render the manual and pipe it through `nroff -man` and the host
    /// pager; falls back to printing the roff source when the pipeline
    /// cannot be spawned
    pub fn emit_manual(&self) -> Result<(), Error> {
        let text = self.manual_roff();
        if page_roff(&text).is_err() {
            print!("{}", text);
        }
        Ok(())
    }
}

fn render_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse().ok())
        .or_else(|| terminal_size::terminal_size().map(|(w, _)| w.0 as usize))
        .unwrap_or(80)
}

fn page_roff(text: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut nroff = Command::new("nroff")
        .arg("-man")
        .arg(format!("-rLL={}n", render_width()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let pager_line = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut words = pager_line.split_whitespace();
    let pager_cmd = words.next().unwrap_or("less");
    let nroff_out = nroff
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no nroff output"))?;
    let mut pager = Command::new(pager_cmd)
        .args(words)
        .stdin(Stdio::from(nroff_out))
        .spawn()?;

    if let Some(mut stdin) = nroff.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    nroff.wait()?;
    pager.wait()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::SwitchArgument;
    use crate::values::{integer_parser, string_set_parser};

    fn sample_parser() -> Parser {
        Parser::new()
            .program_name("demo")
            .purpose("exercise the generated documentation")
            .version("2.4")
            .with_group(
                SwitchGroup::new("General")
                    .with_switch(
                        Switch::new("width")
                            .short('w')
                            .argument(SwitchArgument::new("n", integer_parser()))
                            .doc("Set the output width; see @man{fmt}{1} and @s{color}."),
                    )
                    .with_switch(
                        Switch::new("color")
                            .argument(SwitchArgument::new(
                                "when",
                                string_set_parser(["never", "auto", "always"]),
                            ))
                            .doc("Colorize; the @v{when} word controls it."),
                    )
                    .with_switch(Switch::new("secret").hide()),
            )
    }

    #[test]
    fn manual_contains_sections_and_switch_labels() {
        let roff = sample_parser().manual_roff();
        assert!(roff.contains("NAME"), "{}", roff);
        assert!(roff.contains("SYNOPSIS"));
        assert!(roff.contains("OPTIONS"));
        assert!(roff.contains("demo"));
        assert!(roff.contains("width"));
    }

    #[test]
    fn hidden_switch_is_omitted() {
        let roff = sample_parser().manual_roff();
        assert!(!roff.contains("secret"));
    }

    #[test]
    fn man_tag_accumulates_see_also() {
        let roff = sample_parser().manual_roff();
        assert!(roff.contains("SEE ALSO"));
        assert!(roff.contains("fmt"));
    }

    #[test]
    fn switch_tag_renders_best_prefix() {
        let parser = sample_parser();
        let mut see_also = SeeAlso::default();
        let inlines = expand_markup(&parser, "use @s{color} here", &mut see_also);
        assert!(inlines
            .iter()
            .any(|i| matches!(i, Inline::Bold(s) if s == "--color")));
    }

    #[test]
    fn prop_tag_reads_parser_metadata() {
        let parser = sample_parser();
        let mut see_also = SeeAlso::default();
        let inlines = expand_markup(&parser, "@prop{programName} v@prop{versionString}", &mut see_also);
        let text: String = inlines
            .iter()
            .map(|i| match i {
                Inline::Roman(s) | Inline::Bold(s) | Inline::Italic(s) => s.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "demo v2.4");
    }

    #[test]
    fn double_at_is_literal() {
        let parser = sample_parser();
        let mut see_also = SeeAlso::default();
        let inlines = expand_markup(&parser, "mail@@example", &mut see_also);
        let text: String = inlines
            .iter()
            .map(|i| match i {
                Inline::Roman(s) => s.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "mail@example");
    }

    #[test]
    fn custom_tag_goes_through_the_registry() {
        let parser = sample_parser().doc_tag("upper", |args| {
            args.first().map(|s| s.to_uppercase()).unwrap_or_default()
        });
        let mut see_also = SeeAlso::default();
        let inlines = expand_markup(&parser, "@upper{loud}", &mut see_also);
        assert!(inlines
            .iter()
            .any(|i| matches!(i, Inline::Roman(s) if s == "LOUD")));
    }
}
