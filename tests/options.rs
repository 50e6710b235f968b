//! End-to-end exercises of a realistic declaration through the public API

use sawyer::*;

#[derive(Debug, Clone, PartialEq)]
enum ColorWhen {
    Never,
    Auto,
    Always,
}

struct Tool {
    parser: Parser,
    width: Bind<u32>,
    verbose: Bind<bool>,
    color: Bind<ColorWhen>,
    include_dirs: Bind<Vec<String>>,
    output: Bind<String>,
}

fn tool() -> Tool {
    let width: Bind<u32> = Bind::new(80);
    let verbose: Bind<bool> = Bind::new(false);
    let color: Bind<ColorWhen> = Bind::new(ColorWhen::Auto);
    let include_dirs: Bind<Vec<String>> = Bind::new(Vec::new());
    let output: Bind<String> = Bind::new(String::from("a.out"));

    let general = SwitchGroup::new("General switches")
        .doc("Switches that apply to the whole run.")
        .with_switch(
            Switch::new("width")
                .short('w')
                .argument(SwitchArgument::new(
                    "columns",
                    non_negative_integer_parser().saving(&width),
                ))
                .doc("Limit output to @v{columns} columns."),
        )
        .with_switch(
            Switch::new("verbose")
                .short('v')
                .intrinsic_value("true", boolean_parser().saving(&verbose))
                .doc("Report progress while working."),
        )
        .with_switch(
            Switch::new("color")
                .argument(SwitchArgument::new(
                    "when",
                    enum_parser()
                        .with("never", ColorWhen::Never)
                        .with("auto", ColorWhen::Auto)
                        .with("always", ColorWhen::Always)
                        .saving(&color),
                ))
                .doc("Colorize the report; @v{when} is one of never, auto or always."),
        );

    let compilation = SwitchGroup::new("Compilation switches")
        .with_switch(
            Switch::new("incdir")
                .short('I')
                .retention(Retention::All)
                .explosive_lists(true)
                .argument(SwitchArgument::new(
                    "dirs",
                    list_parser(any_parser(), ",").saving(&include_dirs),
                ))
                .doc("Directories searched for headers, separated by commas."),
        )
        .with_switch(
            Switch::new("output")
                .short('o')
                .argument(SwitchArgument::new("file", any_parser().saving(&output)))
                .doc("Where the result goes; see @man{ld}{1}."),
        );

    let parser = Parser::new()
        .program_name("smelter")
        .purpose("melt sources into an executable")
        .version("0.3.1")
        .doc_section(
            "Description",
            "@prop{programName} reads source files and produces @s{output}.",
        )
        .with_group(general)
        .with_group(compilation);

    Tool {
        parser,
        width,
        verbose,
        color,
        include_dirs,
        output,
    }
}

#[test]
fn mixed_command_line() {
    let t = tool();
    let result = t
        .parser
        .parse([
            "-v",
            "--width=100",
            "--incdir",
            "src,include",
            "-I",
            "vendor",
            "--color=always",
            "-o",
            "out/bin",
        ])
        .unwrap()
        .apply()
        .unwrap();

    assert!(t.verbose.get());
    assert_eq!(t.width.get(), 100);
    assert_eq!(t.color.get(), ColorWhen::Always);
    assert_eq!(t.include_dirs.get(), ["src", "include", "vendor"]);
    assert_eq!(t.output.get(), "out/bin");
    assert!(result.unparsed_args(true).is_empty());
}

#[test]
fn exploded_occurrences_keep_command_line_order() {
    let t = tool();
    let result = t
        .parser
        .parse(["--incdir=a,b", "--incdir=c"])
        .unwrap();

    let vs = result.parsed("incdir");
    assert_eq!(vs.len(), 3);
    let texts: Vec<String> = vs.iter().map(|v| v.as_text()).collect();
    assert_eq!(texts, ["a", "b", "c"]);
    let seqs: Vec<usize> = vs.iter().map(|v| v.key_sequence()).collect();
    assert_eq!(seqs, [0, 1, 2]);
}

#[test]
fn validation_without_application_is_side_effect_free() {
    let t = tool();
    let result = t.parser.parse(["--width=30", "-o", "other"]).unwrap();
    assert!(result.have("width"));
    // nothing was applied, the cells still hold their initial values
    assert_eq!(t.width.get(), 80);
    assert_eq!(t.output.get(), "a.out");
}

#[test]
fn a_failed_line_reports_the_literal_switch() {
    let t = tool();
    let err = t.parser.parse(["--color=sometimes"]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("--color"), "{}", msg);
    assert!(msg.contains("WHEN"), "{}", msg);
}

#[test]
fn termination_keeps_the_rest_for_the_caller() {
    let t = tool();
    let result = t.parser.parse(["-v", "--", "-o", "weird"]).unwrap();
    assert!(result.have("verbose"));
    assert!(!result.have("output"));
    assert_eq!(result.unparsed_args(false), ["-o", "weird"]);
}

#[test]
fn manual_page_mentions_every_visible_switch() {
    let t = tool();
    let roff = t.parser.manual_roff();
    for name in ["width", "verbose", "color", "incdir", "output"] {
        assert!(roff.contains(name), "missing {} in: {}", name, roff);
    }
    assert!(roff.contains("General switches"));
    assert!(roff.contains("Compilation switches"));
    // the @man reference in the output switch documentation
    assert!(roff.contains("SEE ALSO"));
    assert!(roff.contains("ld"));
}
