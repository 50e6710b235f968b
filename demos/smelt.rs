//! Small driver program showing a complete declaration: switches with
//! typed arguments, actions, a generated manual page (`--help`) and
//! response-file input (`@file`).

use sawyer::*;

fn main() {
    let width: Bind<u32> = Bind::new(80);
    let verbose: Bind<bool> = Bind::new(false);
    let inputs: Bind<Vec<String>> = Bind::new(Vec::new());

    let parser = Parser::new()
        .program_name("smelt")
        .purpose("demonstrate declarative command line parsing")
        .version("0.1.0")
        .skip_nonswitches(true)
        .doc_section(
            "Description",
            "@prop{programName} parses its arguments and reports what it \
             saw. Extra arguments may come from a file named after an \
             @prop{inclusionPrefix} prefix; parsing stops at \
             @prop{terminationSwitch}.",
        )
        .with_group(
            SwitchGroup::new("General switches")
                .with_switch(
                    Switch::new("help")
                        .short('h')
                        .action(show_help())
                        .action(exit_program(0))
                        .doc("Show this manual page and exit."),
                )
                .with_switch(
                    Switch::new("version")
                        .short('V')
                        .action(show_version())
                        .action(exit_program(0))
                        .doc("Print the version to standard error and exit."),
                )
                .with_switch(
                    Switch::new("width")
                        .short('w')
                        .argument(SwitchArgument::new(
                            "columns",
                            non_negative_integer_parser().saving(&width),
                        ))
                        .doc("Wrap output at @v{columns} columns."),
                )
                .with_switch(
                    Switch::new("verbose")
                        .short('v')
                        .intrinsic_value("true", boolean_parser().saving(&verbose))
                        .doc("Report progress while working."),
                )
                .with_switch(
                    Switch::new("input")
                        .short('i')
                        .retention(Retention::All)
                        .explosive_lists(true)
                        .argument(SwitchArgument::new(
                            "files",
                            list_parser(any_parser(), ",").saving(&inputs),
                        ))
                        .doc("Input files, comma separated; may be repeated."),
                ),
        );

    let result = parser.parse_or_exit(std::env::args().skip(1));
    let result = match result.apply() {
        Ok(result) => result,
        Err(err) => {
            eprintln!("smelt: {}", err);
            std::process::exit(1);
        }
    };

    println!("width: {}", width.get());
    println!("verbose: {}", verbose.get());
    for file in inputs.get() {
        println!("input: {}", file);
    }
    for arg in result.unparsed_args(false) {
        println!("ignored: {}", arg);
    }
}
