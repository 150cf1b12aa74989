// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use clap::crate_authors;
use structopt::StructOpt;

use std::io::{stderr, Write};
use std::path::PathBuf;
use std::process;

use pascomp::cli;
use pascomp::{diag, Automaton, LrVariant, ParserChoice};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pascomp_parse",
    about = "Parser for the Pascal-flavoured teaching language",
    author = crate_authors!(),
)]
struct CLOptions {
    /// The path of the file containing the source program (standard input when omitted).
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    file: Option<PathBuf>,
    /// Write the output to this file instead of standard output.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// Print the grammar, its FIRST/FOLLOW sets and the LR states instead of parsing.
    #[structopt(short = "d", long = "describe")]
    describe: bool,
}

fn main() {
    let cl_options = match CLOptions::from_iter_safe(std::env::args()) {
        Ok(cl_options) => cl_options,
        Err(error) => cli::exit_on_usage_error(error),
    };
    let choice = ParserChoice::configured();

    if cl_options.describe {
        let mut description = pascomp::grammar().description();
        let variant = choice.variant().unwrap_or(LrVariant::Lr1);
        let automaton = Automaton::build(pascomp::grammar(), variant);
        description += &automaton.description(pascomp::grammar());
        cli::write_all_or_exit(&cl_options.output, &description);
        return;
    }

    let (text, label) = cli::read_source(&cl_options.file);
    let mut output = match pascomp::parse_source(&text, &label, choice) {
        Ok(output) => output,
        Err(failure) => {
            diag::report_parse_failure(&text, &failure);
            process::exit(cli::EXIT_FAILURE);
        }
    };

    let mut rendered = String::new();
    if cfg!(feature = "derivation_output") {
        rendered += "Leftmost derivation:\n";
        for production in output.tree.derivation() {
            rendered += &format!("  {}\n", pascomp::grammar().production(production));
        }
    }
    if cfg!(feature = "syntax_tree_output") {
        let mut bytes: Vec<u8> = vec![];
        if let Err(error) = passyn::tree::write_tree(&output.tree, pascomp::grammar(), &mut bytes)
        {
            writeln!(stderr(), "Error rendering the syntax tree: {}.", error).expect("what?");
            process::exit(cli::EXIT_FAILURE);
        }
        rendered += &String::from_utf8_lossy(&bytes);
    }
    if cfg!(feature = "rd_sdt") && choice == ParserChoice::RecursiveDescent {
        match pascomp::translate(&mut output.tree) {
            Ok(translation) => rendered += &translation.code.to_text(),
            Err(error) => {
                writeln!(stderr(), "Semantic Error: {}.", error).expect("what?");
                process::exit(cli::EXIT_FAILURE);
            }
        }
    }
    cli::write_all_or_exit(&cl_options.output, &rendered);
}
