// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use clap::crate_authors;
use structopt::StructOpt;

use std::io::{stderr, Write};
use std::path::PathBuf;
use std::process;

use pascomp::cli;
use pascomp::{diag, CompileError, ParserChoice};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pascomp_tac",
    about = "Three-address-code generator for the Pascal-flavoured teaching language",
    author = crate_authors!(),
)]
struct CLOptions {
    /// The path of the file containing the source program (standard input when omitted).
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    file: Option<PathBuf>,
    /// Write the three-address code to this file instead of standard output.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() {
    let cl_options = match CLOptions::from_iter_safe(std::env::args()) {
        Ok(cl_options) => cl_options,
        Err(error) => cli::exit_on_usage_error(error),
    };
    let (text, label) = cli::read_source(&cl_options.file);
    match pascomp::compile_source(&text, &label, ParserChoice::configured()) {
        Ok(translation) => {
            // render first so a failure never leaves a partial file behind
            cli::write_all_or_exit(&cl_options.output, &translation.code.to_text());
        }
        Err(CompileError::Parse(failure)) => {
            diag::report_parse_failure(&text, &failure);
            process::exit(cli::EXIT_FAILURE);
        }
        Err(CompileError::Translate(error)) => {
            writeln!(stderr(), "Semantic Error: {}.", error).expect("what?");
            process::exit(cli::EXIT_FAILURE);
        }
    }
}
