// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use clap::crate_authors;
use structopt::StructOpt;

use std::io::{stderr, Write};
use std::path::PathBuf;
use std::process;

use pascomp::cli;
use pascomp::TokenKind;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pascomp_lex",
    about = "Token dump for the Pascal-flavoured teaching language",
    author = crate_authors!(),
)]
struct CLOptions {
    /// The path of the file containing the source program (standard input when omitted).
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    file: Option<PathBuf>,
    /// Write the output to this file instead of standard output.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() {
    let cl_options = match CLOptions::from_iter_safe(std::env::args()) {
        Ok(cl_options) => cl_options,
        Err(error) => cli::exit_on_usage_error(error),
    };
    let (text, label) = cli::read_source(&cl_options.file);
    let mut out = cli::open_output(&cl_options.output);
    let mut tokens = pascomp::token_stream(&text, &label);
    let mut error_count = 0_u32;
    loop {
        match tokens.front_advance() {
            Ok(token) => {
                if token.kind() == TokenKind::EndMarker {
                    break;
                }
                if token.kind().is_illegal() {
                    error_count += 1;
                }
                if let Err(error) = writeln!(
                    out,
                    "{}: {} \"{}\"",
                    token.location(),
                    token.kind(),
                    token.lexeme()
                ) {
                    writeln!(stderr(), "Error writing output: {}.", error).expect("what?");
                    process::exit(cli::EXIT_FAILURE);
                }
            }
            Err(error) => {
                error_count += 1;
                writeln!(stderr(), "Lexical Error: {}.", error).expect("what?");
            }
        }
    }
    if error_count > 0 {
        process::exit(cli::EXIT_FAILURE);
    }
}
