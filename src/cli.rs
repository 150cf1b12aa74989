// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

/// Exit codes shared by the executables: 0 success, 1 input or runtime
/// failure, 2 invalid command-line usage.
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Terminates according to a `clap` parsing outcome: help and version
/// requests exit 0, anything else is invalid usage.
pub fn exit_on_usage_error(error: clap::Error) -> ! {
    match error.kind {
        clap::ErrorKind::HelpDisplayed | clap::ErrorKind::VersionDisplayed => error.exit(),
        _ => {
            writeln!(io::stderr(), "{}", error.message).expect("what?");
            process::exit(EXIT_USAGE);
        }
    }
}

/// Reads the source program from a file or standard input, returning the
/// text together with a label for locations.
pub fn read_source(file: &Option<PathBuf>) -> (String, String) {
    match file {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => (text, path.to_string_lossy().to_string()),
            Err(error) => {
                writeln!(
                    io::stderr(),
                    "Error reading \"{}\": {}.",
                    path.to_string_lossy(),
                    error
                )
                .expect("what?");
                process::exit(EXIT_FAILURE);
            }
        },
        None => {
            let mut text = String::new();
            if let Err(error) = io::stdin().read_to_string(&mut text) {
                writeln!(io::stderr(), "Error reading standard input: {}.", error)
                    .expect("what?");
                process::exit(EXIT_FAILURE);
            }
            (text, String::new())
        }
    }
}

/// Opens the output sink: the named file, or standard output when absent.
pub fn open_output(output: &Option<PathBuf>) -> Box<dyn Write> {
    match output {
        Some(path) => match fs::File::create(path) {
            Ok(file) => Box::new(file),
            Err(error) => {
                writeln!(
                    io::stderr(),
                    "Error creating \"{}\": {}.",
                    path.to_string_lossy(),
                    error
                )
                .expect("what?");
                process::exit(EXIT_FAILURE);
            }
        },
        None => Box::new(io::stdout()),
    }
}

/// Writes a fully rendered text to the output target, all or nothing: on a
/// file target the content is rendered first, so no partial file is left
/// behind after an earlier pipeline failure.
pub fn write_all_or_exit(output: &Option<PathBuf>, text: &str) {
    match output {
        Some(path) => {
            if let Err(error) = fs::write(path, text) {
                writeln!(
                    io::stderr(),
                    "Error writing \"{}\": {}.",
                    path.to_string_lossy(),
                    error
                )
                .expect("what?");
                process::exit(EXIT_FAILURE);
            }
        }
        None => {
            if let Err(error) = io::stdout().write_all(text.as_bytes()) {
                writeln!(io::stderr(), "Error writing standard output: {}.", error)
                    .expect("what?");
                process::exit(EXIT_FAILURE);
            }
        }
    }
}
