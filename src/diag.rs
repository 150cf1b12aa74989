// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::io::{stderr, Write};

use paslex::Location;
use passyn::{Conflict, LrVariant, ParseError, ParseFailure};

pub fn report_error(location: &Location, what: &str) {
    writeln!(stderr(), "{}: Error: {}.", location, what).expect("what?");
}

pub fn report_warning(location: &Location, what: &str) {
    writeln!(stderr(), "{}: Warning: {}.", location, what).expect("what?");
}

pub fn report_conflict(variant: LrVariant, conflict: &Conflict) {
    writeln!(stderr(), "Warning: {} table: {}.", variant, conflict).expect("what?");
}

/// The source line a location points into, with a caret underlining the
/// offending column.  `None` when the location is out of range.
pub fn caret_snippet(text: &str, location: &Location) -> Option<String> {
    let line = text.lines().nth(location.line_number().checked_sub(1)?)?;
    let column = location.offset();
    if column == 0 || column > line.chars().count() + 1 {
        return None;
    }
    let mut snippet = format!("    {}\n    ", line);
    for _ in 1..column {
        snippet.push(' ');
    }
    snippet.push('^');
    Some(snippet)
}

/// Writes every diagnostic of a failed parse to stderr, caret underline
/// included where the source line can be recovered.
pub fn report_parse_failure(text: &str, failure: &ParseFailure) {
    for diagnostic in failure.diagnostics.iter() {
        report_diagnostic(text, diagnostic);
    }
}

pub fn report_diagnostic(text: &str, diagnostic: &ParseError) {
    writeln!(stderr(), "{}", diagnostic).expect("what?");
    if let Some(snippet) = caret_snippet(text, diagnostic.location()) {
        writeln!(stderr(), "{}", snippet).expect("what?");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserChoice;

    #[test]
    fn caret_points_at_the_offending_column() {
        let text = "x = ;\ny = 2;";
        let failure = crate::parse_source(text, "", ParserChoice::Lr1)
            .expect_err("the parse must fail");
        let location = failure.diagnostics[0].location().clone();
        assert_eq!(location.line_number(), 1);
        assert_eq!(location.offset(), 5);
        let snippet = caret_snippet(text, &location).expect("the line must be recoverable");
        assert_eq!(snippet, "    x = ;\n        ^");
    }

    #[test]
    fn out_of_range_locations_have_no_snippet() {
        let mut tokens = crate::token_stream("x", "");
        // drain to the end-marker so the location points past the text
        let _ = tokens.front_advance();
        let end = tokens.front().expect("the end-marker is a token");
        assert!(caret_snippet("", end.location()).is_none());
    }
}
