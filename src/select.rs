//! Interactive disambiguation between multiple matching instances.
//!
//! When a lookup matches more than one instance the user picks one from a
//! 1-based numbered table. The protocol is a single blocking line read on an
//! injected input stream: an empty line accepts the default (the first
//! candidate), an integer in range selects that candidate, anything else is
//! a terminal failure, and end-of-input cancels the invocation cleanly.

use std::io::{BufRead, Write};
use std::num::ParseIntError;

use thiserror::Error;

use crate::candidate::{Candidate, render_numbered_table};

/// Outcome of the selection prompt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    /// The user chose the candidate at this 1-based index.
    Chosen(usize),
    /// The input stream closed before a line was produced; the invocation
    /// aborts cleanly with no further action.
    Cancelled,
}

/// Terminal failures of the selection prompt.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Raised when the selection line does not parse as an integer.
    #[error("invalid selection {input:?}: {source}")]
    UnparseableIndex {
        /// The offending input line.
        input: String,
        /// Parse failure detail.
        #[source]
        source: ParseIntError,
    },
    /// Raised when the selected index falls outside the candidate list.
    #[error("invalid index {index}")]
    IndexOutOfRange {
        /// The offending index.
        index: i64,
    },
    /// Raised when the prompt streams fail.
    #[error("selection prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Presents the numbered candidate table for `lookup` and resolves one
/// selection.
///
/// The prompt defaults to the first candidate; input is read as a single
/// blocking line with no timeout.
///
/// # Errors
///
/// Returns [`SelectError`] when the input is not an integer, the index is
/// out of range, or a prompt stream fails.
pub fn choose(
    lookup: &str,
    candidates: &[Candidate],
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Selection, SelectError> {
    write!(
        output,
        "Found more than one instance for '{lookup}'.\n\n\
         Available instances:\n\n\
         {}\n\
         Which would you like to connect to? [1]\n>>> ",
        render_numbered_table(candidates)
    )?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        // The stream closed mid-prompt; leave the terminal on a fresh line.
        writeln!(output)?;
        output.flush()?;
        return Ok(Selection::Cancelled);
    }

    parse_selection(line.trim(), candidates.len())
}

/// Maps a trimmed selection line to a 1-based candidate index.
fn parse_selection(line: &str, candidate_count: usize) -> Result<Selection, SelectError> {
    let index: i64 = if line.is_empty() {
        1
    } else {
        line.parse().map_err(|source| SelectError::UnparseableIndex {
            input: line.to_owned(),
            source,
        })?
    };

    match usize::try_from(index) {
        Ok(chosen) if chosen >= 1 && chosen <= candidate_count => Ok(Selection::Chosen(chosen)),
        _ => Err(SelectError::IndexOutOfRange { index }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn candidates(count: usize) -> Vec<Candidate> {
        (0..count)
            .map(|n| Candidate {
                display_name: format!("node-{n}"),
                id: format!("i-0000000{n}"),
                private_ip: format!("10.0.0.{n}"),
            })
            .collect()
    }

    fn run_choose(input_text: &str, count: usize) -> (Result<Selection, SelectError>, String) {
        let list = candidates(count);
        let mut input = Cursor::new(input_text.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = choose("api-server", &list, &mut input, &mut output);
        (result, String::from_utf8(output).expect("prompt is utf8"))
    }

    #[test]
    fn empty_line_accepts_the_default() {
        let (result, _) = run_choose("\n", 3);
        assert!(matches!(result, Ok(Selection::Chosen(1))));
    }

    #[test]
    fn integer_input_selects_that_candidate() {
        let (result, _) = run_choose("2\n", 3);
        assert!(matches!(result, Ok(Selection::Chosen(2))));
    }

    #[test]
    fn boundary_index_is_accepted() {
        let (result, _) = run_choose("3\n", 3);
        assert!(matches!(result, Ok(Selection::Chosen(3))));
    }

    #[rstest]
    #[case("9\n", 9)]
    #[case("0\n", 0)]
    #[case("-2\n", -2)]
    fn out_of_range_index_is_terminal(#[case] input_text: &str, #[case] index: i64) {
        let (result, _) = run_choose(input_text, 3);
        match result {
            Err(SelectError::IndexOutOfRange { index: reported }) => {
                assert_eq!(reported, index);
            }
            other => panic!("expected out-of-range failure, got {other:?}"),
        }
    }

    #[test]
    fn non_integer_input_is_terminal_and_names_the_value() {
        let (result, _) = run_choose("fourth\n", 3);
        match result {
            Err(SelectError::UnparseableIndex { input, .. }) => assert_eq!(input, "fourth"),
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[test]
    fn immediate_end_of_input_cancels_cleanly() {
        let (result, output) = run_choose("", 3);
        assert!(matches!(result, Ok(Selection::Cancelled)));
        assert!(
            output.ends_with(">>> \n"),
            "cancellation should leave the terminal on a fresh line: {output:?}"
        );
    }

    #[test]
    fn prompt_names_the_lookup_key_and_numbers_candidates() {
        let (_, output) = run_choose("1\n", 3);
        assert!(output.contains("Found more than one instance for 'api-server'."));
        assert!(output.contains("Which would you like to connect to? [1]\n>>> "));
        assert!(output.contains("\n1"), "table should number from 1");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let (result, _) = run_choose("  2  \n", 3);
        assert!(matches!(result, Ok(Selection::Chosen(2))));
    }
}
