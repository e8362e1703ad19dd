// Splits instance/proof text into whitespace-delimited tokens, one line at a time, keeping
// track of 1-based line numbers for diagnostics. Neither format needs more than this: no
// quoting, no escapes, no multi-line tokens.

/// One non-empty line of whitespace-delimited tokens, with its 1-based position in the file.
pub struct Line<'a> {
    pub number: usize,
    pub tokens: Vec<&'a str>,
}

/// Splits `text` into non-blank lines of tokens. Blank lines are dropped entirely, but the
/// line numbering still accounts for them so reported line numbers match the original file.
pub fn tokenize_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                None
            } else {
                Some(Line {
                    number: i + 1,
                    tokens,
                })
            }
        })
        .collect()
}
