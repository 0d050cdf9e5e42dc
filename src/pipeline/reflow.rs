//! Reflow: one directive per line, one paragraph per line.
//!
//! The converter mirrors the source line structure, so a sentence that was
//! wrapped in the markup arrives split across lines. Prose lines are merged
//! until a blank line or a control-sequence line ends the paragraph.

/// A trimmed line that starts a control sequence. `\ ` is an escaped space
/// and counts as prose.
fn is_directive(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('\\') && !trimmed.starts_with("\\ ")
}

fn flush(paragraph: &mut Vec<String>, out: &mut Vec<String>) {
    if !paragraph.is_empty() {
        out.push(paragraph.join(" "));
        paragraph.clear();
    }
}

/// Regroup `text` into directive lines, merged prose lines and blank lines.
pub fn reflow(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut out);
            out.push(String::new());
        } else if is_directive(line) {
            flush(&mut paragraph, &mut out);
            out.push(line.to_string());
        } else {
            paragraph.push(line.trim().to_string());
        }
    }
    flush(&mut paragraph, &mut out);

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_prose_is_merged() {
        assert_eq!(
            reflow("A linear map\nis a function\nbetween spaces."),
            "A linear map is a function between spaces."
        );
    }

    #[test]
    fn blank_lines_end_paragraphs() {
        assert_eq!(reflow("one\ntwo\n\nthree"), "one two\n\nthree");
    }

    #[test]
    fn directives_get_their_own_lines() {
        assert_eq!(
            reflow("Intro text\n\\section{Definition}\nMore\ntext"),
            "Intro text\n\\section{Definition}\nMore text"
        );
    }

    #[test]
    fn escaped_space_is_prose() {
        assert_eq!(reflow("e.g.\n\\ the map"), "e.g. \\ the map");
    }

    #[test]
    fn directive_only_input_keeps_line_count() {
        let input = "\\section{A}\n\\label{a}\n  \\begin{itemize}\n\\item x\n\\end{itemize}";
        let out = reflow(input);
        assert_eq!(out.lines().count(), input.lines().count());
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(reflow(""), "");
    }
}
