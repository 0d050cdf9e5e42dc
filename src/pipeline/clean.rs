//! Phase 2: repair what the external converter produced.
//!
//! The converter emits syntactically plausible LaTeX that still carries the
//! encyclopedia's baggage: footnotes built from citations, hyperlinks, image
//! directives, table residue, a trailing "See also" section, raw Unicode math
//! symbols and a handful of known mis-renderings. This module fixes those
//! deterministically, then hands off to the math injector and the reflow
//! assembler.
//!
//! ## Rule Order
//!
//! Symbols and converter defects come first, then artifact removal. Caption
//! conversion precedes truncation but produces `\paragraph`, never a section
//! heading, so it cannot trigger the "See also" cut. Empty brace groups are
//! removed before the quote repair, which relies on `\^{}` having become `\^`.
//! Math injection and reflow always run last.

use super::rules::{apply_chain, Rule};
use super::{math, reflow};
use crate::symbols::{DefectFix, CONVERTER_DEFECT_FIXES, UNICODE_MATH_SYMBOLS};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Every cleaning step, in application order.
pub static CLEAN_RULES: &[Rule] = &[
    Rule::new("symbols", substitute_symbols),
    Rule::new("converter-defects", fix_converter_defects),
    Rule::new("footnotes", strip_footnotes),
    Rule::new("hyperlinks", unwrap_hyperlinks),
    Rule::new("urls", strip_urls),
    Rule::new("graphics", strip_graphics),
    Rule::new("captions", captions_to_paragraphs),
    Rule::new("table-borders", strip_table_borders),
    Rule::new("style-attributes", strip_style_attributes),
    Rule::new("sizing-groups", strip_sizing_groups),
    Rule::new("empty-groups", strip_empty_groups),
    Rule::new("empty-display-math", strip_empty_display_math),
    Rule::new("see-also", truncate_see_also),
    Rule::new("quote-artifacts", repair_quote_artifacts),
    Rule::new("math", math::inject),
    Rule::new("reflow", reflow::reflow),
];

/// Clean converter output into the final document body.
pub fn clean(latex: &str) -> String {
    apply_chain("clean", CLEAN_RULES, latex)
}

// ── Symbols and known defects ────────────────────────────────────────────────

/// Replace each Unicode math symbol with its macro, wrapped in `\( … \)`
/// outside math. Inside an existing math span the bare macro is emitted.
///
/// Post: none of the table's keys remain, so a second pass is a no-op.
pub fn substitute_symbols(input: &str) -> String {
    if !UNICODE_MATH_SYMBOLS.iter().any(|(symbol, _)| input.contains(symbol)) {
        return input.to_string();
    }
    let spans = math::math_spans(input);
    let mut out = String::with_capacity(input.len() + 64);
    for (i, c) in input.char_indices() {
        let key = &input[i..i + c.len_utf8()];
        let Some((_, latex)) = UNICODE_MATH_SYMBOLS.iter().find(|(symbol, _)| *symbol == key)
        else {
            out.push(c);
            continue;
        };
        if spans.iter().any(|s| s.contains(&i)) {
            out.push_str(latex);
            let next = input[i + c.len_utf8()..].chars().next();
            if latex.starts_with('\\') && next.is_some_and(|n| n.is_ascii_alphabetic()) {
                out.push(' ');
            }
        } else {
            out.push_str("\\(");
            out.push_str(latex);
            out.push_str("\\)");
        }
    }
    out
}

static DEFECT_REGEXES: Lazy<Vec<(Regex, &'static DefectFix)>> = Lazy::new(|| {
    CONVERTER_DEFECT_FIXES
        .iter()
        .filter_map(|fix| Regex::new(fix.pattern).ok().map(|re| (re, fix)))
        .collect()
});

fn fix_converter_defects(input: &str) -> String {
    DEFECT_REGEXES
        .iter()
        .fold(input.to_string(), |text, (re, fix)| {
            re.replace_all(&text, fix.replacement).into_owned()
        })
}

// ── Artifact removal ─────────────────────────────────────────────────────────

const FOOTNOTE_OPEN: &str = "\\footnote{";

/// Byte offset of the `}` that closes a group whose `{` precedes `body`.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Delete `\footnote{…}` with its nested content. An unbalanced footnote is
/// left as it is.
fn strip_footnotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(FOOTNOTE_OPEN) {
        let body = &rest[start + FOOTNOTE_OPEN.len()..];
        match closing_brace(body) {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &body[end + 1..];
            }
            None => {
                out.push_str(&rest[..start + FOOTNOTE_OPEN.len()]);
                rest = body;
            }
        }
    }
    out.push_str(rest);
    out
}

static RE_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\href\{[^}]*\}\{([^}]*)\}").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\url\{[^}]*\}").unwrap());
static RE_GRAPHICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\include(?:graphics|svg)(?:\[.*?\])?\{.*?\}").unwrap()
});
static RE_CAPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\caption\{([^}]*)\}").unwrap());
static RE_TABLE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|-[-|]*").unwrap());
static RE_TABLE_PIPE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\|+[ \t]*$").unwrap());
static RE_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"style="[^"]*""#).unwrap());
static RE_SIZING_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\s*(?:width\s*=[^{}]*|[0-9.]*\s*\\(?:line|text|column|paper)width)\s*\}")
        .unwrap()
});
static RE_EMPTY_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\\[A-Za-z]+)?\{\s*\}").unwrap());
static RE_EMPTY_DISPLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\[\s*\\\]").unwrap());

/// `\href{url}{text}` → `text`.
fn unwrap_hyperlinks(input: &str) -> String {
    RE_HREF.replace_all(input, "${1}").into_owned()
}

fn strip_urls(input: &str) -> String {
    RE_URL.replace_all(input, "").into_owned()
}

/// Images are shipped separately in the image manifest.
fn strip_graphics(input: &str) -> String {
    RE_GRAPHICS.replace_all(input, "").into_owned()
}

fn captions_to_paragraphs(input: &str) -> String {
    RE_CAPTION
        .replace_all(input, "\\paragraph{${1}}")
        .into_owned()
}

/// Delete `|-` row separators and lines made only of pipes. `\|` (a norm
/// in math) is not a border.
fn strip_table_borders(input: &str) -> String {
    let s = RE_TABLE_ROW.replace_all(input, |caps: &Captures<'_>| {
        match caps.get(0) {
            Some(m) if input[..m.start()].ends_with('\\') => m.as_str().to_string(),
            _ => String::new(),
        }
    });
    RE_TABLE_PIPE_LINE.replace_all(&s, "").into_owned()
}

fn strip_style_attributes(input: &str) -> String {
    RE_STYLE.replace_all(input, "").into_owned()
}

/// Delete brace groups holding nothing but a width, e.g. `{0.5\linewidth}`.
fn strip_sizing_groups(input: &str) -> String {
    RE_SIZING_GROUP.replace_all(input, "").into_owned()
}

/// Delete `{}`. After a control word the group is kept when a letter
/// follows, since `\ldots{}x` must not turn into `\ldotsx`.
fn strip_empty_groups(input: &str) -> String {
    RE_EMPTY_GROUP
        .replace_all(input, |caps: &Captures<'_>| {
            let Some(m) = caps.get(0) else {
                return String::new();
            };
            match caps.get(1) {
                Some(word)
                    if input[m.end()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphabetic()) =>
                {
                    format!("{}{{}}", word.as_str())
                }
                Some(word) => word.as_str().to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

fn strip_empty_display_math(input: &str) -> String {
    RE_EMPTY_DISPLAY.replace_all(input, "").into_owned()
}

// ── Section truncation ───────────────────────────────────────────────────────

static RE_SEE_ALSO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\(?:sub)*section\*?\{See also\}.*\z").unwrap());

/// Cut the "See also" heading and everything after it.
///
/// Post: no text from the heading onwards remains; without the heading the
/// input is returned unchanged.
pub fn truncate_see_also(input: &str) -> String {
    RE_SEE_ALSO.replace(input, "").into_owned()
}

// ── Quote artifacts ──────────────────────────────────────────────────────────

static RE_QUOTED_POWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\\textquotesingle(?:\{\}|\s+)([A-Z])\\textquotesingle(?:\{\})?\s*\\\^\\\{([^{}]+)\\\}",
    )
    .unwrap()
});
static RE_QUOTED_LETTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\textquotesingle(?:\{\}|\s+)([A-Za-z])\\textquotesingle(?:\{\})?").unwrap()
});
static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\textquotesingle(?:\{\})?").unwrap());

/// `'R'^{n}` comes out as `\textquotesingle R\textquotesingle\^\{n\}`;
/// collapse it to `R^n` for the power rule, then drop stray quote macros.
fn repair_quote_artifacts(input: &str) -> String {
    let s = RE_QUOTED_POWER.replace_all(input, "${1}^${2}");
    let s = RE_QUOTED_LETTER.replace_all(&s, "${1}");
    RE_QUOTE.replace_all(&s, "").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_become_separate_inline_spans() {
        let out = substitute_symbols("∀x ∈ S");
        assert_eq!(out, r"\(\forall\)x \(\in\) S");
    }

    #[test]
    fn symbols_inside_math_are_not_rewrapped() {
        assert_eq!(substitute_symbols("\\(f : V → W\\)"), r"\(f : V \to W\)");
        assert_eq!(substitute_symbols("\\(x ∈S\\)"), r"\(x \in S\)");
    }

    #[test]
    fn symbol_substitution_is_idempotent() {
        let input = "a − b ≤ c, θ → ∞, x ∉ ∅";
        let once = substitute_symbols(input);
        assert_eq!(substitute_symbols(&once), once);
        for (symbol, _) in UNICODE_MATH_SYMBOLS {
            assert!(!once.contains(symbol), "{symbol} survived");
        }
    }

    #[test]
    fn converter_defects_are_fixed() {
        assert_eq!(fix_converter_defects("\\begin{itemize}\n\\tightlist\n"), "\\begin{itemize}\n\n");
        assert_eq!(fix_converter_defects(r"\R^n"), "R^n");
        assert_eq!(fix_converter_defects(r"\Rightarrow"), r"\Rightarrow");
        assert_eq!(fix_converter_defects(r"\R\R^n"), "RR^n");
        assert!(!clean(r"\R\R^n").contains(r"\R"));
        assert_eq!(fix_converter_defects(r"f(x, \emph{y})"), "f(x, y)");
    }

    #[test]
    fn footnotes_are_removed_with_nested_content() {
        assert_eq!(
            strip_footnotes(r"Text.\footnote{See \emph{Halmos}, p. 3.} More."),
            "Text. More."
        );
        assert_eq!(strip_footnotes(r"a\footnote{b \{ c} d"), "a d");
    }

    #[test]
    fn unbalanced_footnote_is_left_alone() {
        let input = r"a\footnote{never closed";
        assert_eq!(strip_footnotes(input), input);
    }

    #[test]
    fn hyperlinks_urls_and_graphics() {
        assert_eq!(
            unwrap_hyperlinks(r"\href{https://x.org}{Linear map}"),
            "Linear map"
        );
        assert_eq!(strip_urls(r"see \url{https://x.org} now"), "see  now");
        assert_eq!(
            strip_graphics(r"\includegraphics[width=3cm]{a.png}\includesvg{b}"),
            ""
        );
    }

    #[test]
    fn caption_becomes_paragraph_heading() {
        assert_eq!(
            captions_to_paragraphs(r"\caption{A shear}"),
            r"\paragraph{A shear}"
        );
    }

    #[test]
    fn table_borders_are_stripped_but_norms_survive() {
        assert_eq!(strip_table_borders("a |- b"), "a  b");
        assert_eq!(strip_table_borders("x\n  ||\ny"), "x\n\ny");
        assert_eq!(strip_table_borders(r"\(\|-x\|\)"), r"\(\|-x\|\)");
    }

    #[test]
    fn sizing_and_empty_groups() {
        assert_eq!(strip_sizing_groups(r"m{0.5\linewidth}"), "m");
        assert_eq!(strip_sizing_groups(r"{width=300}"), "");
        assert_eq!(strip_sizing_groups("{the width of x}"), "{the width of x}");
        assert_eq!(strip_empty_groups(r"a{} \ldots{} b"), r"a \ldots b");
        assert_eq!(strip_empty_groups(r"\ldots{}x"), r"\ldots{}x");
        assert_eq!(strip_empty_groups(r"\^{}\{n\}"), r"\^\{n\}");
    }

    #[test]
    fn empty_display_math_is_removed() {
        assert_eq!(strip_empty_display_math("a\\[ \\]b"), "ab");
    }

    #[test]
    fn see_also_truncates_to_end() {
        let input = "Body.\n\\subsection{See also}\\label{see-also}\nA\n\\subsection{References}\nB";
        assert_eq!(truncate_see_also(input), "Body.\n");
    }

    #[test]
    fn truncation_without_heading_is_identity() {
        let input = "Body.\n\\subsection{Examples}\nMore.";
        assert_eq!(truncate_see_also(input), input);
    }

    #[test]
    fn quoted_power_collapses() {
        assert_eq!(
            repair_quote_artifacts(r"\textquotesingle R\textquotesingle\^\{n\}"),
            "R^n"
        );
        assert_eq!(repair_quote_artifacts(r"\textquotesingle R\textquotesingle"), "R");
        assert_eq!(repair_quote_artifacts(r"it\textquotesingle{}s"), "its");
    }

    #[test]
    fn clean_runs_every_phase() {
        let input = "\\section{Definition}\\label{definition}\n\nA map\nT \u{2208} S is\\footnote{x} linear.\n\n\\subsection{See also}\\label{see-also}\n\nJunk";
        let out = clean(input);
        assert_eq!(
            out,
            "\\section{Definition}\\label{definition}\n\nA map T \\(\\in\\) S is linear.\n\n"
        );
    }
}
