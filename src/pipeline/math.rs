//! Math injection: re-wrap mathematics that survived conversion bare.
//!
//! The converter renders `<math>` spans correctly but leaves some notation
//! outside math mode (escaped subscripts, `R^n` from quote repair, stray
//! relation macros). These rules put it back inside `\( … \)` or a display
//! environment.
//!
//! ## Rule Order
//!
//! 1. `\(\begin{align}…\end{align}\)` → `\[\begin{aligned}…\end{aligned}\]`
//! 2. `x\_\{n\}` → `\(x_{n}\)`
//! 3. `\mapsto` → `\to`
//! 4. bare `R^n` powers → `\(R^{n}\)`
//! 5. bare relation/operator macros → `\(\in\)`
//!
//! Rules 4 and 5 skip anything already inside a math span, and the span map
//! is recomputed per rule, so rule 5 never re-wraps what rules 1–4 produced.

use super::rules::{apply_chain, Rule};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

/// The injector rules, in application order.
pub static MATH_RULES: &[Rule] = &[
    Rule::new("align-display", align_to_display),
    Rule::new("escaped-subscript", wrap_escaped_subscripts),
    Rule::new("mapsto", normalise_mapsto),
    Rule::new("bare-power", wrap_bare_powers),
    Rule::new("bare-operator", wrap_bare_operators),
];

/// Re-wrap bare mathematical tokens in math delimiters.
pub fn inject(text: &str) -> String {
    apply_chain("math", MATH_RULES, text)
}

/// Relation and operator macros that must never appear outside math mode.
pub const MATH_MODE_MACROS: &[&str] = &[
    "neq", "eq", "leq", "geq", "in", "notin", "subset", "supset", "to", "approx", "sim",
    "times", "cdot", "pm", "mp", "div", "cap", "cup", "land", "lor", "Rightarrow",
    "Leftarrow", "iff", "implies", "dots", "ldots", "cdots", "vdots", "ddots",
];

// ── Math spans ───────────────────────────────────────────────────────────────

static RE_MATH_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)\\\(.*?\\\)|\\\[.*?\\\]|\\begin\{(?:equation|align|aligned|gather|multline|eqnarray|displaymath|math)\*?\}.*?\\end\{(?:equation|align|aligned|gather|multline|eqnarray|displaymath|math)\*?\}",
    )
    .unwrap()
});

/// Byte ranges of every inline or display math region in `text`.
///
/// A delimiter whose backslash is itself escaped (`\\[2pt]`, a line break
/// with spacing) does not open a span.
pub fn math_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(m) = RE_MATH_SPAN.find_at(text, at) {
        if escaped_at(text, m.start()) {
            at = m.start() + 1;
            continue;
        }
        spans.push(m.range());
        at = m.end();
    }
    spans
}

/// True when an odd run of backslashes ends right before `pos`, i.e. the
/// character at `pos` is escaped rather than starting a control sequence.
fn escaped_at(text: &str, pos: usize) -> bool {
    text[..pos].bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn in_spans(spans: &[Range<usize>], pos: usize) -> bool {
    spans.iter().any(|s| s.contains(&pos))
}

/// Replace matches of `re` that start outside every math span. `wrap`
/// returns `None` to leave a match untouched.
fn replace_outside_math<F>(input: &str, re: &Regex, mut wrap: F) -> String
where
    F: FnMut(&Captures<'_>) -> Option<String>,
{
    let spans = math_spans(input);
    let mut out = String::with_capacity(input.len() + 32);
    let mut last = 0;
    for caps in re.captures_iter(input) {
        let Some(m) = caps.get(0) else { continue };
        if in_spans(&spans, m.start()) {
            continue;
        }
        if let Some(replacement) = wrap(&caps) {
            out.push_str(&input[last..m.start()]);
            out.push_str(&replacement);
            last = m.end();
        }
    }
    out.push_str(&input[last..]);
    out
}

// ── Rule 1: align inside inline math ─────────────────────────────────────────

static RE_INLINE_ALIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\\(\s*\\begin\{align\*?\}(.*?)\\end\{align\*?\}\s*\\\)").unwrap()
});

/// `\(\begin{align}…\end{align}\)` cannot compile; make it a display block.
fn align_to_display(input: &str) -> String {
    RE_INLINE_ALIGN
        .replace_all(input, "\\[\n\\begin{aligned}${1}\\end{aligned}\n\\]")
        .into_owned()
}

// ── Rule 2: escaped subscripts ───────────────────────────────────────────────

static RE_ESCAPED_SUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z])\\_\\\{([^}]+)\\\}").unwrap());

/// `x\_\{n\}` (a subscript the converter escaped as text) → `\(x_{n}\)`.
fn wrap_escaped_subscripts(input: &str) -> String {
    RE_ESCAPED_SUB
        .replace_all(input, "\\(${1}_{${2}}\\)")
        .into_owned()
}

// ── Rule 3: arrow notation ───────────────────────────────────────────────────

static RE_MAPSTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\mapsto\b").unwrap());

fn normalise_mapsto(input: &str) -> String {
    RE_MAPSTO.replace_all(input, r"\to").into_owned()
}

// ── Rule 4: bare powers ──────────────────────────────────────────────────────

static RE_BARE_POWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z])\^(\^?\\?[a-zA-Z0-9+\-−∞]+)").unwrap());

/// `R^n`, `R^-1`, `R^\infty` outside math → `\(R^{n}\)`.
///
/// Skipped when the base is really a control word (`\R^n`) or the exponent
/// runs into a closing brace.
fn wrap_bare_powers(input: &str) -> String {
    replace_outside_math(input, &RE_BARE_POWER, |caps| {
        let m = caps.get(0)?;
        if escaped_at(input, m.start()) || input[m.end()..].starts_with('}') {
            return None;
        }
        Some(format!("\\({}^{{{}}}\\)", &caps[1], &caps[2]))
    })
}

// ── Rule 5: bare operators ───────────────────────────────────────────────────

static RE_CONTROL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([A-Za-z]+)").unwrap());

/// Wrap each whole-name macro from [`MATH_MODE_MACROS`] found outside math
/// in its own `\( … \)`. `\\in` (a line break then "in") is not a macro.
fn wrap_bare_operators(input: &str) -> String {
    replace_outside_math(input, &RE_CONTROL_WORD, |caps| {
        let m = caps.get(0)?;
        if escaped_at(input, m.start()) || !MATH_MODE_MACROS.contains(&&caps[1]) {
            return None;
        }
        Some(format!("\\({}\\)", m.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_inline_display_and_environment_spans() {
        let text = r"a \(x\) b \[y\] c \begin{equation}z\end{equation} d";
        let spans = math_spans(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[0].clone()], r"\(x\)");
        assert_eq!(&text[spans[2].clone()], r"\begin{equation}z\end{equation}");
    }

    #[test]
    fn inline_align_becomes_aligned_display() {
        let out = inject(r"\(\begin{align} a &= b \\ c &= d \end{align}\)");
        assert_eq!(
            out,
            "\\[\n\\begin{aligned} a &= b \\\\ c &= d \\end{aligned}\n\\]"
        );
    }

    #[test]
    fn escaped_subscript_is_wrapped_with_its_letter() {
        assert_eq!(inject(r"the vector v\_\{i\} here"), r"the vector \(v_{i}\) here");
    }

    #[test]
    fn mapsto_becomes_to() {
        assert_eq!(inject(r"\(x \mapsto y\)"), r"\(x \to y\)");
    }

    #[test]
    fn bare_power_is_wrapped() {
        assert_eq!(inject("space R^n here"), r"space \(R^{n}\) here");
        assert_eq!(inject("R^-1"), r"\(R^{-1}\)");
    }

    #[test]
    fn power_inside_math_is_untouched() {
        let input = r"\(R^n\) and \[R^2\]";
        assert_eq!(inject(input), input);
    }

    #[test]
    fn power_followed_by_brace_is_untouched() {
        assert_eq!(inject("{R^n}"), "{R^n}");
    }

    #[test]
    fn bare_operators_are_wrapped_individually() {
        assert_eq!(inject(r"x \in S \times T"), r"x \(\in\) S \(\times\) T");
    }

    #[test]
    fn operators_inside_math_are_not_rewrapped() {
        let input = r"\(x \in S\) and \(\leq\)";
        assert_eq!(inject(input), input);
    }

    #[test]
    fn operator_prefixes_of_longer_macros_are_ignored() {
        assert_eq!(inject(r"\infty and \top and \caption"), r"\infty and \top and \caption");
    }

    #[test]
    fn line_break_before_word_is_not_an_operator() {
        assert_eq!(inject(r"first\\in second"), r"first\\in second");
    }

    #[test]
    fn spaced_line_break_does_not_open_display_math() {
        let input = "row one\\\\[2pt]\nx \\in S and R^n\n\\end{tabular} then \\[y\\]";
        let spans = math_spans(input);
        assert_eq!(spans.len(), 1);
        assert_eq!(&input[spans[0].clone()], r"\[y\]");
        assert_eq!(
            inject(input),
            "row one\\\\[2pt]\nx \\(\\in\\) S and \\(R^{n}\\)\n\\end{tabular} then \\[y\\]"
        );
    }

    #[test]
    fn macro_after_line_break_is_still_an_operator() {
        assert_eq!(inject(r"a\\\in S"), r"a\\\(\in\) S");
        assert_eq!(inject(r"a\\R^n"), r"a\\\(R^{n}\)");
        assert_eq!(inject(r"\R^n"), r"\R^n");
    }

    #[test]
    fn injection_is_stable_on_its_own_output() {
        let once = inject(r"x \in S, R^n, v\_\{i\}");
        assert_eq!(inject(&once), once);
    }
}
