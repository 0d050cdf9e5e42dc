//! Static lookup tables used by the output cleaner.
//!
//! Both tables are ordered slices rather than maps: entries are applied in
//! declaration order, and converter defects are fixed before anything else
//! in the cleaner looks at the affected macros.

/// Unicode mathematical symbols and the LaTeX macro each one becomes.
///
/// The cleaner wraps every replacement in inline-math delimiters, so the
/// minus sign becomes `\(-\)` and `∀` becomes `\(\forall\)`.
pub const UNICODE_MATH_SYMBOLS: &[(&str, &str)] = &[
    ("−", "-"),
    ("×", r"\times"),
    ("÷", r"\div"),
    ("±", r"\pm"),
    ("∓", r"\mp"),
    ("≠", r"\neq"),
    ("≤", r"\leq"),
    ("≥", r"\geq"),
    ("≈", r"\approx"),
    ("≡", r"\equiv"),
    ("∑", r"\sum"),
    ("∏", r"\prod"),
    ("∫", r"\int"),
    ("∞", r"\infty"),
    ("∂", r"\partial"),
    ("∇", r"\nabla"),
    ("∃", r"\exists"),
    ("∀", r"\forall"),
    ("∈", r"\in"),
    ("∉", r"\notin"),
    ("∅", r"\emptyset"),
    ("∧", r"\wedge"),
    ("∨", r"\vee"),
    ("⊂", r"\subset"),
    ("⊃", r"\supset"),
    ("⊆", r"\subseteq"),
    ("⊇", r"\supseteq"),
    ("→", r"\to"),
    ("←", r"\leftarrow"),
    ("⇔", r"\Leftrightarrow"),
    ("⇒", r"\Rightarrow"),
    ("θ", r"\theta"),
    ("λ", r"\lambda"),
    ("μ", r"\mu"),
    ("π", r"\pi"),
    ("φ", r"\phi"),
    ("∠", r"\angle"),
];

/// A known artifact of the external converter and its fix.
#[derive(Debug, Clone, Copy)]
pub struct DefectFix {
    /// Short name used in trace logs.
    pub name: &'static str,
    /// Regex matching the defect.
    pub pattern: &'static str,
    /// Replacement, in `regex` expansion syntax.
    pub replacement: &'static str,
}

/// Converter defects, applied in order.
pub const CONVERTER_DEFECT_FIXES: &[DefectFix] = &[
    DefectFix {
        name: "tightlist",
        pattern: r"\\tightlist",
        replacement: "",
    },
    // `\R` is a wiki-math shorthand the target document never defines.
    // Only the bare macro: `\Rightarrow` and friends are left alone.
    DefectFix {
        name: "bare-reals-macro",
        pattern: r"\\R(\b|[_0-9])",
        replacement: "R${1}",
    },
    DefectFix {
        name: "emphasised-y",
        pattern: r"\\emph\{y\}",
        replacement: "y",
    },
];
