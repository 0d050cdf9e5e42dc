//! Offline integration tests for the conversion pipeline.
//!
//! pandoc is replaced by a small closure that does the handful of
//! mediawiki → latex rewrites the fixtures need, so these run anywhere.
//! The live path (API + real pandoc) is covered by `tests/e2e.rs`.

use once_cell::sync::Lazy;
use regex::Regex;
use wiki2tex::pipeline::{clean, math, reflow, strip};
use wiki2tex::{document, markup_to_latex, Converter, Wiki2TexError};

// ── Test helpers ─────────────────────────────────────────────────────────────

static DISPLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^:<math>(.*?)</math>$").unwrap());
static INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<math>(.*?)</math>").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^==\s*(.+?)\s*==$").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*\s*(.*)$").unwrap());

/// Just enough of pandoc's mediawiki reader for the fixtures below.
fn fake_pandoc(markup: &str) -> Result<String, Wiki2TexError> {
    let s = DISPLAY.replace_all(markup, "\\[${1}\\]");
    let s = INLINE.replace_all(&s, "\\(${1}\\)");
    let s = HEADING.replace_all(&s, |caps: &regex::Captures<'_>| {
        let label = caps[1].to_lowercase().replace(' ', "-");
        format!("\\section{{{}}}\\label{{{}}}", &caps[1], label)
    });
    let s = BULLET.replace_all(&s, "\\item ${1}");
    Ok(s.into_owned())
}

const LINEAR_MAP: &str = r#"{{Short description|Mapping that preserves vector operations}}
In [[mathematics]], and more specifically in [[linear algebra]], a '''linear map''' {{mvar|T}}
is a [[Map (mathematics)|mapping]] between two [[vector space]]s that preserves
addition and scalar multiplication.<ref name="Axler">{{cite book |last=Axler |year=2015}}</ref>

== Definition ==
Let {{mvar|V}} and {{mvar|W}} be vector spaces. A function {{math|''f'' : ''V'' → ''W''}} is linear if
{{math|1=''f''('''u''' + '''v''') = ''f''('''u''') + ''f''('''v''')}}
for all vectors in {{mvar|V}}.<ref>Rudin, p. 3</ref>
[[File:Shear.svg|thumb|A shear]]

== Examples ==
The map x<sub>1</sub> ∈ ℝ is fine.

== See also ==
* [[Linear functional]]
* [[Matrix (mathematics)|Matrix]]
"#;

fn convert_fixture() -> String {
    markup_to_latex("Linear map", LINEAR_MAP, &fake_pandoc, &["cokernel"]).unwrap()
}

// ── Phase 1 ──────────────────────────────────────────────────────────────────

#[test]
fn stripper_scenarios() {
    assert_eq!(strip::strip("{{mvar|T}}"), "T");
    assert_eq!(strip::strip("<sub>n</sub>"), "_{n}");
}

#[test]
fn stripper_removes_encyclopedia_constructs() {
    let stripped = strip::strip(LINEAR_MAP);
    assert!(!stripped.contains("{{"), "templates survived:\n{stripped}");
    assert!(!stripped.contains("<ref"), "references survived:\n{stripped}");
    assert!(!stripped.contains("[["), "links survived:\n{stripped}");
    assert!(!stripped.contains("File:"), "file directive survived:\n{stripped}");
    assert!(stripped.contains("<math>f : V → W</math>"));
    assert!(stripped.contains(":<math>f(u + v) = f(u) + f(v)</math>"));
    assert!(stripped.contains("a mapping between"));
}

// ── Whole pipeline ───────────────────────────────────────────────────────────

#[test]
fn document_is_wrapped_once_in_order() {
    let doc = convert_fixture();
    assert!(doc.starts_with("\\documentclass[12pt]{article}\n"));
    assert!(doc.contains("\\title{Linear map}"));
    let begin = doc.find("\\begin{document}").unwrap();
    let end = doc.find("\\end{document}").unwrap();
    assert!(begin < end);
    assert_eq!(doc.matches("\\begin{document}").count(), 1);
    assert_eq!(doc.matches("\\end{document}").count(), 1);
}

#[test]
fn see_also_section_is_gone() {
    let doc = convert_fixture();
    assert!(!doc.contains("See also"));
    assert!(!doc.contains("Linear functional"));
    assert!(doc.contains("\\section{Examples}"));
}

#[test]
fn prose_is_reflowed_into_paragraphs() {
    let doc = convert_fixture();
    assert!(
        doc.contains(
            "In mathematics, and more specifically in linear algebra, a linear map T is a mapping between two vector spaces that preserves addition and scalar multiplication."
        ),
        "got:\n{doc}"
    );
}

#[test]
fn math_symbols_end_up_in_math_mode() {
    let doc = convert_fixture();
    assert!(doc.contains(r"\(f : V \to W\)"), "got:\n{doc}");
    assert!(doc.contains(r"\[f(u + v) = f(u) + f(v)\]"));
    assert!(doc.contains(r"\(\in\)"));
    assert!(!doc.contains('→'));
    assert!(!doc.contains('∈'));
}

#[test]
fn converter_failure_is_surfaced_unchanged() {
    struct Broken;
    impl Converter for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn convert(&self, _text: &str) -> Result<String, Wiki2TexError> {
            Err(Wiki2TexError::Conversion {
                converter: "broken".into(),
                reason: "exit status 1".into(),
            })
        }
    }
    let err = markup_to_latex("T", LINEAR_MAP, &Broken, &["cokernel"]).unwrap_err();
    assert!(err.to_string().contains("exit status 1"));
}

#[test]
fn empty_markup_never_reaches_the_converter() {
    let never = |_: &str| -> Result<String, Wiki2TexError> { panic!("converter called") };
    let err = markup_to_latex("T", "", &never, &[] as &[&str]).unwrap_err();
    assert!(matches!(err, Wiki2TexError::EmptyInput { .. }));
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn symbol_scenario() {
    assert_eq!(clean::substitute_symbols("∀x ∈ S"), r"\(\forall\)x \(\in\) S");
}

#[test]
fn cleaning_truncates_at_see_also() {
    let latex = "\\section{A}\\label{a}\n\nBody.\n\n\\section{See also}\\label{see-also}\n\n\\item X\n";
    let out = clean::clean(latex);
    assert!(!out.contains("See also"));
    assert!(!out.contains("\\item X"));
    assert!(out.contains("Body."));
}

#[test]
fn cleaning_without_see_also_keeps_everything() {
    let latex = "\\section{A}\n\nBody one.\n\n\\section{B}\n\nBody two.";
    assert_eq!(clean::clean(latex), latex);
}

#[test]
fn reflow_keeps_directive_lines() {
    let input = "\\section{A}\n\\label{a}\n\\begin{itemize}\n\\item one\n\\end{itemize}";
    assert_eq!(reflow::reflow(input).lines().count(), 5);
}

#[test]
fn injector_leaves_existing_math_alone() {
    let input = r"\(x \in S\) and \[R^n\]";
    assert_eq!(math::inject(input), input);
}

#[test]
fn builder_orders_title_and_body() {
    let doc = document::build("Vector", "Hello.");
    let title = doc.find("\\title{Vector}").unwrap();
    let hello = doc.find("Hello.").unwrap();
    assert!(title < hello);
}
