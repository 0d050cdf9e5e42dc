//! Phase 1: strip encyclopedia-specific constructs from raw wiki markup.
//!
//! Runs before the external converter sees the text. Math-bearing templates
//! are normalised first so that the generic template rule does not throw the
//! mathematics away; everything else the converter would mangle (citations,
//! piped anchors, file directives) is removed.
//!
//! ## Rule Order
//!
//! 1. Math templates ([`MATH_TEMPLATE_RULES`]): `{{mvar}}`, `<sub>`, `<sup>`,
//!    italics, then `{{math|1=…}}` before `{{math|…}}`.
//! 2. Content fixes: literal fragments from the config, deleted verbatim.
//! 3. Markup ([`MARKUP_RULES`]): generic templates, visible anchors, bold,
//!    `{{em}}`, file-link lines, wiki-links, references, piped-link remnants,
//!    bare file directives, blank-line collapse.
//!
//! Nested templates are handled one level deep. Deeper nesting may leave
//! residual markup; running the stripper twice is not the fix.

use super::rules::{apply_chain, Rule};
use crate::config::DEFAULT_CONTENT_FIXES;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Strip raw wiki markup using the default content fixes.
pub fn strip(raw: &str) -> String {
    strip_with_fixes(raw, DEFAULT_CONTENT_FIXES)
}

/// Strip raw wiki markup, deleting each of `content_fixes` after the math
/// templates have been normalised.
pub fn strip_with_fixes<S: AsRef<str>>(raw: &str, content_fixes: &[S]) -> String {
    let text = apply_chain("strip.math", MATH_TEMPLATE_RULES, raw);
    let text = apply_content_fixes(&text, content_fixes);
    apply_chain("strip.markup", MARKUP_RULES, &text)
}

/// Math-template normalisation, applied first.
pub static MATH_TEMPLATE_RULES: &[Rule] = &[
    Rule::new("mvar", unwrap_mvar),
    Rule::new("subscript", html_subscripts),
    Rule::new("superscript", html_superscripts),
    Rule::new("italics", strip_italics),
    Rule::new("math-display", math_display_templates),
    Rule::new("math-inline", math_inline_templates),
];

/// Structural markup removal, applied after content fixes.
pub static MARKUP_RULES: &[Rule] = &[
    Rule::new("templates", strip_templates),
    Rule::new("visible-anchor", resolve_visible_anchors),
    Rule::new("bold", strip_bold),
    Rule::new("em", unwrap_em),
    Rule::new("file-link-lines", strip_file_link_lines),
    Rule::new("wiki-links", resolve_wiki_links),
    Rule::new("references", strip_references),
    Rule::new("piped-remnants", strip_piped_remnants),
    Rule::new("file-directives", strip_file_directives),
    Rule::new("blank-lines", collapse_blank_lines),
];

fn apply_content_fixes<S: AsRef<str>>(input: &str, fixes: &[S]) -> String {
    fixes
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| !f.is_empty())
        .fold(input.to_string(), |text, fix| text.replace(fix, ""))
}

// ── Math templates ───────────────────────────────────────────────────────────

static RE_MVAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{mvar\|([^}]+)\}\}").unwrap());
static RE_SUB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sub>([^<]+)</sub>").unwrap());
static RE_SUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sup>([^<]+)</sup>").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,}([^']+)'{2,}").unwrap());
static RE_MATH_EQ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{math\|1=(.*?)\}\}").unwrap());
static RE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{math\|([^=][^}]*)\}\}").unwrap());

/// `{{mvar|T}}` → `T`.
fn unwrap_mvar(input: &str) -> String {
    RE_MVAR.replace_all(input, "${1}").into_owned()
}

/// `<sub>n</sub>` → `_{n}`.
fn html_subscripts(input: &str) -> String {
    RE_SUB.replace_all(input, "_{${1}}").into_owned()
}

/// `<sup>2</sup>` → `^{2}`.
fn html_superscripts(input: &str) -> String {
    RE_SUP.replace_all(input, "^{${1}}").into_owned()
}

/// `''T''` → `T`. Runs of three or more quotes (bold) around quote-free text
/// are consumed here too; bold spans containing apostrophes are left for the
/// bold rule.
fn strip_italics(input: &str) -> String {
    RE_ITALIC.replace_all(input, "${1}").into_owned()
}

/// `{{math|1=a = b}}` → `:<math>a = b</math>` (indented, rendered as display).
///
/// Post: no `{{math|1=` invocation that closes on the same line remains.
fn math_display_templates(input: &str) -> String {
    RE_MATH_EQ
        .replace_all(input, |caps: &Captures<'_>| {
            format!(":<math>{}</math>", caps[1].trim())
        })
        .into_owned()
}

/// `{{math|T: V → W}}` → `<math>T: V → W</math>`.
///
/// Pre: `{{math|1=…}}` already rewritten, so `1=` is never seen here.
fn math_inline_templates(input: &str) -> String {
    RE_MATH
        .replace_all(input, |caps: &Captures<'_>| {
            format!("<math>{}</math>", caps[1].trim())
        })
        .into_owned()
}

// ── Generic templates ────────────────────────────────────────────────────────

static RE_TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// Templates that later rules resolve to visible text.
const RESOLVED_TEMPLATES: &[&str] = &["visible anchor", "em"];

fn template_name(body: &str) -> String {
    body.split('|')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Delete every remaining single-line `{{…}}` invocation except the ones in
/// [`RESOLVED_TEMPLATES`]. Lossy: whatever the template carried is gone.
fn strip_templates(input: &str) -> String {
    RE_TEMPLATE
        .replace_all(input, |caps: &Captures<'_>| {
            let name = template_name(&caps[1]);
            if RESOLVED_TEMPLATES.contains(&name.as_str()) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

// ── Visible text ─────────────────────────────────────────────────────────────

static RE_VISIBLE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?i:visible anchor)\|([^}]+)\}\}").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"'''(.+?)'''").unwrap());
static RE_EM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(?i:em)\|(.+?)\}\}").unwrap());
static RE_WIKI_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static RE_PAREN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());

/// `{{visible anchor|Label|text=Shown}}` → `Shown`; without `text=` the last
/// positional parameter is shown.
fn resolve_visible_anchors(input: &str) -> String {
    RE_VISIBLE_ANCHOR
        .replace_all(input, |caps: &Captures<'_>| {
            let params: Vec<&str> = caps[1].split('|').map(str::trim).collect();
            let explicit = params.iter().find_map(|p| p.strip_prefix("text="));
            explicit
                .or_else(|| params.last().copied())
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .into_owned()
}

/// `'''text'''` → `text`.
fn strip_bold(input: &str) -> String {
    RE_BOLD.replace_all(input, "${1}").into_owned()
}

/// `{{em|text}}` → `text`.
fn unwrap_em(input: &str) -> String {
    RE_EM.replace_all(input, "${1}").into_owned()
}

fn is_file_target(target: &str) -> bool {
    let lower = target.trim_start().to_lowercase();
    lower.starts_with("file:") || lower.starts_with("image:")
}

/// `[[target]]` → `target`, `[[target|text]]` → `text`, `[[Foo (bar)|]]` →
/// `Foo`. File and image links left inline are deleted whole.
fn resolve_wiki_links(input: &str) -> String {
    RE_WIKI_LINK
        .replace_all(input, |caps: &Captures<'_>| {
            let inner = &caps[1];
            if is_file_target(inner) {
                return String::new();
            }
            match inner.split_once('|') {
                Some((target, display)) if display.trim().is_empty() => {
                    RE_PAREN_SUFFIX.replace(target, "").into_owned()
                }
                Some((_, display)) => display.to_string(),
                None => inner.to_string(),
            }
        })
        .into_owned()
}

// ── Deletions ────────────────────────────────────────────────────────────────

static RE_REF_SELF_CLOSING: Lazy<Regex> = Lazy::new(|| Regex::new(r"<ref[^>]*/>").unwrap());
static RE_REF_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<ref(?:\s[^>]*)?>.*?</ref>").unwrap());
static RE_PAREN_PIPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()|]+)\)\|([a-zA-Z]+)\b").unwrap());
static RE_ANCHOR_PIPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^#|\s]+#[^|\s]+\|").unwrap());
static RE_ANCHOR_PIPE_SPACED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[^\s#|]+|\([^)]+\))#[^|\n]+\|").unwrap());
static RE_FILE_LINK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\[\[(?i:file|image):.*$").unwrap());
static RE_FILE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:File|Image):.*$").unwrap());
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

/// Delete `<ref …/>` and `<ref …>…</ref>` including content, across lines.
fn strip_references(input: &str) -> String {
    let s = RE_REF_SELF_CLOSING.replace_all(input, "");
    RE_REF_SPAN.replace_all(&s, "").into_owned()
}

/// Delete what is left of piped links written outside `[[…]]`:
/// `(disambiguation)|word` and `Page#Section|`.
fn strip_piped_remnants(input: &str) -> String {
    let s = RE_PAREN_PIPE.replace_all(input, "");
    let s = RE_ANCHOR_PIPE.replace_all(&s, "");
    RE_ANCHOR_PIPE_SPACED.replace_all(&s, "").into_owned()
}

/// Delete lines that open with a `[[File:…]]` or `[[Image:…]]` link. The
/// whole line goes, so captions carrying nested links leave nothing behind.
fn strip_file_link_lines(input: &str) -> String {
    RE_FILE_LINK_LINE.replace_all(input, "").into_owned()
}

/// Delete bare `File:`/`Image:` directive lines (gallery entries).
fn strip_file_directives(input: &str) -> String {
    RE_FILE_LINE.replace_all(input, "").into_owned()
}

/// Collapse runs of blank lines into one and trim the document.
fn collapse_blank_lines(input: &str) -> String {
    let s = input.replace("\r\n", "\n");
    RE_BLANK_RUN.replace_all(&s, "\n\n").trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
