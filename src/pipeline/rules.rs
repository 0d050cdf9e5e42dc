//! Named rewrite rules and their in-order reduction.
//!
//! Every phase of the pipeline is an ordered list of [`Rule`]s. A rule is a
//! pure `&str → String` function with a name; [`apply_chain`] folds a list
//! over the input. Rules never fail: a pattern that does not match leaves
//! the text unchanged.

use tracing::trace;

/// A single text → text rewrite step.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable name, used in trace logs and tests.
    pub name: &'static str,
    /// The rewrite itself.
    pub apply: fn(&str) -> String,
}

impl Rule {
    pub const fn new(name: &'static str, apply: fn(&str) -> String) -> Self {
        Self { name, apply }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// Apply `rules` to `input` in declaration order.
pub fn apply_chain(stage: &str, rules: &[Rule], input: &str) -> String {
    rules.iter().fold(input.to_string(), |text, rule| {
        let out = (rule.apply)(&text);
        if out != text {
            trace!(
                stage,
                rule = rule.name,
                before = text.len(),
                after = out.len(),
                "rule rewrote text"
            );
        }
        out
    })
}
