//! Document builder: wrap a cleaned body in a compilable article.

/// Escape the LaTeX special characters in plain text.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the full document for `title` around `body`.
pub fn build(title: &str, body: &str) -> String {
    format!(
        "\\documentclass[12pt]{{article}}\n\
         \\usepackage{{amsmath, amssymb}}\n\
         \\usepackage[utf8]{{inputenc}}\n\
         \\usepackage[T1]{{fontenc}}\n\
         \\usepackage{{lmodern}}\n\
         \\title{{{}}}\n\
         \\begin{{document}}\n\
         \\maketitle\n\
         \n\
         {}\n\
         \n\
         \\end{{document}}\n",
        escape_latex(title),
        body
    )
}
