//! TeX to markup rendering.
//!
//! Covers the TeX subset the engine emits. Anything else falls back to the
//! escaped source text.

use tabcalc_core::typeset::Typesetter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum MarkupError {
    #[error("unknown command \\{0}")]
    UnknownCommand(String),

    #[error("unbalanced braces")]
    Unbalanced,

    #[error("missing argument for {0}")]
    MissingArgument(String),

    #[error("groups nested too deeply")]
    TooDeep,
}

/// Deepest group or command nesting the reader follows.
///
/// Leaves room for the TeX produced from the deepest expression the parser
/// accepts.
const MAX_GROUP_DEPTH: usize = 1024;

/// Renders TeX into nested HTML spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct TexMarkupRenderer;

impl TexMarkupRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Typesetter for TexMarkupRenderer {
    fn render_to_markup(&self, tex: &str) -> String {
        let mut reader = TexReader::new(tex);
        match reader.render_sequence(false) {
            Ok(body) => format!("<span class=\"math\">{}</span>", body),
            Err(err) => {
                tracing::debug!("[Markup] Rendering '{}' as plain text: {}", tex, err);
                format!("<span class=\"math plain\">{}</span>", escape(tex))
            }
        }
    }
}

struct TexReader {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl TexReader {
    fn new(tex: &str) -> Self {
        Self {
            chars: tex.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Runs `render` one nesting level deeper.
    fn nested<T>(
        &mut self,
        render: impl FnOnce(&mut Self) -> Result<T, MarkupError>,
    ) -> Result<T, MarkupError> {
        if self.depth >= MAX_GROUP_DEPTH {
            return Err(MarkupError::TooDeep);
        }
        self.depth += 1;
        let rendered = render(self);
        self.depth -= 1;
        rendered
    }

    /// Renders until end of input, or until the closing brace of a group.
    fn render_sequence(&mut self, in_group: bool) -> Result<String, MarkupError> {
        let mut out = String::new();
        loop {
            match self.next() {
                None if in_group => return Err(MarkupError::Unbalanced),
                None => return Ok(out),
                Some('}') if in_group => return Ok(out),
                Some('}') => return Err(MarkupError::Unbalanced),
                Some('{') => out.push_str(&self.nested(|reader| reader.render_sequence(true))?),
                Some('^') => {
                    let exponent = self.argument("^")?;
                    out.push_str(&format!("<sup>{}</sup>", exponent));
                }
                Some('\\') => out.push_str(&self.nested(Self::render_command)?),
                Some(c) => out.push_str(&render_char(c)),
            }
        }
    }

    fn render_command(&mut self) -> Result<String, MarkupError> {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphabetic()) {
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty() {
            // Escaped symbol such as `\{` or `\,`.
            return match self.next() {
                Some(',') => Ok("&thinsp;".to_string()),
                Some(c) => Ok(escape(&c.to_string())),
                None => Err(MarkupError::MissingArgument("\\".to_string())),
            };
        }

        let markup = match name.as_str() {
            "frac" => {
                let numerator = self.argument("\\frac")?;
                let denominator = self.argument("\\frac")?;
                format!(
                    "<span class=\"frac\"><span class=\"num\">{}</span><span class=\"den\">{}</span></span>",
                    numerator, denominator
                )
            }
            "sqrt" => {
                let index = self.optional_index()?;
                let radicand = self.argument("\\sqrt")?;
                match index {
                    Some(index) => format!(
                        "<span class=\"sqrt\"><sup class=\"index\">{}</sup><span class=\"radicand\">{}</span></span>",
                        index, radicand
                    ),
                    None => format!(
                        "<span class=\"sqrt\"><span class=\"radicand\">{}</span></span>",
                        radicand
                    ),
                }
            }
            "mathrm" => format!("<span class=\"mathrm\">{}</span>", self.argument("\\mathrm")?),
            "left" | "right" => match self.next() {
                Some(delimiter) => escape(&delimiter.to_string()),
                None => return Err(MarkupError::MissingArgument(format!("\\{}", name))),
            },
            "cdot" => "&middot;".to_string(),
            "bmod" => " mod ".to_string(),
            "pi" => "&pi;".to_string(),
            "tau" => "&tau;".to_string(),
            "phi" => "&phi;".to_string(),
            _ => return Err(MarkupError::UnknownCommand(name)),
        };
        Ok(markup)
    }

    /// Reads a `{...}` group or a single character argument.
    fn argument(&mut self, command: &str) -> Result<String, MarkupError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        match self.next() {
            Some('{') => self.nested(|reader| reader.render_sequence(true)),
            Some('\\') => self.nested(Self::render_command),
            Some('}') | None => Err(MarkupError::MissingArgument(command.to_string())),
            Some(c) => Ok(render_char(c)),
        }
    }

    /// Reads the `[n]` of `\sqrt[n]{x}` if present.
    fn optional_index(&mut self) -> Result<Option<String>, MarkupError> {
        if self.peek() != Some('[') {
            return Ok(None);
        }
        self.pos += 1;
        let mut index = String::new();
        loop {
            match self.next() {
                Some(']') => return Ok(Some(escape(&index))),
                Some(c) => index.push(c),
                None => return Err(MarkupError::Unbalanced),
            }
        }
    }
}

fn render_char(c: char) -> String {
    if c.is_alphabetic() {
        format!("<i>{}</i>", c)
    } else {
        escape(&c.to_string())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tex: &str) -> String {
        TexMarkupRenderer::new().render_to_markup(tex)
    }

    #[test]
    fn test_fraction_and_power() {
        assert_eq!(
            render("\\frac{1}{x}"),
            "<span class=\"math\"><span class=\"frac\"><span class=\"num\">1</span><span class=\"den\"><i>x</i></span></span></span>"
        );
        assert_eq!(
            render("{2}^{10}"),
            "<span class=\"math\">2<sup>10</sup></span>"
        );
    }

    #[test]
    fn test_symbols_and_delimiters() {
        assert_eq!(
            render("2\\cdot\\pi"),
            "<span class=\"math\">2&middot;&pi;</span>"
        );
        assert_eq!(
            render("\\left(1+2\\right)"),
            "<span class=\"math\">(1+2)</span>"
        );
        assert_eq!(
            render("\\sqrt[3]{8}"),
            "<span class=\"math\"><span class=\"sqrt\"><sup class=\"index\">3</sup><span class=\"radicand\">8</span></span></span>"
        );
    }

    #[test]
    fn test_malformed_input_falls_back_to_escaped_text() {
        assert_eq!(
            render("\\frac{1"),
            "<span class=\"math plain\">\\frac{1</span>"
        );
        assert_eq!(
            render("\\unknown{x}"),
            "<span class=\"math plain\">\\unknown{x}</span>"
        );
        assert_eq!(render("1}"), "<span class=\"math plain\">1}</span>");
    }

    #[test]
    fn test_deeply_nested_groups_fall_back_to_plain_text() {
        let open = "{".repeat(20_000);
        assert_eq!(render(&open), format!("<span class=\"math plain\">{}</span>", open));

        let fractions = "\\frac".repeat(5_000);
        assert!(render(&fractions).starts_with("<span class=\"math plain\">"));

        let moderate = format!("{}x{}", "{".repeat(50), "}".repeat(50));
        assert_eq!(render(&moderate), "<span class=\"math\"><i>x</i></span>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a<b"), "<span class=\"math\"><i>a</i>&lt;<i>b</i></span>");
        assert_eq!(render(""), "<span class=\"math\"></span>");
    }
}
