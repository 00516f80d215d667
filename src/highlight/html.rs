//! HTML rendering of the token stream and the named display surfaces it is
//! injected into.

use std::collections::HashMap;

use super::{tokenize, Language};

/// Escape the three characters that would otherwise be read as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Render `src` as `<div class="code-editor"><pre>...</pre></div>`.
pub fn render(src: &str, lang: Language) -> String {
    let mut body = String::with_capacity(src.len() * 2);
    for token in tokenize(src, lang) {
        let text = escape_html(token.text(src));
        match token.kind.css_class() {
            Some(class) => {
                body.push_str("<span class=\"");
                body.push_str(class);
                body.push_str("\">");
                body.push_str(&text);
                body.push_str("</span>");
            }
            None => body.push_str(&text),
        }
    }
    format!("<div class=\"code-editor\"><pre>{body}</pre></div>")
}

/// A container that holds rendered markup fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    pub children: Vec<String>,
}

/// Display surfaces addressed by id.
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    by_id: HashMap<String, Surface>,
}

impl Surfaces {
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_id = ids.into_iter().map(|id| (id.into(), Surface::default())).collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Surface> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Surface> {
        self.by_id.get_mut(id)
    }
}

/// Highlight `src` into the surface named `id`, replacing its first child or
/// appending when it is empty. Returns `false` (and does nothing) when no
/// surface has that id.
pub fn render_into(surfaces: &mut Surfaces, id: &str, src: &str, lang: Language) -> bool {
    let Some(surface) = surfaces.get_mut(id) else {
        tracing::debug!(id, "highlight target not found");
        return false;
    };
    let markup = render(src, lang);
    match surface.children.first_mut() {
        Some(first) => *first = markup,
        None => surface.children.push(markup),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::TokenKind;

    fn count_spans(markup: &str, kind: TokenKind) -> usize {
        kind.css_class()
            .map(|class| markup.matches(&format!("<span class=\"{class}\">")).count())
            .unwrap_or(0)
    }

    #[test]
    fn escapes_before_wrapping() {
        let html = render("a < b && c > d", Language::C);
        assert!(html.contains("&lt;"));
        assert!(html.contains("<span class=\"operators\">&amp;</span>"));
        assert!(!html.contains(" < "));
    }

    #[test]
    fn comment_only_source_has_no_other_spans() {
        let html = render("// if (x) return 42; \"str\"", Language::Java);
        assert_eq!(count_spans(&html, TokenKind::Comment), 1);
        for kind in [
            TokenKind::String,
            TokenKind::Number,
            TokenKind::Keyword,
            TokenKind::Function,
            TokenKind::Operator,
            TokenKind::Bracket,
        ] {
            assert_eq!(count_spans(&html, kind), 0, "{kind:?} leaked into comment");
        }
    }

    #[test]
    fn wraps_in_pre_block() {
        let html = render("x", Language::Python);
        assert_eq!(html, "<div class=\"code-editor\"><pre>x</pre></div>");
    }

    #[test]
    fn render_into_replaces_first_child() {
        let mut surfaces = Surfaces::with_ids(["code-display-container"]);
        assert!(render_into(&mut surfaces, "code-display-container", "a", Language::C));
        assert!(render_into(&mut surfaces, "code-display-container", "b", Language::C));
        let surface = surfaces.get("code-display-container").unwrap();
        assert_eq!(surface.children.len(), 1);
        assert!(surface.children[0].contains("<pre>b</pre>"));
    }

    #[test]
    fn render_into_unknown_id_is_noop() {
        let mut surfaces = Surfaces::with_ids(["output"]);
        assert!(!render_into(&mut surfaces, "missing", "x", Language::C));
        assert!(surfaces.get("output").unwrap().children.is_empty());
    }
}
