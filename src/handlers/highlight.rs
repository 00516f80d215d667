//! `--highlight`: print the code with ANSI colours or as HTML.

use crate::highlight::html::{render_into, Surfaces};
use crate::highlight::Language;
use crate::printer::CodePrinter;

/// Id of the container the HTML rendering is placed in.
pub const CODE_DISPLAY_ID: &str = "code-display-container";

pub fn run(code: &str, language: Language, html: bool) {
    if html {
        println!("{}", html_document(code, language));
    } else {
        CodePrinter { language, line_numbers: true }.print(code.trim_end_matches('\n'));
    }
}

fn html_document(code: &str, language: Language) -> String {
    let mut surfaces = Surfaces::with_ids([CODE_DISPLAY_ID]);
    render_into(&mut surfaces, CODE_DISPLAY_ID, code, language);
    let inner = surfaces
        .get(CODE_DISPLAY_ID)
        .map(|s| s.children.concat())
        .unwrap_or_default();
    format!("<div id=\"{CODE_DISPLAY_ID}\">{inner}</div>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_wrapped_in_container() {
        let doc = html_document("x = 1 # one", Language::Python);
        assert!(doc.starts_with("<div id=\"code-display-container\"><div class=\"code-editor\"><pre>"));
        assert!(doc.contains("<span class=\"comments\"># one</span>"));
        assert!(doc.ends_with("</pre></div></div>"));
    }
}
