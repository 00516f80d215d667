//! Single-pass source lexer used by every highlight renderer (HTML, ANSI, TUI).

pub mod html;

use std::fmt;
use std::str::FromStr;

/// Languages accepted by the debug backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Python,
    C,
    Cpp,
    Java,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Python, Language::C, Language::Cpp, Language::Java];

    /// Wire name sent to the backend as `language`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON_KEYWORDS,
            Language::C | Language::Cpp | Language::Java => C_FAMILY_KEYWORDS,
        }
    }

    fn hash_comments(&self) -> bool {
        matches!(self, Language::Python)
    }

    pub fn next(&self) -> Language {
        let idx = Self::ALL.iter().position(|l| l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Guess the language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cc" | "cxx" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            other => Err(format!("unsupported language: {other} (expected python, c, cpp or java)")),
        }
    }
}

const C_FAMILY_KEYWORDS: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "let", "const", "var", "new", "try",
    "catch", "finally", "switch", "case", "break", "continue", "class", "import", "export",
    "this", "async", "await", "int", "char", "float", "double", "void", "long", "short",
    "unsigned", "struct", "include", "public", "private", "protected", "static", "final",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "def", "return", "if", "elif", "else", "for", "while", "in", "is", "not", "and", "or",
    "try", "except", "finally", "class", "import", "from", "as", "with", "lambda", "pass",
    "break", "continue", "yield", "async", "await", "print", "None", "True", "False",
];

/// Token classes, one CSS class each in the HTML renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    String,
    Number,
    Keyword,
    Function,
    Operator,
    Bracket,
    Plain,
}

impl TokenKind {
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            TokenKind::Comment => Some("comments"),
            TokenKind::String => Some("strings"),
            TokenKind::Number => Some("numbers"),
            TokenKind::Keyword => Some("keywords"),
            TokenKind::Function => Some("functions"),
            TokenKind::Operator => Some("operators"),
            TokenKind::Bracket => Some("brackets"),
            TokenKind::Plain => None,
        }
    }
}

/// A classified byte range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

const OPERATORS: &[u8] = b"=+-*/%<>&|^!~?:.";
const BRACKETS: &[u8] = b"{}[]()";

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenize `src` in one left-to-right pass.
///
/// Tokens are contiguous and cover the whole input; adjacent plain text is
/// merged into a single token.
pub fn tokenize(src: &str, lang: Language) -> Vec<Token> {
    let bytes = src.as_bytes();
    let keywords = lang.keywords();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let rest = &bytes[i..];

        let slash_comments = !lang.hash_comments();

        if (slash_comments && rest.starts_with(b"//")) || (b == b'#' && lang.hash_comments()) {
            let end = line_end(bytes, i);
            push(&mut tokens, TokenKind::Comment, i, end);
            i = end;
        } else if slash_comments && rest.starts_with(b"/*") {
            let end = find(bytes, i + 2, b"*/").map(|p| p + 2).unwrap_or(bytes.len());
            push(&mut tokens, TokenKind::Comment, i, end);
            i = end;
        } else if b == b'"' || b == b'\'' || b == b'`' {
            match string_end(bytes, i) {
                Some(end) => {
                    push(&mut tokens, TokenKind::String, i, end);
                    i = end;
                }
                None => {
                    push(&mut tokens, TokenKind::Plain, i, i + 1);
                    i += 1;
                }
            }
        } else if is_word_byte(b) {
            let mut end = i;
            while end < bytes.len() && is_word_byte(bytes[end]) {
                end += 1;
            }
            // A fractional part belongs to the number only when digits follow the dot.
            if is_number(&bytes[i..end]) && end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
                let mut frac = end + 1;
                while frac < bytes.len() && is_word_byte(bytes[frac]) {
                    frac += 1;
                }
                if bytes[end + 1..frac].iter().all(u8::is_ascii_digit) {
                    end = frac;
                }
            }
            let word = &src[i..end];
            let kind = if is_number(word.as_bytes()) {
                TokenKind::Number
            } else if keywords.contains(&word) {
                TokenKind::Keyword
            } else if next_non_space(bytes, end) == Some(b'(') {
                TokenKind::Function
            } else {
                TokenKind::Plain
            };
            push(&mut tokens, kind, i, end);
            i = end;
        } else if OPERATORS.contains(&b) {
            push(&mut tokens, TokenKind::Operator, i, i + 1);
            i += 1;
        } else if BRACKETS.contains(&b) {
            push(&mut tokens, TokenKind::Bracket, i, i + 1);
            i += 1;
        } else {
            // Advance by a whole char so ranges stay on UTF-8 boundaries.
            let width = src[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            push(&mut tokens, TokenKind::Plain, i, i + width);
            i += width;
        }
    }

    tokens
}

/// Split the token stream into per-line fragments. Tokens spanning a newline
/// (block comments, multi-line strings) are cut at each line break; the
/// newline itself is not part of any fragment.
pub fn tokenize_lines(src: &str, lang: Language) -> Vec<Vec<(TokenKind, &str)>> {
    let mut lines: Vec<Vec<(TokenKind, &str)>> = vec![Vec::new()];
    for token in tokenize(src, lang) {
        let mut parts = token.text(src).split('\n');
        if let Some(first) = parts.next() {
            if !first.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push((token.kind, first));
                }
            }
        }
        for part in parts {
            let mut line = Vec::new();
            if !part.is_empty() {
                line.push((token.kind, part));
            }
            lines.push(line);
        }
    }
    lines
}

fn push(tokens: &mut Vec<Token>, kind: TokenKind, start: usize, end: usize) {
    if kind == TokenKind::Plain {
        if let Some(last) = tokens.last_mut() {
            if last.kind == TokenKind::Plain && last.end == start {
                last.end = end;
                return;
            }
        }
    }
    tokens.push(Token { kind, start, end });
}

fn is_number(word: &[u8]) -> bool {
    let mut parts = word.splitn(2, |b| *b == b'.');
    let int = parts.next().unwrap_or_default();
    let int_ok = !int.is_empty() && int.iter().all(u8::is_ascii_digit);
    match parts.next() {
        None => int_ok,
        Some(frac) => int_ok && !frac.is_empty() && frac.iter().all(u8::is_ascii_digit),
    }
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().position(|b| *b == b'\n').map(|p| from + p).unwrap_or(bytes.len())
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..].windows(needle.len()).position(|w| w == needle).map(|p| from + p)
}

fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

fn next_non_space(bytes: &[u8], from: usize) -> Option<u8> {
    bytes[from..].iter().copied().find(|b| !b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str, lang: Language) -> Vec<(TokenKind, &str)> {
        tokenize(src, lang).iter().map(|t| (t.kind, t.text(src))).collect()
    }

    #[test]
    fn line_comment_is_a_single_token() {
        let src = "// let x = foo(1) + \"s\"";
        let tokens = tokenize(src, Language::Java);
        assert_eq!(tokens, vec![Token { kind: TokenKind::Comment, start: 0, end: src.len() }]);
    }

    #[test]
    fn comment_stops_at_newline() {
        let src = "x = 1 // note\ny";
        let toks = kinds(src, Language::C);
        assert!(toks.contains(&(TokenKind::Comment, "// note")));
        assert_eq!(toks.last(), Some(&(TokenKind::Plain, "\ny")));
    }

    #[test]
    fn block_comment_hides_contents() {
        let toks = kinds("/* if (x) 42 */ return", Language::Java);
        assert_eq!(toks[0], (TokenKind::Comment, "/* if (x) 42 */"));
        assert_eq!(toks[2], (TokenKind::Keyword, "return"));
        assert_eq!(toks.iter().filter(|(k, _)| *k == TokenKind::Number).count(), 0);
    }

    #[test]
    fn unterminated_block_comment_runs_to_end() {
        let toks = kinds("a /* open", Language::C);
        assert_eq!(toks.last(), Some(&(TokenKind::Comment, "/* open")));
    }

    #[test]
    fn python_hash_comments() {
        let toks = kinds("print(1) # done", Language::Python);
        assert_eq!(toks[0], (TokenKind::Keyword, "print"));
        assert_eq!(toks.last(), Some(&(TokenKind::Comment, "# done")));
        // `#` is not a comment marker in C.
        let c = kinds("#include", Language::C);
        assert_eq!(c[0], (TokenKind::Plain, "#"));
        assert_eq!(c[1], (TokenKind::Keyword, "include"));
    }

    #[test]
    fn python_floor_division_is_not_a_comment() {
        let toks = kinds("x = 7 // 2  # half", Language::Python);
        assert!(toks.contains(&(TokenKind::Number, "2")));
        assert_eq!(toks.iter().filter(|(k, _)| *k == TokenKind::Comment).count(), 1);
        assert_eq!(toks.last(), Some(&(TokenKind::Comment, "# half")));
        assert!(!kinds("a /* b", Language::Python).iter().any(|(k, _)| *k == TokenKind::Comment));
    }

    #[test]
    fn strings_numbers_functions() {
        let toks = kinds("foo (\"a(1)\", 3.14, 7x)", Language::Java);
        assert_eq!(toks[0], (TokenKind::Function, "foo"));
        assert!(toks.contains(&(TokenKind::String, "\"a(1)\"")));
        assert!(toks.contains(&(TokenKind::Number, "3.14")));
        assert!(!toks.iter().any(|(k, t)| *k == TokenKind::Number && t.contains('7')));
    }

    #[test]
    fn escaped_quote_stays_inside_string() {
        let toks = kinds(r#"'it\'s' + 1"#, Language::Java);
        assert_eq!(toks[0], (TokenKind::String, r#"'it\'s'"#));
    }

    #[test]
    fn unterminated_quote_is_plain() {
        let toks = kinds("\"abc", Language::Java);
        assert_eq!(toks, vec![(TokenKind::Plain, "\"abc")]);
    }

    #[test]
    fn operators_and_brackets_per_char() {
        let toks = kinds("a+=b[0];", Language::C);
        assert!(toks.contains(&(TokenKind::Operator, "+")));
        assert!(toks.contains(&(TokenKind::Operator, "=")));
        assert!(toks.contains(&(TokenKind::Bracket, "[")));
        assert!(toks.contains(&(TokenKind::Number, "0")));
    }

    #[test]
    fn member_access_dot_is_operator() {
        let toks = kinds("a.b", Language::Java);
        assert_eq!(toks, vec![(TokenKind::Plain, "a"), (TokenKind::Operator, "."), (TokenKind::Plain, "b")]);
    }

    #[test]
    fn tokens_cover_input_with_unicode() {
        let src = "s = 'é' # ünï\nλ(2)";
        let tokens = tokenize(src, Language::Python);
        let mut pos = 0;
        for t in &tokens {
            assert_eq!(t.start, pos);
            pos = t.end;
        }
        assert_eq!(pos, src.len());
    }

    #[test]
    fn lines_split_multiline_tokens() {
        let lines = tokenize_lines("/* a\nb */ x\n", Language::C);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], vec![(TokenKind::Comment, "/* a")]);
        assert_eq!(lines[1][0], (TokenKind::Comment, "b */"));
        assert!(lines[2].is_empty());
    }

    #[test]
    fn language_parsing() {
        assert_eq!("C++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!("py".parse::<Language>(), Ok(Language::Python));
        assert!("rust".parse::<Language>().is_err());
        assert_eq!(Language::Java.next(), Language::Python);
        assert_eq!(Language::from_extension("HPP"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("rs"), None);
    }
}
