//! # Tokenizer
//!
//! Turns a source string into a flat stream of [`Token`]s. This stage sits
//! outside the "hard core" of the pipeline (spec §1: "the character-level
//! tokenizer is specified only as a token producer") - the parser only needs
//! an ordered list of `{ kind, text, line }` triples, so this module's only
//! contract is the one in spec §6: keywords are case-insensitive, identifiers
//! are lower-cased, `'` starts a line comment, strings are double-quoted with
//! no escape sequences, and every line ends with a `NEWLINE` token followed,
//! at end of input, by one terminal `EOF`.

use crate::error::Fault;

/// Token kind, partitioned per spec §3 into keywords, operators, punctuation,
/// literals, and structural tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    // Keywords
    Print,
    Input,
    Let,
    If,
    Then,
    Else,
    End,
    While,
    Wend,
    Repeat,
    Until,
    For,
    To,
    Step,
    Next,
    Continue,
    Exit,
    And,
    Or,
    Not,
    Len,
    Val,
    IsNan,
    Array,
    // Operators
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Assign,
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    // Literals
    Number,
    String,
    Ident,
    // Structural
    Newline,
    Eof,
}

/// A single lexeme: its kind, its literal text, and the 1-based source line
/// it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub text: String,
    pub line: u32,
}

fn keyword(word: &str) -> Option<Kind> {
    use Kind::*;
    Some(match word {
        "print" => Print,
        "input" => Input,
        "let" => Let,
        "if" => If,
        "then" => Then,
        "else" => Else,
        "end" => End,
        "while" => While,
        "wend" => Wend,
        "repeat" => Repeat,
        "until" => Until,
        "for" => For,
        "to" => To,
        "step" => Step,
        "next" => Next,
        "continue" => Continue,
        "exit" => Exit,
        "and" => And,
        "or" => Or,
        "not" => Not,
        "len" => Len,
        "val" => Val,
        "isnan" => IsNan,
        "array" => Array,
        _ => return None,
    })
}

/// Tokenize an entire source string to completion, returning the full token
/// stream (ending in one `Eof` token) or the first [`Fault::Tokenize`]
/// encountered.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Fault> {
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '\n' => {
                tokens.push(Token {
                    kind: Kind::Newline,
                    text: "\n".to_string(),
                    line,
                });
                line += 1;
                i += 1;
            }
            ' ' | '\t' | '\r' => {
                i += 1;
            }
            '\'' => {
                // Line comment: skip to (but not past) the newline.
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '"' => {
                let start_line = line;
                i += 1;
                let mut s = String::new();
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(Fault::Tokenize {
                        line: start_line,
                        ch: '"',
                    });
                }
                i += 1; // consume closing quote
                tokens.push(Token {
                    kind: Kind::String,
                    text: s,
                    line: start_line,
                });
            }
            c if c.is_ascii_digit() => {
                let mut s = String::new();
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    s.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token {
                    kind: Kind::Number,
                    text: s,
                    line,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    s.push(chars[i]);
                    i += 1;
                }
                let lowered = s.to_lowercase();
                let kind = keyword(&lowered).unwrap_or(Kind::Ident);
                tokens.push(Token {
                    kind,
                    text: lowered,
                    line,
                });
            }
            '=' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token {
                        kind: Kind::EqEq,
                        text: "==".to_string(),
                        line,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: Kind::Assign,
                        text: "=".to_string(),
                        line,
                    });
                    i += 1;
                }
            }
            '!' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token {
                        kind: Kind::NotEq,
                        text: "!=".to_string(),
                        line,
                    });
                    i += 2;
                } else {
                    return Err(Fault::Tokenize { line, ch: c });
                }
            }
            '<' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token {
                        kind: Kind::Le,
                        text: "<=".to_string(),
                        line,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: Kind::Lt,
                        text: "<".to_string(),
                        line,
                    });
                    i += 1;
                }
            }
            '>' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    tokens.push(Token {
                        kind: Kind::Ge,
                        text: ">=".to_string(),
                        line,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: Kind::Gt,
                        text: ">".to_string(),
                        line,
                    });
                    i += 1;
                }
            }
            '+' => {
                tokens.push(Token { kind: Kind::Plus, text: "+".to_string(), line });
                i += 1;
            }
            '-' => {
                tokens.push(Token { kind: Kind::Minus, text: "-".to_string(), line });
                i += 1;
            }
            '*' => {
                tokens.push(Token { kind: Kind::Star, text: "*".to_string(), line });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: Kind::Slash, text: "/".to_string(), line });
                i += 1;
            }
            '%' => {
                tokens.push(Token { kind: Kind::Percent, text: "%".to_string(), line });
                i += 1;
            }
            '^' => {
                tokens.push(Token { kind: Kind::Caret, text: "^".to_string(), line });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: Kind::LParen, text: "(".to_string(), line });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: Kind::RParen, text: ")".to_string(), line });
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: Kind::LBracket, text: "[".to_string(), line });
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: Kind::RBracket, text: "]".to_string(), line });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: Kind::Comma, text: ",".to_string(), line });
                i += 1;
            }
            other => return Err(Fault::Tokenize { line, ch: other }),
        }
    }

    tokens.push(Token {
        kind: Kind::Eof,
        text: String::new(),
        line,
    });

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_keywords_case_insensitively() {
        let toks = tokenize("Let X = 1\nPRINT x\n").unwrap();
        assert_eq!(toks[0].kind, Kind::Let);
        assert_eq!(toks[1].kind, Kind::Ident);
        assert_eq!(toks[1].text, "x");
    }

    #[test]
    fn skips_comments_to_end_of_line() {
        let toks = tokenize("LET X = 1 ' this is a comment\nPRINT X\n").unwrap();
        let kinds: Vec<Kind> = toks.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&Kind::Newline));
        assert!(!kinds.contains(&Kind::String));
    }

    #[test]
    fn reports_unknown_character() {
        let err = tokenize("LET X = 1 @\n").unwrap_err();
        assert_eq!(err, Fault::Tokenize { line: 1, ch: '@' });
    }

    #[test]
    fn double_quoted_strings_have_no_escapes() {
        let toks = tokenize("PRINT \"hi\\n\"\n").unwrap();
        assert_eq!(toks[1].kind, Kind::String);
        assert_eq!(toks[1].text, "hi\\n");
    }
}
