use std::collections::HashMap;

/// A single piece of source text together with the line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// 1-based source line
    pub line: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Token {
            text: text.into(),
            line,
        }
    }

    /// the end-of-program sentinel is the only token with empty text
    pub fn is_end(&self) -> bool {
        self.text.is_empty()
    }
}

/// The token sequence, which is at the same time source and executable.
#[derive(Debug, Clone)]
pub struct Program {
    tokens: Vec<Token>,
    end: Token,
}

impl Program {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end_line = tokens.last().map_or(1, |t| t.line);
        Program {
            tokens,
            end: Token::new("", end_line),
        }
    }

    /// All tokens, without the sentinel
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the token at `index`, or the sentinel for every index past the end
    pub fn token(&self, index: usize) -> &Token {
        self.tokens.get(index).unwrap_or(&self.end)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Everything that is known about a function after its definition was scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    /// index of the `name^` token
    pub start: usize,
    /// distance from `start` to the closing `^^`
    pub len: usize,
    /// label name to the index of its `name:` token. Only visible inside this function.
    pub labels: HashMap<String, usize>,
}

impl FunctionDef {
    /// index of the closing `^^`
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}
