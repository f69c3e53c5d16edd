//! Splits source text into the flat token sequence that is executed directly.

use pest::error::Error;
use pest::Parser;
use pest_derive::Parser;

use crate::core::{Program, Token};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct FlinchParser;

pub type ParseResult<T> = Result<T, Error<Rule>>;

/// Tokenizes `src` and returns the program, terminated by the end-of-program sentinel.
///
/// Every character that is not whitespace or part of a comment belongs to some token,
/// so this does not fail on any input that made it into a `&str`.
pub fn tokenize(src: &str) -> ParseResult<Program> {
    let mut tokens = vec![];
    let mut line = 1;
    let mut seen = 0;
    for pair in FlinchParser::parse(Rule::file, src)?.flatten() {
        if pair.as_rule() != Rule::token {
            continue;
        }
        let start = pair.as_span().start();
        line += src[seen..start].matches('\n').count();
        seen = start;
        tokens.push(Token::new(pair.as_str(), line));
    }
    Ok(Program::new(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(program: &Program) -> Vec<&str> {
        program.tokens().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_skips_whitespace_and_comments() {
        let program = tokenize("  1 2\t+ # a comment <- \n\r\n  $x <-#trailing\n").unwrap();
        assert_eq!(texts(&program), vec!["1", "2", "+", "$x", "<-"]);
    }

    #[test]
    fn test_lines() {
        let program = tokenize("a\n# comment line\n\nb c\n  d").unwrap();
        let lines: Vec<_> = program.tokens().iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 4, 4, 5]);
        // the sentinel carries the line of the last token
        assert!(program.token(4).is_end());
        assert_eq!(program.token(4).line, 5);
    }

    #[test]
    fn test_comment_marker_ends_token() {
        let program = tokenize("abc#def ghi\njkl").unwrap();
        assert_eq!(texts(&program), vec!["abc", "jkl"]);
        assert_eq!(program.token(1).line, 2);
    }

    #[test]
    fn test_empty_source() {
        let program = tokenize("   # nothing here\n").unwrap();
        assert!(program.tokens().is_empty());
        assert!(program.token(0).is_end());
        assert_eq!(program.token(0).line, 1);
    }

    #[test]
    fn test_rejoined_tokens_tokenize_the_same() {
        let src = "fact^ n$ $n <- # store the argument\n\
                   n 1 <= :base if_goto\n\
                   n n 1 - ^fact call_eval * return\n\
                   base: 1 return ^^\n\
                   5 ^fact call_eval";
        let first = tokenize(src).unwrap();
        let joined = texts(&first).join(" ");
        let second = tokenize(&joined).unwrap();
        assert_eq!(texts(&first), texts(&second));
        assert!(second.tokens().iter().all(|t| t.line == 1));
    }
}
