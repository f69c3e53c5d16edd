//! The meaning of a token is determined by its text alone. This classifies a token into
//! one of the forms the dispatch loop knows how to execute.

use std::str::FromStr;
use strum_macros::{EnumString, IntoStaticStr};

/// Tokens that are matched by their full text
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum Keyword {
    #[strum(serialize = "^^")]
    FuncEnd,
    #[strum(serialize = "return")]
    Return,
    #[strum(serialize = "call")]
    Call,
    #[strum(serialize = "call_eval")]
    CallEval,

    #[strum(serialize = "<-")]
    Assign,
    #[strum(serialize = "+=")]
    AddAssign,
    #[strum(serialize = "-=")]
    SubAssign,
    #[strum(serialize = "*=")]
    MulAssign,
    #[strum(serialize = "/=")]
    DivAssign,
    #[strum(serialize = "%=")]
    ModAssign,
    #[strum(serialize = "::")]
    Load,

    #[strum(serialize = "<<<")]
    FrameOpen,
    #[strum(serialize = ">>>")]
    FrameClose,

    #[strum(serialize = "goto")]
    Goto,
    #[strum(serialize = "if_goto")]
    IfGoto,
    #[strum(serialize = "inc_goto_until")]
    IncGotoUntil,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// The binary operators. Each pops `b`, then `a`, and pushes `a op b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,

    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,

    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,

    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// What a token means. Names borrow from the token text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Form<'a> {
    /// `name^`
    FuncDef(&'a str),
    /// `^name`
    FuncRef(&'a str),
    /// `$name$`
    DeclareRef(&'a str),
    /// `$name`
    Ref(&'a str),
    /// `name$`
    Declare(&'a str),
    /// `:name`
    LabelRef(&'a str),
    /// `name:`
    LabelDef(&'a str),
    Keyword(Keyword),
    Operator(Operator),
    /// `!name`
    Builtin(&'a str),
    Integer(i64),
    /// integer syntax, but the value does not fit into an `i64`
    IntegerOutOfRange,
    Real(f64),
    /// bare identifier, reads the variable
    Read(&'a str),
    Unresolved,
}

impl<'a> Form<'a> {
    /// Classifies token text. The checks are ordered, e.g. `^^` is the function end and
    /// not a reference to a function called `^`.
    pub fn of(token: &'a str) -> Form<'a> {
        let long = token.len() >= 2;
        if token == "^^" {
            return Form::Keyword(Keyword::FuncEnd);
        }
        if long {
            if let Some(name) = token.strip_suffix('^') {
                return Form::FuncDef(name);
            }
            if let Some(name) = token.strip_prefix('^') {
                return Form::FuncRef(name);
            }
        }
        if token.len() >= 3 && token.starts_with('$') && token.ends_with('$') {
            return Form::DeclareRef(&token[1..token.len() - 1]);
        }
        if long {
            if let Some(name) = token.strip_prefix('$') {
                return Form::Ref(name);
            }
            if let Some(name) = token.strip_suffix('$') {
                return Form::Declare(name);
            }
        }
        if long && token != "::" {
            if let Some(name) = token.strip_prefix(':') {
                return Form::LabelRef(name);
            }
            if let Some(name) = token.strip_suffix(':') {
                return Form::LabelDef(name);
            }
        }
        if let Ok(kw) = Keyword::from_str(token) {
            return Form::Keyword(kw);
        }
        if let Ok(op) = Operator::from_str(token) {
            return Form::Operator(op);
        }
        if long {
            if let Some(name) = token.strip_prefix('!') {
                return Form::Builtin(name);
            }
        }
        if is_integer(token) {
            return match token.parse::<i64>() {
                Ok(i) => Form::Integer(i),
                Err(_) => Form::IntegerOutOfRange,
            };
        }
        // also takes `inf`, `infinity` and `nan`
        if let Ok(x) = token.parse::<f64>() {
            return Form::Real(x);
        }
        if is_identifier(token) {
            return Form::Read(token);
        }
        Form::Unresolved
    }
}

/// an optional sign followed by decimal digits
fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A label definition as seen by the definition scan, which only looks at the trailing
/// colon. `$x:` is recorded as label `$x`, although executing it pushes a reference.
pub fn label_name(token: &str) -> Option<&str> {
    if token.len() < 2 || token == "::" {
        return None;
    }
    token.strip_suffix(':')
}
