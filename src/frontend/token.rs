//! Token definitions for annotated Squirrel

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text exactly as written
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, text: String::new(), span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// local
    Local,
    /// function
    Function,
    /// class
    Class,
    /// extends
    Extends,
    /// constructor
    Constructor,
    /// static
    Static,
    /// return
    Return,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// do
    Do,
    /// for
    For,
    /// foreach
    Foreach,
    /// in
    In,
    /// break
    Break,
    /// continue
    Continue,
    /// try
    Try,
    /// catch
    Catch,
    /// throw
    Throw,
    /// null
    Null,
    /// true
    True,
    /// false
    False,
    /// this
    This,
    /// base
    Base,
    /// typeof
    Typeof,
    /// instanceof
    Instanceof,
    /// clone
    Clone,
    /// delete
    Delete,
    /// resume
    Resume,
    /// switch
    Switch,
    /// case
    Case,
    /// default
    Default,
    /// enum
    Enum,
    /// const
    Const,
    /// yield
    Yield,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name, function name, etc.)
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// Floating-point literal
    FloatLit(f64),
    /// String literal (regular or verbatim)
    StringLit(String),
    /// Character literal
    CharLit(char),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// <=>
    Cmp,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Not,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// ~
    Tilde,
    /// <<
    Shl,
    /// >>
    Shr,
    /// >>>
    UShr,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,
    /// %=
    PercentEq,
    /// <- (new slot)
    NewSlot,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// .
    Dot,
    /// ...
    DotDotDot,
    /// ::
    ColonColon,
    /// ?
    Question,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,

    // ============ Special ============
    /// End of file
    Eof,
}

impl TokenKind {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Local
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::Extends
                | TokenKind::Constructor
                | TokenKind::Static
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::In
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Throw
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::This
                | TokenKind::Base
                | TokenKind::Typeof
                | TokenKind::Instanceof
                | TokenKind::Clone
                | TokenKind::Delete
                | TokenKind::Resume
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Enum
                | TokenKind::Const
                | TokenKind::Yield
        )
    }

    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "local" => Some(TokenKind::Local),
            "function" => Some(TokenKind::Function),
            "class" => Some(TokenKind::Class),
            "extends" => Some(TokenKind::Extends),
            "constructor" => Some(TokenKind::Constructor),
            "static" => Some(TokenKind::Static),
            "return" => Some(TokenKind::Return),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "do" => Some(TokenKind::Do),
            "for" => Some(TokenKind::For),
            "foreach" => Some(TokenKind::Foreach),
            "in" => Some(TokenKind::In),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "try" => Some(TokenKind::Try),
            "catch" => Some(TokenKind::Catch),
            "throw" => Some(TokenKind::Throw),
            "null" => Some(TokenKind::Null),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "this" => Some(TokenKind::This),
            "base" => Some(TokenKind::Base),
            "typeof" => Some(TokenKind::Typeof),
            "instanceof" => Some(TokenKind::Instanceof),
            "clone" => Some(TokenKind::Clone),
            "delete" => Some(TokenKind::Delete),
            "resume" => Some(TokenKind::Resume),
            "switch" => Some(TokenKind::Switch),
            "case" => Some(TokenKind::Case),
            "default" => Some(TokenKind::Default),
            "enum" => Some(TokenKind::Enum),
            "const" => Some(TokenKind::Const),
            "yield" => Some(TokenKind::Yield),
            _ => None,
        }
    }

    /// Get the precedence of a binary operator (for Pratt parsing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Assignment (lowest)
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::NewSlot => Some(1),

            // Logical OR
            TokenKind::OrOr => Some(3),

            // Logical AND
            TokenKind::AndAnd => Some(4),

            // Bitwise OR
            TokenKind::Or => Some(5),

            // Bitwise XOR
            TokenKind::Caret => Some(6),

            // Bitwise AND
            TokenKind::And => Some(7),

            // Equality
            TokenKind::EqEq | TokenKind::Ne | TokenKind::Cmp => Some(8),

            // Comparison
            TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::In
            | TokenKind::Instanceof => Some(9),

            // Shift
            TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => Some(10),

            // Additive
            TokenKind::Plus | TokenKind::Minus => Some(11),

            // Multiplicative (highest for binary)
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(12),

            _ => None,
        }
    }

    /// Assignment operators group to the right
    pub fn is_assignment(&self) -> bool {
        self.binary_precedence() == Some(1)
    }
}
