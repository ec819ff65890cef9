//! Token kinds and source positions.

use std::fmt;

/// Position of a token in the source text.
///
/// Offsets count characters, not bytes. Tokens produced from
/// environment-variable text carry the span of the `${NAME}` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
    /// 1-based line of the first character
    pub line: u32,
    /// 1-based column of the first character
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Number of characters covered by this span.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Comparison operator of a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Ge,
    ];

    /// Symbolic form, e.g. `<=`.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Fortran-style abbreviation, e.g. `le`.
    pub fn abbr(self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }

    pub fn from_abbr(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.abbr() == text)
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == text)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Kind of a percentile threshold, named by its short prefix (`SOP50`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PercentileKind {
    UserSpecified,
    SampleFcst,
    SampleObs,
    SampleFcstClimo,
    SampleObsClimo,
    FcstClimoDist,
    ObsClimoDist,
    FreqBias,
}

/// Prefix table used when matching a lexeme, longest prefixes first.
/// `SCP` and `CDP` are deprecated spellings of `SOCP` and `OCDP`.
const PERCENTILE_PREFIXES: &[(&str, PercentileKind)] = &[
    ("FBIAS", PercentileKind::FreqBias),
    ("SFCP", PercentileKind::SampleFcstClimo),
    ("SOCP", PercentileKind::SampleObsClimo),
    ("FCDP", PercentileKind::FcstClimoDist),
    ("OCDP", PercentileKind::ObsClimoDist),
    ("USP", PercentileKind::UserSpecified),
    ("SFP", PercentileKind::SampleFcst),
    ("SOP", PercentileKind::SampleObs),
    ("SCP", PercentileKind::SampleObsClimo),
    ("CDP", PercentileKind::ObsClimoDist),
];

/// Strip whichever percentile prefix `text` starts with, without requiring
/// the remainder to be numeric.
pub(crate) fn strip_percentile_prefix(text: &str) -> Option<(PercentileKind, &str)> {
    PERCENTILE_PREFIXES
        .iter()
        .find_map(|(prefix, kind)| text.strip_prefix(prefix).map(|rest| (*kind, rest)))
}

impl PercentileKind {
    pub const ALL: [PercentileKind; 8] = [
        PercentileKind::UserSpecified,
        PercentileKind::SampleFcst,
        PercentileKind::SampleObs,
        PercentileKind::SampleFcstClimo,
        PercentileKind::SampleObsClimo,
        PercentileKind::FcstClimoDist,
        PercentileKind::ObsClimoDist,
        PercentileKind::FreqBias,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            PercentileKind::UserSpecified => "USP",
            PercentileKind::SampleFcst => "SFP",
            PercentileKind::SampleObs => "SOP",
            PercentileKind::SampleFcstClimo => "SFCP",
            PercentileKind::SampleObsClimo => "SOCP",
            PercentileKind::FcstClimoDist => "FCDP",
            PercentileKind::ObsClimoDist => "OCDP",
            PercentileKind::FreqBias => "FBIAS",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            PercentileKind::UserSpecified => "USER_SPECIFIED_PERC",
            PercentileKind::SampleFcst => "SAMPLE_FCST_PERC",
            PercentileKind::SampleObs => "SAMPLE_OBS_PERC",
            PercentileKind::SampleFcstClimo => "SAMPLE_FCST_CLIMO_PERC",
            PercentileKind::SampleObsClimo => "SAMPLE_OBS_CLIMO_PERC",
            PercentileKind::FcstClimoDist => "CLIMO_FCST_DIST_PERC",
            PercentileKind::ObsClimoDist => "CLIMO_OBS_DIST_PERC",
            PercentileKind::FreqBias => "FREQ_BIAS_PERC",
        }
    }

    /// Split a lexeme such as `SOP50` into its kind and percentile value.
    ///
    /// Returns `None` unless the whole remainder after the prefix is a number.
    pub fn split_prefixed(text: &str) -> Option<(Self, f64)> {
        PERCENTILE_PREFIXES.iter().find_map(|(prefix, kind)| {
            let rest = text.strip_prefix(prefix)?;
            crate::word::parse_number(rest).map(|value| (*kind, value))
        })
    }

    /// Look up a percentile kind by its short or long name.
    pub fn from_name(name: &str) -> Option<Self> {
        PERCENTILE_PREFIXES
            .iter()
            .find(|(prefix, _)| *prefix == name)
            .map(|(_, kind)| *kind)
            .or_else(|| Self::ALL.into_iter().find(|kind| kind.long_name() == name))
    }

    /// Whether the value comes from a climatological normal distribution
    /// rather than from a data sample.
    pub fn is_climo_dist(self) -> bool {
        matches!(
            self,
            PercentileKind::FcstClimoDist | PercentileKind::ObsClimoDist
        )
    }
}

impl fmt::Display for PercentileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A token of the configuration language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Names and literals ===
    /// Plain identifier (left-hand side name, or an unknown name)
    Identifier(String),
    /// Quoted string after escape processing and `${}` substitution
    QuotedString(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Builtin function, carrying its index in the builtin table
    Builtin(usize),
    /// Previously defined user function
    UserFunction(String),
    /// Parameter of the function currently being defined (slot index)
    LocalVar(usize),

    // === Thresholds ===
    /// `<`, `<=`, ... or a bare `lt`, `le`, ...
    Comparison(CompareOp),
    /// `le150` style threshold written without spaces
    FortranThreshold(CompareOp, f64),
    /// `SOP50` style percentile
    PercThreshold(PercentileKind, f64),
    /// `NA`
    Na,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,

    // === Keywords and punctuation ===
    Print,
    Assign,
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
}

impl Token {
    /// True for tokens that can start a threshold expression.
    pub fn starts_threshold(&self) -> bool {
        matches!(
            self,
            Token::Comparison(_) | Token::FortranThreshold(..) | Token::Na | Token::Not
        )
    }

    /// Short human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier `{name}`"),
            Token::QuotedString(_) => "string".to_string(),
            Token::Integer(i) => format!("integer {i}"),
            Token::Float(d) => format!("number {d}"),
            Token::Boolean(b) => format!("boolean {b}"),
            Token::Builtin(_) => "builtin function".to_string(),
            Token::UserFunction(name) => format!("function `{name}`"),
            Token::LocalVar(_) => "local variable".to_string(),
            Token::Comparison(op) => format!("`{op}`"),
            Token::FortranThreshold(op, _) => format!("threshold `{}`", op.abbr()),
            Token::PercThreshold(kind, _) => format!("percentile `{kind}`"),
            Token::Na => "`NA`".to_string(),
            Token::And => "`&&`".to_string(),
            Token::Or => "`||`".to_string(),
            Token::Not => "`!`".to_string(),
            Token::Print => "`print`".to_string(),
            Token::Assign => "`=`".to_string(),
            Token::Semicolon => "`;`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Caret => "`^`".to_string(),
        }
    }
}

/// A token together with the text it was lexed from and its location.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    /// Source text of the token (processed text for strings)
    pub text: String,
    pub span: Span,
}
