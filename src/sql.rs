//! Query-text identifiers.
//!
//! Raw query text is high-cardinality; timer names need something short and
//! stable. The identifier for a query is its statement type followed by the
//! hex SHA-1 digest of its canonical form:
//!
//! ```text
//!   "select id,name from t where id=42"
//!        │ SqlNormalizer::normalize
//!        ▼
//!   ("select", "select id, name from t where id = ?")
//!        │ sha1 + hex
//!        ▼
//!   "select_<40 hex digits>"
//! ```
//!
//! ## Key Components
//!
//! - [`SqlNormalizer`]: turns raw text into a [`NormalizedSql`].
//! - [`SimpleSqlNormalizer`]: lowercases, collapses whitespace, strips
//!   comments and replaces string and numeric literals with `?`.
//! - [`SqlIdLoader`]: a [`CacheLoader`] producing identifiers, meant to sit
//!   behind the orchestrator's identifier cache.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use sha1::{Digest, Sha1};

use crate::cache::CacheLoader;

/// Statement type used when the text contains no keyword at all.
pub const UNKNOWN_STATEMENT_TYPE: &str = "unknown";

/// Result of normalizing one query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedSql {
    /// First keyword, lowercased (`select`, `insert`, `call`, ...).
    pub statement_type: String,
    /// Literal-free, whitespace-normalized text.
    pub canonical: String,
}

/// Converts raw query text into a `(statement type, canonical form)` pair.
pub trait SqlNormalizer: Send + Sync + fmt::Debug {
    fn normalize(&self, sql: &str) -> NormalizedSql;
}

impl<N: SqlNormalizer + ?Sized> SqlNormalizer for Arc<N> {
    fn normalize(&self, sql: &str) -> NormalizedSql {
        (**self).normalize(sql)
    }
}

// ---------------------------------------------------------------------------
// SimpleSqlNormalizer
// ---------------------------------------------------------------------------

/// Token-based [`SqlNormalizer`].
///
/// Rules applied to the text:
/// - comments (`-- ...` and `/* ... */`) are dropped;
/// - string literals and numeric literals become `?`;
/// - words and quoted identifiers are lowercased;
/// - the `{ }` escape braces around calls are dropped;
/// - tokens are separated by exactly one space, except that commas attach to
///   the preceding token, parentheses hug their contents and a call's
///   argument list attaches to the routine name (`proc(?)`). Keywords such
///   as `in` or `values` keep their space before `(`.
///
/// ```
/// use probekit::sql::{SimpleSqlNormalizer, SqlNormalizer};
///
/// let normalized = SimpleSqlNormalizer.normalize("SELECT id,name FROM t WHERE id=42 AND n='x'");
/// assert_eq!(normalized.statement_type, "select");
/// assert_eq!(normalized.canonical, "select id, name from t where id = ? and n = ?");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSqlNormalizer;

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Literal,
    Comma,
    Open,
    Close,
    Symbol(String),
}

impl SimpleSqlNormalizer {
    fn tokenize(sql: &str) -> Vec<Token> {
        let chars: Vec<char> = sql.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            match c {
                c if c.is_whitespace() => i += 1,
                '{' | '}' => i += 1,
                '-' if next == Some('-') => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                },
                '/' if next == Some('*') => {
                    i += 2;
                    while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                        i += 1;
                    }
                    i += 2;
                },
                '\'' => {
                    i += 1;
                    while i < chars.len() {
                        if chars[i] == '\'' {
                            // '' is an escaped quote inside the literal
                            if chars.get(i + 1) == Some(&'\'') {
                                i += 2;
                                continue;
                            }
                            break;
                        }
                        i += 1;
                    }
                    i += 1;
                    tokens.push(Token::Literal);
                },
                '"' | '`' => {
                    let quote = c;
                    let start = i;
                    i += 1;
                    while i < chars.len() && chars[i] != quote {
                        i += 1;
                    }
                    i = (i + 1).min(chars.len());
                    let word: String = chars[start..i].iter().collect();
                    tokens.push(Token::Word(word.to_lowercase()));
                },
                c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                        i += 1;
                    }
                    tokens.push(Token::Literal);
                },
                c if is_word_char(c) => {
                    let start = i;
                    while i < chars.len() && is_word_char(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    tokens.push(Token::Word(word.to_lowercase()));
                },
                ',' => {
                    i += 1;
                    tokens.push(Token::Comma);
                },
                '(' => {
                    i += 1;
                    tokens.push(Token::Open);
                },
                ')' => {
                    i += 1;
                    tokens.push(Token::Close);
                },
                _ => {
                    let start = i;
                    i += 1;
                    if let Some(n) = next {
                        if is_compound_operator(c, n) {
                            i += 1;
                        }
                    }
                    tokens.push(Token::Symbol(chars[start..i].iter().collect()));
                },
            }
        }
        tokens
    }

    fn render(tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut previous: Option<&Token> = None;
        for token in tokens {
            let separate = match (previous, token) {
                (None, _) => false,
                (_, Token::Comma | Token::Close) => false,
                (Some(Token::Open), _) => false,
                (Some(Token::Word(word)), Token::Open) => is_keyword(word),
                _ => true,
            };
            if separate {
                out.push(' ');
            }
            match token {
                Token::Word(word) => out.push_str(word),
                Token::Literal => out.push('?'),
                Token::Comma => out.push(','),
                Token::Open => out.push('('),
                Token::Close => out.push(')'),
                Token::Symbol(symbol) => out.push_str(symbol),
            }
            previous = Some(token);
        }
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '#' | '@')
}

/// Words after which `(` opens an expression list, not an argument list.
fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "all"
            | "and"
            | "any"
            | "as"
            | "between"
            | "exists"
            | "from"
            | "having"
            | "in"
            | "into"
            | "join"
            | "not"
            | "on"
            | "or"
            | "select"
            | "set"
            | "some"
            | "then"
            | "using"
            | "values"
            | "when"
            | "where"
            | "with"
    )
}

fn is_compound_operator(first: char, second: char) -> bool {
    matches!(
        (first, second),
        ('<', '=') | ('>', '=') | ('<', '>') | ('!', '=') | ('|', '|') | (':', ':') | (':', '=')
    )
}

impl SqlNormalizer for SimpleSqlNormalizer {
    fn normalize(&self, sql: &str) -> NormalizedSql {
        let tokens = Self::tokenize(sql);
        let statement_type = tokens
            .iter()
            .find_map(|token| match token {
                Token::Word(word) => Some(word.clone()),
                _ => None,
            })
            .unwrap_or_else(|| UNKNOWN_STATEMENT_TYPE.to_owned());
        NormalizedSql {
            statement_type,
            canonical: Self::render(&tokens),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Hex SHA-1 of `text`, with every non-ASCII character replaced by `?`.
pub fn digest_hex(text: &str) -> String {
    let ascii: Vec<u8> = text
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    hex::encode(Sha1::digest(&ascii))
}

/// Builds the identifier of a normalized query: `<type>_<hex sha1>`.
pub fn identifier(normalized: &NormalizedSql) -> String {
    format!("{}_{}", normalized.statement_type, digest_hex(&normalized.canonical))
}

/// Loader mapping raw query text to its identifier.
#[derive(Debug, Clone, Default)]
pub struct SqlIdLoader<N = SimpleSqlNormalizer> {
    normalizer: N,
}

impl<N: SqlNormalizer> SqlIdLoader<N> {
    pub fn new(normalizer: N) -> Self {
        Self { normalizer }
    }

    /// Computes the identifier for `sql` without any caching.
    pub fn sql_id(&self, sql: &str) -> String {
        identifier(&self.normalizer.normalize(sql))
    }
}

impl<N: SqlNormalizer> CacheLoader<String, String> for SqlIdLoader<N> {
    type Error = Infallible;

    fn load(&self, key: &String) -> Result<String, Infallible> {
        Ok(self.sql_id(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(sql: &str) -> String {
        SimpleSqlNormalizer.normalize(sql).canonical
    }

    #[test]
    fn operators_and_commas_are_spaced() {
        assert_eq!(
            canonical("select * from sample where id=?"),
            "select * from sample where id = ?"
        );
        assert_eq!(
            canonical("select id,name from sample order by id asc"),
            "select id, name from sample order by id asc"
        );
        assert_eq!(canonical("select a from t where a<>b"), "select a from t where a <> b");
    }

    #[test]
    fn literals_become_placeholders() {
        assert_eq!(
            canonical("UPDATE t SET name = 'O''Brien', n = 3.14 WHERE id IN (1, 2)"),
            "update t set name = ?, n = ? where id in (?, ?)"
        );
    }

    #[test]
    fn whitespace_and_comments_are_dropped() {
        assert_eq!(
            canonical("  select\t*\n  from /* all */ sample -- trailing\n"),
            "select * from sample"
        );
    }

    #[test]
    fn statement_type_is_first_keyword() {
        assert_eq!(SimpleSqlNormalizer.normalize("{call proc(?)}").statement_type, "call");
        assert_eq!(SimpleSqlNormalizer.normalize("  ").statement_type, UNKNOWN_STATEMENT_TYPE);
    }

    #[test]
    fn identifiers_are_stable() {
        let loader = SqlIdLoader::new(SimpleSqlNormalizer);
        assert_eq!(
            loader.sql_id("select * from sample"),
            "select_d90991bb8c08a7c17c78439f05c47413a4ceb7cb"
        );
        assert_eq!(
            loader.sql_id("select * from sample where id=?"),
            "select_0efff369e5047a4b9fe9379c3b929b01dbca35a4"
        );
        assert_eq!(
            loader.sql_id("SELECT id,name   FROM sample ORDER BY id ASC"),
            "select_0e6401e07280dd48ed998834c17ebe0db1d31e51"
        );
        assert_eq!(
            loader.sql_id("{call INSERT_SAMPLE(?,?)}"),
            "call_6f3e6f742a8d21e69aa9fa604e6623da814e8580"
        );
    }

    #[test]
    fn call_escape_braces_are_dropped() {
        assert_eq!(canonical("{call INSERT_SAMPLE(?,?)}"), "call insert_sample(?, ?)");
        assert_eq!(canonical("{ ? = call next_id ( ) }"), "? = call next_id()");
        assert_eq!(
            canonical("insert into t (a, b) values (1, 2)"),
            "insert into t(a, b) values (?, ?)"
        );
    }

    #[test]
    fn literal_values_do_not_change_identifier() {
        let loader = SqlIdLoader::<SimpleSqlNormalizer>::default();
        assert_eq!(
            loader.sql_id("select * from t where id = 1"),
            loader.sql_id("select * from t where id = 99")
        );
        assert_eq!(loader.load(&"select 1".to_string()), Ok(loader.sql_id("select 1")));
    }

    #[test]
    fn non_ascii_digests_as_question_marks() {
        assert_eq!(digest_hex("caf\u{e9}"), digest_hex("caf?"));
    }
}
