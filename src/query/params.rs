use duckdb::types::Value;

use crate::error::{FacadeError, Result};

/// Parameters bound to a statement before execution.
///
/// Named keys match `$name` placeholders; the leading `$` is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryParams {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl QueryParams {
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        QueryParams::Positional(values.into_iter().collect())
    }

    pub fn named<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        QueryParams::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            QueryParams::None => 0,
            QueryParams::Positional(values) => values.len(),
            QueryParams::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the parameters into the statement's positional order.
    ///
    /// `expected` is the prepared statement's parameter count. DuckDB numbers
    /// named placeholders by first appearance, so names are read from `sql`.
    pub(crate) fn bind_order(&self, sql: &str, expected: usize) -> Result<Vec<Value>> {
        match self {
            QueryParams::None => Ok(Vec::new()),
            QueryParams::Positional(values) => Ok(values.clone()),
            QueryParams::Named(pairs) => {
                let names = named_placeholders(sql);
                if names.len() != expected {
                    return Err(FacadeError::Execution(format!(
                        "statement takes {expected} parameters but names {} of them",
                        names.len()
                    )));
                }

                let mut ordered = vec![Value::Null; expected];
                for (key, value) in pairs {
                    let key = key.trim_start_matches('$');
                    let slot = names.iter().position(|name| name == key).ok_or_else(|| {
                        FacadeError::Execution(format!(
                            "statement has no parameter named ${key}"
                        ))
                    })?;
                    ordered[slot] = value.clone();
                }
                Ok(ordered)
            }
        }
    }
}

/// Distinct `$name` placeholders in order of first appearance.
///
/// Quoted strings, quoted identifiers, comments, dollar-quoted bodies and
/// numbered `$1` placeholders are skipped.
fn named_placeholders(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            quote @ ('\'' | '"') => i = skip_quoted(&chars, i + 1, quote),
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            '$' => {
                let tag_start = i + 1;
                let mut end = tag_start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let tag: String = chars[tag_start..end].iter().collect();
                if chars.get(end) == Some(&'$') && !tag.starts_with(|c: char| c.is_ascii_digit()) {
                    i = skip_dollar_quoted(&chars, end + 1, &tag);
                    continue;
                }
                if !tag.is_empty()
                    && !tag.starts_with(|c: char| c.is_ascii_digit())
                    && !names.contains(&tag)
                {
                    names.push(tag);
                }
                i = end.max(i + 1);
            }
            _ => i += 1,
        }
    }
    names
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Index just past the closing `quote`; a doubled quote is an escape.
fn skip_quoted(chars: &[char], mut i: usize, quote: char) -> usize {
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Index just past the closing `$tag$`.
fn skip_dollar_quoted(chars: &[char], mut i: usize, tag: &str) -> usize {
    let closing: Vec<char> = format!("${tag}$").chars().collect();
    while i < chars.len() {
        if chars[i..].starts_with(&closing) {
            return i + closing.len();
        }
        i += 1;
    }
    i
}

impl From<Vec<Value>> for QueryParams {
    fn from(values: Vec<Value>) -> Self {
        QueryParams::Positional(values)
    }
}

impl From<Vec<(String, Value)>> for QueryParams {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        QueryParams::Named(pairs)
    }
}

impl From<()> for QueryParams {
    fn from(_: ()) -> Self {
        QueryParams::None
    }
}
