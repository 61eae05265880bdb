//! Placeholder translation between backends.
//!
//! All SQL in this codebase is written with SQLite's `?N` ordinal
//! placeholders. The PostgreSQL backend rewrites them to `$N` before
//! execution. Translation is literal-aware: `?` inside single-quoted
//! strings or double-quoted identifiers is left untouched.

/// Rewrite `?N` ordinal placeholders to PostgreSQL's `$N` form.
pub fn to_dollar_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '?' if !in_single && !in_double => {
                if chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                    out.push('$');
                    while chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                        out.push(chars.next().unwrap());
                    }
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_ordinals() {
        assert_eq!(
            to_dollar_placeholders("SELECT * FROM users WHERE id = ?1 AND role = ?2"),
            "SELECT * FROM users WHERE id = $1 AND role = $2"
        );
    }

    #[test]
    fn translates_multi_digit_ordinals() {
        assert_eq!(
            to_dollar_placeholders("VALUES (?9, ?10, ?11)"),
            "VALUES ($9, $10, $11)"
        );
    }

    #[test]
    fn leaves_string_literals_alone() {
        assert_eq!(
            to_dollar_placeholders("SELECT '?1' AS q, name FROM t WHERE id = ?1"),
            "SELECT '?1' AS q, name FROM t WHERE id = $1"
        );
    }

    #[test]
    fn handles_escaped_quotes_in_literals() {
        // '' is an escaped quote inside a literal; the literal does not end there.
        assert_eq!(
            to_dollar_placeholders("SELECT 'it''s ?1' FROM t WHERE id = ?2"),
            "SELECT 'it''s ?1' FROM t WHERE id = $2"
        );
    }

    #[test]
    fn leaves_quoted_identifiers_alone() {
        assert_eq!(
            to_dollar_placeholders("SELECT \"odd?1name\" FROM t WHERE id = ?1"),
            "SELECT \"odd?1name\" FROM t WHERE id = $1"
        );
    }

    #[test]
    fn bare_question_mark_is_untouched() {
        assert_eq!(to_dollar_placeholders("SELECT 1 WHERE 'a' = ?"), "SELECT 1 WHERE 'a' = ?");
    }
}
