//! Guards for names and SQL fragments that arrive from the command line.
//!
//! Identifiers end up double-quoted in DDL; fragments (types, defaults,
//! backfill values) are spliced verbatim, so both are checked before use.

use crate::error::DbInfraError;

/// Postgres truncates identifiers beyond this length.
pub const MAX_IDENT_LEN: usize = 63;

/// Accept `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_IDENT_LEN`] bytes.
pub fn validate_ident(name: &str) -> Result<&str, DbInfraError> {
    let invalid = |reason| DbInfraError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or underscore"))
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("only ASCII letters, digits and underscores are allowed"));
    }
    if name.len() > MAX_IDENT_LEN {
        return Err(invalid("longer than 63 characters"));
    }
    Ok(name)
}

/// Validate then double-quote an identifier.
pub fn quote_ident(name: &str) -> Result<String, DbInfraError> {
    Ok(format!("\"{}\"", validate_ident(name)?))
}

/// A column type such as `JSONB`, `VARCHAR(255)` or `NUMERIC(10, 2)`.
pub fn validate_sql_type(sql_type: &str) -> Result<&str, DbInfraError> {
    let ok = !sql_type.trim().is_empty()
        && sql_type.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ',' | '[' | ']')
        });
    if ok {
        Ok(sql_type)
    } else {
        Err(DbInfraError::rejected(format!(
            "'{sql_type}' is not a plain column type"
        )))
    }
}

/// A single SQL expression: no statement separators, no comments.
pub fn validate_fragment(fragment: &str) -> Result<&str, DbInfraError> {
    if fragment.trim().is_empty() {
        return Err(DbInfraError::rejected("empty SQL expression"));
    }
    for banned in [";", "--", "/*"] {
        if contains_outside_quotes(fragment, banned) {
            return Err(DbInfraError::rejected(format!(
                "expression must not contain '{banned}'"
            )));
        }
    }
    Ok(fragment)
}

fn contains_outside_quotes(sql: &str, needle: &str) -> bool {
    let mut in_quote = false;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            in_quote = !in_quote;
        } else if !in_quote && bytes[i..].starts_with(needle.as_bytes()) {
            return true;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["salons", "working_hours", "_tmp", "Salon2"] {
            assert!(validate_ident(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_injection_attempts() {
        for name in ["", "1abc", "salons; DROP TABLE admins", "a-b", "\"x\"", "é"] {
            assert!(validate_ident(name).is_err(), "{name:?}");
        }
        assert!(validate_ident(&"a".repeat(64)).is_err());
    }

    #[test]
    fn quotes_identifier() {
        assert_eq!(quote_ident("salons").unwrap(), "\"salons\"");
    }

    #[test]
    fn sql_types() {
        assert!(validate_sql_type("JSONB").is_ok());
        assert!(validate_sql_type("VARCHAR(255)").is_ok());
        assert!(validate_sql_type("NUMERIC(10, 2)").is_ok());
        assert!(validate_sql_type("TEXT; DROP TABLE x").is_err());
        assert!(validate_sql_type("TEXT DEFAULT 'x'").is_err());
    }

    #[test]
    fn fragments_allow_separators_inside_string_literals() {
        assert!(validate_fragment("'{\"a\":\"b;c\"}'").is_ok());
        assert!(validate_fragment("'x'; DELETE FROM admins").is_err());
        assert!(validate_fragment("1 -- trailing").is_err());
        assert!(validate_fragment("  ").is_err());
    }
}
