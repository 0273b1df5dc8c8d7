//! SQL identifier validation.
//!
//! Table, column and ORDER BY names are interpolated into SQL text, so every
//! one of them goes through [`Ident::parse`] first.
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow anything except NUL; `"` is escaped as `""`
//! - Parts are joined with `.` (`schema.table.column`)

use crate::error::{DbError, DbResult};
use std::fmt;

/// One dot-separated part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated SQL identifier such as `users`, `public.users` or `"Order"."Id"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> DbResult<Self> {
        if s.is_empty() {
            return Err(DbError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(DbError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') if chars.peek().is_none() => {
                        return Err(DbError::validation(format!(
                            "Trailing '.' in identifier '{s}'"
                        )));
                    }
                    Some('.') => {}
                    Some(c) => {
                        return Err(DbError::validation(format!(
                            "Expected '.' between identifier parts in '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(DbError::validation(format!(
                                "Unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(DbError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let allowed = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !allowed {
                    return Err(DbError::validation(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(DbError::validation(format!(
                    "Empty identifier segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Parse a SELECT projection entry.
    ///
    /// Accepts everything [`Ident::parse`] does, plus `*` and `qualifier.*`.
    pub fn parse_projection(s: &str) -> DbResult<String> {
        if s == "*" {
            return Ok(s.to_string());
        }
        if let Some(qualifier) = s.strip_suffix(".*") {
            return Ok(format!("{}.*", Self::parse(qualifier)?));
        }
        Ok(Self::parse(s)?.to_string())
    }

    /// The identifier parts.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match part {
                IdentPart::Unquoted(s) => f.write_str(s)?,
                IdentPart::Quoted(s) => write!(f, "\"{}\"", s.replace('"', "\"\""))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().to_sql(), "users");
        assert_eq!(Ident::parse("public.users").unwrap().to_sql(), "public.users");
        assert_eq!(Ident::parse("public.users").unwrap().parts().len(), 2);
    }

    #[test]
    fn quoted_parts_round_trip() {
        assert_eq!(
            Ident::parse(r#"public."UserTable".id"#).unwrap().to_sql(),
            r#"public."UserTable".id"#
        );
        assert_eq!(
            Ident::parse(r#""has""quote""#).unwrap().to_sql(),
            r#""has""quote""#
        );
    }

    #[test]
    fn dollar_after_first_char() {
        assert_eq!(Ident::parse("my_var$1").unwrap().to_sql(), "my_var$1");
    }

    #[test]
    fn rejects_injection_attempts() {
        for bad in [
            "",
            "1table",
            "my table",
            "users; DROP TABLE users",
            "name = 1 OR 1",
            "schema..table",
            "schema.",
            r#""unclosed"#,
            r#""""#,
        ] {
            assert!(Ident::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn projections() {
        assert_eq!(Ident::parse_projection("*").unwrap(), "*");
        assert_eq!(Ident::parse_projection("u.*").unwrap(), "u.*");
        assert_eq!(Ident::parse_projection("email").unwrap(), "email");
        assert!(Ident::parse_projection("count(*)").is_err());
        assert!(Ident::parse_projection("bad name.*").is_err());
    }
}
