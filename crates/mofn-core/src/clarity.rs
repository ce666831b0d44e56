//! # Clarity Value Codec
//!
//! Callers of the legacy contract interface exchange values as Clarity
//! text: `u1000` for unsigned integers, bare principals, `true`/`false`,
//! parenthesised lists, and `(ok …)` / `(err …)` response wrappers. This
//! module renders [`Value`]s in that shape and parses the literals used as
//! transaction arguments.
//!
//! Only the subset the escrow interface needs is supported.

use crate::error::MofnError;
use crate::identity::Principal;

/// A Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned 128-bit integer, rendered `u<n>`.
    UInt(u128),
    /// Signed 128-bit integer, rendered `<n>`.
    Int(i128),
    /// Boolean, rendered `true` / `false`.
    Bool(bool),
    /// Standard principal, rendered bare.
    Principal(Principal),
    /// List, rendered `(a b c)`; empty is `()`.
    List(Vec<Value>),
    /// Success response, rendered `(ok <v>)`.
    Ok(Box<Value>),
    /// Error response, rendered `(err <v>)`.
    Err(Box<Value>),
}

impl Value {
    /// Wrap in `(ok …)`.
    pub fn ok(inner: Value) -> Self {
        Self::Ok(Box::new(inner))
    }

    /// `(err <code>)` with a signed integer code, the shape contract
    /// read-only functions use for failures.
    pub fn err_code(code: u32) -> Self {
        Self::Err(Box::new(Self::Int(i128::from(code))))
    }

    /// A list of principals.
    pub fn principals<'a>(items: impl IntoIterator<Item = &'a Principal>) -> Self {
        Self::List(items.into_iter().cloned().map(Self::Principal).collect())
    }

    /// Whether this is an `(ok …)` response.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Whether this is an `(err …)` response.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UInt(n) => write!(f, "u{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Principal(p) => write!(f, "{p}"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Ok(inner) => write!(f, "(ok {inner})"),
            Self::Err(inner) => write!(f, "(err {inner})"),
        }
    }
}

/// Parse an unsigned integer literal.
///
/// Accepts the Clarity form `u1000` and, for convenience, bare digits
/// `1000`.
pub fn parse_uint(s: &str) -> Result<u128, MofnError> {
    let s = s.trim();
    let digits = s.strip_prefix('u').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MofnError::InvalidLiteral {
            value: s.to_string(),
            expected: "unsigned integer such as u1000",
        });
    }
    digits.parse::<u128>().map_err(|_| MofnError::InvalidLiteral {
        value: s.to_string(),
        expected: "unsigned integer within 128 bits",
    })
}

/// Parse a principal literal. A leading `'` (Clarity quote syntax) is
/// tolerated.
pub fn parse_principal(s: &str) -> Result<Principal, MofnError> {
    let s = s.trim();
    Principal::new(s.strip_prefix('\'').unwrap_or(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Principal {
        Principal::new(s).unwrap()
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(Value::UInt(0).to_string(), "u0");
        assert_eq!(Value::UInt(2000).to_string(), "u2000");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }

    #[test]
    fn renders_responses() {
        assert_eq!(Value::ok(Value::UInt(2)).to_string(), "(ok u2)");
        assert_eq!(Value::err_code(4).to_string(), "(err 4)");
        assert!(Value::err_code(4).is_err());
        assert!(Value::ok(Value::Bool(true)).is_ok());
    }

    #[test]
    fn renders_lists() {
        assert_eq!(Value::ok(Value::List(vec![])).to_string(), "(ok ())");
        let a = p("SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR");
        let b = p("ST1BG7MHW2R524WMF7X8PGG3V45ZN040EB9EW0GQJ");
        let list = Value::principals([&a, &b]);
        assert_eq!(
            Value::ok(list).to_string(),
            "(ok (SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR ST1BG7MHW2R524WMF7X8PGG3V45ZN040EB9EW0GQJ))"
        );
    }

    #[test]
    fn parses_uint_literals() {
        assert_eq!(parse_uint("u1000").unwrap(), 1000);
        assert_eq!(parse_uint("2").unwrap(), 2);
        assert_eq!(parse_uint(" u0 ").unwrap(), 0);
        assert_eq!(
            parse_uint("u340282366920938463463374607431768211455").unwrap(),
            u128::MAX
        );
    }

    #[test]
    fn rejects_bad_uint_literals() {
        for bad in ["", "u", "u-1", "-1", "ux10", "u1.5", "u340282366920938463463374607431768211456"] {
            assert!(parse_uint(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parses_quoted_principal() {
        let quoted = parse_principal("'SP1EHFWKXQEQD7TW9WWRGSGJFJ52XNGN6MTJ7X462").unwrap();
        assert_eq!(quoted.as_str(), "SP1EHFWKXQEQD7TW9WWRGSGJFJ52XNGN6MTJ7X462");
        assert!(parse_principal("u1").is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every u128 rendered as a literal parses back to itself.
            #[test]
            fn uint_literal_is_reversible(n in any::<u128>()) {
                let rendered = Value::UInt(n).to_string();
                prop_assert_eq!(parse_uint(&rendered).unwrap(), n);
            }
        }
    }
}
