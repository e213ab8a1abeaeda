use europa_value::Value;

use crate::error::{ReadError, ReadResult};

/// Parses a number token's text (sign, digits, optional radix point, no
/// surrounding `#x`/`#e` prefixes - those are stripped by the caller and
/// passed in as `radix`/`exact`). Supports a fractional part in any radix,
/// not just decimal, which is what makes `#b#i1001.1` parse: integer part
/// `1001` in base 2 is 9, fractional part `.1` in base 2 is 0.5, exactness
/// forced to inexact by `#i` gives the real `9.5`.
pub fn parse_number(text: &str, radix: u32, exact: Option<bool>) -> ReadResult<Value> {
    let mut chars = text.chars().peekable();
    let mut sign = 1i64;
    match chars.peek() {
        Some('+') => {
            chars.next();
        }
        Some('-') => {
            sign = -1;
            chars.next();
        }
        _ => {}
    }

    let mut int_part: i64 = 0;
    let mut any_digit = false;
    while let Some(&c) = chars.peek() {
        match c.to_digit(radix) {
            Some(d) => {
                int_part = int_part * radix as i64 + d as i64;
                any_digit = true;
                chars.next();
            }
            None => break,
        }
    }

    let mut frac_part = 0.0f64;
    let mut has_frac = false;
    if chars.peek() == Some(&'.') {
        has_frac = true;
        chars.next();
        let mut scale = 1.0f64 / radix as f64;
        while let Some(&c) = chars.peek() {
            match c.to_digit(radix) {
                Some(d) => {
                    frac_part += d as f64 * scale;
                    scale /= radix as f64;
                    any_digit = true;
                    chars.next();
                }
                None => break,
            }
        }
    }

    if !any_digit || chars.peek().is_some() {
        return Err(ReadError::MalformedNumber(text.to_string()));
    }

    let exact = exact.unwrap_or(!has_frac);
    if exact && !has_frac {
        Ok(Value::Fixnum(sign * int_part))
    } else {
        let magnitude = int_part as f64 + frac_part;
        Ok(Value::Real(sign as f64 * magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal_integer_is_exact() {
        match parse_number("42", 10, None).unwrap() {
            Value::Fixnum(42) => {}
            _ => panic!("expected exact fixnum"),
        }
    }

    #[test]
    fn negative_binary_integer() {
        match parse_number("-1001", 2, None).unwrap() {
            Value::Fixnum(-9) => {}
            other => panic!("unexpected {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn binary_fraction_forced_inexact() {
        match parse_number("1001.1", 2, Some(false)).unwrap() {
            Value::Real(r) => assert!((r - 9.5).abs() < 1e-12),
            _ => panic!("expected real"),
        }
    }

    #[test]
    fn decimal_point_implies_inexact_without_explicit_flag() {
        match parse_number("3.5", 10, None).unwrap() {
            Value::Real(r) => assert!((r - 3.5).abs() < 1e-12),
            _ => panic!("expected real"),
        }
    }

    #[test]
    fn no_digits_is_malformed() {
        assert!(parse_number("", 10, None).is_err());
    }
}
