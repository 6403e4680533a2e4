//! Strict conversion of whitespace-delimited text tokens into values.
//!
//! Every text codec goes through [`parse`] and [`scan`]. Parsing is
//! locale-independent and all-or-nothing: the whole token must be consumed,
//! integers are range-checked against the 64-bit type before narrowing, and
//! `nan`/`inf` literals are rejected.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("can not parse {kind} from an empty string")]
    Empty { kind: &'static str },
    #[error("can not parse '{text}' as {kind}")]
    Invalid { text: String, kind: &'static str },
    #[error("{text} is out of range for {kind}")]
    OutOfRange { text: String, kind: &'static str },
    #[error("missing exponent in '{text}'")]
    MissingExponent { text: String },
    #[error("the value '{text}' is not a valid hybrid 36 number")]
    InvalidHybrid36 { text: String },
    #[error("tried to read {requested} values, but there are only {available}")]
    NotEnoughValues { requested: usize, available: usize },
    #[error("error while reading '{line}': {source}")]
    InLine {
        line: String,
        #[source]
        source: Box<ParseError>,
    },
}

/// Types that can be parsed from a single text token.
pub trait FromToken: Sized {
    fn from_token(token: &str) -> Result<Self, ParseError>;
}

/// Parses one already-isolated token into `T`.
///
/// # Errors
///
/// Fails if the token is empty, if any character is left over after the
/// value, or if the value does not fit in `T`.
pub fn parse<T: FromToken>(token: &str) -> Result<T, ParseError> {
    T::from_token(token)
}

fn invalid(text: &str, kind: &'static str) -> ParseError {
    ParseError::Invalid {
        text: text.to_string(),
        kind,
    }
}

fn out_of_range(text: &str, kind: &'static str) -> ParseError {
    ParseError::OutOfRange {
        text: text.trim().to_string(),
        kind,
    }
}

fn trim_ascii(input: &str) -> &str {
    input.trim_matches(|c: char| c.is_ascii_whitespace())
}

fn parse_i64(input: &str) -> Result<i64, ParseError> {
    const KIND: &str = "an integer";
    if input.is_empty() {
        return Err(ParseError::Empty { kind: KIND });
    }
    let trimmed = trim_ascii(input);
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, KIND));
    }

    let mut result: i64 = 0;
    for byte in digits.bytes() {
        let digit = i64::from(byte - b'0');
        result = result
            .checked_mul(10)
            .and_then(|value| {
                if negative {
                    value.checked_sub(digit)
                } else {
                    value.checked_add(digit)
                }
            })
            .ok_or_else(|| out_of_range(input, "64-bit integer"))?;
    }
    Ok(result)
}

fn parse_u64(input: &str) -> Result<u64, ParseError> {
    const KIND: &str = "a positive integer";
    if input.is_empty() {
        return Err(ParseError::Empty { kind: KIND });
    }
    let trimmed = trim_ascii(input);
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, KIND));
    }

    let mut result: u64 = 0;
    for byte in digits.bytes() {
        let digit = u64::from(byte - b'0');
        result = result
            .checked_mul(10)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| out_of_range(input, "64-bit unsigned integer"))?;
    }
    Ok(result)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Checks `(+|-)?digits?(.digits)?((e|E)(+|-)?digits)?` with at least one
/// mantissa digit, and an exponent no larger than 308.
fn check_double_grammar(text: &str, input: &str) -> Result<(), ParseError> {
    const KIND: &str = "a double";
    let bytes = text.as_bytes();
    let mut position = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        position += 1;
    }

    let integer_digits = count_digits(&bytes[position..]);
    position += integer_digits;
    let mut fraction_digits = 0;
    if bytes.get(position) == Some(&b'.') {
        position += 1;
        fraction_digits = count_digits(&bytes[position..]);
        position += fraction_digits;
    }
    if integer_digits + fraction_digits == 0 {
        return Err(invalid(input, KIND));
    }

    if matches!(bytes.get(position), Some(b'e' | b'E')) {
        position += 1;
        if matches!(bytes.get(position), Some(b'+' | b'-')) {
            position += 1;
        }
        let exponent_digits = count_digits(&bytes[position..]);
        if exponent_digits == 0 {
            return Err(ParseError::MissingExponent {
                text: input.to_string(),
            });
        }
        let exponent = text[position..position + exponent_digits]
            .parse::<u32>()
            .map_err(|_| out_of_range(input, "double"))?;
        if exponent > 308 {
            return Err(out_of_range(input, "double"));
        }
        position += exponent_digits;
    }

    if position != bytes.len() {
        return Err(invalid(input, KIND));
    }
    Ok(())
}

fn parse_f64(input: &str) -> Result<f64, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty { kind: "a double" });
    }
    let trimmed = trim_ascii(input);
    check_double_grammar(trimmed, input)?;
    let value: f64 = trimmed.parse().map_err(|_| invalid(input, "a double"))?;
    if !value.is_finite() {
        return Err(out_of_range(input, "double"));
    }
    Ok(value)
}

impl FromToken for i64 {
    fn from_token(token: &str) -> Result<Self, ParseError> {
        parse_i64(token)
    }
}

impl FromToken for u64 {
    fn from_token(token: &str) -> Result<Self, ParseError> {
        parse_u64(token)
    }
}

macro_rules! narrow_integer {
    ($wide:ident => $($ty:ty),+) => {
        $(
            impl FromToken for $ty {
                fn from_token(token: &str) -> Result<Self, ParseError> {
                    let value = $wide(token)?;
                    <$ty>::try_from(value).map_err(|_| out_of_range(token, stringify!($ty)))
                }
            }
        )+
    };
}

narrow_integer!(parse_i64 => i8, i16, i32, isize);
narrow_integer!(parse_u64 => u8, u16, u32, usize);

impl FromToken for f64 {
    fn from_token(token: &str) -> Result<Self, ParseError> {
        parse_f64(token)
    }
}

impl FromToken for f32 {
    fn from_token(token: &str) -> Result<Self, ParseError> {
        let value = parse_f64(token)?;
        if value.abs() > f64::from(f32::MAX) {
            return Err(out_of_range(token, "f32"));
        }
        Ok(value as f32)
    }
}

impl FromToken for String {
    fn from_token(token: &str) -> Result<Self, ParseError> {
        if token.is_empty() {
            return Err(ParseError::Empty { kind: "a string" });
        }
        Ok(token.to_string())
    }
}

/// Iterator over the whitespace-separated fields of a line.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    position: usize,
    count: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            count: 0,
        }
    }

    /// Number of bytes of the input consumed so far.
    pub fn read_count(&self) -> usize {
        self.position
    }

    /// Parses the next field, reporting `requested` when the line runs out.
    pub fn next_value<T: FromToken>(&mut self, requested: usize) -> Result<T, ParseError> {
        let available = self.count;
        let token = self.next().ok_or(ParseError::NotEnoughValues {
            requested,
            available,
        })?;
        T::from_token(token)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.input[self.position..];
        let start = rest.find(|c: char| !c.is_ascii_whitespace())?;
        let token = &rest[start..];
        let length = token
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(token.len());
        self.position += start + length;
        self.count += 1;
        Some(&token[..length])
    }
}

/// A fixed group of values read positionally from one line. Implemented for
/// tuples of up to eight [`FromToken`] types.
pub trait Scan: Sized {
    const ARITY: usize;
    fn scan_from(tokens: &mut Tokens<'_>) -> Result<Self, ParseError>;
}

macro_rules! impl_scan {
    ($arity:expr; $($name:ident),+) => {
        impl<$($name: FromToken),+> Scan for ($($name,)+) {
            const ARITY: usize = $arity;
            fn scan_from(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                Ok(($(tokens.next_value::<$name>(Self::ARITY)?,)+))
            }
        }
    };
}

impl_scan!(1; A);
impl_scan!(2; A, B);
impl_scan!(3; A, B, C);
impl_scan!(4; A, B, C, D);
impl_scan!(5; A, B, C, D, E);
impl_scan!(6; A, B, C, D, E, F);
impl_scan!(7; A, B, C, D, E, F, G);
impl_scan!(8; A, B, C, D, E, F, G, H);

/// Reads the leading fields of `line` into a tuple.
///
/// Returns the values and the number of bytes consumed, so callers can
/// check for trailing data on the line.
///
/// # Errors
///
/// [`ParseError::NotEnoughValues`] when the line has fewer fields than the
/// tuple, or [`ParseError::InLine`] wrapping the failure of a single field.
///
/// # Examples
///
/// ```
/// use chemtraj::core::utils::parse::scan;
///
/// let ((index, x, name), _) = scan::<(i64, f64, String)>("1 2.5 foo").unwrap();
/// assert_eq!((index, x, name.as_str()), (1, 2.5, "foo"));
/// ```
pub fn scan<T: Scan>(line: &str) -> Result<(T, usize), ParseError> {
    let mut tokens = Tokens::new(line);
    let values = T::scan_from(&mut tokens).map_err(|error| match error {
        ParseError::NotEnoughValues { .. } => error,
        other => ParseError::InLine {
            line: line.to_string(),
            source: Box::new(other),
        },
    })?;
    Ok((values, tokens.read_count()))
}

const UPPER_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Returns `(10^width, 36^(width - 1))`, or `None` when `width` is zero or
/// too large for 64-bit arithmetic.
fn hybrid36_bounds(width: usize) -> Option<(i64, i64)> {
    let width = u32::try_from(width).ok()?;
    let decimal = 10i64.checked_pow(width)?;
    let block = 36i64.checked_pow(width.checked_sub(1)?)?;
    block.checked_mul(36)?;
    Some((decimal, block))
}

fn encode_base36(digits: &[u8; 36], mut value: i64) -> String {
    let mut encoded = Vec::new();
    while value > 0 {
        encoded.push(digits[(value % 36) as usize]);
        value /= 36;
    }
    if encoded.is_empty() {
        encoded.push(digits[0]);
    }
    encoded.reverse();
    String::from_utf8_lossy(&encoded).into_owned()
}

fn decode_base36(text: &str) -> i64 {
    text.bytes().fold(0, |value, byte| {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'A'..=b'Z' => byte - b'A' + 10,
            _ => byte - b'a' + 10,
        };
        value * 36 + i64::from(digit)
    })
}

/// Encodes `value` in a fixed-width hybrid-36 field.
///
/// Values below `10^width` are written as plain decimal; larger values use
/// the upper-case then the lower-case base-36 ranges. A value that can not be
/// represented gives a field filled with `*`.
pub fn encode_hybrid36(width: usize, value: i64) -> String {
    let stars = || "*".repeat(width);
    let Some((decimal, block)) = hybrid36_bounds(width) else {
        return stars();
    };

    if value < 1 - decimal / 10 {
        return stars();
    }
    if value < decimal {
        return value.to_string();
    }

    let mut value = value - decimal;
    if value < 26 * block {
        return encode_base36(UPPER_DIGITS, value + 10 * block);
    }
    value -= 26 * block;
    if value < 26 * block {
        return encode_base36(LOWER_DIGITS, value + 10 * block);
    }
    stars()
}

/// Decodes a hybrid-36 field of the given width. Blank fields decode to 0.
pub fn decode_hybrid36(width: usize, text: &str) -> Result<i64, ParseError> {
    let error = || ParseError::InvalidHybrid36 {
        text: text.to_string(),
    };
    if text.len() > width {
        return Err(error());
    }
    let Some((decimal, block)) = hybrid36_bounds(width) else {
        return Err(error());
    };
    if text.trim().is_empty() {
        return Ok(0);
    }

    let first = text.as_bytes()[0];
    if first == b'-' || first == b' ' || first.is_ascii_digit() {
        return parse_i64(text);
    }
    if first.is_ascii_uppercase() {
        if !text.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()) {
            return Err(error());
        }
        return Ok(decode_base36(text) - 10 * block + decimal);
    }
    if first.is_ascii_lowercase() {
        if !text.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()) {
            return Err(error());
        }
        return Ok(decode_base36(text) + 16 * block + decimal);
    }
    Err(error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_accepts_signs_and_surrounding_whitespace() {
        assert_eq!(parse::<i64>("42"), Ok(42));
        assert_eq!(parse::<i64>("-42"), Ok(-42));
        assert_eq!(parse::<i64>("+42"), Ok(42));
        assert_eq!(parse::<i64>("  7\t"), Ok(7));
        assert_eq!(parse::<u64>("+18446744073709551615"), Ok(u64::MAX));
    }

    #[test]
    fn parse_integer_round_trips_through_decimal_text() {
        for value in [0, 1, -1, 10, 255, -32768, 1 << 40, i64::MIN, i64::MAX] {
            assert_eq!(parse::<i64>(&value.to_string()), Ok(value));
        }
        for value in [0u64, 9, 1 << 63, u64::MAX] {
            assert_eq!(parse::<u64>(&value.to_string()), Ok(value));
        }
    }

    #[test]
    fn parse_rejects_empty_trailing_and_overflowing_tokens() {
        assert_eq!(
            parse::<i64>(""),
            Err(ParseError::Empty { kind: "an integer" })
        );
        assert!(matches!(
            parse::<i64>("12a"),
            Err(ParseError::Invalid { .. })
        ));
        assert!(matches!(
            parse::<i64>("99999999999999999999"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse::<u64>("99999999999999999999"),
            Err(ParseError::OutOfRange { .. })
        ));
    }

    #[test]
    fn parse_rejects_tokens_without_digits() {
        for token in ["+", "-", ".", "   ", "e5", "--1"] {
            assert!(parse::<i64>(token).is_err(), "{token:?} parsed as i64");
            assert!(parse::<f64>(token).is_err(), "{token:?} parsed as f64");
        }
        assert!(parse::<u64>("-3").is_err());
    }

    #[test]
    fn parse_narrow_integers_checks_range() {
        assert_eq!(parse::<i8>("-128"), Ok(-128));
        assert!(matches!(
            parse::<i8>("128"),
            Err(ParseError::OutOfRange { kind: "i8", .. })
        ));
        assert_eq!(parse::<u32>("4294967295"), Ok(u32::MAX));
        assert!(parse::<u32>("4294967296").is_err());
        assert_eq!(parse::<usize>("12"), Ok(12));
    }

    #[test]
    fn parse_double_accepts_the_full_grammar() {
        assert_eq!(parse::<f64>("2.5"), Ok(2.5));
        assert_eq!(parse::<f64>("-.5"), Ok(-0.5));
        assert_eq!(parse::<f64>("5."), Ok(5.0));
        assert_eq!(parse::<f64>("+1e3"), Ok(1000.0));
        assert_eq!(parse::<f64>("1.5E-2"), Ok(0.015));
        assert_eq!(parse::<f64>(" 12 "), Ok(12.0));
    }

    #[test]
    fn parse_double_rejects_special_values_and_bad_exponents() {
        for token in ["nan", "NaN", "inf", "-infinity"] {
            assert!(matches!(
                parse::<f64>(token),
                Err(ParseError::Invalid { .. })
            ));
        }
        assert!(matches!(
            parse::<f64>("1e"),
            Err(ParseError::MissingExponent { .. })
        ));
        assert!(matches!(
            parse::<f64>("1e+"),
            Err(ParseError::MissingExponent { .. })
        ));
        assert!(matches!(
            parse::<f64>("1e309"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse::<f64>("9e308"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse::<f64>("1.0x"),
            Err(ParseError::Invalid { .. })
        ));
    }

    #[test]
    fn parse_single_precision_checks_range() {
        assert_eq!(parse::<f32>("1.5"), Ok(1.5));
        assert!(parse::<f32>("1e40").is_err());
    }

    #[test]
    fn parse_string_rejects_only_empty_tokens() {
        assert_eq!(parse::<String>("foo"), Ok("foo".to_string()));
        assert!(parse::<String>("").is_err());
    }

    #[test]
    fn tokens_skip_runs_of_whitespace() {
        let mut tokens = Tokens::new("  a \t bb   c ");
        assert_eq!(tokens.next(), Some("a"));
        assert_eq!(tokens.read_count(), 3);
        assert_eq!(tokens.next(), Some("bb"));
        assert_eq!(tokens.next(), Some("c"));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn scan_reads_mixed_fields_in_order() {
        let ((a, b, c), read) = scan::<(i64, f64, String)>("1 2.5 foo").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2.5);
        assert_eq!(c, "foo");
        assert_eq!(read, 9);
    }

    #[test]
    fn scan_reports_consumed_length_for_trailing_data() {
        let line = "3 4 trailing";
        let ((a, b), read) = scan::<(u32, u32)>(line).unwrap();
        assert_eq!((a, b), (3, 4));
        assert_eq!(line[read..].trim(), "trailing");
    }

    #[test]
    fn scan_fails_naming_requested_and_available_counts() {
        let error = scan::<(i64, f64, String)>("1 2").unwrap_err();
        assert_eq!(
            error,
            ParseError::NotEnoughValues {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(
            error.to_string(),
            "tried to read 3 values, but there are only 2"
        );
    }

    #[test]
    fn scan_wraps_field_errors_with_the_line() {
        let error = scan::<(i64, i64)>("1 x").unwrap_err();
        match &error {
            ParseError::InLine { line, source } => {
                assert_eq!(line, "1 x");
                assert!(matches!(**source, ParseError::Invalid { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(error.to_string().starts_with("error while reading '1 x'"));
    }

    #[test]
    fn hybrid36_encodes_each_range() {
        assert_eq!(encode_hybrid36(5, 0), "0");
        assert_eq!(encode_hybrid36(5, 99999), "99999");
        assert_eq!(encode_hybrid36(5, -9999), "-9999");
        assert_eq!(encode_hybrid36(5, -10000), "*****");
        assert_eq!(encode_hybrid36(5, 100000), "A0000");
        assert_eq!(encode_hybrid36(5, 43770015), "ZZZZZ");
        assert_eq!(encode_hybrid36(5, 43770016), "a0000");
        assert_eq!(encode_hybrid36(5, 87440031), "zzzzz");
        assert_eq!(encode_hybrid36(5, 87440032), "*****");
        assert_eq!(encode_hybrid36(4, 10000), "A000");
    }

    #[test]
    fn hybrid36_decodes_what_it_encodes() {
        for value in [0, 1, -999, 9999, 10000, 10001, 1_223_055, 2_436_111] {
            let encoded = encode_hybrid36(4, value);
            assert_eq!(decode_hybrid36(4, &encoded), Ok(value), "{encoded}");
        }
    }

    #[test]
    fn hybrid36_decodes_blank_fields_as_zero() {
        assert_eq!(decode_hybrid36(4, "    "), Ok(0));
        assert_eq!(decode_hybrid36(4, ""), Ok(0));
        assert_eq!(decode_hybrid36(4, "  12"), Ok(12));
    }

    #[test]
    fn hybrid36_rejects_mixed_case_and_overlong_fields() {
        assert!(decode_hybrid36(4, "A0a0").is_err());
        assert!(decode_hybrid36(4, "a0A0").is_err());
        assert!(decode_hybrid36(4, "!000").is_err());
        assert!(decode_hybrid36(4, "100000").is_err());
    }
}
