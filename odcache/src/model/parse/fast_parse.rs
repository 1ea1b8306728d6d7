use super::FastParseError;

/// parses an integer out of the delimited field `line[start..end]`. surrounding
/// whitespace is ignored.
pub fn parse_int(line: &str, start: usize, end: usize) -> Result<i64, FastParseError> {
    let token = delimited_token(line, start, end)?;
    token
        .parse::<i64>()
        .map_err(|_| FastParseError::InvalidInteger(token.to_string()))
}

/// parses a float out of the delimited field `line[start..end]`. accepts an optional
/// sign, a fractional part and a scientific notation exponent.
pub fn parse_float(line: &str, start: usize, end: usize) -> Result<f32, FastParseError> {
    let token = delimited_token(line, start, end)?;
    token
        .parse::<f32>()
        .map_err(|_| FastParseError::InvalidFloat(token.to_string()))
}

/// parses a right-aligned integer from a fixed-width field of `length` characters
/// starting at `offset`. anything left of the trailing run of digits (padding or
/// a neighboring column) is not part of the value.
pub fn parse_fixed_int(line: &str, offset: usize, length: usize) -> Result<i64, FastParseError> {
    let token = fixed_token(line, offset, length, is_integer_char)?;
    token
        .parse::<i64>()
        .map_err(|_| FastParseError::InvalidInteger(token.to_string()))
}

/// parses a right-aligned float from a fixed-width field of `length` characters
/// starting at `offset`.
pub fn parse_fixed_float(line: &str, offset: usize, length: usize) -> Result<f32, FastParseError> {
    let token = fixed_token(line, offset, length, is_float_char)?;
    token
        .parse::<f32>()
        .map_err(|_| FastParseError::InvalidFloat(token.to_string()))
}

fn span(line: &str, start: usize, end: usize) -> Result<&str, FastParseError> {
    line.get(start..end).ok_or(FastParseError::SpanOutOfBounds {
        start,
        end,
        length: line.len(),
    })
}

fn delimited_token(line: &str, start: usize, end: usize) -> Result<&str, FastParseError> {
    let token = span(line, start, end)?.trim();
    if token.is_empty() {
        Err(FastParseError::EmptyField { start, end })
    } else {
        Ok(token)
    }
}

fn fixed_token(
    line: &str,
    offset: usize,
    length: usize,
    accept: fn(char) -> bool,
) -> Result<&str, FastParseError> {
    let end = offset + length;
    let field = span(line, offset, end)?.trim_end();
    let token_start = field
        .char_indices()
        .rev()
        .find(|(_, c)| !accept(*c))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let token = &field[token_start..];
    if token.is_empty() {
        Err(FastParseError::EmptyField { start: offset, end })
    } else {
        Ok(token)
    }
}

fn is_integer_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '+'
}

fn is_float_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_in_delimited_span() {
        let line = "101,2002,3.5";
        assert_eq!(parse_int(line, 0, 3), Ok(101));
        assert_eq!(parse_int(line, 4, 8), Ok(2002));
    }

    #[test]
    fn test_parse_float_handles_sign_and_exponent() {
        let line = "-1.25, 2.5e-1,3E2";
        assert_eq!(parse_float(line, 0, 5), Ok(-1.25));
        assert_eq!(parse_float(line, 6, 13), Ok(0.25));
        assert_eq!(parse_float(line, 14, 17), Ok(300.0));
    }

    #[test]
    fn test_empty_delimited_field_fails() {
        let result = parse_float("1,,2", 2, 2);
        assert_eq!(result, Err(FastParseError::EmptyField { start: 2, end: 2 }));
    }

    #[test]
    fn test_malformed_number_fails() {
        let result = parse_float("1,abc", 2, 5);
        assert_eq!(result, Err(FastParseError::InvalidFloat(String::from("abc"))));
    }

    #[test]
    fn test_fixed_int_is_right_aligned() {
        // 7 character origin column followed by a destination block
        let line = "     12    101:  0.5";
        assert_eq!(parse_fixed_int(line, 0, 7), Ok(12));
        assert_eq!(parse_fixed_int(line, 7, 7), Ok(101));
    }

    #[test]
    fn test_fixed_float_ignores_left_padding() {
        let line = "     12    101:  0.5";
        assert_eq!(parse_fixed_float(line, 15, 5), Ok(0.5));
    }

    #[test]
    fn test_fixed_span_past_line_end_fails() {
        let result = parse_fixed_int("  12", 0, 7);
        assert_eq!(
            result,
            Err(FastParseError::SpanOutOfBounds {
                start: 0,
                end: 7,
                length: 4
            })
        );
    }

    #[test]
    fn test_blank_fixed_field_fails() {
        let result = parse_fixed_int("       ", 0, 7);
        assert_eq!(result, Err(FastParseError::EmptyField { start: 0, end: 7 }));
    }
}
