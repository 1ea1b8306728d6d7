use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FastParseError {
    #[error("span [{start}, {end}) is outside of a line of length {length}")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("expected a number in span [{start}, {end}) but the field is empty")]
    EmptyField { start: usize, end: usize },
    #[error("'{0}' is not a valid integer")]
    InvalidInteger(String),
    #[error("'{0}' is not a valid number")]
    InvalidFloat(String),
}
