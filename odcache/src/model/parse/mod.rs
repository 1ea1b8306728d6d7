//! span-based numeric parsing used by the cache builders. values are parsed directly
//! out of the line buffer without splitting the line into owned strings.
mod delimited_spans;
pub mod fast_parse;
mod fast_parse_error;

pub use delimited_spans::DelimitedSpans;
pub use fast_parse_error::FastParseError;
