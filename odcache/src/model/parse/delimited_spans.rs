/// iterates over the `[start, end)` byte spans of the fields of a delimited line.
/// a trailing delimiter produces a final empty span.
pub struct DelimitedSpans<'a> {
    line: &'a str,
    delimiter: u8,
    position: usize,
    done: bool,
}

impl<'a> DelimitedSpans<'a> {
    pub fn new(line: &'a str, delimiter: u8) -> DelimitedSpans<'a> {
        DelimitedSpans {
            line,
            delimiter,
            position: 0,
            done: false,
        }
    }

    pub fn comma(line: &'a str) -> DelimitedSpans<'a> {
        DelimitedSpans::new(line, b',')
    }
}

impl Iterator for DelimitedSpans<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let start = self.position;
        let remaining = &self.line.as_bytes()[start..];
        match remaining.iter().position(|b| *b == self.delimiter) {
            Some(offset) => {
                let end = start + offset;
                self.position = end + 1;
                Some((start, end))
            }
            None => {
                self.done = true;
                Some((start, self.line.len()))
            }
        }
    }
}
