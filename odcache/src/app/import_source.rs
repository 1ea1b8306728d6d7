use std::path::PathBuf;
use std::str::FromStr;

/// a source file argument of the form `path[:type_index[:time_index]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSource {
    pub path: PathBuf,
    pub type_index: usize,
    pub time_index: usize,
}

impl FromStr for ImportSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = s;
        let mut indices = vec![];
        while indices.len() < 2 {
            match path.rsplit_once(':') {
                Some((head, tail)) => match tail.parse::<usize>() {
                    Ok(index) => {
                        indices.push(index);
                        path = head;
                    }
                    Err(_) => break,
                },
                None => break,
            }
        }
        if path.is_empty() {
            return Err(format!("source '{s}' is missing a file path"));
        }
        indices.reverse();
        Ok(ImportSource {
            path: PathBuf::from(path),
            type_index: indices.first().copied().unwrap_or(0),
            time_index: indices.get(1).copied().unwrap_or(0),
        })
    }
}
