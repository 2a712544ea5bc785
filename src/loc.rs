use std::sync::Arc;

type Pos = usize;

/// A [`SourceInfo`] remembers where HDL text came from.
/// It holds the filename (if read from a file) and the offsets of each line,
/// so that byte positions from the parser can be turned into a [`LineCol`].
#[derive(Clone, Debug)]
pub struct SourceInfo {
    source: Source,
    linelens: LineLens,
}

impl SourceInfo {
    pub fn unknown() -> SourceInfo {
        SourceInfo {
            source: Source::Unknown,
            linelens: LineLens::from(""),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn from_file(filepath: &std::path::Path, contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::File(Arc::new(filepath.to_owned())),
            linelens: LineLens::from(contents),
        }
    }

    pub fn from_string(contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::String,
            linelens: LineLens::from(contents),
        }
    }

    pub fn linecol_from(&self, pos: usize) -> LineCol {
        self.linelens.linecol(pos)
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    File(Arc<std::path::PathBuf>),
    String,
    Unknown,
}

/// A [`LineCol`] is a line and a column, both counted from 1 when displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineCol(usize, usize);

impl LineCol {
    /// The line number, counted from 1.
    pub fn line(&self) -> usize {
        self.0 + 1
    }

    /// The column, counted from 1 in bytes.
    pub fn col(&self) -> usize {
        self.1 + 1
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

/// A [`Loc`] is the span of a chip or part in the text it was parsed from.
#[derive(Clone)]
pub struct Loc {
    start: Pos,
    end: Pos,
    source_info: SourceInfo,
}

impl Loc {
    /// Chips built in code rather than parsed have no location.
    pub fn unknown() -> Loc {
        Loc {
            start: 0,
            end: 0,
            source_info: SourceInfo::unknown(),
        }
    }

    pub fn from(source_info: &SourceInfo, start: usize, end: usize) -> Loc {
        Loc {
            start,
            end,
            source_info: source_info.clone(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.source_info.source, Source::Unknown)
    }

    pub fn start(&self) -> LineCol {
        self.source_info.linelens.linecol(self.start)
    }

    pub fn end(&self) -> LineCol {
        self.source_info.linelens.linecol(self.end)
    }
}

impl std::fmt::Debug for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.source_info.source {
            Source::File(path) => write!(f, "[{}-{}:{:?}]", self.start(), self.end(), path),
            Source::String => write!(f, "[{}-{}]", self.start(), self.end()),
            Source::Unknown => write!(f, "[?]"),
        }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.source_info.source {
            Source::File(path) => write!(f, "{}:{}", path.display(), self.start()),
            Source::String => write!(f, "{}", self.start()),
            Source::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Many objects have location information.
/// [`HasLoc`] allows you to call [`HasLoc::loc`] to get the span information.
pub trait HasLoc {
    fn loc(&self) -> Loc;
}

#[derive(Clone, Debug)]
struct LineLens(Vec<usize>);

impl LineLens {
    fn from(text: &str) -> LineLens {
        let mut lens = vec![];
        for line in text.split('\n') {
            lens.push(line.len() + 1);
        }
        LineLens(lens)
    }

    fn linecol(&self, pos: Pos) -> LineCol {
        let mut line = 0;
        let mut col = pos;
        for line_len in &self.0 {
            if col >= *line_len {
                col -= *line_len;
                line += 1;
            } else {
                break
            }
        }
        LineCol(line, col)
    }
}

#[test]
fn linelens() {
    let text = "CHIP Not {
    IN in;
    OUT out;
}";

    let linelens = LineLens::from(text);
    assert_eq!(linelens.linecol(0).to_string(), "1:1".to_string());
    assert_eq!(linelens.linecol(5).to_string(), "1:6".to_string());
    assert_eq!(linelens.linecol(10).to_string(), "1:11".to_string());
    assert_eq!(linelens.linecol(11).to_string(), "2:1".to_string());
    assert_eq!(linelens.linecol(15).to_string(), "2:5".to_string());
    assert_eq!(linelens.linecol(22).to_string(), "3:1".to_string());
}
