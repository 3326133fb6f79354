use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: FileId, line: usize, start: usize, end: usize) -> Self {
        Self {
            file,
            line,
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Display paths of every file handed over by the loader.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    paths: Vec<String>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId(self.paths.len() as u32);
        self.paths.push(path.into());
        id
    }

    pub fn path(&self, file: FileId) -> Option<&str> {
        self.paths.get(file.0 as usize).map(String::as_str)
    }

    pub fn location(&self, span: Span) -> Location {
        Location {
            path: self
                .path(span.file)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<file #{}>", span.file.0)),
            line: span.line,
        }
    }
}

/// File and line of a finding; columns are never reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}
