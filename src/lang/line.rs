use super::{lex, token::Token, Error, LineNumber};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// One physical line of BASIC source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    file: Rc<str>,
    physical: usize,
    text: String,
}

impl SourceLine {
    pub fn new(file: Rc<str>, physical: usize, text: &str) -> SourceLine {
        SourceLine {
            file,
            physical,
            text: text.to_string(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn physical(&self) -> usize {
        self.physical
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> (LineNumber, Vec<Token>) {
        lex(&self.text)
    }
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// ## Source stream
///
/// Supplies one BASIC line at a time. `include` splices in another file
/// which may not itself include further files.
pub trait LineSource {
    fn next_line(&mut self) -> Option<SourceLine>;
    fn include(&mut self, name: &str) -> Result<()>;
}

pub trait Loader {
    fn load(&mut self, name: &str) -> Result<String>;
}

/// Reads included files relative to a base directory.
#[derive(Debug, Default)]
pub struct FileLoader {
    dir: PathBuf,
}

impl FileLoader {
    pub fn new(dir: PathBuf) -> FileLoader {
        FileLoader { dir }
    }
}

impl Loader for FileLoader {
    fn load(&mut self, name: &str) -> Result<String> {
        if name.trim().is_empty() {
            return Err(error!(BadFileName));
        }
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(s),
            Err(e) => match e.kind() {
                std::io::ErrorKind::NotFound => Err(error!(FileNotFound; name)),
                _ => Err(error!(InternalError; &e.to_string())),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct MemLoader {
    files: HashMap<String, String>,
}

impl MemLoader {
    pub fn new() -> MemLoader {
        MemLoader::default()
    }

    pub fn with(mut self, name: &str, text: &str) -> MemLoader {
        self.files.insert(name.to_string(), text.to_string());
        self
    }
}

impl Loader for MemLoader {
    fn load(&mut self, name: &str) -> Result<String> {
        match self.files.get(name) {
            Some(s) => Ok(s.clone()),
            None => Err(error!(FileNotFound; name)),
        }
    }
}

struct Frame {
    name: Rc<str>,
    lines: Vec<String>,
    next: usize,
}

impl Frame {
    fn new(name: &str, text: &str) -> Frame {
        Frame {
            name: Rc::from(name),
            lines: text.lines().map(|s| s.to_string()).collect(),
            next: 0,
        }
    }
}

pub struct Source {
    frames: Vec<Frame>,
    loader: Box<dyn Loader>,
}

impl Source {
    pub fn new(name: &str, text: &str, loader: Box<dyn Loader>) -> Source {
        Source {
            frames: vec![Frame::new(name, text)],
            loader,
        }
    }

    pub fn from_str(text: &str) -> Source {
        Source::new("<input>", text, Box::new(MemLoader::new()))
    }
}

impl LineSource for Source {
    fn next_line(&mut self) -> Option<SourceLine> {
        loop {
            let frame = self.frames.last_mut()?;
            if let Some(text) = frame.lines.get(frame.next) {
                frame.next += 1;
                return Some(SourceLine::new(frame.name.clone(), frame.next, text));
            }
            if self.frames.len() == 1 {
                return None;
            }
            self.frames.pop();
        }
    }

    fn include(&mut self, name: &str) -> Result<()> {
        if self.frames.len() > 1 {
            return Err(error!(NestedInclude; name));
        }
        let text = self.loader.load(name)?;
        log::debug!("including {} ({} lines)", name, text.lines().count());
        self.frames.push(Frame::new(name, &text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_include() {
        let loader = MemLoader::new()
            .with("A.BAS", "20 PRINT 2\n")
            .with("B.BAS", "30 PRINT 3\n");
        let mut src = Source::new("MAIN", "10 PRINT 1\n40 END\n", Box::new(loader));
        let first = src.next_line().unwrap();
        assert_eq!(first.text(), "10 PRINT 1");
        assert_eq!(first.physical(), 1);
        src.include("A.BAS").unwrap();
        assert!(src.include("B.BAS").is_err());
        let inc = src.next_line().unwrap();
        assert_eq!(inc.file(), "A.BAS");
        assert_eq!(inc.text(), "20 PRINT 2");
        let back = src.next_line().unwrap();
        assert_eq!(back.file(), "MAIN");
        assert_eq!(back.physical(), 2);
        assert!(src.next_line().is_none());
    }

    #[test]
    fn test_missing_include() {
        let mut src = Source::from_str("10 END");
        let e = src.include("NOPE.BAS").unwrap_err();
        assert!(e.is(crate::lang::ErrorCode::FileNotFound));
    }
}
