//! Segment streams stored as files in one folder.
//!
//! A stream is written under a `.partial` name and renamed into place on commit,
//! so `open_input` and `list_all` only ever see complete streams.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sift_common::{Error, Result};

use crate::{IndexInput, IndexOutput, StreamSink, StreamSource, directory::Directory};

const PARTIAL_SUFFIX: &str = ".partial";

/// Directory backed by a filesystem folder.
#[derive(Debug, Clone)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    /// Opens `root`, creating it when missing.
    pub fn open(root: impl AsRef<Path>) -> Result<FsDirectory> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| Error::io(root.display().to_string(), e))?;
        Ok(FsDirectory { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{PARTIAL_SUFFIX}"))
    }
}

impl Directory for FsDirectory {
    fn create_output(&self, name: &str) -> Result<IndexOutput> {
        let path = self.root.join(name);
        if path.exists() {
            return Err(Error::io(
                name,
                std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            ));
        }
        let partial = self.partial_path(name);
        let file = File::create_new(&partial).map_err(|e| Error::io(name, e))?;
        let sink = FileSink {
            writer: Some(BufWriter::new(file)),
            partial,
            path,
        };
        Ok(IndexOutput::new(name, Box::new(sink)))
    }

    fn open_input(&self, name: &str) -> Result<IndexInput> {
        let stream = FileStream::open(&self.root.join(name)).map_err(|e| Error::io(name, e))?;
        IndexInput::open(name, std::sync::Arc::new(stream))
    }

    fn file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.root.join(name).is_file())
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        std::fs::remove_file(self.root.join(name)).map_err(|e| Error::io(name, e))
    }

    fn list_all(&self) -> Result<Vec<String>> {
        let context = self.root.display().to_string();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(|e| Error::io(context.as_str(), e))? {
            let entry = entry.map_err(|e| Error::io(context.as_str(), e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.ends_with(PARTIAL_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

/// A committed stream file. The length is captured at open time since
/// committed streams never change.
struct FileStream {
    file: Mutex<File>,
    len: u64,
}

impl FileStream {
    fn open(path: &Path) -> std::io::Result<FileStream> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(FileStream {
            file: Mutex::new(file),
            len,
        })
    }
}

impl StreamSource for FileStream {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        let end = range.end.min(self.len);
        if range.start >= end {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; (end - range.start) as usize];
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("stream file lock poisoned"))?;
        file.seek(SeekFrom::Start(range.start))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn max_read_size(&self) -> usize {
        16 * 1024
    }
}

struct FileSink {
    writer: Option<BufWriter<File>>,
    partial: PathBuf,
    path: PathBuf,
}

impl StreamSink for FileSink {
    fn append(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.writer
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?
            .write_all(buf)
    }

    fn commit(&mut self) -> std::io::Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        std::fs::rename(&self.partial, &self.path)
    }
}
