//! Named stream storage for a segment's postings files.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use sift_common::{Error, Result};

use crate::{IndexInput, IndexOutput, StreamSink, StreamSource};

/// Builds a per-segment file name: `{segment}_{suffix}.{ext}`, or `{segment}.{ext}`
/// when the suffix is empty.
pub fn segment_file_name(segment: &str, suffix: &str, ext: &str) -> String {
    let mut name = String::with_capacity(segment.len() + suffix.len() + ext.len() + 2);
    name.push_str(segment);
    if !suffix.is_empty() {
        name.push('_');
        name.push_str(suffix);
    }
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// A flat namespace of write-once streams.
pub trait Directory: Send + Sync {
    /// Creates a new stream. Fails if a stream with the same name exists.
    fn create_output(&self, name: &str) -> Result<IndexOutput>;

    /// Opens an existing, sealed stream for reading.
    fn open_input(&self, name: &str) -> Result<IndexInput>;

    fn file_exists(&self, name: &str) -> Result<bool>;

    fn delete_file(&self, name: &str) -> Result<()>;

    /// Lists the names of all sealed streams, sorted.
    fn list_all(&self) -> Result<Vec<String>>;
}

type FileMap = Arc<Mutex<AHashMap<String, Arc<Vec<u8>>>>>;

/// Directory keeping every stream in memory. Streams become visible to readers
/// once their output is closed.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    files: FileMap,
}

impl MemoryDirectory {
    pub fn new() -> MemoryDirectory {
        Default::default()
    }

    /// Returns a copy of the sealed content of `name`.
    pub fn file_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let files = self.lock()?;
        files
            .get(name)
            .map(|data| data.as_ref().clone())
            .ok_or_else(|| not_found(name))
    }

    /// Replaces (or creates) the sealed content of `name`.
    pub fn put_file(&self, name: &str, data: Vec<u8>) -> Result<()> {
        self.lock()?.insert(name.to_string(), Arc::new(data));
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AHashMap<String, Arc<Vec<u8>>>>> {
        self.files
            .lock()
            .map_err(|_| Error::invalid_operation("memory directory lock poisoned"))
    }
}

impl Directory for MemoryDirectory {
    fn create_output(&self, name: &str) -> Result<IndexOutput> {
        if self.lock()?.contains_key(name) {
            return Err(Error::io(
                name,
                std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            ));
        }
        let sink = MemoryFileWriter {
            name: name.to_string(),
            data: Some(Vec::new()),
            files: self.files.clone(),
        };
        Ok(IndexOutput::new(name, Box::new(sink)))
    }

    fn open_input(&self, name: &str) -> Result<IndexInput> {
        let data = self.lock()?.get(name).cloned().ok_or_else(|| not_found(name))?;
        IndexInput::open(name, data as Arc<dyn StreamSource>)
    }

    fn file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(name))
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.lock()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    fn list_all(&self) -> Result<Vec<String>> {
        let mut names = self.lock()?.keys().cloned().collect::<Vec<_>>();
        names.sort_unstable();
        Ok(names)
    }
}

struct MemoryFileWriter {
    name: String,
    data: Option<Vec<u8>>,
    files: FileMap,
}

impl StreamSink for MemoryFileWriter {
    fn append(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.data
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?
            .extend_from_slice(buf);
        Ok(())
    }

    fn commit(&mut self) -> std::io::Result<()> {
        let data = self
            .data
            .take()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        self.files
            .lock()
            .map_err(|_| std::io::Error::other("memory directory lock poisoned"))?
            .insert(std::mem::take(&mut self.name), Arc::new(data));
        Ok(())
    }
}

fn not_found(name: &str) -> Error {
    Error::io(name, std::io::Error::from(std::io::ErrorKind::NotFound))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Directory, MemoryDirectory, segment_file_name};
    use crate::{DataInput, DataOutput};

    pub(crate) fn write_and_read(dir: &dyn Directory) {
        let mut out = dir.create_output("_0.doc").unwrap();
        out.write_vint(300).unwrap();
        out.write_string("abc").unwrap();
        assert_eq!(out.close().unwrap(), 6);

        assert!(dir.file_exists("_0.doc").unwrap());
        assert_eq!(dir.list_all().unwrap(), vec!["_0.doc".to_string()]);
        let mut input = dir.open_input("_0.doc").unwrap();
        assert_eq!(input.read_vint().unwrap(), 300);
        assert_eq!(input.read_string().unwrap(), "abc");

        assert!(dir.create_output("_0.doc").is_err());
        dir.delete_file("_0.doc").unwrap();
        assert!(dir.open_input("_0.doc").is_err());
        assert!(dir.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_memory_directory() {
        let dir = MemoryDirectory::new();
        write_and_read(&dir);

        dir.put_file("x", vec![1, 2, 3]).unwrap();
        assert_eq!(dir.file_bytes("x").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_memory_output_invisible_until_closed() {
        let dir = MemoryDirectory::new();
        let mut out = dir.create_output("a").unwrap();
        out.write_byte(1).unwrap();
        assert!(!dir.file_exists("a").unwrap());
        out.close().unwrap();
        assert!(dir.file_exists("a").unwrap());
    }

    #[test]
    fn test_segment_file_name() {
        assert_eq!(segment_file_name("_3", "", "doc"), "_3.doc");
        assert_eq!(segment_file_name("_3", "Sift_0", "pos"), "_3_Sift_0.pos");
    }
}
