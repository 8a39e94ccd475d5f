//! The per-entry descriptor and the handler protocol.

use std::fmt::{Debug, Formatter};
use std::io::{self, Read};

use crate::errors::ExtractError;

/// Immutable descriptor for one archive entry, handed to the handler
/// together with a borrowed reader over the entry's bytes.
///
/// The reader is only valid for the duration of
/// [`EntryHandler::on_entry`]; reads past the entry's bytes yield
/// end-of-input. The front-end owns the underlying stream and may reuse
/// it after the invocation returns.
pub struct ArchiveHeader<'a> {
    /// Entry path, forward-slash form, leading `/` stripped, cleaned.
    pub name: String,
    /// Modification time in Unix seconds.
    pub mod_time: i64,
    /// Declared uncompressed size; 0 for streams of unknown length.
    pub size: u64,
    /// Folders are skipped before the handler runs, so this is currently
    /// always false.
    pub is_folder: bool,
    reader: &'a mut dyn Read,
}

impl<'a> ArchiveHeader<'a> {
    pub fn new(
        reader: &'a mut dyn Read,
        name: impl Into<String>,
        mod_time: i64,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            mod_time,
            size,
            is_folder: false,
            reader,
        }
    }
}

impl Read for ArchiveHeader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Debug for ArchiveHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHeader")
            .field("name", &self.name)
            .field("mod_time", &self.mod_time)
            .field("size", &self.size)
            .field("is_folder", &self.is_folder)
            .finish_non_exhaustive()
    }
}

/// Caller-supplied processing hook, invoked once per surfaced entry (and
/// once per alias path for tar symlink targets). The handler owns
/// whatever state it needs; extractors never introspect it.
///
/// Returning an error stops the walk and propagates the error to the
/// `extract_archive` caller.
pub trait EntryHandler {
    fn on_entry(&mut self, header: &mut ArchiveHeader<'_>) -> Result<(), ExtractError>;
}

impl<F> EntryHandler for F
where
    F: FnMut(&mut ArchiveHeader<'_>) -> Result<(), ExtractError>,
{
    fn on_entry(&mut self, header: &mut ArchiveHeader<'_>) -> Result<(), ExtractError> {
        self(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_reads_delegate() {
        let mut data: &[u8] = b"payload";
        let mut header = ArchiveHeader::new(&mut data, "file.txt", 7, 7);
        let mut out = String::new();
        header.read_to_string(&mut out).unwrap();
        assert_eq!(out, "payload");
        assert!(!header.is_folder);
    }

    #[test]
    fn closures_are_handlers() {
        let mut seen = Vec::new();
        let mut handler = |header: &mut ArchiveHeader<'_>| -> Result<(), ExtractError> {
            seen.push(header.name.clone());
            Ok(())
        };
        let mut data: &[u8] = b"";
        let handler_ref: &mut dyn EntryHandler = &mut handler;
        handler_ref
            .on_entry(&mut ArchiveHeader::new(&mut data, "a", 0, 0))
            .unwrap();
        assert_eq!(seen, ["a"]);
    }
}
