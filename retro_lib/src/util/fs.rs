//! File-backed buffer windows.
//!
//! Cartridge and boot ROM images are exposed to the rest of the system as
//! owned, fixed-size windows into a file. The storage is released when the
//! buffer is dropped, so there is no unmap call to forget or to issue twice.

use crate::error::{RetroError, RetroResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops;
use std::path::Path;

/// An owned window of `len` bytes read from a file at a fixed offset.
pub struct FileBuffer {
    data: Box<[u8]>,
}

impl FileBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ops::Deref for FileBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

/// Read a `len`-byte window starting at `offset` from the file at `path`.
///
/// A zero-length window or a window extending past the end of the file is an
/// error: short cartridge images must fail loudly at init time rather than
/// hand out truncated storage.
pub fn map_file(path: &Path, offset: u64, len: usize) -> RetroResult<FileBuffer> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Err(RetroError::FileOrDirNotFound(path.display().to_string())),
    };

    let file_len = file.metadata()?.len();
    if len == 0 || offset.checked_add(len as u64).is_none_or(|end| end > file_len) {
        return Err(RetroError::BadMapWindow {
            path: path.display().to_string(),
            offset,
            len,
        });
    }

    file.seek(SeekFrom::Start(offset))?;
    let mut data = vec![0; len].into_boxed_slice();
    file.read_exact(&mut data)?;

    Ok(FileBuffer { data })
}
