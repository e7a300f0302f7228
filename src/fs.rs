//! Filesystem collaborator: resolve a URI to a regular file, stat it, and
//! memory-map its contents read-only. Built directly against `libc`
//! (`open`/`fstat`/`mmap`/`munmap`) rather than a mapping crate, since none
//! of the retrieval pack's dependencies cover one — `hyperium-hyper`'s own
//! `ffi` module reaches for raw `libc` the same way for comparable needs.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of resolving a URI path against the web root.
pub enum Resolved {
    File(FileInfo),
    NotFound,
    Forbidden,
}

pub struct FileInfo {
    pub size: u64,
    pub mtime: SystemTime,
    fd: libc::c_int,
}

impl FileInfo {
    /// Opens and stats `path`. Returns `NotFound`/`Forbidden` instead of an
    /// error for the common negative cases so the response builder can map
    /// them directly onto 404/403 without inspecting `io::Error` kinds.
    pub fn stat(path: &Path) -> io::Result<Resolved> {
        let c_path = match CString::new(path.as_os_str().as_bytes()) {
            Ok(p) => p,
            Err(_) => return Ok(Resolved::NotFound),
        };

        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY) };
        if fd < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::NotFound => Ok(Resolved::NotFound),
                io::ErrorKind::PermissionDenied => Ok(Resolved::Forbidden),
                _ => Err(err),
            };
        }

        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::fstat(fd, &mut stat) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        if stat.st_mode & libc::S_IFMT != libc::S_IFREG {
            unsafe { libc::close(fd) };
            return Ok(Resolved::Forbidden);
        }

        let mtime = UNIX_EPOCH + std::time::Duration::new(stat.st_mtime as u64, 0);
        Ok(Resolved::File(FileInfo {
            size: stat.st_size as u64,
            mtime,
            fd,
        }))
    }

    /// Maps the whole file read-only. The mapping is unmapped when the
    /// returned `MappedFile` drops, scoped to a single response send per
    /// spec.md §5.
    pub fn mmap(&self) -> io::Result<MappedFile> {
        if self.size == 0 {
            // mmap of a zero-length file is undefined; nothing to send.
            return Ok(MappedFile {
                ptr: ptr::null_mut(),
                len: 0,
            });
        }
        let len = self.size as usize;
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                self.fd,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(MappedFile { ptr, len })
    }
}

impl Drop for FileInfo {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

pub struct MappedFile {
    ptr: *mut libc::c_void,
    len: usize,
}

impl MappedFile {
    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.len) }
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if self.len > 0 {
            unsafe {
                libc::munmap(self.ptr, self.len);
            }
        }
    }
}

// SAFETY: the mapping is read-only and never mutated from another thread;
// this server is single-threaded but the type still needs to cross the
// boundary into a background thread in the integration tests.
unsafe impl Send for MappedFile {}
