use std::io;

use libc::{c_int, c_long, c_uint, c_void};
use procmaps::Pid;

/// Raw ptrace with errno-based failure detection. The peek requests return
/// the fetched word, and `-1` is a valid word, so errno is cleared first and
/// consulted after.
pub unsafe fn ptrace(request: c_uint, pid: Pid, addr: *mut c_void, data: *mut c_void) -> Result<c_long, io::Error> {
    *libc::__errno_location() = 0;
    let ret = libc::ptrace(request, pid, addr, data);
    if ret == -1 && *libc::__errno_location() != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret)
}

/// Blocks until the target changes state; returns the raw wait status.
pub fn waitpid(pid: Pid, options: c_int) -> Result<c_int, io::Error> {
    let mut status: c_int = 0;
    let ret = unsafe { libc::waitpid(pid, &mut status, options) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(status)
}
