use std::ptr;

use libc::{
    c_void, PTRACE_ATTACH, PTRACE_CONT, PTRACE_DETACH, PTRACE_GETREGS, PTRACE_PEEKDATA, PTRACE_POKEDATA,
    PTRACE_SETREGS, WUNTRACED,
};
use procmaps::{MapEntry, Process};

use super::{
    error::Error,
    ffi,
    regs::{program_call, Regs},
    Result, WORD,
};

/// Remote addresses of the loader-related functions the injection workflow
/// needs. Resolved all-or-nothing and cached for the session's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct LoaderSymbols {
    pub dlopen: usize,
    pub dlsym: usize,
    pub dlerror: usize,
    pub calloc: usize,
    pub free: usize,
}

/// An attached ptrace session. The target stays suspended for the session's
/// whole lifetime, except while a synthetic call is running. Dropping the
/// session detaches.
pub struct Session {
    process: Process,
    symbols: Option<LoaderSymbols>,
    attached: bool,
}

impl Session {
    /// Attaches to the target and blocks until it reports the stop.
    pub fn attach(process: Process) -> Result<Self> {
        unsafe { ffi::ptrace(PTRACE_ATTACH, process.pid(), ptr::null_mut(), ptr::null_mut()) }
            .map_err(Error::AttachFailed)?;
        ffi::waitpid(process.pid(), 0).map_err(Error::AttachFailed)?;
        Ok(Self { process, symbols: None, attached: true })
    }

    #[inline]
    pub fn process(&self) -> &Process {
        &self.process
    }

    /// Resumes the target's independent execution. Idempotent, best effort.
    pub fn detach(&mut self) {
        if self.attached {
            let _ = unsafe { ffi::ptrace(PTRACE_DETACH, self.process.pid(), ptr::null_mut(), ptr::null_mut()) };
            self.attached = false;
        }
    }

    pub(crate) fn ensure_attached(&self) -> Result<()> {
        if self.attached {
            Ok(())
        } else {
            Err(Error::NotAttached)
        }
    }

    /// Reads `len` bytes from the target. The underlying peek moves whole
    /// words, so the read is rounded up internally and truncated back before
    /// returning; either every word was read or the call fails.
    pub fn read(&self, addr: usize, len: usize) -> Result<Vec<u8>> {
        self.ensure_attached()?;
        let words = len.div_ceil(WORD);
        let mut buf = Vec::with_capacity(words * WORD);
        for i in 0..words {
            let at = addr + i * WORD;
            let word = unsafe { ffi::ptrace(PTRACE_PEEKDATA, self.process.pid(), at as *mut c_void, ptr::null_mut()) }
                .map_err(|source| Error::ReadMemory { addr: at, source })?;
            buf.extend_from_slice(&(word as usize).to_ne_bytes());
        }
        buf.truncate(len);
        Ok(buf)
    }

    /// Writes `data` to the target. The staging buffer is zero-padded up to a
    /// whole number of words and poked word by word: a length that is not a
    /// word multiple overwrites up to WORD-1 trailing target bytes with
    /// zeroes. Words already poked are not rolled back on failure.
    pub fn write(&self, addr: usize, data: &[u8]) -> Result<()> {
        self.ensure_attached()?;
        for (i, word) in stage_words(data).into_iter().enumerate() {
            let at = addr + i * WORD;
            unsafe { ffi::ptrace(PTRACE_POKEDATA, self.process.pid(), at as *mut c_void, word as *mut c_void) }
                .map_err(|source| Error::WriteMemory { addr: at, source })?;
        }
        Ok(())
    }

    /// Invokes a function inside the target: programs registers and stack,
    /// resumes the target until the callee returns onto the zeroed link
    /// register and faults, then reads r0 back. The pre-call register state
    /// is restored afterwards, best effort even when the protocol failed
    /// midway.
    pub fn call(&self, function: usize, args: &[usize]) -> Result<usize> {
        self.ensure_attached()?;
        let saved = self.get_regs()?;
        let mut regs = saved;

        let result = self.run_call(&mut regs, function, args);
        let restored = self.set_regs(&saved);

        let value = result?;
        restored?;
        Ok(value)
    }

    fn run_call(&self, regs: &mut Regs, function: usize, args: &[usize]) -> Result<usize> {
        for (addr, word) in program_call(regs, function, args) {
            self.write(addr, &word.to_ne_bytes())?;
        }
        self.set_regs(regs)?;
        unsafe { ffi::ptrace(PTRACE_CONT, self.process.pid(), ptr::null_mut(), ptr::null_mut()) }
            .map_err(Error::Resume)?;
        // stops again when execution lands on address 0
        ffi::waitpid(self.process.pid(), WUNTRACED).map_err(Error::Resume)?;
        let after = self.get_regs()?;
        Ok(after.uregs[0] as usize)
    }

    fn get_regs(&self) -> Result<Regs> {
        let mut regs = Regs::default();
        unsafe {
            ffi::ptrace(
                PTRACE_GETREGS,
                self.process.pid(),
                ptr::null_mut(),
                &mut regs as *mut Regs as *mut c_void,
            )
        }
        .map_err(Error::GetRegs)?;
        Ok(regs)
    }

    fn set_regs(&self, regs: &Regs) -> Result<()> {
        unsafe {
            ffi::ptrace(
                PTRACE_SETREGS,
                self.process.pid(),
                ptr::null_mut(),
                regs as *const Regs as *mut c_void,
            )
        }
        .map_err(Error::SetRegs)?;
        Ok(())
    }

    /// Remote addresses of dlopen/dlsym/dlerror/calloc/free, computed from
    /// their locally-known addresses via the module base delta. Resolved once
    /// per session; a single miss fails the whole set.
    pub fn loader_symbols(&mut self) -> Result<LoaderSymbols> {
        if let Some(symbols) = self.symbols {
            return Ok(symbols);
        }
        let local = Process::current().map_err(Error::SymbolResolution)?;
        let resolve = |addr: usize| self.process.resolve_symbol(addr, &local).map_err(Error::SymbolResolution);
        let symbols = LoaderSymbols {
            dlopen: resolve(libc::dlopen as usize)?,
            dlsym: resolve(libc::dlsym as usize)?,
            dlerror: resolve(libc::dlerror as usize)?,
            calloc: resolve(libc::calloc as usize)?,
            free: resolve(libc::free as usize)?,
        };
        self.symbols = Some(symbols);
        Ok(symbols)
    }

    /// Allocates `len + 1` bytes in the target and writes the NUL-terminated
    /// text there; returns the remote address. The allocation is the
    /// caller's to free (via a remote `free` call).
    pub fn write_string(&mut self, text: &str) -> Result<usize> {
        let symbols = self.loader_symbols()?;
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        let addr = self.call(symbols.calloc, &[bytes.len(), 1])?;
        self.write(addr, &bytes)?;
        Ok(addr)
    }

    /// Loads a shared library into the target by calling its dlopen with a
    /// remotely-written path. Returns the loader handle; 0 means the load
    /// failed. dlerror stays unread, a NULL handle is the only failure
    /// signal surfaced.
    pub fn inject(&mut self, path: &str) -> Result<usize> {
        let symbols = self.loader_symbols()?;
        let remote_path = self.write_string(path)?;
        let handle = self.call(symbols.dlopen, &[remote_path, libc::RTLD_NOW as usize])?;
        self.call(symbols.free, &[remote_path])?;
        Ok(handle)
    }

    /// Reads from `addr` to the end of its containing region.
    pub fn dump_region(&self, addr: usize) -> Result<(Vec<u8>, MapEntry)> {
        let region = self
            .process
            .find_region(addr)
            .ok_or(Error::UnmappedAddress(addr))?
            .clone();
        let bytes = self.read(addr, region.end() - addr)?;
        Ok((bytes, region))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Zero-pads `data` up to a whole number of machine words and packs it into
/// poke-ready words.
fn stage_words(data: &[u8]) -> Vec<usize> {
    let mut staged = data.to_vec();
    staged.resize(data.len().div_ceil(WORD) * WORD, 0);
    staged
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut bytes = [0u8; WORD];
            bytes.copy_from_slice(chunk);
            usize::from_ne_bytes(bytes)
        })
        .collect()
}

#[test]
fn test_stage_words_whole_words() {
    let data = (1..=2 * WORD as u8).collect::<Vec<_>>();
    let words = stage_words(&data);
    assert_eq!(words.len(), 2);
    let mut bytes = [0u8; WORD];
    bytes.copy_from_slice(&data[..WORD]);
    assert_eq!(words[0], usize::from_ne_bytes(bytes));
}

#[test]
fn test_stage_words_zero_pads_partial_tail() {
    let words = stage_words(&[0xff; 1]);
    let mut expected = [0u8; WORD];
    expected[0] = 0xff;
    assert_eq!(words, vec![usize::from_ne_bytes(expected)]);

    let words = stage_words(&vec![0xaa; WORD + 1]);
    assert_eq!(words.len(), 2);
    expected = [0u8; WORD];
    expected[0] = 0xaa;
    assert_eq!(words[1], usize::from_ne_bytes(expected));
}

#[test]
fn test_stage_words_empty() {
    assert!(stage_words(&[]).is_empty());
}

#[test]
fn test_attach_nonexistent_pid_fails() {
    // pid 4194305 is above the default kernel pid_max
    let target = Process::from_lines(4194305, String::from("ghost"), std::iter::empty::<&str>());
    match Session::attach(target) {
        Err(Error::AttachFailed(_)) => {}
        Err(err) => panic!("expected AttachFailed, got {err}"),
        Ok(_) => panic!("attach to a nonexistent pid succeeded"),
    }
}

#[test]
fn test_read_write_round_trip_on_child() {
    use std::process::Command;

    let Ok(mut child) = Command::new("sleep").arg("30").spawn() else {
        return;
    };
    std::thread::sleep(std::time::Duration::from_millis(100));

    let pid = child.id() as procmaps::Pid;
    // environments that deny ptrace make this a no-op rather than a failure
    let Ok(target) = Process::open(pid) else {
        let _ = child.kill();
        return;
    };
    let Ok(session) = Session::attach(target) else {
        let _ = child.kill();
        return;
    };

    let writable = session
        .process()
        .maps()
        .iter()
        .find(|m| m.permissions().starts_with("rw") && m.size() >= 2 * WORD)
        .map(|m| m.begin());
    if let Some(addr) = writable {
        let original = session.read(addr, 2 * WORD).unwrap();
        let pattern = (0..2 * WORD as u8).collect::<Vec<_>>();
        session.write(addr, &pattern).unwrap();
        assert_eq!(session.read(addr, pattern.len()).unwrap(), pattern);
        session.write(addr, &original).unwrap();
    }

    drop(session);
    let _ = child.kill();
    let _ = child.wait();
}

// A remote call into a function that never returns (an exit-style callee
// terminates the target before the return-address fault) parks the session
// in waitpid forever; there is no timeout. Accepted limitation.
#[cfg(target_arch = "arm")]
#[test]
#[ignore = "blocks indefinitely when the callee never returns"]
fn test_call_into_exit_never_returns() {
    use std::process::Command;

    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let target = Process::open(child.id() as procmaps::Pid).unwrap();
    let session = Session::attach(target).unwrap();
    let local = Process::current().unwrap();
    let exit_addr = session.process().resolve_symbol(libc::exit as usize, &local).unwrap();
    let _ = session.call(exit_addr, &[1]);
    let _ = child.wait();
}
