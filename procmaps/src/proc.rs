use std::fs;

use super::{Error, MapEntry, Pid, Result};

/// Point-in-time snapshot of a process's address space. Regions keep listing
/// order, which is load-address order; lookups are first match wins.
pub struct Process {
    pid: Pid,
    name: String,
    maps: Vec<MapEntry>,
}

impl Process {
    pub fn open(pid: Pid) -> Result<Self> {
        let name = read_name(pid)?;
        let listing = fs::read_to_string(format!("/proc/{pid}/maps")).map_err(Error::QueryMaps)?;
        Ok(Self::from_lines(pid, name, listing.lines()))
    }

    /// Snapshot of the inspecting process itself, the local side of symbol
    /// resolution.
    pub fn current() -> Result<Self> {
        Self::open(std::process::id() as Pid)
    }

    /// Scans `/proc` for the first process whose command line equals `name`.
    pub fn find(name: &str) -> Result<Self> {
        for ent in fs::read_dir("/proc").map_err(Error::OpenProcess)? {
            let ent = ent.map_err(Error::OpenProcess)?;
            let file_name = ent.file_name();
            let Ok(pid) = file_name.to_string_lossy().parse::<Pid>() else {
                continue;
            };
            if read_name(pid).is_ok_and(|n| n == name) {
                return Self::open(pid);
            }
        }
        Err(Error::ProcessNotFound(name.to_string()))
    }

    pub fn from_lines<'a, I>(pid: Pid, name: String, lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let maps = lines.into_iter().map(MapEntry::parse).collect();
        Self { pid, name, maps }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn maps(&self) -> &[MapEntry] {
        &self.maps
    }

    /// First region containing `addr`, in listing order.
    pub fn find_region(&self, addr: usize) -> Option<&MapEntry> {
        self.maps.iter().find(|m| m.contains(addr))
    }

    /// Base address of the first executable region whose backing name
    /// contains `name`. This is where the module's code is mapped.
    pub fn find_module_base(&self, name: &str) -> Option<usize> {
        self.maps
            .iter()
            .find(|m| m.is_executable() && m.name().contains(name))
            .map(|m| m.begin())
    }

    /// Translates an address valid in `local_space` into this address space.
    ///
    /// Works by locating the module backing the local address, finding where
    /// the same module is mapped here, and shifting by the base delta. Only
    /// sound when both processes map the same shared object.
    pub fn resolve_symbol(&self, local_addr: usize, local_space: &Process) -> Result<usize> {
        let region = local_space
            .find_region(local_addr)
            .ok_or(Error::SymbolNotLocal(local_addr))?;
        let base = self
            .find_module_base(region.name())
            .ok_or_else(|| Error::ModuleNotMapped(region.name().to_string()))?;
        Ok(base + (local_addr - region.begin()))
    }
}

fn read_name(pid: Pid) -> Result<String> {
    let raw = fs::read(format!("/proc/{pid}/cmdline")).map_err(|_| Error::ProcessNotFound(pid.to_string()))?;
    let first = raw.split(|&b| b == 0).next().unwrap_or_default();
    Ok(String::from_utf8_lossy(first).into_owned())
}

#[cfg(test)]
fn space(pid: Pid, listing: &str) -> Process {
    Process::from_lines(pid, String::from("test"), listing.lines())
}

#[test]
fn test_find_region_first_match() {
    let p = space(
        1,
        "1000-2000 r--p 00000000 00:00 0\n\
         2000-3000 rw-p 00000000 00:00 0  [heap]\n\
         1800-2800 rw-p 00000000 00:00 0  overlap",
    );
    assert_eq!(p.find_region(0x1800).map(|m| m.begin()), Some(0x1000));
    assert_eq!(p.find_region(0x2000).map(|m| m.name()), Some("[heap]"));
    assert!(p.find_region(0x3000).is_none());
}

#[test]
fn test_find_module_base_executable_only() {
    let p = space(
        1,
        "10000-11000 r--p 00000000 08:01 7  /lib/libfoo.so\n\
         11000-12000 r-xp 00001000 08:01 7  /lib/libfoo.so\n\
         20000-21000 r-xp 00000000 08:01 9  /lib/libbar.so",
    );
    assert_eq!(p.find_module_base("libfoo"), Some(0x11000));
    assert_eq!(p.find_module_base("libbar.so"), Some(0x20000));
    assert_eq!(p.find_module_base("libbaz"), None);
}

#[test]
fn test_resolve_symbol_translation_invariant() {
    let local = space(1, "40000000-40100000 r-xp 00000000 08:01 3  /lib/libc.so");
    let target = space(2, "b6e00000-b6f00000 r-xp 00000000 08:01 3  /lib/libc.so");
    for k in [0usize, 0x10, 0x4242, 0xfffff] {
        let resolved = target.resolve_symbol(0x40000000 + k, &local).unwrap();
        assert_eq!(resolved, 0xb6e00000 + k);
    }
}

#[test]
fn test_resolve_symbol_not_local() {
    let local = space(1, "40000000-40100000 r-xp 00000000 08:01 3  /lib/libc.so");
    let target = space(2, "b6e00000-b6f00000 r-xp 00000000 08:01 3  /lib/libc.so");
    assert!(matches!(
        target.resolve_symbol(0xdead0000, &local),
        Err(Error::SymbolNotLocal(0xdead0000))
    ));
}

#[test]
fn test_resolve_symbol_module_not_mapped() {
    let local = space(1, "40000000-40100000 r-xp 00000000 08:01 3  /lib/libm.so");
    let target = space(2, "b6e00000-b6f00000 r-xp 00000000 08:01 3  /lib/libc.so");
    assert!(matches!(
        target.resolve_symbol(0x40000100, &local),
        Err(Error::ModuleNotMapped(name)) if name == "/lib/libm.so"
    ));
}
