#[derive(Debug)]
pub enum Error {
    AttachFailed(std::io::Error),
    NotAttached,
    ReadMemory { addr: usize, source: std::io::Error },
    WriteMemory { addr: usize, source: std::io::Error },
    GetRegs(std::io::Error),
    SetRegs(std::io::Error),
    Resume(std::io::Error),
    UnmappedAddress(usize),
    SymbolResolution(procmaps::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AttachFailed(err) => write!(f, "AttachFailed: {err}"),
            Error::NotAttached => write!(f, "NotAttached: session already detached"),
            Error::ReadMemory { addr, source } => write!(f, "ReadMemory at {addr:#x}: {source}"),
            Error::WriteMemory { addr, source } => write!(f, "WriteMemory at {addr:#x}: {source}"),
            Error::GetRegs(err) => write!(f, "GetRegs: {err}"),
            Error::SetRegs(err) => write!(f, "SetRegs: {err}"),
            Error::Resume(err) => write!(f, "Resume: {err}"),
            Error::UnmappedAddress(addr) => write!(f, "UnmappedAddress: no region contains {addr:#x}"),
            Error::SymbolResolution(err) => write!(f, "SymbolResolution: {err}"),
        }
    }
}

impl std::error::Error for Error {}
