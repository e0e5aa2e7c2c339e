#[derive(Debug)]
pub enum Error {
    ProcessNotFound(String),
    OpenProcess(std::io::Error),
    QueryMaps(std::io::Error),
    SymbolNotLocal(usize),
    ModuleNotMapped(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ProcessNotFound(who) => write!(f, "ProcessNotFound: {who}"),
            Error::OpenProcess(err) => write!(f, "OpenProcess: {err}"),
            Error::QueryMaps(err) => write!(f, "QueryMaps: {err}"),
            Error::SymbolNotLocal(addr) => write!(f, "SymbolNotLocal: {addr:#x} is not in any local region"),
            Error::ModuleNotMapped(name) => write!(f, "ModuleNotMapped: {name}"),
        }
    }
}

impl std::error::Error for Error {}
