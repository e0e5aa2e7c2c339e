use std::fmt::Display;

pub struct Error(pub String);

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<procmaps::Error> for Error {
    fn from(value: procmaps::Error) -> Self {
        Self(value.to_string())
    }
}

impl From<tracer::Error> for Error {
    fn from(value: tracer::Error) -> Self {
        Self(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
