//! Memory-map model of a linux process: `/proc/<pid>/maps` parsing, region and
//! module lookup, and ASLR-delta symbol resolution between two address spaces.

mod error;
mod map;
mod proc;

pub use error::Error;
pub use map::MapEntry;
pub use proc::Process;

pub type Pid = i32;

pub type Result<T, E = Error> = std::result::Result<T, E>;
