use std::path::PathBuf;

use argh::{FromArgValue, FromArgs};
use procmaps::{Pid, Process};
use tracer::Session;

use super::{
    error::{Error, Result},
    utils,
};

/// Hex address argument, `0x` prefix optional.
#[derive(Debug, Clone, Copy)]
pub struct Address(pub usize);

impl FromArgValue for Address {
    fn from_arg_value(value: &str) -> Result<Self, String> {
        usize::from_str_radix(value.trim_start_matches("0x"), 16)
            .map(Self)
            .map_err(|e| e.to_string())
    }
}

/// Literal byte pattern given as an even-length hex string.
#[derive(Debug, Clone)]
pub struct Pattern(pub Vec<u8>);

impl FromArgValue for Pattern {
    fn from_arg_value(value: &str) -> Result<Self, String> {
        utils::parse_pattern(value).map(Self)
    }
}

#[derive(FromArgs)]
#[argh(description = "inspect and manipulate the memory of a running process.")]
pub struct Commands {
    #[argh(subcommand)]
    pub cmds: CommandEnum,
}

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum CommandEnum {
    Show(SubCommandShow),
    Read(SubCommandRead),
    Dump(SubCommandDump),
    Search(SubCommandSearch),
    Inject(SubCommandInject),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "show", description = "show process info and memory regions")]
pub struct SubCommandShow {
    #[argh(option, short = 'p', description = "process id")]
    pub pid: Option<Pid>,

    #[argh(option, short = 'n', description = "process name")]
    pub name: Option<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "read", description = "read remote memory and print it as hex")]
pub struct SubCommandRead {
    #[argh(option, short = 'p', description = "process id")]
    pub pid: Option<Pid>,

    #[argh(option, short = 'n', description = "process name")]
    pub name: Option<String>,

    #[argh(option, short = 'a', description = "address to read from, hex")]
    pub addr: Address,

    #[argh(option, short = 's', description = "number of bytes to read")]
    pub size: usize,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "dump", description = "dump the region containing an address to a file")]
pub struct SubCommandDump {
    #[argh(option, short = 'p', description = "process id")]
    pub pid: Option<Pid>,

    #[argh(option, short = 'n', description = "process name")]
    pub name: Option<String>,

    #[argh(option, short = 'a', description = "address inside the region, hex")]
    pub addr: Address,

    #[argh(option, short = 'o', description = "output file path")]
    pub out: PathBuf,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "search", description = "search all regions for a byte pattern")]
pub struct SubCommandSearch {
    #[argh(option, short = 'p', description = "process id")]
    pub pid: Option<Pid>,

    #[argh(option, short = 'n', description = "process name")]
    pub name: Option<String>,

    #[argh(option, short = 'x', description = "hex byte pattern")]
    pub pattern: Pattern,

    #[argh(option, short = 'f', description = "only scan regions whose name contains this")]
    pub filter: Option<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "inject", description = "inject a shared library via the remote dynamic loader")]
pub struct SubCommandInject {
    #[argh(option, short = 'p', description = "process id")]
    pub pid: Option<Pid>,

    #[argh(option, short = 'n', description = "process name")]
    pub name: Option<String>,

    #[argh(option, short = 'l', description = "path of the library to inject")]
    pub lib: PathBuf,
}

fn select_process(pid: Option<Pid>, name: Option<&str>) -> Result<Process> {
    match (pid, name) {
        (Some(_), Some(_)) => Err(Error::from("--pid and --name are mutually exclusive")),
        (Some(pid), None) => Ok(Process::open(pid)?),
        (None, Some(name)) => Ok(Process::find(name)?),
        (None, None) => Err(Error::from("one of --pid or --name is required")),
    }
}

impl SubCommandShow {
    pub fn init(self) -> Result<()> {
        let process = select_process(self.pid, self.name.as_deref())?;
        println!("pid    : {}", process.pid());
        println!("name   : {}", process.name());
        println!("memory :\n");
        for map in process.maps() {
            println!("{map}");
        }
        Ok(())
    }
}

impl SubCommandRead {
    pub fn init(self) -> Result<()> {
        let process = select_process(self.pid, self.name.as_deref())?;
        let region = process
            .find_region(self.addr.0)
            .ok_or(format!("no region contains {:#x}", self.addr.0))?;
        println!("reading {} bytes from {:#x} ( {} )\n", self.size, self.addr.0, region.name());

        let session = Session::attach(process)?;
        let bytes = session.read(self.addr.0, self.size)?;
        utils::hexdump(self.addr.0, &bytes);
        Ok(())
    }
}

impl SubCommandDump {
    pub fn init(self) -> Result<()> {
        let process = select_process(self.pid, self.name.as_deref())?;
        let session = Session::attach(process)?;
        let (bytes, region) = session.dump_region(self.addr.0)?;
        println!("found {:#x} in {}", self.addr.0, region.name());
        utils::write_dump(&self.out, &bytes)?;
        println!("dumped {} bytes to {}", bytes.len(), self.out.display());
        Ok(())
    }
}

impl SubCommandSearch {
    pub fn init(self) -> Result<()> {
        let process = select_process(self.pid, self.name.as_deref())?;
        let session = Session::attach(process)?;
        let report = session.search(&self.pattern.0, self.filter.as_deref())?;
        for region in &report.skipped {
            eprintln!("skipped unreadable region {:x}-{:x} {}", region.begin(), region.end(), region.name());
        }
        for hit in &report.matches {
            println!("{:#010x}  {}", hit.addr, hit.region);
        }
        println!("\n{} matches", report.matches.len());
        Ok(())
    }
}

impl SubCommandInject {
    pub fn init(self) -> Result<()> {
        let path = self.lib.to_str().ok_or("library path is not valid utf-8")?.to_string();
        let process = select_process(self.pid, self.name.as_deref())?;
        let mut session = Session::attach(process)?;
        let handle = session.inject(&path)?;
        if handle == 0 {
            return Err(Error::from("dlopen returned a null handle"));
        }
        println!("injected {path}, handle {handle:#x}");
        Ok(())
    }
}
