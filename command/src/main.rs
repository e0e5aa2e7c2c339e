mod cmd;
mod error;
mod utils;

use cmd::{CommandEnum, Commands};

fn main() {
    if let Err(err) = match argh::from_env::<Commands>().cmds {
        CommandEnum::Show(this) => this.init(),
        CommandEnum::Read(this) => this.init(),
        CommandEnum::Dump(this) => this.init(),
        CommandEnum::Search(this) => this.init(),
        CommandEnum::Inject(this) => this.init(),
    } {
        eprintln!("\n\x1b[31m error: {err} \x1b[0m")
    }
}
