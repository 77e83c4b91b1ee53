//! Build script rendering the `scw-volume` manual page into `OUT_DIR`.

use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR").map(PathBuf::from).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
    })?;

    let command = cli::Cli::command();
    let page = format!("{}.1", command.get_name());
    let mut rendered = Vec::new();
    Man::new(command).render(&mut rendered)?;
    fs::write(out_dir.join(page), rendered)?;

    Ok(())
}
