use std::path::{Path, PathBuf};

use clap::CommandFactory;

// cli.rs only needs clap and clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let man_dir = PathBuf::from(std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR")).join("man");
    std::fs::create_dir_all(&man_dir).expect("create man directory");

    // Depth-first over the command tree; subcommand pages are named
    // `fritzbox-ports-add.1` and so on.
    let mut pending = vec![cli::Cli::command()];
    while let Some(cmd) = pending.pop() {
        let name = cmd.get_name().to_owned();
        for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
            pending.push(sub.clone().name(format!("{name}-{}", sub.get_name())));
        }
        write_page(cmd, &man_dir.join(format!("{name}.1")));
    }
}

fn write_page(cmd: clap::Command, path: &Path) {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut page)
        .unwrap_or_else(|e| panic!("render {}: {e}", path.display()));
    std::fs::write(path, page).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}
