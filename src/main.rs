extern crate ipset_manager;

use std::env;

use anyhow::{Context, Result};

use ipset_manager::IpsetCommand;

fn main() -> Result<()> {
    simple_logger::init()?;

    let set_name = env::args()
        .nth(1)
        .context("expected a set name as the first argument")?;

    let command = IpsetCommand::new();
    let set = command.set_by_name(&set_name)?;
    println!("{:#?}", set);

    Ok(())
}
