//! `podforge targets` command

use anyhow::Result;

use crate::cli::{GlobalOpts, TargetsArgs};
use podforge::ops::format_targets;

pub fn execute(args: TargetsArgs, opts: &GlobalOpts) -> Result<()> {
    let project = super::load_project(opts)?;
    let set = project.target_set();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        print!("{}", format_targets(&set));
    }

    Ok(())
}
