//! `podforge clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalOpts};
use podforge::builder::BuildContext;
use podforge::util::fs::remove_dir_all_if_exists;

pub fn execute(args: CleanArgs, opts: &GlobalOpts) -> Result<()> {
    let project = super::load_project(opts)?;
    let ctx = BuildContext::new(&project);

    let dir = if args.all {
        ctx.build_dir.clone()
    } else {
        ctx.cocoapods_dir()
    };

    remove_dir_all_if_exists(&dir)?;
    if !opts.quiet {
        eprintln!("     Removed {}", ctx.display_path(&dir));
    }

    Ok(())
}
