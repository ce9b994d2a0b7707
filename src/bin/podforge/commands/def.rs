//! `podforge def` command

use anyhow::Result;

use crate::cli::{DefArgs, GlobalOpts};
use podforge::ops::render_def;

pub fn execute(args: DefArgs, opts: &GlobalOpts) -> Result<()> {
    let project = super::load_project(opts)?;
    print!("{}", render_def(&project, &args.module, args.target.as_deref())?);
    Ok(())
}
