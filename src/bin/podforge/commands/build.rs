//! `podforge build` command

use anyhow::Result;

use crate::cli::{BuildArgs, GlobalOpts};
use podforge::ops::podforge_build::{plan, select_steps, BuildOptions};

pub fn execute(args: BuildArgs, opts: &GlobalOpts) -> Result<()> {
    let project = super::load_project(opts)?;

    let build_opts = BuildOptions {
        targets: args.target,
        sync: args.sync,
        sync_only: false,
        jobs: args.jobs,
        // Absent flag falls back to [build] keep-going
        keep_going: args.keep_going.then_some(true),
        progress: super::show_progress(opts),
    };

    if args.plan {
        let (_, plan) = plan(&project)?;
        let selected = select_steps(&plan, &build_opts)?;
        println!("{}", serde_json::to_string_pretty(&plan.to_json(&selected)?)?);
        return Ok(());
    }

    super::run_build(&project, &build_opts, opts)?;
    Ok(())
}
