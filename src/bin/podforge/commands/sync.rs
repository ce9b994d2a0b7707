//! `podforge sync` command

use anyhow::Result;

use crate::cli::{GlobalOpts, MessageFormat, SyncArgs};
use podforge::builder::BuildContext;
use podforge::ops::podforge_build::BuildOptions;

pub fn execute(args: SyncArgs, opts: &GlobalOpts) -> Result<()> {
    let project = super::load_project(opts)?;

    let build_opts = BuildOptions {
        sync: Some(args.target.clone()),
        sync_only: true,
        jobs: args.jobs,
        progress: super::show_progress(opts),
        ..Default::default()
    };

    super::run_build(&project, &build_opts, opts)?;

    if opts.message_format == MessageFormat::Human && !opts.quiet {
        let ctx = BuildContext::new(&project);
        eprintln!(
            "      Synced `{}` -> {}",
            args.target,
            ctx.display_path(&ctx.sync_dest())
        );
    }

    Ok(())
}
