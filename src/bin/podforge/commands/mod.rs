//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod def;
pub mod doctor;
pub mod sync;
pub mod targets;

use std::io::IsTerminal;

use anyhow::Result;

use crate::cli::{GlobalOpts, MessageFormat};
use podforge::builder::events::{EventSink, JsonLinesSink, NullSink};
use podforge::builder::executor::BuildReport;
use podforge::core::Project;
use podforge::ops::podforge_build::{build, BuildOptions};
use podforge::util::config::{CocoapodsConfig, Config};
use podforge::util::process::SystemRunner;
use podforge::util::GlobalContext;

pub fn context(opts: &GlobalOpts) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(opts.verbose);
    ctx.set_color(opts.color);
    Ok(ctx)
}

/// Configuration layer made of CLI flags.
pub fn overrides(opts: &GlobalOpts) -> Config {
    Config {
        cocoapods: CocoapodsConfig {
            xcodebuild: opts.xcodebuild.clone(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn load_project(opts: &GlobalOpts) -> Result<Project> {
    let ctx = context(opts)?;
    Project::load(&ctx, overrides(opts))
}

/// Progress bars only make sense for humans watching a terminal.
pub fn show_progress(opts: &GlobalOpts) -> bool {
    opts.message_format == MessageFormat::Human
        && !opts.quiet
        && !opts.verbose
        && std::io::stderr().is_terminal()
}

/// Run a build with the real toolchain and print the summary line.
pub fn run_build(project: &Project, build_opts: &BuildOptions, opts: &GlobalOpts) -> Result<BuildReport> {
    let sink: &dyn EventSink = match opts.message_format {
        MessageFormat::Json => &JsonLinesSink,
        MessageFormat::Human => &NullSink,
    };

    let report = build(project, build_opts, &SystemRunner, sink)?;

    if opts.message_format == MessageFormat::Human && !opts.quiet {
        eprintln!(
            "    Finished {} step(s) in {:.2}s",
            report.steps.len(),
            report.duration.as_secs_f64()
        );
    }

    Ok(report)
}
