//! `podforge doctor` command

use anyhow::Result;

use crate::cli::{DoctorArgs, GlobalOpts};
use podforge::ops::{doctor, format_report, DoctorOptions};

pub fn execute(_args: DoctorArgs, opts: &GlobalOpts) -> Result<()> {
    let ctx = super::context(opts)?;
    let options = DoctorOptions {
        overrides: super::overrides(opts),
    };

    let report = doctor(&ctx, options)?;
    print!("{}", format_report(&report, ctx.is_verbose()));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
