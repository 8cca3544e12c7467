use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context as _, Result};

pub(crate) fn check_rails_installed(rails: &str) -> Result<bool> {
    let check = Command::new(rails)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    // A missing executable is a plain "no", not a failure to check.
    match check {
        Ok(status) => Ok(status.success()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).context(format!("failed to check if {rails} is installed")),
    }
}

/// Runs `<rails> new <app_name> <arguments...> --template=<template>`.
pub(crate) fn new_app(
    rails: &str,
    app_name: &str,
    arguments: &str,
    template: impl AsRef<Path>,
) -> Result<()> {
    let template = template.as_ref();
    let status = Command::new(rails)
        .arg("new")
        .arg(app_name)
        .args(arguments.split_whitespace())
        .arg(format!("--template={}", template.display()))
        .status()
        .context(format!("failed to execute {rails} new"))?;

    if !status.success() {
        bail!("{rails} new exited with {status}")
    }

    Ok(())
}
