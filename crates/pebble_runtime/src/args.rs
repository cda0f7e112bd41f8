//! Command line: `pebble [--config <file.json>] [--headless <frames>]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const USAGE: &str = "usage: pebble [--config <file.json>] [--headless <frames>]";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    /// Frame count for a windowless run.
    pub headless: Option<u64>,
    pub help: bool,
}

impl Args {
    /// Parse everything after the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a file path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--headless" => {
                    let frames = args.next().context("--headless needs a frame count")?;
                    let frames = frames
                        .parse()
                        .with_context(|| format!("invalid frame count `{frames}`"))?;
                    parsed.headless = Some(frames);
                }
                "--help" | "-h" => parsed.help = true,
                other => bail!("unexpected argument `{other}`\n{USAGE}"),
            }
        }

        Ok(parsed)
    }
}
