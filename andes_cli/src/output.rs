use clap::Args;
use simple_eyre::{eyre::eyre, Result};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Args)]
pub struct Output {
    /// Path to a file where the result should be stored, printed to stdout when missing
    #[clap(short, long, value_parser = unique_path_parser, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

fn unique_path_parser(p: &str) -> Result<PathBuf> {
    let p = Path::new(p);
    if p.try_exists()? {
        Err(eyre!("Path {p:?} already exists"))
    } else {
        Ok(p.to_path_buf())
    }
}

/// Returns std::io::Write stream with coloring enabled if program is run interactively
fn get_stdout() -> StandardStream {
    StandardStream::stdout(if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

impl Output {
    /// Writes titled sections, titles are colored on an interactive terminal
    pub fn write_sections(&self, sections: &[(&str, String)]) -> Result<()> {
        match &self.output {
            Some(path) => {
                log::debug!("Saving result to {:?}", path);
                let mut out = File::create(path)?;
                for (title, body) in sections {
                    writeln!(&mut out, "{}\n{}\n", title, body)?;
                }
            }
            None => {
                let mut stdout = get_stdout();
                for (title, body) in sections {
                    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    writeln!(&mut stdout, "{}", title)?;
                    stdout.reset()?;
                    writeln!(&mut stdout, "{}\n", body)?;
                }
            }
        }
        Ok(())
    }
}
