use std::io;
use std::io::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use structopt::StructOpt;

use base::defs::{IntoResult, Result};
use base::fpx;
use base::util::fs;

#[derive(StructOpt)]
#[structopt(about = "Export .fpx file into JSON")]
pub struct ExportToJsonCommand {
    #[structopt(help = "Input .fpx file (STDIN if omitted)")]
    in_path: Option<PathBuf>,

    #[structopt(
        help = "Output JSON file (STDOUT if omitted)",
        long,
        short = "o"
    )]
    out_path: Option<PathBuf>,

    #[structopt(help = "Prettify JSON output", long, short = "p")]
    pretty: bool,
}

impl ExportToJsonCommand {
    pub fn run(&self) -> Result<()> {
        let mut reader = if let Some(path) = &self.in_path {
            fpx::Reader::new(fs::open_file(path)?)?
        } else {
            fpx::Reader::new(io::stdin())?
        };

        let mut writer: Box<dyn io::Write> =
            if let Some(path) = &self.out_path {
                Box::new(fs::create_file(path)?)
            } else {
                Box::new(io::stdout())
            };

        export_to_json(&mut reader, &mut *writer, self.pretty)
    }
}

#[derive(Serialize)]
struct JsonExport {
    faces: Vec<fpx::FacePixels>,
}

pub fn export_to_json(
    reader: &mut dyn fpx::Read,
    writer: &mut dyn io::Write,
    pretty: bool,
) -> Result<()> {
    let mut export = JsonExport { faces: Vec::new() };
    while let Some(face) = reader.read_face()? {
        export.faces.push(face);
    }

    if pretty {
        serde_json::to_writer_pretty(&mut *writer, &export)
    } else {
        serde_json::to_writer(&mut *writer, &export)
    }
    .res(|| "failed to write JSON".to_string())?;

    writeln!(writer).res(|| "failed to write JSON".to_string())
}
