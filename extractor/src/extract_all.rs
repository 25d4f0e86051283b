use std::fs::read_dir;
use std::path::PathBuf;

use log::{error, info};
use structopt::StructOpt;

use base::defs::{IntoResult, Result};
use base::fpx;

use crate::misc::{
    check_dir_exists, extract_mesh_file, mesh_file_extension, MESH_EXTENSIONS,
};

#[derive(StructOpt)]
#[structopt(about = "Extract per-face texture pixels from all mesh files \
    in a directory")]
pub struct ExtractAllCommand {
    #[structopt(
        help = "Input directory with mesh files",
        long,
        short = "i",
        default_value = "."
    )]
    in_dir: PathBuf,

    #[structopt(
        help = "Texture image for the next texture number, in order",
        long,
        number_of_values = 1,
        short = "t"
    )]
    textures: Vec<PathBuf>,

    #[structopt(
        help = "Output directory",
        long,
        short = "o",
        default_value = "."
    )]
    out_dir: PathBuf,

    #[structopt(flatten)]
    writer_params: fpx::WriterParams,
}

impl ExtractAllCommand {
    pub fn run(&self) -> Result<()> {
        check_dir_exists(&self.in_dir)?;
        check_dir_exists(&self.out_dir)?;

        let mut paths = Vec::new();
        let entries = read_dir(&self.in_dir).res(|| {
            format!("failed to read directory '{}'", self.in_dir.display())
        })?;
        for entry in entries {
            let entry = entry.res(|| {
                format!("failed to read directory '{}'", self.in_dir.display())
            })?;
            let path = entry.path();
            let ext = mesh_file_extension(&path);
            if path.is_file() && MESH_EXTENSIONS.contains(&ext.as_str()) {
                paths.push(path);
            }
        }
        paths.sort();

        // A failing mesh file must not abort the batch.
        let mut num_failed = 0;
        for path in &paths {
            if let Err(err) = extract_mesh_file(
                path,
                &self.textures,
                &self.out_dir,
                &self.writer_params,
            ) {
                error!("failed to process '{}': {}", path.display(), err);
                num_failed += 1;
            }
        }

        info!(
            "processed {} mesh files, {} failed",
            paths.len(),
            num_failed
        );

        Ok(())
    }
}
