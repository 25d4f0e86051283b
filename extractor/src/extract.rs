use std::path::PathBuf;

use structopt::StructOpt;

use base::defs::Result;
use base::fpx;

use crate::misc::{check_dir_exists, extract_mesh_file};

#[derive(StructOpt)]
#[structopt(about = "Extract per-face texture pixels from a mesh file")]
pub struct ExtractCommand {
    #[structopt(help = "Input mesh file (.ply or .obj)")]
    mesh_path: PathBuf,

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

impl ExtractCommand {
    pub fn run(&self) -> Result<()> {
        check_dir_exists(&self.out_dir)?;
        extract_mesh_file(
            &self.mesh_path,
            &self.textures,
            &self.out_dir,
            &self.writer_params,
        )?;
        Ok(())
    }
}
