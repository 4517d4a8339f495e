use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use structopt::StructOpt;

use motviz::convert::{Converter, ReconcileConfig};
use motviz::MotionTable;

mod descriptor;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "motviz",
    about = "converts a skeletal model + motion file into visualizer JSON"
)]
struct Opt {
    /// Model descriptor (json)
    #[structopt(parse(from_os_str))]
    model: PathBuf,

    /// Motion file (.mot)
    #[structopt(parse(from_os_str))]
    motion: PathBuf,

    /// Output JSON path
    #[structopt(parse(from_os_str))]
    output: PathBuf,

    /// Reconciliation overrides (toml)
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Treat rotational values as degrees regardless of the file header
    #[structopt(long)]
    degrees: bool,

    /// Treat rotational values as radians regardless of the file header
    #[structopt(long, conflicts_with = "degrees")]
    radians: bool,

    /// Vertical offset subtracted from pelvis_ty
    #[structopt(long)]
    vertical_offset: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();

    let opt = Opt::from_args();

    let model =
        descriptor::ChainModel::from_path(&opt.model).context("failed to load model")?;
    let table = MotionTable::from_path(&opt.motion).context("failed to parse motion file")?;
    info!(
        "{} usable frame(s), {} dropped, {} column(s)",
        table.rows.len(),
        table.dropped_rows,
        table.column_names.len()
    );

    let mut config = ReconcileConfig::default();
    if let Some(path) = &opt.config {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let overrides: descriptor::Config =
            toml::from_str(&data).context("failed to parse config file")?;
        overrides.apply(&mut config);
    }
    if opt.degrees {
        config.degrees = Some(true);
    }
    if opt.radians {
        config.degrees = Some(false);
    }
    if opt.vertical_offset.is_some() {
        config.vertical_offset = opt.vertical_offset;
    }

    let converter = Converter::new(&model, config);
    let document = converter.convert(&table)?;

    let file = fs::File::create(&opt.output)
        .with_context(|| format!("failed to create {}", opt.output.display()))?;
    document.write(BufWriter::new(file))?;
    info!(
        "wrote {} frame(s) to {}",
        document.frames.len(),
        opt.output.display()
    );

    Ok(())
}
