use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use splitbootimg_oxide::{split, FormatVariant, Header, Result};

/// Split an Android boot or recovery image into its sections
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the boot or recovery image
    image: PathBuf,

    /// The image header carries a device-tree size field
    #[arg(short = 'd', long = "dt")]
    device_tree: bool,
}

fn run(args: &Args) -> Result<Vec<PathBuf>> {
    let variant = if args.device_tree {
        FormatVariant::DeviceTree
    } else {
        FormatVariant::Plain
    };

    let header = Header::parse_file(&args.image, variant)?;
    println!("{header}");

    let layout = header.layout();
    let base = args
        .image
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "boot".to_owned());
    split(&args.image, &header, &layout, &base)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if !args.image.exists() {
        eprintln!("Error: {} not found", args.image.display());
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(produced) => {
            for path in produced {
                println!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
