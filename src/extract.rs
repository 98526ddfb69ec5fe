//! Dumps the sections of a boot image into separate artifact files.

use std::{
    fs::{self, File},
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;

use crate::{
    err::{Error, Result},
    Header, Layout,
};

/// Copies the `size` bytes at `offset` inside `image` into a new file at
/// `out`, creating or truncating it.
pub fn dump_section(image: &Path, offset: u64, size: u32, out: &Path) -> Result<()> {
    let mut input = File::open(image).map_err(|e| Error::io(image, e))?;
    input
        .seek(SeekFrom::Start(offset))
        .map_err(|e| Error::io(image, e))?;

    let mut section = vec![0u8; size as usize];
    input
        .read_exact(&mut section)
        .map_err(|e| Error::io(image, e))?;
    fs::write(out, &section).map_err(|e| Error::io(out, e))?;
    Ok(())
}

/// Inflates the gzip file at `src` into `dst`.
///
/// `src` is left in place whether or not inflation succeeds.
pub fn gunzip_file(src: &Path, dst: &Path) -> Result<()> {
    let input = File::open(src).map_err(|e| Error::io(src, e))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));

    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| Error::Decompression {
            path: src.to_owned(),
            source: e,
        })?;
    fs::write(dst, &inflated).map_err(|e| Error::io(dst, e))?;
    Ok(())
}

/// Extracts every present section of `image`.
///
/// Artifact names are derived by suffixing `base`: `<base>-kernel`,
/// `<base>-ramdisk.gz` plus its inflated `<base>-ramdisk`, and, when their
/// declared sizes are nonzero, `<base>-second.gz` and `<base>-dt.img`.
/// Returns the paths written, in production order.
pub fn split(image: &Path, header: &Header, layout: &Layout, base: &str) -> Result<Vec<PathBuf>> {
    let mut produced = Vec::new();

    // The kernel and ramdisk are structural, emitted even when empty.
    let kernel = PathBuf::from(format!("{base}-kernel"));
    dump_section(image, layout.kernel_offset, header.kernel_size, &kernel)?;
    produced.push(kernel);

    let ramdisk_gz = PathBuf::from(format!("{base}-ramdisk.gz"));
    let ramdisk = PathBuf::from(format!("{base}-ramdisk"));
    dump_section(image, layout.ramdisk_offset, header.ramdisk_size, &ramdisk_gz)?;
    // The compressed dump stays on disk even when inflation fails.
    gunzip_file(&ramdisk_gz, &ramdisk)?;
    produced.push(ramdisk_gz);
    produced.push(ramdisk);

    if header.second_size != 0 {
        // Named .gz for historical reasons, never inflated.
        let second = PathBuf::from(format!("{base}-second.gz"));
        dump_section(image, layout.second_offset, header.second_size, &second)?;
        produced.push(second);
    }

    if header.device_tree_size != 0 {
        let dt = PathBuf::from(format!("{base}-dt.img"));
        dump_section(
            image,
            layout.device_tree_offset,
            header.device_tree_size,
            &dt,
        )?;
        produced.push(dt);
    }

    Ok(produced)
}
