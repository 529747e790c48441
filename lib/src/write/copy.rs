use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Chainable, Result};

/// Makes `dst` a copy of the regular file `src`.
///
/// A hard link is tried first. If linking fails for any reason the bytes are
/// copied instead and synced to storage before returning. If `src` and `dst`
/// already refer to the same file, nothing is done, so copying twice to the
/// same destination is idempotent.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let source = fs::metadata(src).chain_with(|| error! {
        "failed to stat copy source",
        "path" => src.display(),
    })?;

    if !source.is_file() {
        return err! {
            "non-regular source file",
            "path" => src.display(),
            "type" => file_type_name(&source),
        };
    }

    match fs::metadata(dst) {
        Ok(destination) if !destination.is_file() => return err! {
            "non-regular destination file",
            "path" => dst.display(),
            "type" => file_type_name(&destination),
        },
        Ok(destination) if same_file(src, &source, dst, &destination) => return Ok(()),
        Ok(_) => {},
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => return Err(e).chain(error! {
            "failed to stat copy destination",
            "path" => dst.display(),
        }),
    }

    if let Err(e) = fs::hard_link(src, dst) {
        tracing::trace!(src = %src.display(), "hard link failed, copying: {e}");
        copy_contents(src, dst).chain_with(|| error! {
            "failed to copy file",
            "from" => src.display(),
            "to" => dst.display(),
        })?;
    }

    Ok(())
}

/// Replaces the contents of `dst`, creating it if needed, with those of
/// `src`, then flushes `dst` to storage.
fn copy_contents(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dst)?);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

#[cfg(unix)]
fn same_file(_: &Path, a: &Metadata, _: &Path, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(a: &Path, _: &Metadata, b: &Path, _: &Metadata) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_type_name(metadata: &Metadata) -> &'static str {
    let kind = metadata.file_type();
    if kind.is_dir() {
        "directory"
    } else if kind.is_symlink() {
        "symlink"
    } else if kind.is_file() {
        "file"
    } else {
        "special"
    }
}
