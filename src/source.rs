use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::error::{StitchkitError, StitchkitResult};

/// List the images in `folder` whose file names end in `.{ext}` for one of `extensions`,
/// sorted by file name. A leading dot on a configured extension is ignored.
///
/// Subdirectories are skipped even if their names match.
pub fn list_images(folder: &Path, extensions: &[String]) -> StitchkitResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("read source folder '{}'", folder.display()))?;

    let mut named: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", folder.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?;
        if file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if has_recognized_extension(&name, extensions) {
            named.push((name, entry.path()));
        }
    }

    named.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(named.into_iter().map(|(_, p)| p).collect())
}

/// Like [`list_images`], but an empty result is an error.
pub fn require_images(folder: &Path, extensions: &[String]) -> StitchkitResult<Vec<PathBuf>> {
    let images = list_images(folder, extensions)?;
    if images.is_empty() {
        return Err(StitchkitError::EmptySource(folder.to_path_buf()));
    }
    Ok(images)
}

pub fn has_recognized_extension(name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.');
        !ext.is_empty()
            && name
                .strip_suffix(ext)
                .is_some_and(|stem| stem.ends_with('.'))
    })
}

fn open_reader(path: &Path) -> StitchkitResult<image::ImageReader<BufReader<File>>> {
    image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniff format of '{}'", path.display()))
        .map_err(Into::into)
}

/// Read width and height from the image header without decoding pixels.
///
/// The format is sniffed from the file contents, so a JPEG saved as `.tiff` still works.
pub fn image_dimensions(path: &Path) -> StitchkitResult<(u32, u32)> {
    open_reader(path)?.into_dimensions().map_err(|e| {
        StitchkitError::image(format!("read dimensions of '{}': {e}", path.display()))
    })
}

/// Decode a whole image, sniffing the format like [`image_dimensions`].
pub fn decode_image(path: &Path) -> StitchkitResult<image::DynamicImage> {
    open_reader(path)?
        .decode()
        .map_err(|e| StitchkitError::image(format!("decode '{}': {e}", path.display())))
}
