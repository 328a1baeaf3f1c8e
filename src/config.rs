use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::foundation::error::{StitchkitError, StitchkitResult};

/// Top-level configuration for both commands.
///
/// Every field is optional in the JSON form; missing fields take the defaults below.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub stitch: StitchConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Endpoint hit once per requested image.
    pub url: String,
    /// Number of GET requests to issue.
    pub count: u32,
    pub out_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: "https://picsum.photos/800/600".to_string(),
            count: 200,
            out_dir: PathBuf::from("data/src"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub output_file: String,
    /// Share of currently available memory the batch estimate may budget, in `(0, 1]`.
    pub memory_fraction: f64,
    /// Recognized file name extensions; a leading dot is optional. Matching is case-sensitive.
    pub extensions: Vec<String>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data/src"),
            dest_dir: PathBuf::from("data/output"),
            output_file: "stitched_image.tif".to_string(),
            memory_fraction: 0.5,
            extensions: vec!["jpg".to_string(), "png".to_string(), "tiff".to_string()],
        }
    }
}

impl StitchConfig {
    pub fn output_path(&self) -> PathBuf {
        self.dest_dir.join(&self.output_file)
    }
}

impl Config {
    pub fn from_reader<R: std::io::Read>(r: R) -> StitchkitResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| StitchkitError::validation(format!("parse config JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> StitchkitResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StitchkitError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> StitchkitResult<()> {
        self.fetch.validate()?;
        self.stitch.validate()
    }
}

impl FetchConfig {
    pub fn validate(&self) -> StitchkitResult<()> {
        if self.url.trim().is_empty() {
            return Err(StitchkitError::validation("fetch url must be non-empty"));
        }
        Ok(())
    }
}

impl StitchConfig {
    pub fn validate(&self) -> StitchkitResult<()> {
        if !(self.memory_fraction > 0.0 && self.memory_fraction <= 1.0) {
            return Err(StitchkitError::validation(format!(
                "memory_fraction must be in (0, 1], got {}",
                self.memory_fraction
            )));
        }
        if self.extensions.is_empty() {
            return Err(StitchkitError::validation(
                "at least one image extension is required",
            ));
        }
        if self.output_file.trim().is_empty() {
            return Err(StitchkitError::validation("output file name must be non-empty"));
        }
        Ok(())
    }
}
