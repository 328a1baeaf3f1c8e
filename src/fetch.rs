use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    config::FetchConfig,
    foundation::error::{StitchkitError, StitchkitResult},
};

/// Status code and full body of one GET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that answers a GET for a URL.
///
/// A non-success status is a normal return; only transport failures are errors.
pub trait ImageSource {
    fn get(&self, url: &str) -> StitchkitResult<FetchedBody>;
}

/// Blocking HTTP source backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageSource for HttpSource {
    fn get(&self, url: &str) -> StitchkitResult<FetchedBody> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| StitchkitError::fetch(format!("GET {url}: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| StitchkitError::fetch(format!("read body of {url}: {e}")))?;
        Ok(FetchedBody {
            status,
            body: body.to_vec(),
        })
    }
}

/// `image_{index}.tiff`; indices start at 1.
pub fn image_file_name(index: u32) -> String {
    format!("image_{index}.tiff")
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub requested: u32,
    pub written: Vec<PathBuf>,
    /// `(index, status)` of every response that was not a 200.
    pub skipped: Vec<(u32, u16)>,
}

pub struct Fetcher<S> {
    source: S,
    cfg: FetchConfig,
}

impl<S: ImageSource> Fetcher<S> {
    pub fn new(source: S, cfg: FetchConfig) -> StitchkitResult<Self> {
        cfg.validate()?;
        Ok(Self { source, cfg })
    }

    /// Issue `count` sequential GETs and save every 200 body verbatim.
    #[tracing::instrument(skip(self), fields(url = %self.cfg.url, count = self.cfg.count))]
    pub fn run(&self) -> StitchkitResult<FetchReport> {
        std::fs::create_dir_all(&self.cfg.out_dir).with_context(|| {
            format!("create download folder '{}'", self.cfg.out_dir.display())
        })?;

        let mut report = FetchReport {
            requested: self.cfg.count,
            ..FetchReport::default()
        };

        for index in 1..=self.cfg.count {
            let fetched = self.source.get(&self.cfg.url)?;
            if fetched.status != 200 {
                tracing::debug!(index, status = fetched.status, "skipping response");
                report.skipped.push((index, fetched.status));
                continue;
            }

            let path = self.cfg.out_dir.join(image_file_name(index));
            std::fs::write(&path, &fetched.body)
                .with_context(|| format!("write '{}'", path.display()))?;
            report.written.push(path);
        }

        tracing::info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            "finished downloading images"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Scripted {
        statuses: Vec<u16>,
        calls: Cell<usize>,
    }

    impl ImageSource for Scripted {
        fn get(&self, _url: &str) -> StitchkitResult<FetchedBody> {
            let i = self.calls.get();
            self.calls.set(i + 1);
            Ok(FetchedBody {
                status: self.statuses[i % self.statuses.len()],
                body: vec![i as u8; 3],
            })
        }
    }

    struct Unreachable;

    impl ImageSource for Unreachable {
        fn get(&self, url: &str) -> StitchkitResult<FetchedBody> {
            Err(StitchkitError::fetch(format!("GET {url}: connection refused")))
        }
    }

    fn cfg(name: &str, count: u32) -> FetchConfig {
        FetchConfig {
            url: "http://example.invalid/img".to_string(),
            count,
            out_dir: std::env::temp_dir()
                .join(format!("stitchkit_fetch_{name}_{}", std::process::id())),
        }
    }

    #[test]
    fn file_names_are_one_based_tiff() {
        assert_eq!(image_file_name(1), "image_1.tiff");
        assert_eq!(image_file_name(200), "image_200.tiff");
    }

    #[test]
    fn non_200_responses_are_skipped() {
        let cfg = cfg("skip", 4);
        let source = Scripted {
            statuses: vec![200, 404, 200, 503],
            calls: Cell::new(0),
        };
        let fetcher = Fetcher::new(source, cfg.clone()).unwrap();
        let report = fetcher.run().unwrap();

        assert_eq!(fetcher.source.calls.get(), 4);
        assert_eq!(report.requested, 4);
        assert_eq!(
            report.written,
            [cfg.out_dir.join("image_1.tiff"), cfg.out_dir.join("image_3.tiff")]
        );
        assert_eq!(report.skipped, [(2, 404), (4, 503)]);
        assert_eq!(std::fs::read(&report.written[1]).unwrap(), [2u8, 2, 2]);
        assert!(!cfg.out_dir.join("image_2.tiff").exists());

        std::fs::remove_dir_all(&cfg.out_dir).ok();
    }

    #[test]
    fn transport_errors_propagate() {
        let cfg = cfg("unreachable", 2);
        let err = Fetcher::new(Unreachable, cfg.clone()).unwrap().run().unwrap_err();
        assert!(matches!(err, StitchkitError::Fetch(_)));
        std::fs::remove_dir_all(&cfg.out_dir).ok();
    }

    #[test]
    fn zero_count_downloads_nothing() {
        let cfg = cfg("zero", 0);
        let report = Fetcher::new(Unreachable, cfg.clone()).unwrap().run().unwrap();
        assert_eq!(report.requested, 0);
        assert!(report.written.is_empty());
        assert!(report.skipped.is_empty());
        std::fs::remove_dir_all(&cfg.out_dir).ok();
    }
}
