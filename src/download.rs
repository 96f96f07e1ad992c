use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Method;
use reqwest::header::CONTENT_DISPOSITION;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::Client;
use crate::error::{GridError, Result};
use crate::response::stream_into;
use crate::util::filename_from_content_disposition;

/// A file written by [`Client::download_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl Client {
    /// Downloads export file `pk` into `dir`, naming it after the server's
    /// `Content-Disposition` header.
    ///
    /// The body is streamed into a temporary file in `dir` first; the temporary
    /// file is removed if the request fails or the header is missing.
    pub fn download_file(&self, pk: i64, dir: &Path) -> Result<DownloadedFile> {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| GridError::io(format!("failed to create directory {}", dir.display()), e))?;

        let request = self.request(Method::GET, &format!("export/download/file/{pk}/"))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| GridError::io(format!("failed to create a file in {}", dir.display()), e))?;

        let pb = self.progress.then(progress_bar);
        let streamed = stream_into(self.transport.send(request), &mut tmp, pb.as_ref());
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let (headers, bytes) = streamed?;

        let disposition = headers
            .get(CONTENT_DISPOSITION)
            .ok_or_else(|| {
                GridError::Deserialize(format!(
                    "download of file {pk} has no Content-Disposition header"
                ))
            })?
            .to_str()
            .map_err(|e| GridError::Deserialize(format!("unreadable Content-Disposition: {e}")))?;
        let filename = filename_from_content_disposition(disposition).ok_or_else(|| {
            GridError::Deserialize(format!("malformed Content-Disposition header {disposition:?}"))
        })?;

        let target = dir.join(&filename);
        tmp.persist(&target).map_err(|e| {
            GridError::io(format!("failed to move download to {}", target.display()), e.error)
        })?;

        tracing::info!(pk, path = %target.display(), bytes, "downloaded export file");
        Ok(DownloadedFile {
            path: target,
            bytes,
        })
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
    )
    .map(|s| s.progress_chars("=>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_for, mock_server};
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn file_is_named_after_content_disposition() -> Result<()> {
        let server = mock_server();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/export/download/file/31/")
                .query_param("source", "KEY");
            then.status(200)
                .header("content-type", "application/octet-stream")
                .header("content-disposition", r#"attachment; filename="tile_31.laz""#)
                .body("LASF-bytes");
        });

        let dir = TempDir::new().expect("tempdir");
        let file = client_for(&server).download_file(31, dir.path())?;
        mock.assert();

        assert_eq!(file.path, dir.path().join("tile_31.laz"));
        assert_eq!(file.bytes, 10);
        assert_eq!(std::fs::read(&file.path).expect("read"), b"LASF-bytes");
        assert_eq!(entries(dir.path()), vec!["tile_31.laz".to_string()]);
        Ok(())
    }

    #[test]
    fn missing_content_disposition_is_a_decode_error() {
        let server = mock_server();
        server.mock(|when, then| {
            when.method("GET").path("/export/download/file/32/");
            then.status(200)
                .header("content-type", "application/octet-stream")
                .body("bytes");
        });

        let dir = TempDir::new().expect("tempdir");
        let err = client_for(&server)
            .download_file(32, dir.path())
            .expect_err("must fail");
        assert!(matches!(err, GridError::Deserialize(_)), "{err:?}");
        assert!(entries(dir.path()).is_empty(), "temporary file must not linger");
    }

    #[test]
    fn http_failure_writes_nothing() {
        let server = mock_server();
        server.mock(|when, then| {
            when.method("GET").path("/export/download/file/33/");
            then.status(403).body("Forbidden");
        });

        let dir = TempDir::new().expect("tempdir");
        let err = client_for(&server)
            .download_file(33, dir.path())
            .expect_err("must fail");
        assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn json_error_body_is_an_application_failure() {
        let server = mock_server();
        server.mock(|when, then| {
            when.method("GET").path("/export/download/file/34/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"error":"File is not ready"}"#);
        });

        let dir = TempDir::new().expect("tempdir");
        let err = client_for(&server)
            .download_file(34, dir.path())
            .expect_err("must fail");
        assert!(matches!(err, GridError::Application { .. }));
    }
}
