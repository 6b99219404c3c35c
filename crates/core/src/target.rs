//! What gets uploaded: a file on disk or an in-memory buffer

use crate::error::{Error, Result};
use crate::form::FileBody;
use std::path::{Path, PathBuf};

/// Source of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// A local file, streamed from disk under its own file name
    Path(PathBuf),
    /// Raw bytes sent under an explicit file name
    Bytes { data: Vec<u8>, file_name: String },
}

impl UploadTarget {
    /// Upload a local file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        UploadTarget::Path(path.into())
    }

    /// Upload a byte buffer. The service needs a file name to pick the
    /// extension of the hosted file, so `None` is rejected.
    pub fn bytes(data: impl Into<Vec<u8>>, file_name: Option<&str>) -> Result<Self> {
        let file_name = file_name.ok_or_else(|| {
            Error::InvalidArgument("A file name is required when uploading raw bytes".to_string())
        })?;

        Ok(UploadTarget::Bytes {
            data: data.into(),
            file_name: file_name.to_string(),
        })
    }

    /// File name sent with the `fileToUpload` part
    pub fn file_name(&self) -> Result<String> {
        match self {
            UploadTarget::Path(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "Path has no usable file name: {}",
                        path.display()
                    ))
                }),
            UploadTarget::Bytes { file_name, .. } => {
                if file_name.trim().is_empty() {
                    Err(Error::InvalidArgument(
                        "A file name is required when uploading raw bytes".to_string(),
                    ))
                } else {
                    Ok(file_name.clone())
                }
            }
        }
    }

    /// Check the target and turn it into a part body. Path targets are
    /// opened lazily by the transport; only their metadata is read here.
    pub(crate) async fn resolve(self) -> Result<(String, FileBody)> {
        let file_name = self.file_name()?;

        let body = match self {
            UploadTarget::Path(path) => {
                let metadata = tokio::fs::metadata(&path).await?;
                if !metadata.is_file() {
                    return Err(Error::InvalidArgument(format!(
                        "Not a regular file: {}",
                        path.display()
                    )));
                }
                FileBody::File {
                    path,
                    len: metadata.len(),
                }
            }
            UploadTarget::Bytes { data, .. } => FileBody::Bytes(data),
        };

        Ok((file_name, body))
    }
}

impl From<&Path> for UploadTarget {
    fn from(path: &Path) -> Self {
        UploadTarget::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for UploadTarget {
    fn from(path: PathBuf) -> Self {
        UploadTarget::Path(path)
    }
}
