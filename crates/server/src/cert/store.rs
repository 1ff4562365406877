//! Reading and writing the PEM credential pair on disk.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::CertError;

/// Read both files if both exist.
///
/// Returns `Ok(None)` when either file is missing, so the caller can generate
/// a fresh pair.
///
/// # Errors
///
/// Returns [`CertError::Load`] if a file exists but cannot be read.
pub fn read_pair(cert_path: &Path, key_path: &Path) -> Result<Option<(Vec<u8>, Vec<u8>)>, CertError> {
    if !cert_path.exists() || !key_path.exists() {
        return Ok(None);
    }
    let cert = read(cert_path)?;
    let key = read(key_path)?;
    Ok(Some((cert, key)))
}

fn read(path: &Path) -> Result<Vec<u8>, CertError> {
    fs::read(path).map_err(|source| CertError::Load {
        path: path.to_owned(),
        source,
    })
}

/// Persist a generated pair, replacing whatever is at either path.
///
/// The key is written first. If the certificate then fails to write, the key
/// is removed again so the pair is either complete or absent.
///
/// # Errors
///
/// Returns [`CertError::Persist`] naming the path that could not be written.
pub fn write_pair(
    cert_path: &Path,
    cert_pem: &[u8],
    key_path: &Path,
    key_pem: &[u8],
) -> Result<(), CertError> {
    write_file(key_path, key_pem, true)?;
    if let Err(e) = write_file(cert_path, cert_pem, false) {
        if let Err(cleanup) = fs::remove_file(key_path) {
            warn!(path = %key_path.display(), error = %cleanup, "failed to remove orphaned TLS key");
        }
        return Err(e);
    }
    Ok(())
}

/// Write `contents` to a sibling temp file and rename it over `path`.
fn write_file(path: &Path, contents: &[u8], private: bool) -> Result<(), CertError> {
    let persist_err = |source| CertError::Persist {
        path: path.to_owned(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let tmp = tmp_path(path);
    let result = write_new(&tmp, contents, private).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(persist_err)
}

fn write_new(path: &Path, contents: &[u8], private: bool) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if private { 0o600 } else { 0o644 });
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
