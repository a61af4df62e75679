use std::path::PathBuf;

use directories::BaseDirs;
use tracing::warn;

/// Per-application data directory, falling back to `/tmp/<app_name>` when the
/// platform has no well-known base directories (e.g. a minimal container).
pub fn local_share_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    let Some(base_dirs) = BaseDirs::new() else {
        warn!("couldn't find basedirs, storing data in /tmp/<app_name>");
        return PathBuf::from(format!("/tmp/{}", app_name.as_ref()));
    };
    base_dirs.data_dir().join(app_name.as_ref())
}

pub fn data_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    local_share_dir(app_name).join("data")
}

pub fn logs_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    local_share_dir(app_name).join("logs")
}
