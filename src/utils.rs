use log::info;
use std::io;
use std::path::Path;
use tokio::fs;

/// Creates `path` (and parents) if it does not exist yet. Idempotent.
pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating directory: {}", path.display());
            fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}
