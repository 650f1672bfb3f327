use std::{fmt, fs, io, path::Path};

use tracing::{debug, info};
use uuid::Uuid;

/// Random identifier for one client profile. Identifies a browser profile, never a person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn random() -> Self {
        DeviceId(Uuid::new_v4().to_string())
    }

    /// Reads the id stored at `path`, creating and persisting a new one on first use.
    ///
    /// The file is never rotated or removed here.
    pub fn load_or_create(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                debug!(path = %path.display(), "loaded device id");
                return Ok(DeviceId(contents.trim().to_string()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let device_id = Self::random();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &device_id.0)?;
        info!(path = %path.display(), "created device id");
        Ok(device_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId(s.to_string())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_once_then_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile").join("device-id");

        let first = DeviceId::load_or_create(&path).unwrap();
        assert!(Uuid::parse_str(first.as_str()).is_ok());
        assert!(path.exists());

        let second = DeviceId::load_or_create(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device-id");
        fs::write(&path, "\n").unwrap();

        let device_id = DeviceId::load_or_create(&path).unwrap();
        assert!(!device_id.as_str().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), device_id.as_str());
    }

    #[test]
    fn existing_id_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device-id");
        fs::write(&path, "abc-123\n").unwrap();

        assert_eq!(
            DeviceId::load_or_create(&path).unwrap(),
            DeviceId::from("abc-123")
        );
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(DeviceId::random(), DeviceId::random());
    }
}
