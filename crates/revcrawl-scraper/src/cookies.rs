use std::path::{Path, PathBuf};

use crate::error::ScraperError;
use crate::page::StoredCookie;

/// Cookie set persisted as a JSON array of cookie objects.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cookie set. `Ok(None)` means no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CookieIo`] if the file exists but cannot be read,
    /// or [`ScraperError::CookieParse`] if it is not a JSON cookie array.
    pub fn load(&self) -> Result<Option<Vec<StoredCookie>>, ScraperError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScraperError::CookieIo {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };

        let cookies: Vec<StoredCookie> =
            serde_json::from_str(&content).map_err(|e| ScraperError::CookieParse {
                path: self.path.display().to_string(),
                source: e,
            })?;
        Ok(Some(cookies))
    }

    /// Overwrite the cookie file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CookieIo`] if the file cannot be written.
    pub fn save(&self, cookies: &[StoredCookie]) -> Result<(), ScraperError> {
        let io_err = |source| ScraperError::CookieIo {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(cookies).map_err(|e| ScraperError::CookieParse {
            path: self.path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&self.path, body).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_preserves_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("nested/cookies.json"));
        let mut cookie = StoredCookie::new("session-token", "abc");
        cookie.domain = Some(".amazon.com".to_string());
        cookie.expiry = Some(1_900_000_000);

        store.save(std::slice::from_ref(&cookie)).unwrap();
        assert_eq!(store.load().unwrap(), Some(vec![cookie]));
    }

    #[test]
    fn load_accepts_browser_export_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(
            &path,
            r#"[{"name":"ubid-main","value":"1","domain":".amazon.com","path":"/",
                "secure":true,"httpOnly":false,"expiry":null,"sameSite":"Lax"}]"#,
        )
        .unwrap();

        let cookies = CookieStore::new(&path).load().unwrap().unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].http_only, Some(false));
        assert_eq!(cookies[0].expiry, None);
        assert_eq!(cookies[0].same_site.as_deref(), Some("Lax"));
    }

    #[test]
    fn load_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = CookieStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ScraperError::CookieParse { .. }));
    }
}
