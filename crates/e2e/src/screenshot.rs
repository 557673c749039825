//! Checkpoint screenshots

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::driver::BrowserSession;

/// Writes checkpoint screenshots into one directory.
///
/// Files are named `<test>_<checkpoint>_<YYYYMMDD_HHMMSS>.png`, so repeated
/// runs never clobber each other (unless started within the same second).
#[derive(Debug, Clone)]
pub struct ScreenshotRecorder {
    dir: PathBuf,
}

impl ScreenshotRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, test_name: &str, checkpoint: &str, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.png",
            sanitize(test_name),
            sanitize(checkpoint),
            at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Capture the current page. Failures are logged and yield `None`; a
    /// missing screenshot never fails the scenario.
    pub async fn capture<S: BrowserSession>(
        &self,
        session: &S,
        test_name: &str,
        checkpoint: &str,
    ) -> Option<PathBuf> {
        let path = self.path_for(test_name, checkpoint, Local::now());

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Could not create screenshot dir {}: {}", self.dir.display(), e);
            return None;
        }

        match session.screenshot(&path).await {
            Ok(()) if path.exists() => {
                debug!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Ok(()) => {
                warn!("Screenshot not written to {}", path.display());
                None
            }
            Err(e) => {
                warn!("Error taking screenshot '{}': {}", checkpoint, e);
                None
            }
        }
    }
}

fn sanitize(name: &str) -> String {
    name.replace(['/', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_path_naming() {
        let recorder = ScreenshotRecorder::new("screenshots");
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            recorder.path_for("test_1_login", "login page", at),
            PathBuf::from("screenshots/test_1_login_login_page_20240309_140507.png")
        );
        assert_eq!(
            recorder.path_for("suite/test a", "x", at),
            PathBuf::from("screenshots/suite_test_a_x_20240309_140507.png")
        );
    }
}
