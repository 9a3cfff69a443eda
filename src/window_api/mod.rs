//! Contains logic for extracting the focused application and the website it shows from different
//! environments. [GenericWindowManager] and [GenericDomainExtractor] are the main artifacts of
//! this module that abstract the operations.

pub mod domain;
#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "win")]
pub mod win_domain;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::{path::Path, sync::Arc};

use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindowData {
    /// Name of the process without extension. For example 'chrome' or 'nvim'
    pub process_name: Arc<str>,
    /// Full path to an executable. For example /usr/bin/nvim
    pub process_path: Arc<str>,
    pub process_id: u32,
}

impl ActiveWindowData {
    /// Fills in the name from an executable path.
    pub fn from_path(process_path: &str, process_id: u32) -> Self {
        Self {
            process_name: process_name_from_path(process_path).into(),
            process_path: process_path.into(),
            process_id,
        }
    }
}

/// Converts `C:\Program Files\app.exe` or `/usr/bin/app` into `app`.
pub fn process_name_from_path(path: &str) -> String {
    // Windows paths have to be handled on every platform, so both separators are accepted.
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = Path::new(file_name)
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    if stem.is_empty() {
        path.to_string()
    } else {
        stem
    }
}

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    /// Retrieves the process owning the focused window. `None` when nothing has focus, for
    /// example on the lock screen.
    fn get_active_window_data(&mut self) -> Result<Option<ActiveWindowData>>;

    /// Retrieve amount of time user has been inactive in milliseconds
    fn get_idle_time(&mut self) -> Result<u32>;
}

/// Reads the website shown by a focused browser.
#[cfg_attr(test, mockall::automock)]
pub trait DomainExtractor {
    /// Returns the normalized domain of the page the browser shows, see
    /// [domain::normalize_domain].
    fn get_current_domain(&mut self, process_name: &str) -> Result<Option<String>>;
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowManager;
                Ok(Self {
                    inner: Box::new(WindowsWindowManager::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Ok(Self {
                    inner: Box::new(LinuxWindowManager::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No window manager was specified, build with the `win` or `x11` feature"
                ))
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window_data(&mut self) -> Result<Option<ActiveWindowData>> {
        self.inner.get_active_window_data()
    }

    fn get_idle_time(&mut self) -> Result<u32> {
        self.inner.get_idle_time()
    }
}

/// Extractor used where reading browser address bars isn't supported.
pub struct NoDomainExtractor;

impl DomainExtractor for NoDomainExtractor {
    fn get_current_domain(&mut self, _process_name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Serves as a cross-compatible DomainExtractor implementation.
pub struct GenericDomainExtractor {
    inner: Box<dyn DomainExtractor>,
}

impl GenericDomainExtractor {
    pub fn new() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                match win_domain::WindowsDomainExtractor::new() {
                    Ok(extractor) => Self { inner: Box::new(extractor) },
                    Err(e) => {
                        tracing::error!("UI Automation is unavailable, websites won't be tracked {e:?}");
                        Self { inner: Box::new(NoDomainExtractor) }
                    }
                }
            }
            else {
                Self { inner: Box::new(NoDomainExtractor) }
            }
        }
    }
}

impl Default for GenericDomainExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainExtractor for GenericDomainExtractor {
    fn get_current_domain(&mut self, process_name: &str) -> Result<Option<String>> {
        self.inner.get_current_domain(process_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{process_name_from_path, ActiveWindowData, DomainExtractor, NoDomainExtractor};

    #[test]
    fn test_process_name_from_path() {
        assert_eq!(
            process_name_from_path("C:\\Program Files\\Google\\Chrome\\chrome.exe"),
            "chrome"
        );
        assert_eq!(process_name_from_path("/usr/bin/nvim"), "nvim");
        assert_eq!(process_name_from_path("firefox"), "firefox");
        assert_eq!(process_name_from_path("/opt/app.v2/run.sh"), "run");
    }

    #[test]
    fn test_active_window_from_path() {
        let data = ActiveWindowData::from_path("/usr/lib/firefox/firefox", 42);
        assert_eq!(&*data.process_name, "firefox");
        assert_eq!(&*data.process_path, "/usr/lib/firefox/firefox");
        assert_eq!(data.process_id, 42);
    }

    #[test]
    fn test_no_domain_extractor() {
        assert_eq!(
            NoDomainExtractor.get_current_domain("chrome").unwrap(),
            None
        );
    }
}
