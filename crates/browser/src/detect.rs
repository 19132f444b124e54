//! Locating a Chromium binary on the host.

use std::path::{Path, PathBuf};

/// Names looked up on `PATH`, most specific first.
const PATH_NAMES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
    "chrome",
    "headless_shell",
    "microsoft-edge-stable",
    "microsoft-edge",
    "msedge",
];

/// Well-known install locations outside `PATH`.
#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];
#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INSTALL_LOCATIONS: &[&str] = &["/usr/lib/chromium/chromium", "/opt/google/chrome/chrome"];

/// Environment variable that may point at the browser binary.
pub const CHROME_ENV: &str = "CHROME";

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub found: bool,
    pub path: Option<PathBuf>,
    /// How to install a browser; empty when one was found.
    pub install_hint: String,
}

/// Find a browser binary.
///
/// The configured path wins, then `$CHROME`, then the platform's usual
/// install locations, then a `PATH` lookup. Candidates that do not exist
/// are skipped.
pub fn detect_browser(configured: Option<&str>) -> DetectionResult {
    let from_env = std::env::var(CHROME_ENV).ok();
    let explicit = configured
        .into_iter()
        .chain(from_env.as_deref())
        .chain(INSTALL_LOCATIONS.iter().copied())
        .map(Path::new)
        .find(|path| path.is_file())
        .map(Path::to_path_buf);

    let path = explicit.or_else(|| PATH_NAMES.iter().find_map(|name| which::which(name).ok()));

    match path {
        Some(path) => DetectionResult {
            found: true,
            path: Some(path),
            install_hint: String::new(),
        },
        None => DetectionResult {
            found: false,
            path: None,
            install_hint: install_instructions(),
        },
    }
}

/// How to get a browser onto this machine.
pub fn install_instructions() -> String {
    let install = if cfg!(target_os = "macos") {
        "brew install --cask chromium"
    } else if cfg!(target_os = "windows") {
        "winget install Google.Chrome"
    } else {
        "apt install chromium  (or: dnf install chromium, pacman -S chromium)"
    };

    format!(
        "ticketscope needs a Chromium-based browser.\n\
         Install one with: {install}\n\
         or point to an existing binary with `[browser] chrome_path = \"...\"` \
         in ticketscope.toml or the {CHROME_ENV} environment variable."
    )
}
