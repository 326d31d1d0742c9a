use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

/// Well-known install locations, checked after the local dir and PATH.
const COMMON_EXECUTABLES: &[&str] = &[
    "/opt/homebrew/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/usr/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/usr/local/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
];

/// Returns the per-user directory for a locally managed Tesseract install
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchup-scout")
        .join("tesseract")
}

fn executable_name() -> &'static str {
    if cfg!(windows) { "tesseract.exe" } else { "tesseract" }
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then common paths
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured Tesseract executable not found: {}",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding `<language>.traineddata`.
///
/// Returns `None` when nothing explicit is found; Tesseract then falls back
/// to its compiled-in default.
pub fn find_tessdata_dir(configured: Option<&Path>, language: &str) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }

    let traineddata = format!("{}.traineddata", language);

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if local_tessdata.join(&traineddata).exists() {
        return Some(local_tessdata);
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    COMMON_TESSDATA
        .iter()
        .map(PathBuf::from)
        .find(|p| p.join(&traineddata).exists())
}

/// Checks that the resolved executable actually runs, logging its version.
pub fn check_tesseract(executable: &Path) -> Result<String> {
    let output = Command::new(executable)
        .arg("--version")
        .output()
        .map_err(|e| anyhow!("Failed to run {}: {}", executable.display(), e))?;

    if !output.status.success() {
        return Err(anyhow!(
            "{} --version exited with {}",
            executable.display(),
            output.status
        ));
    }

    // Older builds print the version banner on stderr
    let banner = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).to_string()
    };
    let version = banner.lines().next().unwrap_or("").trim().to_string();
    log(&format!("Using {} ({})", version, executable.display()));
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_executable_must_exist() {
        let result = find_tesseract_executable(Some(Path::new("/nonexistent/tesseract")));
        assert!(result.is_err());
    }

    #[test]
    fn test_configured_executable_is_used() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract");
        std::fs::write(&exe, b"").unwrap();

        assert_eq!(find_tesseract_executable(Some(&exe)).unwrap(), exe);
    }

    #[test]
    fn test_configured_tessdata_wins() {
        let found = find_tessdata_dir(Some(Path::new("/custom/tessdata")), "eng");
        assert_eq!(found, Some(PathBuf::from("/custom/tessdata")));
    }

    #[test]
    fn test_tesseract_dir_is_app_scoped() {
        let dir = get_tesseract_dir();
        assert!(dir.ends_with(Path::new("matchup-scout").join("tesseract")));
    }
}
