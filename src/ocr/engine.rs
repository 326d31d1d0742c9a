use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use crate::extraction::config::TesseractConfig;

use super::setup::{find_tessdata_dir, find_tesseract_executable};

/// Converts a preprocessed field image into raw text.
///
/// `whitelist` lists every character the engine may emit. Implementations
/// must be shareable across the frame worker pool.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, img: &GrayImage, whitelist: &str) -> Result<String>;
}

/// Runs the `tesseract` executable once per field.
pub struct TesseractCli {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    language: String,
    oem: u8,
    psm: u8,
    timeout: Duration,
}

impl TesseractCli {
    /// Resolves the executable and tessdata directory from config or the system.
    pub fn from_config(config: &TesseractConfig) -> Result<Self> {
        let executable = find_tesseract_executable(config.executable.as_deref())?;
        let tessdata_dir = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);
        Ok(Self {
            executable,
            tessdata_dir,
            language: config.language.clone(),
            oem: config.oem,
            psm: config.psm,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, input: &Path, whitelist: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg("stdout")
            .arg("--oem")
            .arg(self.oem.to_string())
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("-l")
            .arg(&self.language);
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-c")
            .arg(format!("tessedit_char_whitelist={}", whitelist));
        cmd
    }
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract-cli"
    }

    fn recognize(&self, img: &GrayImage, whitelist: &str) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write field image for Tesseract")?;

        // Output goes to files so a chatty child can never block on a full pipe
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;
        let mut child = self
            .command(temp_input.path(), whitelist)
            .stdin(Stdio::null())
            .stdout(stdout.try_clone()?)
            .stderr(stderr.try_clone()?)
            .spawn()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!(
                    "Tesseract timed out after {}ms",
                    self.timeout.as_millis()
                ));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let message = read_all(&mut stderr)?;
            return Err(anyhow!("Tesseract failed ({}): {}", status, message.trim()));
        }

        read_all(&mut stdout)
    }
}

/// How often a running recognizer process is checked for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn read_all(file: &mut std::fs::File) -> Result<String> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}
