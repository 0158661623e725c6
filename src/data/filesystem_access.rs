//! Locations evaluation output and cached model settings are written to.
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};

#[derive(Debug)]
pub enum FsAccess {
    /// `~/.cache/frcnn`
    Cache,
    /// The working directory.
    Current,
}

impl FsAccess {
    /// Directory annotated images of one run are saved to: `./other/box_figure/<run>`.
    pub fn box_figure_dir(run: &str) -> Result<PathBuf> {
        Self::Current.path_with_subs(&["other", "box_figure", run])
    }

    /// Directory evaluation reports are written to: `./graphs`.
    pub fn report_dir() -> Result<PathBuf> {
        Self::Current.path_with_subs(&["graphs"])
    }

    /// Where the settings of `model_name` are cached: `~/.cache/frcnn/configs/<model_name>.json`.
    pub fn config_file(model_name: &str) -> Result<PathBuf> {
        let name = match model_name {
            "" => "frcnn",
            x => x,
        };
        Ok(Self::Cache.path_with_subs(&["configs"])?.join(format!("{name}.json")))
    }

    fn base_path(&self) -> Result<PathBuf> {
        match self {
            FsAccess::Cache => dirs::cache_dir()
                .map(|p| p.join("frcnn"))
                .ok_or_else(|| anyhow!("No cache directory on this platform.")),
            FsAccess::Current => std::env::current_dir().context("No usable working directory."),
        }
    }

    /// Appends `subs` to the base path and creates the directory if needed.
    ///
    /// # Examples
    /// `~/.cache/frcnn/sub1/sub2`, `./sub1/sub2`.
    pub fn path_with_subs(&self, subs: &[&str]) -> Result<PathBuf> {
        let mut path = self.base_path()?;
        for sub in subs {
            path.push(sub);
        }
        create_directory(&path)?;
        Ok(path)
    }
}

/// Creates the specified directory if it does not exist.
pub fn create_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
        log::info!("Created directory {}", path.display());
    }
    Ok(())
}
