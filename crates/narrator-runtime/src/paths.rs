//! KittenTTS file locations.
//!
//! The server script and its virtual environment live in a `scripts/`
//! directory: under the installed application root for packaged builds, or
//! relative to the working directory in a development checkout. Roots are
//! searched in order and the first hit wins.

use std::path::{Path, PathBuf};

/// Installed location of the helper scripts.
pub const INSTALLED_SCRIPTS_DIR: &str = "/usr/lib/en-parlant/scripts";

/// Development checkout location of the helper scripts.
pub const DEV_SCRIPTS_DIR: &str = "scripts";

pub const KITTENTTS_SCRIPT: &str = "kittentts-server.py";

const VENV_DIR: &str = ".venv";

#[derive(Debug, Clone)]
pub struct KittenTtsPaths {
    roots: Vec<PathBuf>,
}

impl Default for KittenTtsPaths {
    fn default() -> Self {
        Self::with_roots([INSTALLED_SCRIPTS_DIR, DEV_SCRIPTS_DIR])
    }
}

impl KittenTtsPaths {
    /// Search the given script directories, in order.
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn find(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }

    pub fn script(&self) -> Option<PathBuf> {
        self.find(Path::new(KITTENTTS_SCRIPT))
    }

    pub fn venv_dir(&self) -> Option<PathBuf> {
        self.find(Path::new(VENV_DIR))
    }

    /// Interpreter inside the first virtual environment that has one.
    pub fn venv_python(&self) -> Option<PathBuf> {
        self.find(&venv_bin(Path::new(VENV_DIR), "python"))
    }

    /// Where `setup` creates the virtual environment: inside the first
    /// root that exists, or the last root if none do.
    pub fn setup_venv_dir(&self) -> Option<PathBuf> {
        self.roots
            .iter()
            .find(|root| root.is_dir())
            .or_else(|| self.roots.last())
            .map(|root| root.join(VENV_DIR))
    }

    /// Every place the script is looked for, for error messages.
    pub fn describe_script_search(&self) -> String {
        self.roots
            .iter()
            .map(|root| root.join(KITTENTTS_SCRIPT).display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Path of an executable inside a virtual environment.
pub fn venv_bin(venv: &Path, name: &str) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join(format!("{name}.exe"))
    } else {
        venv.join("bin").join(name)
    }
}
