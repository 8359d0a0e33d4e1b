//! A utility module for common operations.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::env::Env;
use crate::error::{Error, Result};

/// Rename a file, replacing the target if it exists.
pub fn rename_path(env: &impl Env, old: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<()> {
    let (old, new) = (old.as_ref(), new.as_ref());
    let abs_old = env.in_cwd(&old);
    let abs_new = env.in_cwd(&new);
    std::fs::rename(abs_old, abs_new).map_err(|err| {
        Error::from(err).context(&format!(
            "moving '{}' to '{}'",
            old.display(),
            new.display()
        ))
    })
}

//------------ OutputFile ----------------------------------------------------

/// A file that only replaces its path once it is committed.
///
/// The content is written through a buffer to a sibling file with a `.new`
/// suffix. [`OutputFile::commit`] moves that file over the target path. If
/// the file is dropped before it was committed, the temporary file is
/// removed and whatever was at the target path stays untouched.
pub struct OutputFile<E: Env> {
    env: E,

    /// The target path as given by the user.
    path: PathBuf,

    /// The path of the file being written.
    temp: PathBuf,

    /// The buffered file, `None` once closed.
    writer: Option<BufWriter<File>>,

    /// Whether the file has been moved to the target path.
    committed: bool,
}

impl<E: Env> OutputFile<E> {
    /// Start writing a file that will replace `path` when committed.
    pub fn create(env: E, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut temp = path.clone();
        temp.as_mut_os_string().push(".new");

        let file = File::create(env.in_cwd(&temp)).map_err(|err| {
            Error::from(err).context(&format!("creating '{}'", temp.display()))
        })?;
        Ok(Self {
            env,
            path,
            temp,
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    /// Flush all buffered data and move the file to its target path.
    pub fn commit(mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Err(Error::new(&format!(
                "'{}' has already been closed",
                self.temp.display()
            )));
        };
        let file = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .and_then(|file| file.sync_all().map(|()| file))
            .map_err(|err| {
                Error::from(err).context(&format!("writing '{}'", self.temp.display()))
            })?;
        drop(file);

        rename_path(&self.env, &self.temp, &self.path)?;
        self.committed = true;
        Ok(())
    }
}

impl<E: Env> Write for OutputFile<E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::ErrorKind::BrokenPipe.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<E: Env> Drop for OutputFile<E> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close the file before removing it.
        self.writer = None;
        if let Err(err) = std::fs::remove_file(self.env.in_cwd(&self.temp)) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("cannot remove '{}': {err}", self.temp.display());
            }
        }
    }
}

//============ Tests =========================================================
