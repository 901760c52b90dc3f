use std::io;
use std::path::Path;
use std::process::Command;

/// Shows the user what a rewrite would change
pub trait DiffDisplay: Send + Sync {
    fn show(&self, original: &Path, updated: &Path) -> io::Result<()>;
}

/// Runs the system `diff` program with output going straight to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalDiff;

impl DiffDisplay for ExternalDiff {
    fn show(&self, original: &Path, updated: &Path) -> io::Result<()> {
        // Checked up front so diff never receives a bogus path
        for file in [original, updated] {
            if !file.is_file() {
                println!("File {} does not exist", file.display());
                return Ok(());
            }
        }

        // diff exits non-zero when the files differ, so the status is ignored
        Command::new("diff").arg(original).arg(updated).status()?;
        Ok(())
    }
}
