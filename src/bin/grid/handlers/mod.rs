pub mod aoi;
pub mod configure;
pub mod export;

use std::fmt::Display;

use anyhow::bail;

/// Every argument is attempted; failures are reported as they happen and
/// turned into a single error at the end.
#[derive(Debug, Default)]
pub struct Tally {
    total: usize,
    failed: usize,
}

impl Tally {
    pub fn ok(&mut self) {
        self.total += 1;
    }

    pub fn fail(&mut self, arg: impl Display, err: impl Display) {
        self.total += 1;
        self.failed += 1;
        eprintln!("{arg}: {err}");
    }

    pub fn finish(self) -> anyhow::Result<()> {
        if self.failed > 0 {
            bail!("{} of {} argument(s) failed", self.failed, self.total);
        }
        Ok(())
    }
}
