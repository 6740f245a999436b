use std::io::{self, Write};

/// TAP (Test Anything Protocol) v14 output.
#[derive(Debug, Default)]
pub struct Tap {
    tests: Vec<TapTest>,
}

#[derive(Debug)]
enum Outcome {
    Ok,
    NotOk(String),
    Skip,
}

#[derive(Debug)]
struct TapTest {
    outcome: Outcome,
    desc: String,
}

/// Counts after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapSummary {
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
}

impl Tap {
    pub fn new() -> Self {
        Tap::default()
    }

    pub fn ok(&mut self, desc: impl Into<String>) {
        self.push(Outcome::Ok, desc);
    }

    pub fn not_ok(&mut self, desc: impl Into<String>, diagnostics: impl Into<String>) {
        self.push(Outcome::NotOk(diagnostics.into()), desc);
    }

    pub fn skip(&mut self, desc: impl Into<String>) {
        self.push(Outcome::Skip, desc);
    }

    fn push(&mut self, outcome: Outcome, desc: impl Into<String>) {
        self.tests.push(TapTest {
            outcome,
            desc: desc.into(),
        });
    }

    pub fn summary(&self) -> TapSummary {
        let mut s = TapSummary::default();
        for t in &self.tests {
            match t.outcome {
                Outcome::Ok => s.pass += 1,
                Outcome::NotOk(_) => s.fail += 1,
                Outcome::Skip => s.skip += 1,
            }
        }
        s
    }

    pub fn failure_count(&self) -> usize {
        self.summary().fail
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<TapSummary> {
        writeln!(out, "TAP version 14")?;
        writeln!(out, "1..{}", self.tests.len())?;
        for (i, t) in self.tests.iter().enumerate() {
            let n = i + 1;
            match &t.outcome {
                Outcome::Ok => writeln!(out, "ok {} - {}", n, t.desc)?,
                Outcome::Skip => writeln!(out, "ok {} - {} # SKIP", n, t.desc)?,
                Outcome::NotOk(diag) => {
                    writeln!(out, "not ok {} - {}", n, t.desc)?;
                    for line in diag.lines() {
                        writeln!(out, "  # {}", line)?;
                    }
                }
            }
        }
        let summary = self.summary();
        writeln!(out, "# tests {}", self.tests.len())?;
        writeln!(out, "# pass  {}", summary.pass)?;
        writeln!(out, "# fail  {}", summary.fail)?;
        writeln!(out, "# skip  {}", summary.skip)?;
        Ok(summary)
    }

    /// Write the report to stdout.
    pub fn finish(self) -> io::Result<TapSummary> {
        let stdout = io::stdout();
        self.write_to(&mut stdout.lock())
    }
}
