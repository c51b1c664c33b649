use clap::ValueEnum;

/// How command results are printed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Aligned columns.
    Table,
    /// Single-line JSON.
    Raw,
}

/// The global flags command handlers read. Log level flags are consumed in
/// `main` before dispatch.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub limit: Option<u32>,
    pub project: Option<String>,
}

impl GlobalFlags {
    /// `--limit` if given, else `fallback` (the configured default).
    #[must_use]
    pub const fn limit_or(&self, fallback: u32) -> u32 {
        match self.limit {
            Some(limit) => limit,
            None => fallback,
        }
    }
}
