use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchTier {
    Quick,
    Full,
}

impl BenchTier {
    /// Rows per synthetic page.
    pub fn rows(self) -> &'static [usize] {
        match self {
            Self::Quick => &[50, 500],
            Self::Full => &[50, 500, 5_000],
        }
    }
}

pub fn bench_tier() -> BenchTier {
    match env::var("PDFGRID_BENCH_TIER").as_deref() {
        Ok("full") => BenchTier::Full,
        _ => BenchTier::Quick,
    }
}
