use super::AnalysisResult;

/// Collects per-file results as workers finish them
///
/// Results are kept in arrival (completion) order; consumers must not assume
/// it matches discovery order.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    results: Vec<AnalysisResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: AnalysisResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<AnalysisResult> {
        self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn fixed(&self) -> usize {
        self.results.iter().filter(|r| r.was_fixed).count()
    }

    /// Quality gate verdict: no failed file
    pub fn gate_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

impl FromIterator<AnalysisResult> for ResultAggregator {
    fn from_iter<I: IntoIterator<Item = AnalysisResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
