use serde::Serialize;

/// A successful batch outcome. Carries its own seed: completions arrive in
/// whatever order the service finishes them, never in submission order.
#[derive(Debug, Clone)]
pub struct BatchImage {
    pub seed: u64,
    pub url: String,
    pub bytes: Vec<u8>,
}

/// One failed batch job.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub seed: u64,
    pub message: String,
}

/// Aggregated result of one batch call. Partial failure is data, not an
/// error: as long as at least one job succeeded the summary is returned
/// with the failures carried alongside.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Successful images in arrival order.
    pub images: Vec<BatchImage>,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub(crate) fn record_success(&mut self, image: BatchImage) {
        self.succeeded += 1;
        self.images.push(image);
    }

    pub(crate) fn record_failure(&mut self, failure: BatchFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Concatenation of every per-seed failure reason.
    pub fn failure_report(&self) -> String {
        self.failures
            .iter()
            .map(|failure| format!("seed {}: {}", failure.seed, failure.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Human-readable one-liner for host UIs.
    pub fn status_line(&self) -> String {
        if self.failed == 0 {
            format!("{}/{} images generated", self.succeeded, self.total())
        } else {
            format!(
                "{}/{} images generated, {} failed ({})",
                self.succeeded,
                self.total(),
                self.failed,
                self.failure_report()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_and_report() {
        let mut summary = BatchSummary::default();
        summary.record_success(BatchImage {
            seed: 11,
            url: "https://x/a.png".into(),
            bytes: vec![1],
        });
        summary.record_failure(BatchFailure {
            seed: 12,
            message: "Server error: HTTP 500".into(),
        });

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 2);
        assert!(summary.failure_report().contains("seed 12"));
        assert!(summary.status_line().starts_with("1/2"));
    }

    #[test]
    fn clean_summary_status_line() {
        let mut summary = BatchSummary::default();
        summary.record_success(BatchImage {
            seed: 5,
            url: "https://x/a.png".into(),
            bytes: vec![],
        });
        assert_eq!(summary.status_line(), "1/1 images generated");
    }
}
