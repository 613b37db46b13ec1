//! Workforce Safety Score: the mean PSR of a company's linked technicians.
//!
//! This is an informational read model. It holds no reference to any
//! company-owned rating and offers no way to write one; the Company Safety
//! Rating lives in a separate subsystem and is computed from company
//! compliance data only.

use serde::{Deserialize, Serialize};

use super::domain::CompanyId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceSafetyScore {
    pub company_id: CompanyId,
    /// Mean PSR, or 0.0 when no technician is linked.
    pub score: f64,
    pub technician_count: usize,
}

impl WorkforceSafetyScore {
    pub fn from_ratings<I>(company_id: CompanyId, ratings: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

        let score = if count == 0 { 0.0 } else { sum / count as f64 };

        Self {
            company_id,
            score,
            technician_count: count,
        }
    }
}
