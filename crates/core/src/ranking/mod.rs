// Hearth is an open source community crowdfunding platform.
// Copyright (C) 2024 Hearth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

pub mod factors;
pub mod scorer;
pub mod selector;

use std::collections::HashMap;

use crate::enum_map::EnumMap;

pub use factors::{Factor, FactorEnum, FactorEnumDiscriminants, ScoreContext};
pub use scorer::Scorer;
pub use selector::{ensure_diversity, Diverse, SizeBucket};

/// Relevance of one community for one user: a total plus the per-factor
/// breakdown it sums from. Derived per request and never persisted.
#[derive(Debug, Clone)]
pub struct CommunityScore {
    total: f64,
    breakdown: EnumMap<FactorEnum, f64>,
}

impl CommunityScore {
    pub(crate) fn from_breakdown(breakdown: EnumMap<FactorEnum, f64>) -> Self {
        let total: f64 = breakdown.values().sum();

        Self {
            // two decimals, intermediate factors stay unrounded
            total: (total * 100.0).round() / 100.0,
            breakdown,
        }
    }

    /// The all-zero score, used when the community does not exist.
    pub fn zero() -> Self {
        let mut breakdown = EnumMap::new();
        for factor in FactorEnum::all() {
            breakdown.insert(factor, 0.0);
        }

        Self {
            total: 0.0,
            breakdown,
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn factor(&self, factor: FactorEnum) -> f64 {
        self.breakdown.get(factor).copied().unwrap_or(0.0)
    }

    /// Factor-keyed view for display and serialization.
    pub fn breakdown(&self) -> HashMap<FactorEnumDiscriminants, f64> {
        FactorEnum::all()
            .map(|factor| (factor.into(), self.factor(factor)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_rounded_sum_of_breakdown() {
        let mut breakdown = EnumMap::new();
        breakdown.insert(FactorEnum::from(factors::SharedTags), 15.0);
        breakdown.insert(FactorEnum::from(factors::FundingSuccessRate), 2.0 / 3.0 * 2.0);

        let score = CommunityScore::from_breakdown(breakdown);

        assert_eq!(score.total(), 16.33);
        assert_eq!(score.factor(factors::SharedTags.into()), 15.0);
        assert_eq!(score.factor(factors::MutualMembers.into()), 0.0);
    }

    #[test]
    fn zero_score_has_all_factors() {
        let score = CommunityScore::zero();

        assert_eq!(score.total(), 0.0);
        assert_eq!(score.breakdown().len(), FactorEnum::num_variants());
        for (_, value) in score.breakdown() {
            assert_eq!(value, 0.0);
        }
    }
}
