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

use enum_dispatch::enum_dispatch;
use strum::{EnumDiscriminants, VariantArray};

use crate::community::{Community, PostStatus};
use crate::enum_map::InsertEnumMapKey;
use crate::profile::ProfileAttributes;

/// Snapshot of everything one scoring pass reads. Assembled once per
/// (user, community) pair; the factors themselves are pure functions over it.
#[derive(Debug, Clone)]
pub struct ScoreContext {
    pub community: Community,

    /// Approved tag names, lowercased for matching.
    pub approved_tags: Vec<String>,

    /// The user's interests, lowercased for matching.
    pub interests: Vec<String>,

    /// Active members of the community who are also active members of one of
    /// the user's communities. `None` when the user holds no memberships.
    pub mutual_members: Option<u64>,

    /// Capped sample of member profiles; empty unless the user has both an
    /// age range and a student status.
    pub member_sample: Vec<ProfileAttributes>,

    pub leader: Option<ProfileAttributes>,

    pub post_statuses: Vec<PostStatus>,

    pub user: ProfileAttributes,
}

impl ScoreContext {
    /// Approved tags that fuzzily match at least one interest. The match is
    /// a case-folded substring check in both directions.
    pub fn shared_tag_count(&self) -> usize {
        self.approved_tags
            .iter()
            .filter(|tag| {
                self.interests
                    .iter()
                    .any(|interest| tag.contains(interest.as_str()) || interest.contains(tag.as_str()))
            })
            .count()
    }
}

/// A single relevance factor. Factors are additive and independently capped;
/// each degrades to a zero contribution on missing data instead of failing.
#[enum_dispatch]
pub trait Factor:
    Clone + Copy + std::fmt::Debug + PartialEq + Eq + std::hash::Hash + Into<FactorEnum>
{
    /// Upper bound on the points this factor contributes.
    fn max_contribution(&self) -> f64;

    fn compute(&self, ctx: &ScoreContext) -> f64;
}

#[enum_dispatch(Factor)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(derive(
    VariantArray,
    serde::Serialize,
    serde::Deserialize,
    PartialOrd,
    Ord,
    Hash
))]
#[strum_discriminants(serde(rename_all = "camelCase"))]
pub enum FactorEnum {
    SharedTags,
    MutualMembers,
    DemographicAlignment,
    SharedInterests,
    GeographicProximity,
    ActivityLevel,
    CommunitySize,
    FundingSuccessRate,
}

impl FactorEnum {
    pub fn all() -> impl Iterator<Item = FactorEnum> {
        FactorEnumDiscriminants::VARIANTS
            .iter()
            .copied()
            .map(FactorEnum::from)
    }

    pub fn num_variants() -> usize {
        FactorEnumDiscriminants::VARIANTS.len()
    }
}

impl From<FactorEnumDiscriminants> for FactorEnum {
    fn from(discriminant: FactorEnumDiscriminants) -> Self {
        match discriminant {
            FactorEnumDiscriminants::SharedTags => SharedTags.into(),
            FactorEnumDiscriminants::MutualMembers => MutualMembers.into(),
            FactorEnumDiscriminants::DemographicAlignment => DemographicAlignment.into(),
            FactorEnumDiscriminants::SharedInterests => SharedInterests.into(),
            FactorEnumDiscriminants::GeographicProximity => GeographicProximity.into(),
            FactorEnumDiscriminants::ActivityLevel => ActivityLevel.into(),
            FactorEnumDiscriminants::CommunitySize => CommunitySize.into(),
            FactorEnumDiscriminants::FundingSuccessRate => FundingSuccessRate.into(),
        }
    }
}

impl InsertEnumMapKey for FactorEnum {
    fn into_usize(self) -> usize {
        FactorEnumDiscriminants::from(self) as usize
    }
}

/// Fraction of the community's approved tags the user's interests cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedTags;
impl Factor for SharedTags {
    fn max_contribution(&self) -> f64 {
        30.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        if ctx.approved_tags.is_empty() {
            return 0.0;
        }

        (ctx.shared_tag_count() as f64 / ctx.approved_tags.len() as f64) * self.max_contribution()
    }
}

/// How many of the community's active members the user already shares a
/// community with. Maxes out at 5 mutual members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutualMembers;
impl Factor for MutualMembers {
    fn max_contribution(&self) -> f64 {
        25.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        match ctx.mutual_members {
            Some(mutual) => {
                ((mutual as f64 / 5.0) * self.max_contribution()).min(self.max_contribution())
            }
            None => 0.0,
        }
    }
}

/// Age-range and student-status agreement with the sampled member profiles.
/// Every sampled profile contributes both checks, matched or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DemographicAlignment;
impl Factor for DemographicAlignment {
    fn max_contribution(&self) -> f64 {
        15.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        let (Some(age_range), Some(student_status)) =
            (ctx.user.age_range, ctx.user.student_status)
        else {
            return 0.0;
        };

        if ctx.member_sample.is_empty() {
            return 0.0;
        }

        let mut matches = 0usize;
        let mut checks = 0usize;

        for member in &ctx.member_sample {
            if member.age_range == Some(age_range) {
                matches += 1;
            }
            checks += 1;

            if member.student_status == Some(student_status) {
                matches += 1;
            }
            checks += 1;
        }

        (matches as f64 / checks as f64) * self.max_contribution()
    }
}

/// Shared tags measured against the size of the user's interest list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedInterests;
impl Factor for SharedInterests {
    fn max_contribution(&self) -> f64 {
        20.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        if ctx.interests.is_empty() {
            return 0.0;
        }

        ((ctx.shared_tag_count() as f64 / ctx.interests.len() as f64) * self.max_contribution())
            .min(self.max_contribution())
    }
}

/// Distance to the community, with the leader's location standing in for the
/// community's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeographicProximity;
impl Factor for GeographicProximity {
    fn max_contribution(&self) -> f64 {
        5.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        let Some(user_location) = &ctx.user.location else {
            return 0.0;
        };
        let Some(leader_location) = ctx.leader.as_ref().and_then(|l| l.location.as_ref()) else {
            return 0.0;
        };

        if leader_location.city == user_location.city {
            5.0
        } else if leader_location.state == user_location.state {
            3.0
        } else if leader_location.country == user_location.country {
            1.0
        } else {
            0.0
        }
    }
}

/// More active projects score higher, saturating at 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityLevel;
impl Factor for ActivityLevel {
    fn max_contribution(&self) -> f64 {
        5.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        (ctx.community.active_projects_count as f64 / 5.0).min(1.0) * self.max_contribution()
    }
}

/// Size bonus. Sweet spot is 10-100 members; very large communities get a
/// smaller bonus, tiny ones none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommunitySize;
impl Factor for CommunitySize {
    fn max_contribution(&self) -> f64 {
        3.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        let member_count = ctx.community.member_count;

        if (10..=100).contains(&member_count) {
            3.0
        } else if member_count > 100 {
            1.0
        } else {
            0.0
        }
    }
}

/// Share of the community's posts that reached their goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FundingSuccessRate;
impl Factor for FundingSuccessRate {
    fn max_contribution(&self) -> f64 {
        2.0
    }

    fn compute(&self, ctx: &ScoreContext) -> f64 {
        if ctx.post_statuses.is_empty() {
            return 0.0;
        }

        let funded = ctx
            .post_statuses
            .iter()
            .filter(|status| matches!(status, PostStatus::Funded | PostStatus::Completed))
            .count();

        (funded as f64 / ctx.post_statuses.len() as f64) * self.max_contribution()
    }
}
