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

use std::sync::Arc;

use futures::join;
use itertools::Itertools;
use uuid::Uuid;

use crate::community::Community;
use crate::config::RecommenderConfig;
use crate::enum_map::EnumMap;
use crate::profile::ProfileAttributes;
use crate::store::Store;
use crate::Result;

use super::factors::{Factor, FactorEnum, ScoreContext};
use super::CommunityScore;

/// Scores one community for one user. Read-only against the store and free of
/// shared mutable state, so concurrent calls for different candidates are
/// safe.
pub struct Scorer<S: Store> {
    store: Arc<S>,
    member_sample_size: usize,
}

impl<S: Store> Scorer<S> {
    pub fn new(store: Arc<S>, config: &RecommenderConfig) -> Self {
        Self {
            store,
            member_sample_size: config.member_sample_size,
        }
    }

    /// Total function over its inputs: absent optional data contributes zero
    /// and an unknown community yields the zero score.
    pub async fn score(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        user: &ProfileAttributes,
    ) -> Result<CommunityScore> {
        let Some(ctx) = self.context(user_id, community_id, user).await? else {
            return Ok(CommunityScore::zero());
        };

        let mut breakdown = EnumMap::new();
        for factor in FactorEnum::all() {
            breakdown.insert(factor, factor.compute(&ctx));
        }

        Ok(CommunityScore::from_breakdown(breakdown))
    }

    async fn context(
        &self,
        user_id: Uuid,
        community_id: Uuid,
        user: &ProfileAttributes,
    ) -> Result<Option<ScoreContext>> {
        let Some(community) = self.store.community(community_id).await? else {
            return Ok(None);
        };

        let approved_tags = self
            .store
            .community_tags(community_id)
            .await?
            .into_iter()
            .filter(|tag| tag.approved)
            .map(|tag| tag.tag_name.to_lowercase())
            .collect();

        let interests = user
            .interests
            .iter()
            .map(|interest| interest.to_lowercase())
            .collect();

        // the remaining lookups are independent of each other
        let (mutual_members, member_sample, leader, posts) = join!(
            self.mutual_members(user_id, community_id),
            self.member_sample(community_id, user),
            self.leader_profile(&community, user),
            self.store.posts(community_id),
        );

        Ok(Some(ScoreContext {
            community,
            approved_tags,
            interests,
            mutual_members: mutual_members?,
            member_sample: member_sample?,
            leader: leader?,
            post_statuses: posts?.into_iter().map(|post| post.status).collect(),
            user: user.clone(),
        }))
    }

    async fn mutual_members(&self, user_id: Uuid, community_id: Uuid) -> Result<Option<u64>> {
        let user_communities = self.store.active_community_ids(user_id).await?;
        if user_communities.is_empty() {
            return Ok(None);
        }

        let network: Vec<Uuid> = self
            .store
            .active_member_ids_of(&user_communities)
            .await?
            .into_iter()
            .unique()
            .collect();

        let mutual = self
            .store
            .count_active_members_among(community_id, &network)
            .await?;

        Ok(Some(mutual))
    }

    async fn member_sample(
        &self,
        community_id: Uuid,
        user: &ProfileAttributes,
    ) -> Result<Vec<ProfileAttributes>> {
        if user.age_range.is_none() || user.student_status.is_none() {
            return Ok(Vec::new());
        }

        // capped sample; the full member list is never scanned
        let members = self
            .store
            .active_member_ids(community_id, Some(self.member_sample_size))
            .await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        self.store.profiles(&members).await
    }

    async fn leader_profile(
        &self,
        community: &Community,
        user: &ProfileAttributes,
    ) -> Result<Option<ProfileAttributes>> {
        if user.location.is_none() {
            return Ok(None);
        }

        self.store.profile(community.leader_id).await
    }
}
