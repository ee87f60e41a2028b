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

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use hashbrown::HashSet;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::community::Community;
use crate::config::RecommenderConfig;
use crate::llm::{self, LlmApi};
use crate::profile::ProfileAttributes;
use crate::ranking::{
    ensure_diversity, CommunityScore, Diverse, FactorEnumDiscriminants, Scorer,
};
use crate::store::Store;
use crate::{Error, Result};

/// A community picked for a user, with the score that put it there.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub community: Community,
    /// Approved tag names in their stored casing.
    pub tags: Vec<String>,
    pub score: CommunityScore,
}

impl Diverse for Recommendation {
    fn member_count(&self) -> u64 {
        self.community.member_count
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Serializable view of a [`Recommendation`] with the per-factor breakdown
/// spelled out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedRecommendation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub member_count: u64,
    pub active_projects: u64,
    pub verified: bool,
    pub total_score: f64,
    pub score_breakdown: HashMap<FactorEnumDiscriminants, f64>,
}

impl From<&Recommendation> for DisplayedRecommendation {
    fn from(recommendation: &Recommendation) -> Self {
        Self {
            id: recommendation.community.id,
            name: recommendation.community.name.clone(),
            description: recommendation.community.description.clone(),
            tags: recommendation.tags.clone(),
            member_count: recommendation.community.member_count,
            active_projects: recommendation.community.active_projects_count,
            verified: recommendation.community.is_verified,
            total_score: recommendation.score.total(),
            score_breakdown: recommendation.score.breakdown(),
        }
    }
}

/// Picks communities for users: assembles the candidate pool, scores it,
/// and cuts the ranked list down to a diverse set.
pub struct Recommender<S: Store> {
    store: Arc<S>,
    scorer: Scorer<S>,
    config: RecommenderConfig,
}

impl<S: Store> Recommender<S> {
    pub fn new(store: Arc<S>, config: RecommenderConfig) -> Self {
        let scorer = Scorer::new(Arc::clone(&store), &config);

        Self {
            store,
            scorer,
            config,
        }
    }

    pub fn scorer(&self) -> &Scorer<S> {
        &self.scorer
    }

    /// Score-ranked, diversity-cut recommendations.
    pub async fn recommend(&self, user_id: Uuid) -> Result<Vec<Recommendation>> {
        let user = self
            .store
            .profile(user_id)
            .await?
            .ok_or(Error::ProfileNotFound)?;

        let (pool, _, _) = self.candidate_pool(user_id).await?;
        debug!(candidates = pool.len(), %user_id, "scoring candidate pool");

        let mut scored = self.score_pool(user_id, &user, pool).await?;
        sort_by_total(&mut scored);

        Ok(ensure_diversity(scored, self.config.max_recommendations))
    }

    /// Let the language model rank the pool, then score its picks. The model
    /// sees the user profile, the ids already joined or dismissed, and a
    /// compact view of every candidate; it answers with an ordered id array.
    /// No diversity pass here, mixing is left to the model.
    pub async fn recommend_with_model(
        &self,
        model: &LlmApi,
        user_id: Uuid,
    ) -> Result<Vec<Recommendation>> {
        let user = self
            .store
            .profile(user_id)
            .await?
            .ok_or(Error::ProfileNotFound)?;

        let (pool, joined, dismissed) = self.candidate_pool(user_id).await?;
        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let pool: Vec<(Community, Vec<String>)> =
            join_all(pool.into_iter().map(|community| async move {
                let tags = self.approved_tag_names(community.id).await?;
                Ok::<_, anyhow::Error>((community, tags))
            }))
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        let views: Vec<CandidateView<'_>> = pool
            .iter()
            .map(|(community, tags)| CandidateView::new(community, tags))
            .collect();

        let reply = model
            .generate(&rank_prompt(&user, &views, &joined, &dismissed)?)
            .await?;
        let ranked_ids: Vec<Uuid> = llm::parse_json_reply(&reply)?;
        debug!(picks = ranked_ids.len(), %user_id, "model ranked candidates");

        let scored = join_all(
            ranked_ids
                .iter()
                .take(self.config.max_recommendations)
                .filter_map(|id| pool.iter().find(|(community, _)| community.id == *id))
                .map(|(community, tags)| {
                    let user = &user;
                    async move {
                        let score = self.scorer.score(user_id, community.id, user).await?;
                        Ok::<_, anyhow::Error>(Recommendation {
                            community: community.clone(),
                            tags: tags.clone(),
                            score,
                        })
                    }
                }),
        )
        .await;

        let mut picks: Vec<Recommendation> = scored.into_iter().collect::<Result<_>>()?;
        sort_by_total(&mut picks);

        Ok(picks)
    }

    /// Ids the user can see: public communities plus those they are an
    /// active member of.
    pub async fn filter_accessible(
        &self,
        user_id: Uuid,
        community_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        let (candidates, memberships) = futures::join!(
            self.store.communities(community_ids),
            self.store.active_community_ids(user_id),
        );

        Ok(candidates?
            .into_iter()
            .filter(|community| !community.is_private)
            .map(|community| community.id)
            .chain(
                memberships?
                    .into_iter()
                    .filter(|id| community_ids.contains(id)),
            )
            .unique()
            .collect())
    }

    /// Communities reachable through co-members of the user's communities,
    /// excluding the user's own.
    pub async fn communities_with_mutual_members(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let own = self.store.active_community_ids(user_id).await?;
        if own.is_empty() {
            return Ok(Vec::new());
        }

        let peers: Vec<Uuid> = self
            .store
            .active_member_ids_of(&own)
            .await?
            .into_iter()
            .filter(|peer| *peer != user_id)
            .unique()
            .collect();
        if peers.is_empty() {
            return Ok(Vec::new());
        }

        let own_set: HashSet<Uuid> = own.into_iter().collect();

        Ok(self
            .store
            .active_community_ids_of(&peers)
            .await?
            .into_iter()
            .filter(|community| !own_set.contains(community))
            .take(limit)
            .unique()
            .collect())
    }

    /// Public communities holding one of the given approved tags.
    pub async fn communities_by_tags(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<Community>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .store
            .communities_with_approved_tags(tags)
            .await?
            .into_iter()
            .filter(|community| !community.is_private)
            .unique_by(|community| community.id)
            .take(limit)
            .collect())
    }

    /// Public communities with the most going on right now.
    pub async fn trending(&self, limit: usize) -> Result<Vec<Community>> {
        let mut communities: Vec<Community> = self
            .store
            .public_communities()
            .await?
            .into_iter()
            .filter(|community| community.active_projects_count > 0)
            .collect();

        communities.sort_by(|a, b| {
            b.active_projects_count
                .cmp(&a.active_projects_count)
                .then(b.member_count.cmp(&a.member_count))
        });
        communities.truncate(limit);

        Ok(communities)
    }

    /// Public communities whose leader lives in or near the given location.
    pub async fn nearby(
        &self,
        city: &str,
        state: &str,
        country: &str,
        limit: usize,
    ) -> Result<Vec<Community>> {
        let leaders = self
            .store
            .profile_ids_matching_location(city, state, country)
            .await?;
        if leaders.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .store
            .communities_led_by(&leaders)
            .await?
            .into_iter()
            .filter(|community| !community.is_private)
            .take(limit)
            .collect())
    }

    pub async fn dismiss(&self, user_id: Uuid, community_id: Uuid) -> Result<()> {
        self.store.dismiss(user_id, community_id).await
    }

    pub async fn undismiss(&self, user_id: Uuid, community_id: Uuid) -> Result<()> {
        self.store.undismiss(user_id, community_id).await
    }

    pub async fn dismissed(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.store.dismissed_community_ids(user_id).await
    }

    pub async fn has_completed_onboarding(&self, user_id: Uuid) -> Result<bool> {
        Ok(self
            .store
            .profile(user_id)
            .await?
            .map(|profile| profile.onboarding_completed)
            .unwrap_or(false))
    }

    /// Public communities the user has not joined or dismissed, biggest
    /// first, capped to the configured pool size.
    async fn candidate_pool(
        &self,
        user_id: Uuid,
    ) -> Result<(Vec<Community>, Vec<Uuid>, Vec<Uuid>)> {
        let (joined, dismissed) = futures::join!(
            self.store.active_community_ids(user_id),
            self.store.dismissed_community_ids(user_id),
        );
        let (joined, dismissed) = (joined?, dismissed?);

        let excluded: HashSet<Uuid> = joined.iter().chain(dismissed.iter()).copied().collect();

        let mut pool: Vec<Community> = self
            .store
            .public_communities()
            .await?
            .into_iter()
            .filter(|community| !excluded.contains(&community.id))
            .collect();

        pool.sort_by(|a, b| b.member_count.cmp(&a.member_count));
        pool.truncate(self.config.candidate_pool_size);

        Ok((pool, joined, dismissed))
    }

    async fn score_pool(
        &self,
        user_id: Uuid,
        user: &ProfileAttributes,
        pool: Vec<Community>,
    ) -> Result<Vec<Recommendation>> {
        join_all(pool.into_iter().map(|community| async move {
            let (tags, score) = futures::join!(
                self.approved_tag_names(community.id),
                self.scorer.score(user_id, community.id, user),
            );

            Ok::<_, anyhow::Error>(Recommendation {
                community,
                tags: tags?,
                score: score?,
            })
        }))
        .await
        .into_iter()
        .collect()
    }

    async fn approved_tag_names(&self, community: Uuid) -> Result<Vec<String>> {
        Ok(self
            .store
            .community_tags(community)
            .await?
            .into_iter()
            .filter(|tag| tag.approved)
            .map(|tag| tag.tag_name)
            .collect())
    }
}

/// Stable descending sort; candidates with equal totals keep their incoming
/// order.
fn sort_by_total(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.score.total().total_cmp(&a.score.total()));
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateView<'a> {
    id: Uuid,
    name: &'a str,
    description: Option<&'a str>,
    tags: &'a [String],
    member_count: u64,
    active_projects: u64,
    verified: bool,
}

impl<'a> CandidateView<'a> {
    fn new(community: &'a Community, tags: &'a [String]) -> Self {
        Self {
            id: community.id,
            name: &community.name,
            description: community.description.as_deref(),
            tags,
            member_count: community.member_count,
            active_projects: community.active_projects_count,
            verified: community.is_verified,
        }
    }
}

fn rank_prompt(
    user: &ProfileAttributes,
    candidates: &[CandidateView<'_>],
    joined: &[Uuid],
    dismissed: &[Uuid],
) -> Result<String> {
    let id_list = |ids: &[Uuid]| {
        if ids.is_empty() {
            "None".to_string()
        } else {
            ids.iter().map(|id| id.to_string()).join(", ")
        }
    };

    Ok(format!(
        r#"You are an AI recommendation system for a community crowdfunding platform. Your task is to recommend communities to a user based on their profile and interests.

User Profile:
{}

Communities user is already in: {}
Communities user dismissed: {}

Available Communities to Recommend:
{}

Task:
1. Analyze the user's profile (interests, location, occupation, etc.)
2. Match them with communities that align with their profile
3. Consider geographic proximity for local communities
4. Ensure diversity in recommendations (mix of sizes, topics, activity levels)
5. Exclude communities they're already in or have dismissed
6. Return top 10 community recommendations

Return a JSON array of community IDs ranked by relevance (best matches first).
Example: ["uuid-1", "uuid-2", "uuid-3", ...]
"#,
        serde_json::to_string_pretty(user)?,
        id_list(joined),
        id_list(dismissed),
        serde_json::to_string_pretty(candidates)?,
    ))
}
