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
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::community::{Post, Proposal};
use crate::config::LlmConfig;
use crate::llm::{parse_json_reply, LlmApi};
use crate::store::Store;
use crate::ttl_cache::TtlCache;
use crate::{Error, Result};

const MAX_TAGS: usize = 5;
const RECENT_ACTIVITY: usize = 10;

/// Suggests and refreshes community tags with the language model.
///
/// Suggestions land unapproved; nothing affects matching or display until the
/// community leader approves it. Replies are cached for an hour per community
/// so repeated leader visits don't re-query the model.
pub struct Tagger<S: Store> {
    api: LlmApi,
    store: Arc<S>,
    cache: Mutex<TtlCache<String, Vec<String>>>,
}

impl<S: Store> Tagger<S> {
    pub fn new(store: Arc<S>, config: &LlmConfig) -> Self {
        Self {
            api: LlmApi::from_config(config),
            store,
            cache: Mutex::new(TtlCache::with_ttl_and_max_size(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_max_size,
            )),
        }
    }

    /// Initial tags for a fresh community, inferred from its name and
    /// description and stored for leader approval.
    pub async fn infer_tags(&self, community_id: Uuid) -> Result<Vec<String>> {
        let key = format!("tags:{community_id}:initial");
        if let Some(tags) = self.cache.lock().await.get(&key) {
            debug!(%community_id, "tag inference served from cache");
            return Ok(tags.clone());
        }

        let community = self
            .store
            .community(community_id)
            .await?
            .ok_or(Error::CommunityNotFound)?;

        let prompt = infer_prompt(
            &community.name,
            community.description.as_deref().unwrap_or("No description provided"),
        );
        let tags = self.request_tags(&prompt).await?;

        self.store.add_suggested_tags(community_id, &tags).await?;
        self.cache.lock().await.insert(key, tags.clone());

        Ok(tags)
    }

    /// Re-derive tags from what the community has actually been doing lately.
    /// Returned for leader review, not persisted.
    pub async fn refine_tags(&self, community_id: Uuid) -> Result<Vec<String>> {
        let key = format!("tags:{community_id}:refined");
        if let Some(tags) = self.cache.lock().await.get(&key) {
            debug!(%community_id, "tag refinement served from cache");
            return Ok(tags.clone());
        }

        let community = self
            .store
            .community(community_id)
            .await?
            .ok_or(Error::CommunityNotFound)?;

        let current: Vec<String> = self
            .store
            .community_tags(community_id)
            .await?
            .into_iter()
            .filter(|tag| tag.approved)
            .map(|tag| tag.tag_name)
            .collect();

        let (proposals, posts) = futures::join!(
            self.recent_proposal_titles(community_id),
            self.recent_post_titles(community_id),
        );

        let prompt = refine_prompt(&community.name, &current, &proposals?, &posts?);
        let tags = self.request_tags(&prompt).await?;

        self.cache.lock().await.insert(key, tags.clone());

        Ok(tags)
    }

    async fn request_tags(&self, prompt: &str) -> Result<Vec<String>> {
        let reply = self.api.generate(prompt).await?;
        let tags: Vec<String> = parse_json_reply(&reply)?;

        Ok(tags
            .into_iter()
            .take(MAX_TAGS)
            .map(|tag| tag.to_lowercase().trim().to_string())
            .collect())
    }

    async fn recent_post_titles(&self, community_id: Uuid) -> Result<Vec<String>> {
        let mut posts: Vec<Post> = self.store.posts(community_id).await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts
            .into_iter()
            .take(RECENT_ACTIVITY)
            .map(|post| post.title)
            .collect())
    }

    async fn recent_proposal_titles(&self, community_id: Uuid) -> Result<Vec<String>> {
        let mut proposals: Vec<Proposal> = self.store.proposals(community_id).await?;
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(proposals
            .into_iter()
            .take(RECENT_ACTIVITY)
            .map(|proposal| proposal.title)
            .collect())
    }
}

fn infer_prompt(name: &str, description: &str) -> String {
    format!(
        r#"You are helping categorize a community on a crowdfunding platform. Based on the community information provided, suggest 3-5 relevant tags that describe what this community is about.

Community Name: {name}
Description: {description}

Requirements:
- Suggest 3-5 tags maximum
- Tags should be single words or short phrases (max 2 words)
- Focus on themes, activities, or interests
- Be specific and relevant
- Use lowercase

Return ONLY a JSON array of tags, nothing else.
Example: ["technology", "education", "community-service"]
"#
    )
}

fn refine_prompt(
    name: &str,
    current_tags: &[String],
    recent_proposals: &[String],
    recent_posts: &[String],
) -> String {
    let none = "None".to_string();
    let join = |titles: &[String]| {
        if titles.is_empty() {
            none.clone()
        } else {
            titles.join(", ")
        }
    };

    format!(
        r#"You are refining tags for a community based on recent activity. Review the current tags and recent activity, then suggest updated tags that better reflect what the community is actually doing.

Community Name: {name}
Current Tags: {}

Recent Proposals: {}
Recent Crowdfunding Projects: {}

Task:
1. Review if current tags still fit
2. Suggest new tags based on actual activity
3. Remove tags that no longer apply
4. Return 3-5 tags maximum

Return ONLY a JSON array of refined tags, nothing else.
Example: ["technology", "education", "community-service"]
"#,
        current_tags.join(", "),
        join(recent_proposals),
        join(recent_posts),
    )
}
