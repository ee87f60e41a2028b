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
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::community::{Community, CommunityTag, MemberStatus, Membership, Post, Proposal, TagSource};
use crate::profile::ProfileAttributes;
use crate::Result;

use super::Store;

#[derive(Default)]
struct Inner {
    profiles: HashMap<Uuid, ProfileAttributes>,
    communities: Vec<Community>,
    tags: Vec<CommunityTag>,
    memberships: Vec<Membership>,
    posts: Vec<Post>,
    proposals: Vec<Proposal>,
    dismissals: Vec<(Uuid, Uuid)>,
}

/// In-memory [`Store`]. Backs the test suites; iteration order is insertion
/// order, which keeps fixtures deterministic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, user: Uuid, attrs: ProfileAttributes) {
        self.inner.write().unwrap().profiles.insert(user, attrs);
    }

    pub fn insert_community(&self, community: Community) {
        self.inner.write().unwrap().communities.push(community);
    }

    pub fn insert_tag(&self, tag: CommunityTag) {
        self.inner.write().unwrap().tags.push(tag);
    }

    pub fn insert_membership(&self, membership: Membership) {
        self.inner.write().unwrap().memberships.push(membership);
    }

    pub fn insert_post(&self, post: Post) {
        self.inner.write().unwrap().posts.push(post);
    }

    pub fn insert_proposal(&self, proposal: Proposal) {
        self.inner.write().unwrap().proposals.push(proposal);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn community(&self, id: Uuid) -> Result<Option<Community>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.communities.iter().find(|c| c.id == id).cloned())
    }

    async fn communities(&self, ids: &[Uuid]) -> Result<Vec<Community>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .communities
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn public_communities(&self) -> Result<Vec<Community>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .communities
            .iter()
            .filter(|c| !c.is_private)
            .cloned()
            .collect())
    }

    async fn communities_led_by(&self, leaders: &[Uuid]) -> Result<Vec<Community>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .communities
            .iter()
            .filter(|c| leaders.contains(&c.leader_id))
            .cloned()
            .collect())
    }

    async fn communities_with_approved_tags(
        &self,
        tag_names: &[String],
    ) -> Result<Vec<Community>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .tags
            .iter()
            .filter(|t| t.approved && tag_names.contains(&t.tag_name))
            .filter_map(|t| {
                inner
                    .communities
                    .iter()
                    .find(|c| c.id == t.community_id)
                    .cloned()
            })
            .collect())
    }

    async fn community_tags(&self, community: Uuid) -> Result<Vec<CommunityTag>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .tags
            .iter()
            .filter(|t| t.community_id == community)
            .cloned()
            .collect())
    }

    async fn add_suggested_tags(&self, community: Uuid, tag_names: &[String]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        for name in tag_names {
            let exists = inner
                .tags
                .iter()
                .any(|t| t.community_id == community && &t.tag_name == name);
            if !exists {
                inner.tags.push(CommunityTag {
                    community_id: community,
                    tag_name: name.clone(),
                    source: TagSource::Ai,
                    approved: false,
                });
            }
        }
        Ok(())
    }

    async fn active_member_ids(
        &self,
        community: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        let mut members: Vec<Uuid> = inner
            .memberships
            .iter()
            .filter(|m| m.community_id == community && m.status == MemberStatus::Active)
            .map(|m| m.user_id)
            .collect();

        if let Some(limit) = limit {
            members.truncate(limit);
        }

        Ok(members)
    }

    async fn active_member_ids_of(&self, communities: &[Uuid]) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| {
                m.status == MemberStatus::Active && communities.contains(&m.community_id)
            })
            .map(|m| m.user_id)
            .collect())
    }

    async fn count_active_members_among(&self, community: Uuid, users: &[Uuid]) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| {
                m.community_id == community
                    && m.status == MemberStatus::Active
                    && users.contains(&m.user_id)
            })
            .count() as u64)
    }

    async fn active_community_ids(&self, user: Uuid) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user && m.status == MemberStatus::Active)
            .map(|m| m.community_id)
            .collect())
    }

    async fn active_community_ids_of(&self, users: &[Uuid]) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.status == MemberStatus::Active && users.contains(&m.user_id))
            .map(|m| m.community_id)
            .collect())
    }

    async fn profile(&self, user: Uuid) -> Result<Option<ProfileAttributes>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.profiles.get(&user).cloned())
    }

    async fn profiles(&self, users: &[Uuid]) -> Result<Vec<ProfileAttributes>> {
        let inner = self.inner.read().unwrap();
        Ok(users
            .iter()
            .filter_map(|user| inner.profiles.get(user).cloned())
            .collect())
    }

    async fn profile_ids_matching_location(
        &self,
        city: &str,
        state: &str,
        country: &str,
    ) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .profiles
            .iter()
            .filter(|(_, attrs)| {
                attrs.location.as_ref().is_some_and(|location| {
                    location.city == city
                        || location.state == state
                        || location.country == country
                })
            })
            .map(|(user, _)| *user)
            .collect())
    }

    async fn post(&self, id: Uuid) -> Result<Option<Post>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn posts(&self, community: Uuid) -> Result<Vec<Post>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .posts
            .iter()
            .filter(|p| p.community_id == community)
            .cloned()
            .collect())
    }

    async fn set_hover_summary(&self, post: Uuid, summary: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == post) {
            post.hover_summary = Some(summary.to_string());
        }
        Ok(())
    }

    async fn proposals(&self, community: Uuid) -> Result<Vec<Proposal>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .proposals
            .iter()
            .filter(|p| p.community_id == community)
            .cloned()
            .collect())
    }

    async fn dismiss(&self, user: Uuid, community: Uuid) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.dismissals.contains(&(user, community)) {
            inner.dismissals.push((user, community));
        }
        Ok(())
    }

    async fn undismiss(&self, user: Uuid, community: Uuid) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.dismissals.retain(|entry| entry != &(user, community));
        Ok(())
    }

    async fn dismissed_community_ids(&self, user: Uuid) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .dismissals
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, community)| *community)
            .collect())
    }
}
