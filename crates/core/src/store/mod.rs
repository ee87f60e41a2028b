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

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::community::{Community, CommunityTag, Post, Proposal};
use crate::profile::ProfileAttributes;
use crate::Result;

/// Persistence seam towards the managed backend.
///
/// Every method maps to a single equality/containment lookup; ordering,
/// sampling policy and all scoring arithmetic stay in this crate. Individual
/// lookups carry no ordering dependency on each other and may be issued
/// concurrently.
#[async_trait]
pub trait Store: Send + Sync {
    async fn community(&self, id: Uuid) -> Result<Option<Community>>;

    async fn communities(&self, ids: &[Uuid]) -> Result<Vec<Community>>;

    async fn public_communities(&self) -> Result<Vec<Community>>;

    async fn communities_led_by(&self, leaders: &[Uuid]) -> Result<Vec<Community>>;

    /// Communities holding an approved tag with one of the given names. One
    /// entry per matching tag, so a community may appear more than once.
    async fn communities_with_approved_tags(&self, tag_names: &[String])
        -> Result<Vec<Community>>;

    async fn community_tags(&self, community: Uuid) -> Result<Vec<CommunityTag>>;

    /// Record model-suggested tags as unapproved, skipping names the
    /// community already has.
    async fn add_suggested_tags(&self, community: Uuid, tag_names: &[String]) -> Result<()>;

    async fn active_member_ids(&self, community: Uuid, limit: Option<usize>)
        -> Result<Vec<Uuid>>;

    /// Active member ids across several communities; a user appears once per
    /// membership.
    async fn active_member_ids_of(&self, communities: &[Uuid]) -> Result<Vec<Uuid>>;

    async fn count_active_members_among(&self, community: Uuid, users: &[Uuid]) -> Result<u64>;

    async fn active_community_ids(&self, user: Uuid) -> Result<Vec<Uuid>>;

    /// Active community ids across several users; a community appears once
    /// per membership.
    async fn active_community_ids_of(&self, users: &[Uuid]) -> Result<Vec<Uuid>>;

    async fn profile(&self, user: Uuid) -> Result<Option<ProfileAttributes>>;

    async fn profiles(&self, users: &[Uuid]) -> Result<Vec<ProfileAttributes>>;

    /// Ids of users whose profile location matches any of the given city,
    /// state or country.
    async fn profile_ids_matching_location(
        &self,
        city: &str,
        state: &str,
        country: &str,
    ) -> Result<Vec<Uuid>>;

    async fn post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn posts(&self, community: Uuid) -> Result<Vec<Post>>;

    async fn set_hover_summary(&self, post: Uuid, summary: &str) -> Result<()>;

    async fn proposals(&self, community: Uuid) -> Result<Vec<Proposal>>;

    async fn dismiss(&self, user: Uuid, community: Uuid) -> Result<()>;

    async fn undismiss(&self, user: Uuid, community: Uuid) -> Result<()>;

    async fn dismissed_community_ids(&self, user: Uuid) -> Result<Vec<Uuid>>;
}
