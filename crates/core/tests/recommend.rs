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

use chrono::Utc;
use uuid::Uuid;

use hearth::community::{
    Community, CommunityTag, MemberRole, MemberStatus, Membership, TagSource,
};
use hearth::config::RecommenderConfig;
use hearth::profile::{Location, ProfileAttributes};
use hearth::ranking::factors::{CommunitySize, SharedInterests, SharedTags};
use hearth::store::MemoryStore;
use hearth::Recommender;

fn recommender(store: &Arc<MemoryStore>) -> Recommender<MemoryStore> {
    Recommender::new(Arc::clone(store), RecommenderConfig::default())
}

fn community(store: &MemoryStore, name: &str, member_count: u64) -> Community {
    community_with(store, name, member_count, 0, false)
}

fn community_with(
    store: &MemoryStore,
    name: &str,
    member_count: u64,
    active_projects_count: u64,
    is_private: bool,
) -> Community {
    let community = Community {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        leader_id: Uuid::new_v4(),
        is_private,
        is_verified: false,
        member_count,
        active_projects_count,
        created_at: Utc::now(),
    };
    store.insert_community(community.clone());
    community
}

fn approved_tag(store: &MemoryStore, community: Uuid, name: &str) {
    tag(store, community, name, true);
}

fn tag(store: &MemoryStore, community: Uuid, name: &str, approved: bool) {
    store.insert_tag(CommunityTag {
        community_id: community,
        tag_name: name.to_string(),
        source: TagSource::Leader,
        approved,
    });
}

fn join(store: &MemoryStore, community: Uuid, user: Uuid, status: MemberStatus) {
    store.insert_membership(Membership {
        community_id: community,
        user_id: user,
        role: MemberRole::Member,
        status,
    });
}

fn user_with_interests(store: &MemoryStore, interests: &[&str]) -> Uuid {
    let user = Uuid::new_v4();
    store.insert_profile(
        user,
        ProfileAttributes {
            interests: interests.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
    );
    user
}

fn names(communities: &[Community]) -> Vec<&str> {
    communities.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn recommendations_ranked_by_score() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &["baking"]);

    let sourdough = community(&store, "sourdough circle", 50);
    approved_tag(&store, sourdough.id, "baking");
    let cycling = community(&store, "night riders", 50);
    approved_tag(&store, cycling.id, "cycling");

    let recommendations = recommender(&store).recommend(user).await.unwrap();

    assert_eq!(recommendations.len(), 2);
    assert_eq!(recommendations[0].community.name, "sourdough circle");

    let top = &recommendations[0];
    assert_eq!(top.score.factor(SharedTags.into()), 30.0);
    assert_eq!(top.score.factor(SharedInterests.into()), 20.0);
    assert_eq!(top.score.factor(CommunitySize.into()), 3.0);
    assert_eq!(top.score.total(), 53.0);
    assert_eq!(top.tags, vec!["baking".to_string()]);

    assert_eq!(recommendations[1].score.total(), 3.0);
}

#[tokio::test]
async fn joined_dismissed_and_private_are_not_candidates() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);

    let joined = community(&store, "joined", 50);
    join(&store, joined.id, user, MemberStatus::Active);

    let dismissed = community(&store, "dismissed", 50);

    let pending = community(&store, "pending", 50);
    join(&store, pending.id, user, MemberStatus::Pending);

    community_with(&store, "hidden", 50, 0, true);
    community(&store, "open", 50);

    let recommender = recommender(&store);
    recommender.dismiss(user, dismissed.id).await.unwrap();

    let recommendations = recommender.recommend(user).await.unwrap();

    let recommended: Vec<&str> = recommendations
        .iter()
        .map(|r| r.community.name.as_str())
        .collect();

    // a pending membership does not count as joined
    assert_eq!(recommended, vec!["pending", "open"]);
}

#[tokio::test]
async fn missing_profile_is_an_error() {
    let store = Arc::new(MemoryStore::new());

    let err = recommender(&store).recommend(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<hearth::Error>(),
        Some(hearth::Error::ProfileNotFound)
    ));
}

#[tokio::test]
async fn pool_keeps_the_biggest_communities() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);

    community(&store, "tiny", 30);
    community(&store, "mid", 40);
    community(&store, "big", 50);

    let config = RecommenderConfig {
        candidate_pool_size: 2,
        ..Default::default()
    };
    let recommender = Recommender::new(Arc::clone(&store), config);

    let recommendations = recommender.recommend(user).await.unwrap();

    let recommended: Vec<&str> = recommendations
        .iter()
        .map(|r| r.community.name.as_str())
        .collect();

    // equal totals keep pool order, biggest first
    assert_eq!(recommended, vec!["big", "mid"]);
}

#[tokio::test]
async fn oversized_result_is_cut_by_diversity_buckets() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);

    for i in 0..6 {
        community(&store, &format!("medium-{i}"), 50);
    }

    let config = RecommenderConfig {
        max_recommendations: 4,
        ..Default::default()
    };
    let recommender = Recommender::new(Arc::clone(&store), config);

    let recommendations = recommender.recommend(user).await.unwrap();

    // six medium candidates, quota floor(4 * 0.5) = 2; the other buckets are
    // empty and are not backfilled
    assert_eq!(recommendations.len(), 2);
}

#[tokio::test]
async fn accessible_ids_are_public_plus_active_memberships() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);

    let open = community(&store, "open", 10);
    let mine = community_with(&store, "mine", 10, 0, true);
    join(&store, mine.id, user, MemberStatus::Active);
    let pending = community_with(&store, "pending", 10, 0, true);
    join(&store, pending.id, user, MemberStatus::Pending);
    let closed = community_with(&store, "closed", 10, 0, true);

    let ids = vec![open.id, mine.id, pending.id, closed.id];
    let accessible = recommender(&store)
        .filter_accessible(user, &ids)
        .await
        .unwrap();

    assert_eq!(accessible, vec![open.id, mine.id]);
}

#[tokio::test]
async fn trending_orders_by_activity_then_size() {
    let store = Arc::new(MemoryStore::new());

    community_with(&store, "quiet", 500, 0, false);
    community_with(&store, "busy-small", 10, 5, false);
    community_with(&store, "busy-big", 99, 5, false);
    community_with(&store, "busiest", 5, 9, false);
    community_with(&store, "private-busy", 50, 9, true);

    let trending = recommender(&store).trending(10).await.unwrap();

    assert_eq!(names(&trending), vec!["busiest", "busy-big", "busy-small"]);
}

#[tokio::test]
async fn by_tags_dedups_and_skips_private() {
    let store = Arc::new(MemoryStore::new());

    let bakery = community(&store, "bakery", 10);
    approved_tag(&store, bakery.id, "baking");
    approved_tag(&store, bakery.id, "bread");

    let hidden = community_with(&store, "hidden", 10, 0, true);
    approved_tag(&store, hidden.id, "baking");

    let unreviewed = community(&store, "unreviewed", 10);
    tag(&store, unreviewed.id, "baking", false);

    let recommender = recommender(&store);

    let tags = vec!["baking".to_string(), "bread".to_string()];
    let matches = recommender.communities_by_tags(&tags, 10).await.unwrap();
    assert_eq!(names(&matches), vec!["bakery"]);

    let none = recommender.communities_by_tags(&[], 10).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn nearby_goes_through_leader_locations() {
    let store = Arc::new(MemoryStore::new());

    let local_leader = Uuid::new_v4();
    store.insert_profile(
        local_leader,
        ProfileAttributes {
            location: Some(Location {
                city: "Aarhus".to_string(),
                state: "Midtjylland".to_string(),
                country: "Denmark".to_string(),
            }),
            ..Default::default()
        },
    );

    let remote_leader = Uuid::new_v4();
    store.insert_profile(
        remote_leader,
        ProfileAttributes {
            location: Some(Location {
                city: "Berlin".to_string(),
                state: "Berlin".to_string(),
                country: "Germany".to_string(),
            }),
            ..Default::default()
        },
    );

    for (name, leader) in [("locals", local_leader), ("remotes", remote_leader)] {
        store.insert_community(Community {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            leader_id: leader,
            is_private: false,
            is_verified: false,
            member_count: 10,
            active_projects_count: 0,
            created_at: Utc::now(),
        });
    }

    let nearby = recommender(&store)
        .nearby("Aarhus", "Midtjylland", "Denmark", 10)
        .await
        .unwrap();

    assert_eq!(names(&nearby), vec!["locals"]);
}

#[tokio::test]
async fn mutual_member_discovery_walks_co_memberships() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);

    let home = community(&store, "home", 10);
    let via_peer_a = community(&store, "via-a", 10);
    let via_peer_b = community(&store, "via-b", 10);

    join(&store, home.id, user, MemberStatus::Active);

    let peer_a = Uuid::new_v4();
    join(&store, home.id, peer_a, MemberStatus::Active);
    join(&store, via_peer_a.id, peer_a, MemberStatus::Active);

    let peer_b = Uuid::new_v4();
    join(&store, home.id, peer_b, MemberStatus::Active);
    join(&store, via_peer_b.id, peer_b, MemberStatus::Active);

    let found = recommender(&store)
        .communities_with_mutual_members(user, 10)
        .await
        .unwrap();

    // the user's own community never recommends itself
    assert_eq!(found, vec![via_peer_a.id, via_peer_b.id]);
}

#[tokio::test]
async fn dismissals_roundtrip() {
    let store = Arc::new(MemoryStore::new());
    let user = user_with_interests(&store, &[]);
    let c = community(&store, "noisy", 10);

    let recommender = recommender(&store);

    recommender.dismiss(user, c.id).await.unwrap();
    recommender.dismiss(user, c.id).await.unwrap();
    assert_eq!(recommender.dismissed(user).await.unwrap(), vec![c.id]);

    recommender.undismiss(user, c.id).await.unwrap();
    assert!(recommender.dismissed(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn onboarding_probe() {
    let store = Arc::new(MemoryStore::new());

    let done = Uuid::new_v4();
    store.insert_profile(
        done,
        ProfileAttributes {
            onboarding_completed: true,
            ..Default::default()
        },
    );

    let recommender = recommender(&store);

    assert!(recommender.has_completed_onboarding(done).await.unwrap());
    assert!(!recommender
        .has_completed_onboarding(Uuid::new_v4())
        .await
        .unwrap());
}
