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

pub mod defaults;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RecommenderConfig {
    /// How many communities the pool handed to scoring may contain.
    #[serde(default = "defaults::Recommender::candidate_pool_size")]
    pub candidate_pool_size: usize,

    #[serde(default = "defaults::Recommender::max_recommendations")]
    pub max_recommendations: usize,

    /// Cap on the member profiles sampled for demographic alignment. Scoring
    /// never scans a community's full member list.
    #[serde(default = "defaults::Recommender::member_sample_size")]
    pub member_sample_size: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            candidate_pool_size: defaults::Recommender::candidate_pool_size(),
            max_recommendations: defaults::Recommender::max_recommendations(),
            member_sample_size: defaults::Recommender::member_sample_size(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LlmConfig {
    /// Base url of an OpenAI-compatible completions endpoint.
    pub api: String,

    pub model: String,

    #[serde(default = "defaults::Llm::max_tokens")]
    pub max_tokens: u64,

    #[serde(default = "defaults::Llm::temperature")]
    pub temperature: f64,

    #[serde(default = "defaults::Llm::top_p")]
    pub top_p: f64,

    #[serde(default = "defaults::Llm::cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "defaults::Llm::cache_max_size")]
    pub cache_max_size: usize,
}
