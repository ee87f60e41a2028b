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

pub struct Recommender;

impl Recommender {
    pub fn candidate_pool_size() -> usize {
        50
    }

    pub fn max_recommendations() -> usize {
        10
    }

    pub fn member_sample_size() -> usize {
        20
    }
}

pub struct Llm;

impl Llm {
    pub fn max_tokens() -> u64 {
        1_024
    }

    pub fn temperature() -> f64 {
        0.7
    }

    pub fn top_p() -> f64 {
        0.9
    }

    pub fn cache_ttl_secs() -> u64 {
        3_600
    }

    pub fn cache_max_size() -> usize {
        1_024
    }
}
