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

//! Recommendation core for Hearth.
//!
//! Users join communities, submit proposals and fund crowdfunding posts;
//! this crate decides which communities to put in front of them. Persistence
//! and authentication live in a managed backend that callers hand us through
//! the [`store::Store`] trait.

use thiserror::Error;

pub mod community;
pub mod config;
mod enum_map;
pub mod llm;
pub mod profile;
pub mod ranking;
pub mod recommender;
pub mod store;
pub mod summarizer;
pub mod tagger;
mod ttl_cache;

pub use recommender::Recommender;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Community not found")]
    CommunityNotFound,

    #[error("Post not found")]
    PostNotFound,
}

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;
