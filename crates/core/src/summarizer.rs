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
use tracing::warn;
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::llm::LlmApi;
use crate::store::Store;
use crate::ttl_cache::TtlCache;
use crate::{Error, Result};

const SUMMARY_MAX_TOKENS: u64 = 256;
const SUMMARY_TEMPERATURE: f64 = 0.5;

// the prompt asks for 15 words; allow some creative overflow before warning
const SUMMARY_WORD_LIMIT: usize = 20;

/// One-sentence hover summaries for crowdfunding posts.
pub struct PostSummarizer<S: Store> {
    api: LlmApi,
    store: Arc<S>,
    cache: Mutex<TtlCache<String, String>>,
}

impl<S: Store> PostSummarizer<S> {
    pub fn new(store: Arc<S>, config: &LlmConfig) -> Self {
        Self {
            api: LlmApi::builder(config.api.clone(), config.model.clone())
                .temp(SUMMARY_TEMPERATURE)
                .top_p(config.top_p)
                .max_tokens(SUMMARY_MAX_TOKENS)
                .build(),
            store,
            cache: Mutex::new(TtlCache::with_ttl_and_max_size(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_max_size,
            )),
        }
    }

    /// Summarize arbitrary title and description text.
    pub async fn summarize(&self, title: &str, description: &str) -> Result<String> {
        let key = cache_key(title, description);
        if let Some(summary) = self.cache.lock().await.get(&key) {
            return Ok(summary.clone());
        }

        let reply = self.api.generate(&summarize_prompt(title, description)).await?;
        let summary = reply.trim().to_string();

        let words = summary.split_whitespace().count();
        if words > SUMMARY_WORD_LIMIT {
            warn!(words, "summary exceeded word limit");
        }

        self.cache.lock().await.insert(key, summary.clone());

        Ok(summary)
    }

    /// Summarize a stored post and persist the summary on it.
    pub async fn summarize_post(&self, post_id: Uuid) -> Result<String> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(Error::PostNotFound)?;

        let summary = self.summarize(&post.title, &post.description).await?;
        self.store.set_hover_summary(post_id, &summary).await?;

        Ok(summary)
    }
}

fn cache_key(title: &str, description: &str) -> String {
    let prefix: String = description.chars().take(50).collect();
    format!("summary:{title}:{prefix}")
}

fn summarize_prompt(title: &str, description: &str) -> String {
    format!(
        r#"Summarize this crowdfunding project in ONE sentence (max 15 words) suitable for a hover preview.

Project Title: {title}
Description: {description}

Requirements:
- Exactly one sentence
- Maximum 15 words
- Focus on what's being funded and why
- Be concise and compelling
- No emojis or special characters

Return ONLY the summary sentence, nothing else.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_truncates_long_descriptions() {
        let description = "ø".repeat(120);
        let key = cache_key("title", &description);

        assert_eq!(key, format!("summary:title:{}", "ø".repeat(50)));
    }
}
