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

use anyhow::anyhow;

use crate::config::LlmConfig;
use crate::Result;

/// Client for an OpenAI-compatible completions endpoint.
pub struct LlmApi {
    api: String,
    model: String,
    top_p: f64,
    temp: f64,
    max_tokens: Option<u64>,
    stop: Vec<String>,
}

impl LlmApi {
    pub fn builder(api: String, model: String) -> LlmApiBuilder {
        LlmApiBuilder::new(api, model)
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::builder(config.api.clone(), config.model.clone())
            .temp(config.temperature)
            .top_p(config.top_p)
            .max_tokens(config.max_tokens)
            .build()
    }

    fn payload(&self, prompt: &str) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "prompt": prompt,
            "temperature": self.temp,
            "top_p": self.top_p,
            "stop": self.stop.clone(),
            "model": self.model.clone(),
        });

        if let Some(max_tokens) = self.max_tokens {
            payload["max_tokens"] = serde_json::json!(max_tokens);
        }

        payload
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::new();
        let res = client
            .post(format!("{}/v1/completions", &self.api))
            .json(&self.payload(prompt))
            .send()
            .await?;

        let res = res.text().await?;

        let res: serde_json::Value = serde_json::from_str(&res)?;

        let res = res
            .get("choices")
            .ok_or(anyhow!("unexpected response format"))?
            .get(0)
            .ok_or(anyhow!("unexpected response format"))?
            .get("text")
            .ok_or(anyhow!("unexpected response format"))?
            .as_str()
            .ok_or(anyhow!("unexpected response format"))?;

        Ok(String::from(res))
    }
}

pub struct LlmApiBuilder {
    api: String,
    model: String,
    top_p: f64,
    temp: f64,
    max_tokens: Option<u64>,
    stop: Vec<String>,
}

impl LlmApiBuilder {
    pub fn new(api: String, model: String) -> Self {
        Self {
            api,
            model,
            top_p: 0.9,
            temp: 1.0,
            max_tokens: None,
            stop: vec![],
        }
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn temp(mut self, temp: f64) -> Self {
        self.temp = temp;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn stop(mut self, stop: Vec<&str>) -> Self {
        self.stop = stop.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> LlmApi {
        LlmApi {
            api: self.api,
            top_p: self.top_p,
            temp: self.temp,
            max_tokens: self.max_tokens,
            stop: self.stop,
            model: self.model,
        }
    }
}

/// Parse a JSON value out of a model reply, stripping the markdown code fence
/// models tend to wrap their answer in.
pub fn parse_json_reply<T: serde::de::DeserializeOwned>(reply: &str) -> Result<T> {
    let trimmed = reply.trim();
    let body = fenced_block(trimmed).unwrap_or(trimmed);

    Ok(serde_json::from_str(body.trim())?)
}

fn fenced_block(reply: &str) -> Option<&str> {
    let start = reply.find("```")?;
    let after = &reply[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```")?;

    Some(&after[..end])
}
