//! HTTP demo client for a running sentimeter server.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Client;

pub const DEFAULT_ANALYZE_URL: &str = "http://localhost:5000/api/sentiment/analyze";

const SAMPLE_TWEETS: [&str; 8] = [
    "I love this new product! It's amazing!",
    "This is terrible, I'm very disappointed.",
    "The service was okay, nothing special.",
    "Great customer service and fast delivery.",
    "The product arrived damaged and customer service was unhelpful.",
    "I'm really enjoying using this app, it's so intuitive!",
    "This update has made everything worse, I can't find anything now.",
    "Just a normal day, nothing exciting happened.",
];

/// Human label for a score.
pub(crate) fn category(score: f64) -> &'static str {
    if score > 0.5 {
        "Very Positive"
    } else if score > 0.0 {
        "Positive"
    } else if score < -0.5 {
        "Very Negative"
    } else if score < 0.0 {
        "Negative"
    } else {
        "Neutral"
    }
}

/// Thin client for `POST /api/sentiment/analyze`.
pub(crate) struct DemoClient {
    client: Client,
    url: String,
}

impl DemoClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub(crate) fn new(url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("sentimeter-cli/0.1 (demo)")
            .build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    /// Send `tweets` and return the server's `{tweet: score}` map.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx response; the server's
    /// `error` message is included when present.
    pub(crate) async fn analyze(&self, tweets: &[String]) -> anyhow::Result<BTreeMap<String, f64>> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "tweets": tweets }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"].as_str().unwrap_or("no error message");
            anyhow::bail!("server returned {status}: {message}");
        }

        Ok(response.json().await?)
    }
}

fn render_results(results: &BTreeMap<String, f64>) -> String {
    let rule = "-".repeat(80);
    let mut out = String::new();
    for (tweet, score) in results {
        out.push_str(&format!(
            "Tweet: {tweet}\nScore: {score:.4} - {}\n{rule}\n",
            category(*score)
        ));
    }
    out
}

/// # Errors
///
/// Returns an error if the server cannot be reached or rejects the request.
pub(crate) async fn run_demo(url: &str, texts: Vec<String>) -> anyhow::Result<()> {
    let tweets = if texts.is_empty() {
        SAMPLE_TWEETS.iter().map(|t| (*t).to_string()).collect()
    } else {
        texts
    };

    println!("analyzing {} tweets via {url}", tweets.len());
    let client = DemoClient::new(url)?;
    let started = Instant::now();
    let results = client.analyze(&tweets).await?;

    print!("{}", render_results(&results));
    println!("analysis completed in {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
#[path = "demo_test.rs"]
mod tests;
