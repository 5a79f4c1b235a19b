use async_trait::async_trait;
use futures_util::future::join_all;
use crate::config::Config;
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub mod platform;

pub use platform::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Taken,
    /// The name can't exist on the platform
    Invalid,
    Unknown,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Availability::Available => "available",
            Availability::Taken => "taken",
            Availability::Invalid => "invalid",
            Availability::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub username: String,
    pub platform: Platform,
    pub availability: Availability,
}

#[async_trait]
pub trait UsernameChecker: Send + Sync {
    async fn check(&self, username: &str, platform: Platform) -> Availability;
}

/// Checks a name by requesting its public profile page
pub struct ProfileProbe {
    http_client: reqwest::Client,
}

impl ProfileProbe {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.sherlock_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl UsernameChecker for ProfileProbe {
    async fn check(&self, username: &str, platform: Platform) -> Availability {
        if !is_plausible_username(username) {
            return Availability::Invalid;
        }

        let url = platform.profile_url(username);
        match self.http_client.get(&url).send().await {
            Ok(response) => availability_from_status(response.status()),
            Err(e) => {
                debug!("Profile probe for {} failed: {}", url, e);
                Availability::Unknown
            }
        }
    }
}

fn availability_from_status(status: reqwest::StatusCode) -> Availability {
    if status == reqwest::StatusCode::NOT_FOUND {
        Availability::Available
    } else if status.is_success() {
        Availability::Taken
    } else {
        Availability::Unknown
    }
}

/// Usernames on every supported platform share this character set
pub fn is_plausible_username(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Names worth looking up for a member, without blanks or duplicates
pub fn candidate_names(display_name: &str, nick: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in std::iter::once(display_name).chain(nick) {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Check every name on every platform concurrently. Results keep the
/// order of `names`, then `platforms`.
pub async fn execute_queries(
    checker: &dyn UsernameChecker,
    names: &[String],
    platforms: &[Platform],
) -> Vec<QueryResult> {
    let queries = names.iter().flat_map(|name| {
        platforms.iter().map(move |&platform| async move {
            QueryResult {
                username: name.clone(),
                platform,
                availability: checker.check(name, platform).await,
            }
        })
    });
    join_all(queries).await
}

/// Group results into one `(username, lines)` pair per name, for display
pub fn summarize(results: &[QueryResult]) -> Vec<(String, String)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for result in results {
        let line = format!("{} {}: {}", marker(result.availability), result.platform, result.availability);
        match grouped.iter_mut().find(|(name, _)| *name == result.username) {
            Some((_, lines)) => lines.push(line),
            None => grouped.push((result.username.clone(), vec![line])),
        }
    }
    grouped
        .into_iter()
        .map(|(name, lines)| (name, lines.join("\n")))
        .collect()
}

fn marker(availability: Availability) -> &'static str {
    match availability {
        Availability::Available => "✅",
        Availability::Taken => "❌",
        Availability::Invalid => "⚠️",
        Availability::Unknown => "❔",
    }
}
