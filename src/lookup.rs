/// The encyclopedia lookup: fetch an article introduction for a topic
/// and pick one good sentence from it.
///
/// The HTTP round trip runs on a worker thread and reports back over a
/// channel, so the animation loop never blocks on the network. Every
/// attempted title is appended to the query log; every title that
/// yielded a usable sentence goes to the success log as well. Both logs
/// are plain append-only text files, one title per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::config::LookupConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub extract: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// Upstream data missing or malformed — the API is down or changed.
    #[error("invalid upstream response")]
    InvalidResponse,
    /// No article with that title.
    #[error("article not found")]
    NotFound,
    /// The article has no usable sentences.
    #[error("article has no content")]
    NoContent,
    /// Only sub-10-character fragments were available.
    #[error("best sentence too short")]
    TooShort,
    /// Network or decode failure, distinct from the typed kinds above.
    #[error("transport failure: {0}")]
    Transport(String),
}

pub type LookupReply = Result<Article, LookupError>;

// ── Upstream wire shape ──

#[derive(Deserialize, Debug, Default)]
pub struct ApiResponse {
    query: Option<ApiQuery>,
}

#[derive(Deserialize, Debug)]
struct ApiQuery {
    pages: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize, Debug, Default)]
struct ApiPage {
    title: Option<String>,
    extract: Option<String>,
}

// ── Public entry points ──

/// Run the lookup on a worker thread; the result arrives on the
/// returned channel. Dropping the receiver abandons the query.
pub fn spawn(cfg: LookupConfig, title: String) -> Receiver<LookupReply> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(lookup(&cfg, &title));
    });
    rx
}

/// Blocking lookup: query the endpoint, decode, pick a sentence.
pub fn lookup(cfg: &LookupConfig, title: &str) -> LookupReply {
    append_line(&cfg.query_log, title);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
        .map_err(transport)?;

    let response = client
        .get(&cfg.endpoint)
        .query(&[
            ("action", "query"),
            ("prop", "extracts|info"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("inprop", "url"),
            ("format", "json"),
            ("titles", title),
        ])
        .send()
        .map_err(transport)?;

    let data: ApiResponse = response.json().map_err(transport)?;
    let article = resolve(data, &mut rand::rng())?;

    append_line(&cfg.success_log, &article.title);
    Ok(article)
}

fn transport(e: reqwest::Error) -> LookupError {
    LookupError::Transport(e.to_string())
}

// ── Decoding and sentence selection (pure, tested) ──

/// Turn a decoded upstream response into one good sentence.
pub fn resolve(data: ApiResponse, rng: &mut impl Rng) -> LookupReply {
    let (title, extract) = first_page(data)?;
    let pick = pick_sentence(&extract, rng)?;
    Ok(Article {
        title,
        extract: pick,
    })
}

/// The first page of the response, as (title, extract).
fn first_page(data: ApiResponse) -> Result<(String, String), LookupError> {
    let pages = data
        .query
        .and_then(|q| q.pages)
        .filter(|p| !p.is_empty())
        .ok_or(LookupError::InvalidResponse)?;

    // Pages are keyed by page id; the first entry is the match.
    let page: ApiPage = pages
        .into_iter()
        .next()
        .and_then(|(_, v)| serde_json::from_value(v).ok())
        .ok_or(LookupError::InvalidResponse)?;

    let extract = match page.extract {
        Some(e) if !e.is_empty() => e,
        _ => return Err(LookupError::NotFound),
    };
    Ok((page.title.unwrap_or_default(), extract))
}

/// Candidate sentences: split after `\n . ! ?`, dropping fragments that
/// are empty after trimming or end in `:` (headers, lead-ins).
pub fn sentence_pool(extract: &str) -> Vec<&str> {
    extract
        .split_inclusive(['\n', '.', '!', '?'])
        .filter(|frag| {
            let t = frag.trim();
            !t.is_empty() && !t.ends_with(':')
        })
        .collect()
}

/// Pick one sentence uniformly at random. Sub-10-byte picks (after
/// trimming) are rejected rather than silently surfaced.
fn pick_sentence(extract: &str, rng: &mut impl Rng) -> Result<String, LookupError> {
    let pool = sentence_pool(extract);
    if pool.is_empty() {
        return Err(LookupError::NoContent);
    }

    let pick = pool[rng.random_range(0..pool.len())].trim();
    if pick.len() < 10 {
        return Err(LookupError::TooShort);
    }
    Ok(pick.to_string())
}

// ── Audit logs ──

/// Append one line; log failures never fail the lookup.
fn append_line(path: &Path, title: &str) {
    if path.as_os_str().is_empty() {
        return;
    }
    let file = OpenOptions::new().append(true).create(true).open(path);
    if let Ok(mut f) = file {
        let _ = writeln!(f, "{title}");
    }
}
