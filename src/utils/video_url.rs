use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Whether `candidate` looks like a YouTube video id.
pub fn is_video_id(candidate: &str) -> bool {
    VIDEO_ID.is_match(candidate)
}

fn parse(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('<') || raw.contains('>') {
        return None;
    }
    let url = if raw.contains("://") {
        Url::parse(raw).ok()?
    } else {
        // `javascript:` and friends parse as absolute URLs, so the scheme check below catches them.
        Url::parse(raw)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .or_else(|| Url::parse(&format!("https://{}", raw)).ok())?
    };
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

fn first_segment_after<'a>(url: &'a Url, prefix: &str) -> Option<&'a str> {
    let mut segments = url.path_segments()?;
    if segments.next()? != prefix {
        return None;
    }
    segments.next()
}

/// Pull the 11-character video id out of a watch, short-link, embed or shorts URL.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let url = parse(raw)?;
    let host = url.host_str()?.to_lowercase();

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        url.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        if url.path() == "/watch" {
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
        } else {
            first_segment_after(&url, "embed")
                .or_else(|| first_segment_after(&url, "shorts"))
                .map(str::to_string)
        }
    } else {
        None
    }?;

    is_video_id(&candidate).then_some(candidate)
}

pub fn is_video_url(raw: &str) -> bool {
    extract_video_id(raw).is_some()
}

/// Link that opens `video_id` at the given offset.
pub fn watch_url_at(video_id: &str, seconds: f64) -> String {
    format!(
        "https://www.youtube.com/watch?v={}&t={}s",
        video_id,
        seconds.max(0.0).floor() as u64
    )
}
