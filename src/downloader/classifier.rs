// URL classification - pure, total functions over raw URL strings
//
// Malformed input never fails; it simply classifies as a plain single item.

use url::Url;

/// Query parameters that only make sense inside a playlist context
const PLAYLIST_CONTEXT_PARAMS: &[&str] = &["list", "index"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A single media item (or anything unrecognised)
    Single,
    /// A playlist listing without a specific watched item
    PlaylistRoot,
    /// A specific item opened from inside a playlist
    ItemInPlaylist { start_index: usize },
}

pub fn classify(url: &str) -> UrlKind {
    if is_playlist_root(url) {
        UrlKind::PlaylistRoot
    } else if is_item_within_playlist(url) {
        UrlKind::ItemInPlaylist {
            start_index: extract_start_index(url),
        }
    } else {
        UrlKind::Single
    }
}

fn parse(url: &str) -> Option<Url> {
    Url::parse(url.trim()).ok()
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.into_owned())
}

/// `v=` on watch pages, or the path segment of a youtu.be short link
fn has_video_id(url: &Url) -> bool {
    if query_value(url, "v").is_some() {
        return true;
    }
    let is_short_link = url
        .host_str()
        .map(|h| h.eq_ignore_ascii_case("youtu.be"))
        .unwrap_or(false);
    is_short_link && url.path().trim_matches('/').len() > 1
}

pub fn is_playlist_root(url: &str) -> bool {
    parse(url)
        .map(|u| query_value(&u, "list").is_some() && !has_video_id(&u))
        .unwrap_or(false)
}

pub fn is_item_within_playlist(url: &str) -> bool {
    parse(url)
        .map(|u| query_value(&u, "list").is_some() && has_video_id(&u))
        .unwrap_or(false)
}

/// 1-based playlist position from `index=`; 1 when absent or unparsable
pub fn extract_start_index(url: &str) -> usize {
    parse(url)
        .and_then(|u| query_value(&u, "index"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&i| i >= 1)
        .unwrap_or(1)
}

/// Host match against a configured set; subdomains of an entry match too
pub fn is_primary_host<S: AsRef<str>>(url: &str, hosts: &[S]) -> bool {
    let Some(host) = parse(url).and_then(|u| u.host_str().map(|h| h.to_lowercase())) else {
        return false;
    };
    hosts.iter().any(|entry| {
        let entry = entry.as_ref().trim().to_lowercase();
        !entry.is_empty() && (host == entry || host.ends_with(&format!(".{}", entry)))
    })
}

/// Drop playlist-context parameters so the tool fetches only the item itself
pub fn strip_playlist_context(url: &str) -> String {
    let Some(mut parsed) = parse(url) else {
        return match url.find("&list=") {
            Some(pos) => url[..pos].to_string(),
            None => url.to_string(),
        };
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !PLAYLIST_CONTEXT_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}
