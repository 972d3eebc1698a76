use serde::Deserialize;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::models::{PlaylistSummary, SourcePlaylist, TrackDescriptor};
use crate::sources::http::{ApiClient, ApiRequest};
use crate::sources::SourceReader;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 50;

/// 삭제되었거나 비공개가 된 영상은 이 제목으로 내려온다.
const UNAVAILABLE_TITLES: [&str; 2] = ["Deleted video", "Private video"];

/// YouTube Data API v3 읽기 전용 클라이언트.
pub struct YoutubeClient {
    api: ApiClient,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<YoutubePlaylist>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct YoutubePlaylist {
    id: String,
    snippet: Snippet,
    content_details: Option<ContentDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    item_count: u32,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

impl YoutubeClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn url(path: &str) -> String {
        format!("{API_BASE}{path}")
    }

    /// ID가 정확히 하나의 플레이리스트로 해석되어야 한다. 0개나 여러 개면 NotFound.
    fn playlist_title(&self, playlist_id: &str) -> Result<String> {
        let req = ApiRequest::get(Self::url("/playlists"))
            .query("part", "snippet")
            .query("id", playlist_id)
            .query("maxResults", PAGE_SIZE);
        let resp: PlaylistListResponse = self.api.json(&req)?;

        match resp.items.as_slice() {
            [playlist] => {
                debug!(playlist_id, title = %playlist.snippet.title, "youtube.playlist");
                Ok(playlist.snippet.title.clone())
            }
            [] => Err(MigrateError::NotFound(format!(
                "YouTube playlist {playlist_id}"
            ))),
            many => Err(MigrateError::NotFound(format!(
                "YouTube playlist {playlist_id} is ambiguous ({} matches)",
                many.len()
            ))),
        }
    }

    /// 재생목록의 모든 영상 제목. `nextPageToken`이 없어질 때까지 읽는다.
    pub fn playlist_titles(&self, playlist_id: &str) -> Result<Vec<TrackDescriptor>> {
        let mut titles = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = ApiRequest::get(Self::url("/playlistItems"))
                .query("part", "snippet")
                .query("playlistId", playlist_id)
                .query("maxResults", PAGE_SIZE);
            if let Some(ref token) = page_token {
                req = req.query("pageToken", token);
            }
            let page: PlaylistItemsPage = self.api.json(&req)?;

            for item in page.items {
                if UNAVAILABLE_TITLES.contains(&item.snippet.title.as_str()) {
                    debug!(playlist_id, "youtube.skip_unavailable");
                    continue;
                }
                titles.push(TrackDescriptor::new(item.snippet.title));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(playlist_id, count = titles.len(), "youtube.playlist_items");
        Ok(titles)
    }
}

impl SourceReader for YoutubeClient {
    fn read_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist> {
        let name = self.playlist_title(playlist_id)?;
        let tracks = self.playlist_titles(playlist_id)?;
        Ok(SourcePlaylist { name, tracks })
    }

    fn list_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = ApiRequest::get(Self::url("/playlists"))
                .query("part", "snippet,contentDetails")
                .query("mine", "true")
                .query("maxResults", PAGE_SIZE);
            if let Some(ref token) = page_token {
                req = req.query("pageToken", token);
            }
            let page: PlaylistListResponse = self.api.json(&req)?;

            playlists.extend(page.items.into_iter().map(|p| PlaylistSummary {
                id: p.id,
                name: p.snippet.title,
                track_count: p.content_details.map(|d| d.item_count),
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(playlists)
    }
}
