use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::models::{CatalogTrack, PlaylistSummary, SourcePlaylist, TrackDescriptor};
use crate::sources::http::{ApiClient, ApiRequest};
use crate::sources::{Catalog, SourceReader};

const API_BASE: &str = "https://api.spotify.com/v1";

/// 플레이리스트 트랙 추가 요청 하나에 담을 수 있는 최대 URI 수.
pub const MAX_ITEMS_PER_ADD: usize = 100;
/// `PUT /me/tracks` 한 번에 보낼 수 있는 최대 ID 수.
pub const MAX_IDS_PER_LIKE: usize = 50;
/// `/search`의 `limit` 최댓값.
pub const MAX_SEARCH_LIMIT: u32 = 50;

const PLAYLIST_PAGE_LIMIT: usize = 100;
const SAVED_PAGE_LIMIT: usize = 50;
const USER_PLAYLISTS_LIMIT: usize = 50;

/// Spotify Web API 클라이언트.
/// 소스(플레이리스트 읽기)와 대상 카탈로그(검색, 생성, 추가) 역할을 모두 한다.
pub struct SpotifyClient {
    api: ApiClient,
    user_id: String,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    name: String,
}

#[derive(Deserialize)]
struct PlaylistTracksPage {
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TracksResult,
}

#[derive(Deserialize)]
struct TracksResult {
    items: Vec<SpotifyTrack>,
    total: u32,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    // local files have no id
    id: Option<String>,
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Deserialize)]
struct UserPlaylistsPage {
    items: Vec<SimplePlaylist>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct SimplePlaylist {
    id: String,
    name: String,
    tracks: Option<TracksRef>,
}

#[derive(Deserialize)]
struct TracksRef {
    total: u32,
}

#[derive(Deserialize)]
struct SavedTracksPage {
    items: Vec<SavedTrack>,
    total: usize,
}

#[derive(Deserialize)]
struct SavedTrack {
    track: SpotifyTrack,
}

impl SpotifyTrack {
    /// `"Artist - Title"` 형식의 설명 문자열.
    fn descriptor(&self) -> TrackDescriptor {
        match self.artists.first() {
            Some(artist) => TrackDescriptor::new(format!("{} - {}", artist.name, self.name)),
            None => TrackDescriptor::new(self.name.clone()),
        }
    }

    fn into_catalog(self) -> CatalogTrack {
        CatalogTrack {
            uri: self.uri,
            name: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

impl SpotifyClient {
    pub fn new(user_id: &str, api: ApiClient) -> Result<Self> {
        if user_id.trim().is_empty() {
            return Err(MigrateError::InvalidArgument(
                "Spotify user id is required".to_string(),
            ));
        }
        Ok(Self {
            api,
            user_id: user_id.to_string(),
        })
    }

    fn url(path: &str) -> String {
        format!("{API_BASE}{path}")
    }

    /// 404 응답을 NotFound로 바꾼다.
    fn lookup_playlist(&self, playlist_id: &str) -> Result<PlaylistResponse> {
        let req = ApiRequest::get(Self::url(&format!("/playlists/{playlist_id}")))
            .query("fields", "name");
        self.api.json(&req).map_err(|e| match e.status() {
            Some(404) => MigrateError::NotFound(format!("Spotify playlist {playlist_id}")),
            _ => e,
        })
    }

    /// 플레이리스트의 모든 트랙을 `"Artist - Title"` 형식으로 가져온다.
    /// offset을 늘려가며 빈 페이지, limit보다 짧은 페이지, 또는 `next`가 없는 페이지에서 멈춘다.
    pub fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackDescriptor>> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let req = ApiRequest::get(Self::url(&format!("/playlists/{playlist_id}/tracks")))
                .query("offset", offset)
                .query("limit", PLAYLIST_PAGE_LIMIT);
            let page: PlaylistTracksPage = self.api.json(&req)?;

            let count = page.items.len();
            if count == 0 {
                break;
            }
            tracks.extend(
                page.items
                    .iter()
                    .filter_map(|item| item.track.as_ref())
                    .map(SpotifyTrack::descriptor),
            );
            if count < PLAYLIST_PAGE_LIMIT || page.next.is_none() {
                break;
            }
            offset += PLAYLIST_PAGE_LIMIT;
        }

        debug!(playlist_id, count = tracks.len(), "spotify.playlist_tracks");
        Ok(tracks)
    }

    /// 플레이리스트의 모든 트랙 ID. 응답의 `next` URL을 따라간다.
    pub fn playlist_track_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut req = ApiRequest::get(Self::url(&format!("/playlists/{playlist_id}/tracks")))
            .query("limit", PLAYLIST_PAGE_LIMIT);

        loop {
            let page: PlaylistTracksPage = self.api.json(&req)?;
            ids.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter_map(|track| track.id),
            );
            match page.next {
                Some(next) => req = ApiRequest::get(next),
                None => break,
            }
        }

        Ok(ids)
    }

    /// 좋아요 표시한 모든 트랙 ID.
    pub fn liked_track_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut offset = 0;

        loop {
            let req = ApiRequest::get(Self::url("/me/tracks"))
                .query("offset", offset)
                .query("limit", SAVED_PAGE_LIMIT);
            let page: SavedTracksPage = self.api.json(&req)?;

            if page.items.is_empty() {
                break;
            }
            offset += page.items.len();
            ids.extend(page.items.into_iter().filter_map(|saved| saved.track.id));
            if offset >= page.total {
                break;
            }
        }

        Ok(ids)
    }

    /// 트랙들에 좋아요를 표시한다. 반환값은 처리한 트랙 수.
    pub fn like_tracks(&self, ids: &[String]) -> Result<usize> {
        for chunk in ids.chunks(MAX_IDS_PER_LIKE) {
            let req = ApiRequest::put(Self::url("/me/tracks")).query("ids", chunk.join(","));
            self.api.execute(&req)?;
        }
        info!(count = ids.len(), "spotify.liked");
        Ok(ids.len())
    }

    pub fn like_playlist(&self, playlist_id: &str) -> Result<usize> {
        let ids = self.playlist_track_ids(playlist_id)?;
        self.like_tracks(&ids)
    }
}

impl SourceReader for SpotifyClient {
    fn read_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist> {
        let playlist = self.lookup_playlist(playlist_id)?;
        let tracks = self.playlist_tracks(playlist_id)?;
        Ok(SourcePlaylist {
            name: playlist.name,
            tracks,
        })
    }

    fn list_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let mut playlists = Vec::new();
        let mut req = ApiRequest::get(Self::url(&format!("/users/{}/playlists", self.user_id)))
            .query("limit", USER_PLAYLISTS_LIMIT);

        loop {
            let page: UserPlaylistsPage = self.api.json(&req)?;
            playlists.extend(page.items.into_iter().map(|p| PlaylistSummary {
                id: p.id,
                name: p.name,
                track_count: p.tracks.map(|t| t.total),
            }));
            match page.next {
                Some(next) => req = ApiRequest::get(next),
                None => break,
            }
        }

        Ok(playlists)
    }
}

impl Catalog for SpotifyClient {
    fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogTrack>> {
        let req = ApiRequest::get(Self::url("/search"))
            .query("q", query)
            .query("type", "track")
            .query("limit", limit);
        let resp: SearchResponse = self.api.json(&req)?;

        if resp.tracks.total == 0 {
            return Ok(Vec::new());
        }
        Ok(resp
            .tracks
            .items
            .into_iter()
            .map(SpotifyTrack::into_catalog)
            .collect())
    }

    fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<String> {
        let req = ApiRequest::post(
            Self::url(&format!("/users/{}/playlists", self.user_id)),
            json!({
                "name": name,
                "description": description,
                "public": public,
            }),
        );
        let created: CreatedPlaylist = self.api.json(&req)?;
        info!(name, playlist_id = %created.id, "spotify.playlist_created");
        Ok(created.id)
    }

    fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        if uris.len() > MAX_ITEMS_PER_ADD {
            return Err(MigrateError::InvalidArgument(format!(
                "at most {MAX_ITEMS_PER_ADD} tracks per request, got {}",
                uris.len()
            )));
        }
        let req = ApiRequest::post(
            Self::url(&format!("/playlists/{playlist_id}/tracks")),
            json!({ "uris": uris }),
        );
        self.api.execute(&req)?;
        Ok(())
    }

    fn playlist_name(&self, playlist_id: &str) -> Result<String> {
        Ok(self.lookup_playlist(playlist_id)?.name)
    }
}
