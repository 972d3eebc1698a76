pub mod http;
pub mod spotify;
pub mod youtube;

use crate::error::Result;
use crate::models::{CatalogTrack, PlaylistSummary, SourcePlaylist};

/// 트랙 목록을 읽어오는 소스 플랫폼.
/// YouTube, Spotify 등 다양한 소스를 이 트레이트로 추상화한다.
pub trait SourceReader {
    /// 플레이리스트 이름과 전체 트랙 목록을 가져온다. 모든 페이지를 끝까지 읽는다.
    fn read_playlist(&self, playlist_id: &str) -> Result<SourcePlaylist>;
    /// 계정이 가진 플레이리스트 목록.
    fn list_playlists(&self) -> Result<Vec<PlaylistSummary>>;
}

/// 트랙을 검색하고 플레이리스트를 만드는 대상 카탈로그.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    /// 쿼리 문자열로 트랙을 검색한다. 결과가 없으면 빈 목록을 반환한다.
    fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogTrack>>;
    /// 새 플레이리스트를 만들고 ID를 반환한다.
    fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<String>;
    /// 플레이리스트 끝에 트랙을 추가한다. 배치 분할은 호출하는 쪽의 책임이다.
    fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
    fn playlist_name(&self, playlist_id: &str) -> Result<String>;
}
