use std::fmt;

/// 소스 플레이리스트의 트랙 하나를 설명하는 문자열.
/// YouTube는 `"Title"`, Spotify는 `"Artist - Title"` 형식이다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackDescriptor(String);

impl TrackDescriptor {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source Reader가 반환하는 플레이리스트 이름과 트랙 목록.
#[derive(Debug, Clone)]
pub struct SourcePlaylist {
    pub name: String,
    pub tracks: Vec<TrackDescriptor>,
}

/// 카탈로그 검색 결과 후보 하나.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTrack {
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
}

impl CatalogTrack {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("unknown")
    }
}

/// 대상 카탈로그에서 찾은 트랙.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub uri: String,
    pub name: String,
    pub artist: String,
}

impl From<CatalogTrack> for ResolvedTrack {
    fn from(track: CatalogTrack) -> Self {
        let artist = track.primary_artist().to_string();
        Self {
            uri: track.uri,
            name: track.name,
            artist,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub track_count: Option<u32>,
}

/// 한 번의 마이그레이션 결과. 실행이 끝나면 버려진다.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub playlist_id: String,
    pub playlist_name: String,
    pub tracks: Vec<ResolvedTrack>,
    pub not_found: Vec<TrackDescriptor>,
}

impl MigrationResult {
    pub fn added(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn playlist_url(&self) -> String {
        format!("https://open.spotify.com/playlist/{}", self.playlist_id)
    }
}

/// 플랫폼별 bearer 토큰. 로그나 파일에 절대 남기지 않는다.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("BQD-secret-token");
        assert_eq!(format!("{:?}", cred), "Credential(***)");
        assert_eq!(cred.expose(), "BQD-secret-token");
    }

    #[test]
    fn test_resolved_from_catalog_track() {
        let track = CatalogTrack {
            uri: "spotify:track:4u7EnebtmKWzUH433cf5Qv".to_string(),
            name: "Bohemian Rhapsody".to_string(),
            artists: vec!["Queen".to_string(), "Someone".to_string()],
        };
        let resolved = ResolvedTrack::from(track);
        assert_eq!(resolved.artist, "Queen");
        assert_eq!(resolved.name, "Bohemian Rhapsody");
    }

    #[test]
    fn test_playlist_url() {
        let result = MigrationResult {
            playlist_id: "37i9dQZF1DX".to_string(),
            playlist_name: "Mix".to_string(),
            tracks: vec![],
            not_found: vec![],
        };
        assert!(result.is_empty());
        assert_eq!(
            result.playlist_url(),
            "https://open.spotify.com/playlist/37i9dQZF1DX"
        );
    }
}
