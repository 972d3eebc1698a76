use tracing::{debug, info};

use crate::core::normalize::normalize;
use crate::error::Result;
use crate::models::{ResolvedTrack, TrackDescriptor};
use crate::sources::Catalog;

/// 트랙 설명 문자열을 대상 카탈로그의 트랙 하나로 바꾼다.
/// 후보 순위 비교 없이 검색 결과의 첫 번째 후보를 쓴다.
pub struct CatalogResolver<'a> {
    catalog: &'a dyn Catalog,
    search_limit: u32,
}

impl<'a> CatalogResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog, search_limit: u32) -> Self {
        Self {
            catalog,
            search_limit,
        }
    }

    /// 검색 결과가 없으면 `Ok(None)`. 요청 자체가 실패했을 때만 오류를 반환한다.
    pub fn resolve(&self, descriptor: &TrackDescriptor) -> Result<Option<ResolvedTrack>> {
        let query = normalize(descriptor.as_str());
        if query.is_empty() {
            debug!(descriptor = %descriptor, "resolver.empty_query");
            return Ok(None);
        }
        if query != descriptor.as_str() {
            debug!(descriptor = %descriptor, query = %query, "resolver.reformatted");
        }

        let candidates = self.catalog.search(&query, self.search_limit)?;
        let Some(best) = candidates.into_iter().next() else {
            return Ok(None);
        };

        let track = ResolvedTrack::from(best);
        info!("Found \"{}\" by {}", track.name, track.artist);
        Ok(Some(track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::models::CatalogTrack;
    use crate::sources::MockCatalog;

    fn candidate(id: &str, name: &str, artist: &str) -> CatalogTrack {
        CatalogTrack {
            uri: format!("spotify:track:{id}"),
            name: name.to_string(),
            artists: vec![artist.to_string()],
        }
    }

    #[test]
    fn test_searches_normalized_query_and_takes_first() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search()
            .withf(|query, limit| query == "Queen Bohemian Rhapsody" && *limit == 2)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    candidate("a1", "Bohemian Rhapsody", "Queen"),
                    candidate("b2", "Bohemian Rhapsody - Live", "Queen"),
                ])
            });

        let resolver = CatalogResolver::new(&catalog, 2);
        let track = resolver
            .resolve(&TrackDescriptor::new("Bohemian Rhapsody - Queen (Official Video)"))
            .unwrap()
            .unwrap();

        assert_eq!(track.uri, "spotify:track:a1");
        assert_eq!(track.artist, "Queen");
    }

    #[test]
    fn test_no_candidates_is_none() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let resolver = CatalogResolver::new(&catalog, 2);
        let result = resolver.resolve(&TrackDescriptor::new("Unknown Demo Take 7"));

        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_empty_query_skips_search() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().never();

        let resolver = CatalogResolver::new(&catalog, 2);
        let result = resolver.resolve(&TrackDescriptor::new("(Official Audio)"));

        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_transport_failure_is_error() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search()
            .returning(|_, _| Err(MigrateError::http(500, "server error")));

        let resolver = CatalogResolver::new(&catalog, 2);
        let result = resolver.resolve(&TrackDescriptor::new("Imagine"));

        assert!(matches!(
            result,
            Err(MigrateError::Transport {
                status: Some(500),
                ..
            })
        ));
    }
}
