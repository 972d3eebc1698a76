use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::MigrationConfig;
use crate::core::resolver::CatalogResolver;
use crate::core::retry::Sleeper;
use crate::error::{MigrateError, Result};
use crate::models::{MigrationResult, ResolvedTrack, TrackDescriptor};
use crate::sources::spotify::{MAX_ITEMS_PER_ADD, MAX_SEARCH_LIMIT};
use crate::sources::{Catalog, SourceReader};

/// 검색 진행 표시에 쓰는 프레임. 트랙마다 하나씩 돌아간다.
pub const SPINNER_FRAMES: [&str; 5] = ["", ".", "..", "...", "...."];

/// 마이그레이션 진행 상황. 호출하는 쪽에서 무시하거나 로그로 남기거나 화면에 그린다.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    SourceRead { name: String, tracks: usize },
    PlaylistReady { playlist_id: String, created: bool },
    Searching { index: usize, total: usize },
    Resolved { index: usize, track: ResolvedTrack },
    NotFound { index: usize, descriptor: TrackDescriptor },
    Uploaded { batch: usize, batches: usize, tracks: usize },
    Settling(Duration),
}

impl Progress {
    pub fn spinner_frame(index: usize) -> &'static str {
        SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
    }
}

/// 결과를 기록할 대상 플레이리스트.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistTarget {
    /// 이미 있는 플레이리스트에 추가한다.
    Existing(String),
    /// 이 이름으로 새로 만든다.
    Create(String),
    /// 소스 플레이리스트 이름으로 새로 만든다.
    CreateFromSource,
}

impl PlaylistTarget {
    /// ID가 있으면 재사용하고, 없으면 이름으로 생성한다. 둘 다 없으면 InvalidArgument.
    pub fn from_options(playlist_id: Option<&str>, playlist_name: Option<&str>) -> Result<Self> {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        match (non_empty(playlist_id), non_empty(playlist_name)) {
            (Some(id), _) => Ok(PlaylistTarget::Existing(id.to_string())),
            (None, Some(name)) => Ok(PlaylistTarget::Create(name.to_string())),
            (None, None) => Err(MigrateError::InvalidArgument(
                "a destination playlist id or name is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationSettings {
    pub batch_size: usize,
    pub search_limit: u32,
    pub settle_delay: Duration,
    pub public: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self::from(&MigrationConfig::default())
    }
}

impl From<&MigrationConfig> for MigrationSettings {
    fn from(cfg: &MigrationConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            search_limit: cfg.search_limit,
            settle_delay: Duration::from_millis(cfg.settle_delay_ms),
            public: cfg.public,
        }
    }
}

impl MigrationSettings {
    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_ITEMS_PER_ADD {
            return Err(MigrateError::InvalidArgument(format!(
                "batch size must be between 1 and {MAX_ITEMS_PER_ADD}, got {}",
                self.batch_size
            )));
        }
        if self.search_limit == 0 || self.search_limit > MAX_SEARCH_LIMIT {
            return Err(MigrateError::InvalidArgument(format!(
                "search limit must be between 1 and {MAX_SEARCH_LIMIT}, got {}",
                self.search_limit
            )));
        }
        Ok(())
    }
}

fn playlist_description(name: &str) -> String {
    format!("Imported {name} with playlist-migrate")
}

/// 소스 읽기부터 업로드까지 마이그레이션 전체를 순서대로 실행한다.
pub struct PlaylistBuilder<'a> {
    catalog: &'a dyn Catalog,
    settings: MigrationSettings,
    sleeper: Rc<dyn Sleeper>,
}

impl<'a> PlaylistBuilder<'a> {
    pub fn new(catalog: &'a dyn Catalog, settings: MigrationSettings, sleeper: Rc<dyn Sleeper>) -> Self {
        Self {
            catalog,
            settings,
            sleeper,
        }
    }

    /// 대상은 `PlaylistTarget::from_options`로 만든다.
    /// 인자 검증은 원격 호출 전에 끝낸다. 업로드 도중 실패하면 이미 올라간 배치는 되돌리지 않는다.
    pub fn migrate(
        &self,
        source_playlist_id: &str,
        reader: &dyn SourceReader,
        target: &PlaylistTarget,
        progress: &mut dyn FnMut(&Progress),
    ) -> Result<MigrationResult> {
        self.settings.validate()?;
        if source_playlist_id.trim().is_empty() {
            return Err(MigrateError::InvalidArgument(
                "a source playlist id is required".to_string(),
            ));
        }

        let source = reader.read_playlist(source_playlist_id)?;
        if source.tracks.is_empty() {
            return Err(MigrateError::NoItems(format!(
                "no songs found in playlist '{}'",
                source.name
            )));
        }
        info!(playlist = %source.name, tracks = source.tracks.len(), "source.read");
        progress(&Progress::SourceRead {
            name: source.name.clone(),
            tracks: source.tracks.len(),
        });

        let (playlist_id, playlist_name, created) = self.prepare_target(target, &source.name)?;
        progress(&Progress::PlaylistReady {
            playlist_id: playlist_id.clone(),
            created,
        });

        let (tracks, not_found) = self.resolve_all(&source.tracks, progress)?;

        if tracks.is_empty() {
            warn!(
                playlist = %playlist_name,
                not_found = not_found.len(),
                "no songs could be resolved, nothing uploaded"
            );
        } else {
            self.upload(&playlist_id, &tracks, progress)?;
            progress(&Progress::Settling(self.settings.settle_delay));
            self.sleeper.sleep(self.settings.settle_delay);
            info!(
                "Added {} songs to playlist '{}' (https://open.spotify.com/playlist/{})",
                tracks.len(),
                playlist_name,
                playlist_id
            );
        }

        if !not_found.is_empty() {
            let names: Vec<&str> = not_found.iter().map(TrackDescriptor::as_str).collect();
            warn!("Could not find {} songs: {:?}", not_found.len(), names);
        }

        Ok(MigrationResult {
            playlist_id,
            playlist_name,
            tracks,
            not_found,
        })
    }

    /// (id, name, created)
    fn prepare_target(
        &self,
        target: &PlaylistTarget,
        source_name: &str,
    ) -> Result<(String, String, bool)> {
        let name = match target {
            PlaylistTarget::Existing(id) => {
                let name = self.catalog.playlist_name(id)?;
                debug!(playlist_id = %id, name = %name, "target.existing");
                return Ok((id.clone(), name, false));
            }
            PlaylistTarget::Create(name) => name.as_str(),
            PlaylistTarget::CreateFromSource => source_name,
        };

        info!("Creating playlist '{name}'");
        let id = self.catalog.create_playlist(
            name,
            &playlist_description(name),
            self.settings.public,
        )?;
        Ok((id, name.to_string(), true))
    }

    /// 순서를 유지하며 하나씩 검색한다. 같은 설명 문자열은 한 번만 검색한다.
    fn resolve_all(
        &self,
        descriptors: &[TrackDescriptor],
        progress: &mut dyn FnMut(&Progress),
    ) -> Result<(Vec<ResolvedTrack>, Vec<TrackDescriptor>)> {
        let resolver = CatalogResolver::new(self.catalog, self.settings.search_limit);
        let mut seen: HashMap<&TrackDescriptor, Option<ResolvedTrack>> = HashMap::new();
        let mut tracks = Vec::new();
        let mut not_found = Vec::new();
        let total = descriptors.len();

        for (index, descriptor) in descriptors.iter().enumerate() {
            progress(&Progress::Searching { index, total });
            debug!(descriptor = %descriptor, "resolver.search");

            let outcome = match seen.get(descriptor) {
                Some(cached) => cached.clone(),
                None => {
                    let outcome = resolver.resolve(descriptor)?;
                    seen.insert(descriptor, outcome.clone());
                    outcome
                }
            };

            match outcome {
                Some(track) => {
                    progress(&Progress::Resolved {
                        index,
                        track: track.clone(),
                    });
                    tracks.push(track);
                }
                None => {
                    info!("\"{descriptor}\" was not found");
                    progress(&Progress::NotFound {
                        index,
                        descriptor: descriptor.clone(),
                    });
                    not_found.push(descriptor.clone());
                }
            }
        }

        Ok((tracks, not_found))
    }

    fn upload(
        &self,
        playlist_id: &str,
        tracks: &[ResolvedTrack],
        progress: &mut dyn FnMut(&Progress),
    ) -> Result<()> {
        let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
        let batches = uris.len().div_ceil(self.settings.batch_size);

        for (i, chunk) in uris.chunks(self.settings.batch_size).enumerate() {
            self.catalog.add_items(playlist_id, chunk)?;
            debug!(playlist_id, batch = i + 1, batches, size = chunk.len(), "upload.batch");
            progress(&Progress::Uploaded {
                batch: i + 1,
                batches,
                tracks: chunk.len(),
            });
        }
        Ok(())
    }
}
