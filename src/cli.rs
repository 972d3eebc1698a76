use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};
use tracing::info;

use crate::config::{self, Config};
use crate::core::builder::{MigrationSettings, PlaylistBuilder, PlaylistTarget, Progress};
use crate::core::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::error::MigrateError;
use crate::models::{Credential, MigrationResult, PlaylistSummary};
use crate::sources::http::{ApiClient, ClientOptions};
use crate::sources::spotify::{SpotifyClient, MAX_ITEMS_PER_ADD, MAX_SEARCH_LIMIT};
use crate::sources::youtube::YoutubeClient;
use crate::sources::{Catalog, SourceReader};

#[derive(Parser)]
#[command(
    name = "playlist-migrate",
    about = "YouTube/Spotify 플레이리스트를 Spotify 플레이리스트로 옮기는 도구"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 설정 파일 경로 (기본: ~/.config/playlist-migrate/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// 결과를 기록할 Spotify 플레이리스트 지정.
#[derive(Args)]
pub struct TargetArgs {
    /// 트랙을 추가할 기존 플레이리스트 ID
    #[arg(long, value_name = "ID", conflicts_with_all = ["name", "keep_name"])]
    pub target_playlist: Option<String>,

    /// 새로 만들 플레이리스트 이름
    #[arg(long, conflicts_with = "keep_name")]
    pub name: Option<String>,

    /// 소스 플레이리스트 이름으로 새 플레이리스트를 만든다
    #[arg(long)]
    pub keep_name: bool,
}

impl TargetArgs {
    fn target(&self) -> std::result::Result<PlaylistTarget, MigrateError> {
        if self.keep_name && self.target_playlist.is_none() {
            return Ok(PlaylistTarget::CreateFromSource);
        }
        PlaylistTarget::from_options(self.target_playlist.as_deref(), self.name.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// YouTube 재생목록을 Spotify로 옮긴다
    Youtube {
        /// YouTube Data API OAuth 액세스 토큰
        #[arg(long, env = "YOUTUBE_TOKEN", hide_env_values = true)]
        youtube_token: String,
        /// Spotify 사용자 ID
        #[arg(long, env = "SPOTIFY_USER")]
        spotify_user: String,
        /// Spotify 액세스 토큰
        #[arg(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
        spotify_token: String,
        /// 옮길 YouTube 재생목록 ID
        #[arg(long)]
        playlist: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Spotify 계정 간에 플레이리스트를 옮긴다
    Spotify {
        #[arg(long, env = "SOURCE_SPOTIFY_USER")]
        source_user: String,
        #[arg(long, env = "SOURCE_SPOTIFY_TOKEN", hide_env_values = true)]
        source_token: String,
        #[arg(long, env = "TARGET_SPOTIFY_USER")]
        target_user: String,
        #[arg(long, env = "TARGET_SPOTIFY_TOKEN", hide_env_values = true)]
        target_token: String,
        /// 옮길 Spotify 플레이리스트 ID
        #[arg(long)]
        playlist: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// 계정의 플레이리스트 목록 표시
    Playlists {
        #[command(subcommand)]
        platform: Platform,
    },
    /// Spotify 플레이리스트의 모든 곡에 좋아요 표시
    Like {
        #[arg(long, env = "SPOTIFY_USER")]
        user: String,
        #[arg(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        playlist: String,
    },
    /// 좋아요 표시한 곡 수 표시
    Liked {
        #[arg(long, env = "SPOTIFY_USER")]
        user: String,
        #[arg(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// 재시도, 배치 크기 등 설정 편집
    Config,
}

#[derive(Subcommand)]
pub enum Platform {
    Spotify {
        #[arg(long, env = "SPOTIFY_USER")]
        user: String,
        #[arg(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
        token: String,
    },
    Youtube {
        #[arg(long, env = "YOUTUBE_TOKEN", hide_env_values = true)]
        token: String,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(&config_path).context("설정 파일을 읽을 수 없습니다")?;
    crate::logging::init_logging(&cfg.logging, cli.verbose)?;

    let sleeper: Rc<dyn Sleeper> = Rc::new(ThreadSleeper);
    let options = ClientOptions {
        retry: RetryPolicy::from(&cfg.retry),
        timeout: Duration::from_secs(cfg.http.timeout_secs),
        sleeper,
    };

    match cli.command {
        Commands::Youtube {
            youtube_token,
            spotify_user,
            spotify_token,
            playlist,
            target,
        } => {
            let target = target.target()?;
            let youtube = YoutubeClient::new(connect(youtube_token, &options)?);
            let spotify = SpotifyClient::new(&spotify_user, connect(spotify_token, &options)?)?;
            cmd_migrate(&cfg, &options, &youtube, &spotify, &playlist, &target)
        }
        Commands::Spotify {
            source_user,
            source_token,
            target_user,
            target_token,
            playlist,
            target,
        } => {
            let target = target.target()?;
            let source = SpotifyClient::new(&source_user, connect(source_token, &options)?)?;
            let dest = SpotifyClient::new(&target_user, connect(target_token, &options)?)?;
            cmd_migrate(&cfg, &options, &source, &dest, &playlist, &target)
        }
        Commands::Playlists { platform } => match platform {
            Platform::Spotify { user, token } => {
                let spotify = SpotifyClient::new(&user, connect(token, &options)?)?;
                cmd_playlists(&spotify)
            }
            Platform::Youtube { token } => {
                let youtube = YoutubeClient::new(connect(token, &options)?);
                cmd_playlists(&youtube)
            }
        },
        Commands::Like {
            user,
            token,
            playlist,
        } => {
            let spotify = SpotifyClient::new(&user, connect(token, &options)?)?;
            cmd_like(&spotify, &playlist)
        }
        Commands::Liked { user, token } => {
            let spotify = SpotifyClient::new(&user, connect(token, &options)?)?;
            let ids = spotify
                .liked_track_ids()
                .context("좋아요 목록을 가져오지 못했습니다")?;
            println!("좋아요 표시한 곡: {}개", ids.len());
            Ok(())
        }
        Commands::Config => cmd_config(&config_path, cfg),
    }
}

fn connect(token: String, options: &ClientOptions) -> Result<ApiClient> {
    Ok(ApiClient::connect(Credential::new(token), options)?)
}

fn cmd_migrate(
    cfg: &Config,
    options: &ClientOptions,
    reader: &dyn SourceReader,
    catalog: &dyn Catalog,
    playlist: &str,
    target: &PlaylistTarget,
) -> Result<()> {
    let builder = PlaylistBuilder::new(
        catalog,
        MigrationSettings::from(&cfg.migration),
        options.sleeper.clone(),
    );

    let mut renderer = ProgressRenderer::new();
    let result = builder
        .migrate(playlist, reader, target, &mut |p| renderer.render(p))
        .context("플레이리스트 마이그레이션에 실패했습니다")?;
    renderer.finish();

    print_summary(&result);

    if result.is_empty() {
        return Err(MigrateError::NoItems("검색된 곡이 하나도 없습니다".to_string()).into());
    }
    info!(playlist = %result.playlist_name, added = result.added(), "migration.done");
    Ok(())
}

/// 검색 진행을 한 줄 애니메이션으로 그린다. 터미널이 아니면 아무것도 그리지 않는다.
struct ProgressRenderer {
    enabled: bool,
    dirty: bool,
}

impl ProgressRenderer {
    fn new() -> Self {
        Self {
            enabled: std::io::stderr().is_terminal(),
            dirty: false,
        }
    }

    fn render(&mut self, progress: &Progress) {
        if !self.enabled {
            return;
        }
        let mut err = std::io::stderr();
        match progress {
            Progress::SourceRead { name, tracks } => {
                let _ = writeln!(err, "'{name}'에서 {tracks}곡을 찾았습니다");
            }
            Progress::PlaylistReady {
                playlist_id,
                created: true,
            } => {
                let _ = writeln!(err, "플레이리스트를 만들었습니다: {playlist_id}");
            }
            Progress::Searching { index, total } => {
                let _ = write!(
                    err,
                    "\r곡 검색 중{:<4} ({}/{})",
                    Progress::spinner_frame(*index),
                    index + 1,
                    total
                );
                let _ = err.flush();
                self.dirty = true;
            }
            Progress::Uploaded {
                batch,
                batches,
                tracks,
            } => {
                self.finish();
                let _ = writeln!(err, "업로드 {batch}/{batches} ({tracks}곡)");
            }
            Progress::Settling(delay) => {
                let _ = writeln!(err, "반영 대기 중... ({}ms)", delay.as_millis());
            }
            _ => {}
        }
    }

    fn finish(&mut self) {
        if self.dirty {
            let _ = writeln!(std::io::stderr());
            self.dirty = false;
        }
    }
}

fn print_summary(result: &MigrationResult) {
    println!(
        "'{}' 플레이리스트에 {}곡을 추가했습니다",
        result.playlist_name,
        result.added()
    );
    println!("{}", result.playlist_url());

    if result.not_found.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "찾지 못한 곡"]);
    for (i, descriptor) in result.not_found.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(descriptor.as_str())]);
    }
    println!("\n{table}");
    println!("찾지 못한 곡: {}개", result.not_found.len());
}

fn cmd_playlists(reader: &dyn SourceReader) -> Result<()> {
    let playlists = reader
        .list_playlists()
        .context("플레이리스트 목록을 가져오지 못했습니다")?;

    if playlists.is_empty() {
        println!("플레이리스트가 없습니다.");
        return Ok(());
    }

    println!("{}", playlist_table(&playlists));
    println!("\n총 {}개", playlists.len());
    Ok(())
}

fn playlist_table(playlists: &[PlaylistSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "이름", "곡 수"]);
    for p in playlists {
        let count = p
            .track_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![Cell::new(&p.id), Cell::new(&p.name), Cell::new(count)]);
    }
    table
}

fn cmd_like(spotify: &SpotifyClient, playlist: &str) -> Result<()> {
    let liked = spotify
        .like_playlist(playlist)
        .context("좋아요 표시에 실패했습니다")?;
    println!("{liked}곡에 좋아요를 표시했습니다!");
    Ok(())
}

fn cmd_config(path: &Path, mut cfg: Config) -> Result<()> {
    println!("playlist-migrate 설정 ({})", path.display());
    println!("(토큰은 저장하지 않습니다. 명령줄 인자나 환경 변수로 전달하세요)\n");

    cfg.retry.max_attempts = Input::new()
        .with_prompt("요청당 최대 시도 횟수")
        .default(cfg.retry.max_attempts)
        .validate_with(|v: &u32| -> std::result::Result<(), String> {
            if *v >= 1 {
                Ok(())
            } else {
                Err("1 이상이어야 합니다".to_string())
            }
        })
        .interact_text()?;

    cfg.migration.batch_size = Input::new()
        .with_prompt("업로드 배치 크기")
        .default(cfg.migration.batch_size)
        .validate_with(|v: &usize| in_range(*v, 1, MAX_ITEMS_PER_ADD))
        .interact_text()?;

    cfg.migration.search_limit = Input::new()
        .with_prompt("검색 후보 수")
        .default(cfg.migration.search_limit)
        .validate_with(|v: &u32| in_range(*v, 1, MAX_SEARCH_LIMIT))
        .interact_text()?;

    cfg.migration.settle_delay_ms = Input::new()
        .with_prompt("업로드 후 대기 시간 (ms)")
        .default(cfg.migration.settle_delay_ms)
        .interact_text()?;

    cfg.migration.public = Confirm::new()
        .with_prompt("새 플레이리스트를 공개로 만들까요?")
        .default(cfg.migration.public)
        .interact()?;

    cfg.logging.filter = Input::new()
        .with_prompt("로그 필터")
        .default(cfg.logging.filter.clone())
        .interact_text()?;

    config::save_config(path, &cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}

fn in_range<T>(value: T, min: T, max: T) -> std::result::Result<(), String>
where
    T: PartialOrd + std::fmt::Display,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(format!("{min}에서 {max} 사이여야 합니다"))
    }
}
