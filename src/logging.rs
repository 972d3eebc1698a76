use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// stderr로 출력하는 tracing 구독자를 초기화한다.
/// `RUST_LOG`가 있으면 설정 파일의 필터보다 우선한다.
pub fn init_logging(cfg: &LoggingConfig, verbose: bool) -> Result<()> {
    let env = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(env.as_deref(), &cfg.filter, verbose);
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("잘못된 로그 필터입니다: {directives}"))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("로거 초기화에 실패했습니다")?;

    Ok(())
}

/// `-v`는 `RUST_LOG`를 쓸 때도 이 크레이트를 debug로 올린다.
fn filter_directives(env: Option<&str>, config_filter: &str, verbose: bool) -> String {
    let base = match env {
        Some(env) if !env.trim().is_empty() => env.trim(),
        _ => config_filter,
    };
    if verbose {
        format!("{base},playlist_migrate=debug")
    } else {
        base.to_string()
    }
}
