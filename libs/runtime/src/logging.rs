use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// True if `target` is `subsystem` itself or one of its `::` children.
fn matches_subsystem(target: &str, subsystem: &str) -> bool {
    target == subsystem
        || (target.starts_with(subsystem) && target[subsystem.len()..].starts_with("::"))
}

/// Catch-all filter: passes events of targets no explicit section claims.
fn unclaimed_targets_filter(
    claimed: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let target = meta.target();
        !claimed.iter().any(|c| matches_subsystem(target, c)) && meta.level() <= &max_level
    })
}

// -------- rotating file sinks --------

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut f) => f.write(buf),
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut f) => f.flush(),
            Err(_) => Ok(()),
        }
    }
}

/// Writer that drops everything when no sink is resolved for a record.
struct MaybeFile(Option<RotatingFile>);

impl Write for MaybeFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-subsystem files by target prefix, falling back to
/// the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotatingFile>,
    by_subsystem: HashMap<String, RotatingFile>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<RotatingFile> {
        self.by_subsystem
            .iter()
            .find(|(name, _)| matches_subsystem(target, name))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeFile;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeFile(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeFile(self.resolve(meta.target()))
    }
}

/// Relative log paths are resolved against `base_dir` (the server home dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating_file(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> std::io::Result<RotatingFile> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

fn file_for_section(name: &str, section: &Section, base_dir: &Path) -> Option<RotatingFile> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let log_path = resolve_log_path(&section.file, base_dir);

    match open_rotating_file(&log_path, max_bytes as usize, backups) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!(
                "Failed to open log file for '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Initialize the global subscriber.
///
/// Each non-default section claims its target prefix for console and file
/// output at its own levels; the `default` section covers everything else.
/// Console output is human-readable, file output is JSON.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records before the subscriber is installed.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let layers = build_layers(cfg, base_dir, atty::is(atty::Stream::Stdout));
    let _ = Registry::default().with(layers).try_init();
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path, ansi: bool) -> Vec<BoxedLayer> {
    let subsystems: Vec<(&String, &Section)> = cfg
        .iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .collect();
    let claimed: Vec<String> = subsystems.iter().map(|(n, _)| (*n).clone()).collect();

    let mut console_targets = Targets::new().with_default(LevelFilter::OFF);
    let mut file_targets = Targets::new().with_default(LevelFilter::OFF);
    let mut router = FileRouter::default();

    for (name, section) in &subsystems {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            console_targets = console_targets.with_target((*name).clone(), level);
        }
        if let Some(writer) = file_for_section(name, section, base_dir) {
            router.by_subsystem.insert((*name).clone(), writer);
            if let Some(level) = parse_tracing_level(&section.file_level) {
                file_targets = file_targets.with_target((*name).clone(), level);
            }
        }
    }

    let default_section = cfg.get(DEFAULT_SECTION);
    if let Some(section) = default_section {
        router.default = file_for_section(DEFAULT_SECTION, section, base_dir);
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(
        fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(console_targets)
            .boxed(),
    );

    if !router.by_subsystem.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(file_targets)
                .boxed(),
        );
    }

    if let Some(section) = default_section {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            layers.push(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_filter(unclaimed_targets_filter(claimed.clone(), level))
                    .boxed(),
            );
        }
        if router.default.is_some() {
            if let Some(level) = parse_tracing_level(&section.file_level) {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_writer(router)
                        .with_filter(unclaimed_targets_filter(claimed, level))
                        .boxed(),
                );
            }
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(file: &str) -> Section {
        Section {
            console_level: "info".into(),
            file: file.into(),
            file_level: "debug".into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn test_subsystem_prefix_matching() {
        assert!(matches_subsystem("odata_http", "odata_http"));
        assert!(matches_subsystem("odata_http::negotiate", "odata_http"));
        assert!(!matches_subsystem("odata_http_extra", "odata_http"));
        assert!(!matches_subsystem("odata_core", "odata_http"));
    }

    #[test]
    fn test_relative_log_path_resolves_under_base_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));
    }

    #[test]
    fn test_rotating_file_creates_parent_dir() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");
        assert!(open_rotating_file(&p, 128 * 1024, 2).is_ok());
        assert!(p.parent().unwrap().exists());
    }

    #[test]
    fn test_router_prefers_subsystem_file() {
        let tmp = tempdir().unwrap();
        let mut router = FileRouter::default();
        assert!(router.resolve("odata_http").is_none());

        router.default = file_for_section("default", &section("logs/all.log"), tmp.path());
        router.by_subsystem.insert(
            "odata_http".into(),
            file_for_section("odata_http", &section("logs/http.log"), tmp.path()).unwrap(),
        );

        let http = router.resolve("odata_http::negotiate").unwrap();
        assert!(Arc::ptr_eq(&http.0, &router.by_subsystem["odata_http"].0));
        let other = router.resolve("odata_core").unwrap();
        assert!(Arc::ptr_eq(&other.0, &router.default.as_ref().unwrap().0));
    }

    #[test]
    fn test_empty_file_disables_sink() {
        let tmp = tempdir().unwrap();
        assert!(file_for_section("default", &section("  "), tmp.path()).is_none());
    }

    #[test]
    fn test_layers_for_default_config() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert("odata_http".into(), section("logs/http.log"));

        // console + subsystem file + default console + default file
        assert_eq!(build_layers(&cfg, tmp.path(), false).len(), 4);
        assert!(tmp.path().join("logs").is_dir());
    }
}
