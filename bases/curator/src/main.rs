// bases/curator/src/main.rs
use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tag_sources::{
    changed_paths, read_sources, CacheKey, JsonScanCache, LoftyTagReader, LoftyTagWriter,
};
use tracing::{debug, info, warn};

mod config;
mod pipeline;
mod releases;
mod report;
mod scan;

use catalog::AlbumKey;
use config::{CliArgs, Config};
use pipeline::TaggingArchiver;
use release_matcher::MatchSession;
use report::{OutcomeReport, Reporter};

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(CliArgs::parse());

    if !config.library_path.exists() {
        return Err(eyre!(
            "Library path does not exist: {}",
            config.library_path.display()
        ));
    }

    if config.is_apply_mode() {
        warn!(root = %config.archive_root.display(), "APPLY MODE: albums WILL be moved");
    } else {
        warn!("CHECK MODE: nothing will be moved, use --apply to archive");
    }

    run(&config)
}

fn run(config: &Config) -> Result<()> {
    let scan = scan::scan_library(&config.library_path, Some(&config.archive_root))
        .wrap_err("Failed to walk the library")?;
    info!(
        audio = scan.audio.len(),
        other = scan.non_audio.len(),
        "Scanned library"
    );

    let mut cache = config
        .cache_file
        .as_ref()
        .map(JsonScanCache::load)
        .transpose()?;
    let scan = match &cache {
        Some(cache) => {
            let changed = changed_paths(&scan.audio, cache)?;
            info!(changed = changed.len(), "Checked scan cache");
            scan.restrict_to(&changed)
        }
        None => scan,
    };

    let reader = LoftyTagReader;
    let mut sources = Vec::with_capacity(scan.audio.len());
    for path in &scan.audio {
        match read_sources(path, &reader) {
            Ok(set) => sources.push(set),
            Err(e) => warn!(path = %path.display(), error = %e, "Could not read file"),
        }
    }

    let aggregation = catalog::catalog_files(&sources, &scan.non_audio);
    let mut albums = aggregation.albums;
    info!(albums = albums.len(), skipped = aggregation.errors.len(), "Cataloged library");

    if let Some(releases_file) = &config.releases_file {
        let source = releases::JsonReleaseSource::load(releases_file)?;
        let mut session = MatchSession::new(source);
        let matched = releases::match_albums(&mut session, &mut albums);
        info!(matched, "Matched albums against known releases");
    }

    let reporter = Reporter::new(config.output);
    reporter.print_albums(&albums)?;
    reporter.print_skipped(&aggregation.errors);

    let archiver =
        archive::Archiver::new(&config.archive_root).with_source_root(&config.library_path);
    if config.is_check_mode() {
        for album in &albums {
            match archiver.existing_archive(album) {
                Some(existing) => println!(
                    "Would skip {}: already archived at {}",
                    album.reconstituted_name(),
                    existing.display()
                ),
                None => reporter.print_plan(album, &archiver.plan(album)),
            }
        }
        return Ok(());
    }

    // Where each album's files were before archiving moved them.
    let originals: HashMap<AlbumKey, Vec<PathBuf>> = albums
        .iter()
        .map(|album| {
            let mut paths: Vec<PathBuf> = album.tracks().iter().map(|t| t.path.clone()).collect();
            paths.extend(album.non_audio_files.iter().cloned());
            (album.key.clone(), paths)
        })
        .collect();

    let archiver = Arc::new(TaggingArchiver::new(archiver, LoftyTagWriter));
    let reports = if config.threaded {
        pipeline::archive_in_background(archiver, config.queue_capacity, albums)?
    } else {
        pipeline::archive_in_place(archiver, config.queue_capacity, albums)?
    };
    reporter.print_outcomes(&reports);

    if let Some(cache) = cache.as_mut() {
        remember_archived(cache, &originals, &reports);
        cache.save()?;
    }
    Ok(())
}

/// Remember the files of albums that archived cleanly. Files that moved are
/// forgotten; failed albums are left out so the next run retries them.
fn remember_archived(
    cache: &mut JsonScanCache,
    originals: &HashMap<AlbumKey, Vec<PathBuf>>,
    reports: &[OutcomeReport],
) {
    for report in reports.iter().filter(|r| r.archived()) {
        let Some(paths) = originals.get(&report.key) else {
            continue;
        };
        for path in paths {
            if !path.exists() {
                cache.forget(path);
                continue;
            }
            match CacheKey::for_path(path) {
                Ok(key) => cache.record(key),
                Err(e) => warn!(error = %e, "Could not remember file"),
            }
        }
        debug!(album = %report.key, files = paths.len(), "Updated scan cache");
    }
}
