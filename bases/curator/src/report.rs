// bases/curator/src/report.rs
use crate::config::OutputFormat;
use archive::{ArchiveOutcome, CleanupWarning, PlannedMove};
use catalog::{Album, AlbumKey, CatalogError};
use serde::Serialize;

/// What the front end is told about one archived album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    pub key: AlbumKey,
    pub error: Option<String>,
    pub warnings: Vec<CleanupWarning>,
}

impl OutcomeReport {
    pub fn archived(&self) -> bool {
        self.error.is_none()
    }
}

impl From<&ArchiveOutcome> for OutcomeReport {
    fn from(outcome: &ArchiveOutcome) -> Self {
        let (error, warnings) = match &outcome.result {
            Ok(warnings) => (None, warnings.clone()),
            Err(e) => (Some(e.to_string()), Vec::new()),
        };
        Self {
            key: outcome.key.clone(),
            error,
            warnings,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub archived: usize,
    pub failed: usize,
    pub warnings: usize,
}

pub fn summarize(reports: &[OutcomeReport]) -> Summary {
    reports.iter().fold(Summary::default(), |mut summary, report| {
        if report.archived() {
            summary.archived += 1;
        } else {
            summary.failed += 1;
        }
        summary.warnings += report.warnings.len();
        summary
    })
}

pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn print_albums(&self, albums: &[Album]) -> serde_json::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(albums)?),
            OutputFormat::Text { simple } => {
                for album in albums {
                    println!("{}", album.display_formatted(simple));
                    for flag in &album.review_flags {
                        println!("  Review: {}", flag);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn print_skipped(&self, errors: &[CatalogError]) {
        for error in errors {
            eprintln!("Skipped: {}", error);
        }
    }

    pub fn print_plan(&self, album: &Album, moves: &[PlannedMove]) {
        println!("Would archive {}:", album.reconstituted_name());
        for planned in moves {
            println!(
                "  {} -> {}",
                planned.source.display(),
                planned.destination.display()
            );
        }
    }

    pub fn print_outcomes(&self, reports: &[OutcomeReport]) {
        for report in reports {
            match &report.error {
                None => println!("Archived {}", report.key),
                Some(error) => eprintln!("Failed to archive {}: {}", report.key, error),
            }
            for warning in &report.warnings {
                println!("  Warning: {}", warning);
            }
        }
        let summary = summarize(reports);
        println!(
            "\n{} archived, {} failed, {} cleanup warnings",
            summary.archived, summary.failed, summary.warnings
        );
    }
}
