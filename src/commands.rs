//! CLI commands for altlookup: convert, digest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use walkdir::WalkDir;

use crate::config::{self, LookupSource};
use crate::diagnostics::Diagnostics;
use crate::digest::digest_of;
use crate::document::Block;
use crate::error;
use crate::lookup::{self, RunState};
use crate::lookups::{self, LookupIndex};
use crate::parser::{self, IncludeMode};
use crate::render;
use crate::types::Severity;

/// Options for one `convert` invocation.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Documents or directories of documents.
    pub inputs: Vec<PathBuf>,
    /// Lookup records overriding `.altlookup.toml`.
    pub lookups: Option<String>,
    /// Where to write HTML; defaults to each input's directory.
    pub out_dir: Option<PathBuf>,
    /// Report destination overriding `.altlookup.toml`.
    pub report: Option<PathBuf>,
    /// Summary destination overriding `.altlookup.toml`.
    pub summary: Option<PathBuf>,
}

/// Output destinations chosen for the run, fixed by the first document
/// that has lookups enabled.
#[derive(Debug, Default)]
struct Outputs {
    /// Whether any document ran with a non-empty index.
    enabled: bool,
    report: Option<PathBuf>,
    summary: Option<PathBuf>,
}

/// Parse, look up alternatives, and render every input; then write the
/// report and summary. One `RunState` spans all inputs.
///
/// Configuration and fragment problems are logged and never fail the run.
///
/// # Errors
///
/// Returns errors from config loading, a missing input or top-level include,
/// or writing output files.
pub fn convert(options: &ConvertOptions) -> Result<ExitCode, error::Error> {
    let root = std::env::current_dir()?;
    let config = config::Config::load(&root)?.with_overrides(
        options.lookups.clone(),
        options.report.clone(),
        options.summary.clone(),
    );

    let mut run = RunState::default();
    let mut outputs = Outputs::default();
    // Configured records are validated once per run; attribute records once per document.
    let run_index = config
        .configured_lookups()
        .map(|source| return resolve_index(&root, &source, &mut run.diagnostics));

    let inputs = expand_inputs(&options.inputs)?;
    for input in &inputs {
        let mut document = parser::parse_file(input, IncludeMode::Strict, &mut run.diagnostics)?;

        let index = match &run_index {
            Some(index) => index.clone(),
            None => match config.lookups_for(&document) {
                Some(source) => resolve_index(&root, &source, &mut run.diagnostics),
                None => LookupIndex::default(),
            },
        };
        if !index.is_empty() && !outputs.enabled {
            outputs.enabled = true;
            outputs.report = config.report_for(&document);
            outputs.summary = config.summary_for(&document);
        }

        lookup::process(&mut document, &index, &mut run);

        let out_path = output_path(input, options.out_dir.as_deref());
        std::fs::write(&out_path, render::render_document(&document))?;
        log::info!("wrote {}", out_path.display());
    }

    if outputs.enabled {
        if let Some(path) = &outputs.report {
            run.report.write(path)?;
        }
        if let Some(path) = &outputs.summary {
            run.coverage.write(path)?;
        }
    }

    let errors = run.diagnostics.count(Severity::Error);
    let warnings = run.diagnostics.count(Severity::Warning);
    let count = inputs.len();
    let listings = run.report.entries().len();
    eprintln!("Converted {count} documents, {listings} listings checked ({errors} errors, {warnings} warnings)");
    log::debug!("{} distinct listing bodies digested", run.distinct_listings());

    return Ok(ExitCode::SUCCESS);
}

/// Print the digest and expected alternative file name of every listing
/// that declares a language.
///
/// # Errors
///
/// Returns errors from reading or parsing `input`.
pub fn digest(input: &Path) -> Result<(), error::Error> {
    let mut diagnostics = Diagnostics::default();
    let document = parser::parse_file(input, IncludeMode::Strict, &mut diagnostics)?;

    for block in &document.blocks {
        let Block::Listing(listing) = block else { continue };
        let Some(lang) = &listing.language else { continue };
        println!("{}\t{lang}\t{}", listing.location, digest_of(&listing.source).file_name());
    }

    return Ok(());
}

/// Replace directories with the `.adoc` files beneath them, sorted.
///
/// # Errors
///
/// Returns `Error::FileNotFound` for an input that does not exist.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, error::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| return e.file_type().is_file())
                .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "adoc"))
                .map(walkdir::DirEntry::into_path)
                .collect();
            found.sort();
            files.extend(found);
        } else if input.exists() {
            files.push(input.clone());
        } else {
            return Err(error::Error::FileNotFound { path: input.clone() });
        }
    }
    return Ok(files);
}

/// `<out_dir or input dir>/<stem>.html`.
fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| return "index".to_string(), |s| return s.to_string_lossy().into_owned());
    let dir = out_dir.or_else(|| return input.parent()).unwrap_or_else(|| return Path::new(""));
    return dir.join(format!("{stem}.html"));
}

/// Validate lookup records. A bad configuration disables lookups and is
/// logged as a single error at the place it was declared.
fn resolve_index(root: &Path, source: &LookupSource, diagnostics: &mut Diagnostics) -> LookupIndex {
    return match lookups::parse(&source.text, root) {
        Ok(index) => {
            if !index.is_empty() {
                log::debug!("lookups enabled for {}", index.source_langs().collect::<Vec<_>>().join(", "));
            }
            index
        },
        Err(e) => {
            diagnostics.error(source.location.as_ref(), format!("{e}; alternative language lookups disabled"));
            LookupIndex::default()
        },
    };
}
