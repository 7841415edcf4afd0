//! mmerge - regeneration merge for SQL mapper XML files
//!
//! Merges freshly generated mapper XML into the existing file, keeping
//! hand-written statements and user-added attributes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xml_mapper_merge::{
    parse_file, LegacyMarkers, MergeOptions, Merger, NodeRef, XmlPrinterOptions,
};

/// Regeneration merge for SQL mapper XML files
#[derive(Parser)]
#[command(name = "mmerge")]
#[command(version)]
#[command(about = "Merge regenerated SQL mapper XML into existing files", long_about = None)]
struct Cli {
    /// Log merge details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a generated mapper into an existing one
    #[command(visible_alias = "m")]
    Merge {
        /// Generated mapper file
        generated: PathBuf,
        /// Existing mapper file
        existing: PathBuf,
        /// Output file (default: stdout)
        output: Option<PathBuf>,

        /// Write the result over the existing file
        #[arg(short, long, conflicts_with = "output")]
        in_place: bool,

        /// Omit the XML declaration from the output
        #[arg(long)]
        no_declaration: bool,

        /// Write the edit log as XML to this file
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// List the root children of a mapper and how a merge would treat them
    #[command(visible_alias = "s")]
    Scan {
        /// Mapper file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            generated,
            existing,
            output,
            in_place,
            no_declaration,
            log,
        } => {
            let target = merge_target(&existing, output, in_place);
            run_merge(
                &generated,
                &existing,
                target.as_deref(),
                no_declaration,
                log.as_deref(),
            )
        }
        Commands::Scan { file } => run_scan(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs warnings by default, debug with `--verbose`. `RUST_LOG` overrides
/// both.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Where the merged text goes: the existing file with `--in-place`, else
/// `--output`, else stdout (`None`).
fn merge_target(existing: &Path, output: Option<PathBuf>, in_place: bool) -> Option<PathBuf> {
    if in_place {
        Some(existing.to_path_buf())
    } else {
        output
    }
}

/// Runs the merge and writes the result only once it has succeeded.
fn run_merge(
    generated_path: &Path,
    existing_path: &Path,
    output_path: Option<&Path>,
    no_declaration: bool,
    log_path: Option<&Path>,
) -> Result<()> {
    let generated = fs::read_to_string(generated_path)
        .with_context(|| format!("failed to read {}", generated_path.display()))?;

    let merger = Merger::new(MergeOptions {
        printer: XmlPrinterOptions {
            declaration: !no_declaration,
            ..Default::default()
        },
        ..Default::default()
    });
    debug!(existing = %existing_path.display(), "merging");
    let merged = merger.merge_file_with_log(&generated, existing_path)?;

    match output_path {
        Some(path) => fs::write(path, &merged.text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().write_all(merged.text.as_bytes())?,
    }

    if let Some(path) = log_path {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        merged.log.write_xml(&mut writer)?;
        writer.flush()?;
    }

    eprintln!("Merge complete: {}.", merged.log.summary());
    let stale = merged.log.stale_legacy_ids();
    if !stale.is_empty() {
        eprintln!(
            "{} preserved statements look like old generator output: {}",
            stale.len(),
            stale.join(", ")
        );
    }
    Ok(())
}

/// Prints one line per non-whitespace root child.
fn run_scan(path: &Path) -> Result<()> {
    let doc = parse_file(path)?;
    let markers = LegacyMarkers::default();

    let root = doc.root().borrow();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for child in root.children() {
        if child.borrow().is_whitespace() {
            continue;
        }
        writeln!(out, "{}", scan_line(child, &markers))?;
    }
    Ok(())
}

fn scan_line(child: &NodeRef, markers: &LegacyMarkers) -> String {
    let legacy = markers.is_generated(child);
    let node = child.borrow();
    match node.id() {
        Some(id) if legacy => format!("{:<10} {} (legacy generated)", node.node_name(), id),
        Some(id) => format!("{:<10} {}", node.node_name(), id),
        None => format!("{:<10} (no id)", node.node_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCTYPE: &str = r#"<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">"#;

    #[test]
    fn test_merge_writes_output_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated.xml");
        let existing = dir.path().join("UserMapper.xml");
        let output = dir.path().join("out.xml");
        let log = dir.path().join("log.xml");
        fs::write(
            &generated,
            format!("{DOCTYPE}\n<mapper namespace=\"New\">\n  <select id=\"a\">1</select>\n</mapper>"),
        )
        .unwrap();
        fs::write(
            &existing,
            format!("{DOCTYPE}\n<mapper namespace=\"Old\">\n  <select id=\"mine\">2</select>\n</mapper>"),
        )
        .unwrap();

        run_merge(&generated, &existing, Some(&output), false, Some(&log)).unwrap();

        let merged = fs::read_to_string(&output).unwrap();
        assert!(merged.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(merged.contains("id=\"a\""));
        assert!(merged.contains("id=\"mine\""));
        assert!(fs::read_to_string(&log).unwrap().contains("<insert id=\"a\""));
    }

    #[test]
    fn test_merge_in_place_rewrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated.xml");
        let existing = dir.path().join("UserMapper.xml");
        fs::write(
            &generated,
            format!("{DOCTYPE}\n<mapper namespace=\"New\">\n  <select id=\"a\">1</select>\n</mapper>"),
        )
        .unwrap();
        fs::write(
            &existing,
            format!(
                "{DOCTYPE}\n<mapper namespace=\"Old\">\n  <select id=\"a\">0</select>\n  \
                 <select id=\"mine\">2</select>\n</mapper>"
            ),
        )
        .unwrap();

        let target = merge_target(&existing, Some(dir.path().join("ignored.xml")), true);
        assert_eq!(target.as_deref(), Some(existing.as_path()));
        run_merge(&generated, &existing, target.as_deref(), false, None).unwrap();

        let merged = fs::read_to_string(&existing).unwrap();
        assert!(merged.contains("<mapper namespace=\"New\">"));
        assert!(merged.contains("<select id=\"a\">1</select>"));
        assert!(merged.contains("<select id=\"mine\">2</select>"));
        assert!(!merged.contains(">0<"));
        assert!(!dir.path().join("ignored.xml").exists());
    }

    #[test]
    fn test_merge_target_defaults_to_output() {
        let existing = Path::new("UserMapper.xml");
        assert_eq!(merge_target(existing, None, false), None);
        assert_eq!(
            merge_target(existing, Some(PathBuf::from("out.xml")), false),
            Some(PathBuf::from("out.xml"))
        );
    }

    #[test]
    fn test_failed_merge_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated.xml");
        let existing = dir.path().join("UserMapper.xml");
        let output = dir.path().join("out.xml");
        fs::write(&generated, format!("{DOCTYPE}\n<mapper><select/></mapper>")).unwrap();
        fs::write(&existing, format!("{DOCTYPE}\n<mapper/>")).unwrap();

        assert!(run_merge(&generated, &existing, Some(&output), false, None).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_scan_line() {
        let doc = xml_mapper_merge::parse_str(
            r#"<mapper><select id="abatorgenerated_find"/><sql id="cols"/><cache/></mapper>"#,
        )
        .unwrap();
        let markers = LegacyMarkers::default();
        let lines: Vec<String> = doc
            .root()
            .borrow()
            .children()
            .iter()
            .map(|c| scan_line(c, &markers))
            .collect();

        assert_eq!(
            lines,
            vec![
                "select     abatorgenerated_find (legacy generated)",
                "sql        cols",
                "cache      (no id)",
            ]
        );
    }
}
