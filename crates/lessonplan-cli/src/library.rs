//! `lessonplan library ...`: manage stored syllabi.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use lessonplan_storage::{LibraryEntry, SyllabusLibrary};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum LibraryCommands {
    /// Store syllabus PDFs and index their weeks.
    Add {
        /// PDF files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Add every PDF under a directory.
    Import {
        dir: PathBuf,
    },

    /// List stored syllabi.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one syllabus and its weeks.
    Show {
        /// Id or unique id prefix
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored syllabus.
    Remove {
        id: String,
    },

    /// Re-run extraction and parsing for a stored syllabus.
    Reparse {
        id: String,
    },
}

pub fn run(library: &SyllabusLibrary, command: LibraryCommands) -> Result<()> {
    match command {
        LibraryCommands::Add { files } => {
            for file in files {
                let entry = library
                    .add_file(&file)
                    .with_context(|| format!("Failed to add {}", file.display()))?;
                print_added(&entry);
            }
        }
        LibraryCommands::Import { dir } => {
            let added = library
                .import_dir(&dir)
                .with_context(|| format!("Failed to import {}", dir.display()))?;
            for entry in &added {
                print_added(entry);
            }
            println!("  {} {} syllabi imported", "→".yellow(), added.len());
        }
        LibraryCommands::List { json } => {
            let entries = library.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("{} library is empty", "info:".yellow().bold());
            } else {
                for entry in &entries {
                    println!(
                        "{}  {}  {} weeks",
                        short_id(entry).cyan(),
                        entry.label(),
                        entry.weeks.len()
                    );
                }
            }
        }
        LibraryCommands::Show { id, json } => {
            let entry = library.ensure_outline(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("{} {}", entry.id.to_string().cyan(), entry.label().bold());
                println!("  path: {}", entry.path.display());
                println!("  sha256: {}", entry.sha256);
                println!("  outline codes: {}", entry.outline_map.len());
                if entry.extraction_failed {
                    println!("  {} text extraction failed", "warning:".yellow().bold());
                }
                for week in &entry.weeks {
                    println!("  {} {}", "•".cyan(), week.label());
                }
            }
        }
        LibraryCommands::Remove { id } => {
            let entry = library.remove(&id)?;
            println!("{} {}", "removed".green().bold(), entry.label());
        }
        LibraryCommands::Reparse { id } => {
            let entry = library.reparse(&id)?;
            println!(
                "{} {} ({} weeks, {} outline codes)",
                "reparsed".green().bold(),
                entry.label(),
                entry.weeks.len(),
                entry.outline_map.len()
            );
        }
    }
    Ok(())
}

fn short_id(entry: &LibraryEntry) -> String {
    entry.id.to_string()[..8].to_string()
}

fn print_added(entry: &LibraryEntry) {
    println!(
        "{} {} {}",
        "added".green().bold(),
        short_id(entry).cyan(),
        entry.name
    );
    if entry.extraction_failed {
        println!("  {} no text could be extracted", "warning:".yellow().bold());
    } else if entry.weeks.is_empty() {
        println!("  {} no weeks found", "warning:".yellow().bold());
    } else {
        println!("  {} {} weeks", "→".yellow(), entry.weeks.len());
    }
}
