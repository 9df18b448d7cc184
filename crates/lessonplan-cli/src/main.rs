//! Lessonplan CLI
//!
//! Command-line interface for:
//! - Extracting text and weeks from syllabus PDFs
//! - Drafting a week's lesson table (editable `stage|time|content|note` text)
//! - Reconciling an edited draft and composing the weekly report
//! - Managing the stored syllabus library

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use lessonplan_ingest::{
    draft_for_week, parse_syllabus_file, reconcile_detailed, DraftOptions, ExtractorChain,
    InferredFields, LessonDraft, LessonReport, OutlineCodeMap, SyllabusParse,
};
use lessonplan_storage::SyllabusLibrary;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod library;

use config::LessonplanConfig;
use library::LibraryCommands;

#[derive(Parser)]
#[command(name = "lessonplan")]
#[command(author, version, about = "Weekly lesson-plan drafts from syllabus PDFs")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plain text from a syllabus PDF.
    Extract {
        input: PathBuf,
        /// Write text here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the weeks found in a syllabus.
    Weeks {
        /// Syllabus file (PDF or text) or library id
        source: String,
        #[arg(long)]
        json: bool,
    },

    /// Show the outline codes embedded in a syllabus.
    Outline {
        source: String,
        #[arg(long)]
        json: bool,
    },

    /// Draft one week's lesson table.
    Draft {
        #[command(flatten)]
        week: WeekArgs,
        /// Print fields and rows as JSON
        #[arg(long)]
        json: bool,
        /// Write the draft text here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Parse an edited draft back into rows (JSON). `-` reads stdin.
    Reconcile {
        input: PathBuf,
        /// Include line numbers and malformed flags
        #[arg(long)]
        detailed: bool,
    },

    /// Compose the weekly plan/report text.
    Report {
        #[command(flatten)]
        week: WeekArgs,
        /// Edited draft text to use instead of a fresh draft
        #[arg(long)]
        draft: Option<PathBuf>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        materials: Option<String>,
        #[arg(long)]
        evaluation: Option<String>,
        #[arg(long)]
        student_notes: Option<String>,
        #[arg(long)]
        teacher_notes: Option<String>,
        /// Also write the renderer field mapping as JSON
        #[arg(long)]
        fields: Option<PathBuf>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage stored syllabi.
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
}

/// Which week to draft, plus manual field entries.
#[derive(Args)]
struct WeekArgs {
    /// Syllabus file (PDF or text) or library id
    source: String,
    #[arg(short, long)]
    week: u32,
    /// Outline table (JSON or delimited text)
    #[arg(long)]
    outline: Option<PathBuf>,
    #[arg(long)]
    class_name: Option<String>,
    #[arg(long)]
    class_date: Option<String>,
    #[arg(long)]
    audience: Option<String>,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    objective: Option<String>,
    /// Memo appended to the development stage
    #[arg(long)]
    memo: Option<String>,
    /// Leave the prayer out of the introduction
    #[arg(long)]
    no_prayer: bool,
}

impl WeekArgs {
    fn overrides(&self) -> InferredFields {
        InferredFields {
            class_name: self.class_name.clone(),
            class_date: self.class_date.clone(),
            audience: self.audience.clone(),
            topic: self.topic.clone(),
            objective: self.objective.clone(),
            ..Default::default()
        }
    }

    fn options(&self, config: &LessonplanConfig) -> DraftOptions {
        let mut options = config.draft.clone();
        if self.no_prayer {
            options.include_prayer = false;
        }
        if self.memo.is_some() {
            options.plan_note = self.memo.clone();
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = LessonplanConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { input, out } => cmd_extract(&input, out.as_deref()),
        Commands::Weeks { source, json } => cmd_weeks(&config, &source, json),
        Commands::Outline { source, json } => cmd_outline(&config, &source, json),
        Commands::Draft { week, json, out } => cmd_draft(&config, &week, json, out.as_deref()),
        Commands::Reconcile { input, detailed } => cmd_reconcile(&input, detailed),
        Commands::Report {
            week,
            draft,
            teacher,
            materials,
            evaluation,
            student_notes,
            teacher_notes,
            fields,
            out,
        } => {
            let mut report = build_report(&config, &week, draft.as_deref())?;
            let set = |slot: &mut String, value: Option<String>| {
                if let Some(value) = value {
                    *slot = value;
                }
            };
            set(&mut report.teacher_name, teacher);
            set(&mut report.materials, materials);
            set(&mut report.evaluation, evaluation);
            set(&mut report.student_notes, student_notes);
            set(&mut report.teacher_notes, teacher_notes);
            cmd_report(&report, fields.as_deref(), out.as_deref())
        }
        Commands::Library { command } => {
            let library = SyllabusLibrary::open(config.storage())
                .context("Failed to open syllabus library")?;
            library::run(&library, command)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Syllabus loading
// ============================================================================

struct LoadedSyllabus {
    parse: SyllabusParse,
    file_name: Option<String>,
}

/// A path on disk, or else an id in the library.
fn load_syllabus(config: &LessonplanConfig, source: &str) -> Result<LoadedSyllabus> {
    let path = Path::new(source);
    if path.exists() {
        let parse = parse_syllabus_file(path, &config.segmenter)?;
        return Ok(LoadedSyllabus {
            parse,
            file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        });
    }

    let library = SyllabusLibrary::open(config.storage())?;
    let entry = library
        .ensure_outline(source)
        .with_context(|| format!("`{source}` is neither a file nor a library id"))?;
    Ok(LoadedSyllabus {
        parse: entry.as_parse(),
        file_name: Some(entry.name),
    })
}

fn warn_parse_state(parse: &SyllabusParse) {
    if parse.extraction_failed {
        eprintln!(
            "{} no text could be extracted from the PDF",
            "warning:".yellow().bold()
        );
    }
    if parse.no_weeks_found() {
        eprintln!("{} no weeks found", "warning:".yellow().bold());
    }
}

fn draft_week(config: &LessonplanConfig, args: &WeekArgs) -> Result<LessonDraft> {
    let loaded = load_syllabus(config, &args.source)?;
    warn_parse_state(&loaded.parse);

    let week = loaded.parse.week(args.week).ok_or_else(|| {
        let available: Vec<String> = loaded
            .parse
            .weeks
            .iter()
            .map(|w| w.week_index.to_string())
            .collect();
        anyhow!(
            "week {} not found (available: {})",
            args.week,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        )
    })?;

    let extra = args
        .outline
        .as_deref()
        .map(|path| {
            OutlineCodeMap::load(path)
                .with_context(|| format!("Failed to load outline table: {}", path.display()))
        })
        .transpose()?;

    let context = loaded.parse.context_for(loaded.file_name.as_deref());
    let draft = draft_for_week(
        &loaded.parse,
        week,
        extra.as_ref(),
        &context,
        &args.overrides(),
        &args.options(config),
    );

    let missing = draft.fields.missing();
    if !missing.is_empty() {
        eprintln!(
            "{} fill in manually: {}",
            "info:".yellow().bold(),
            missing.join(", ")
        );
    }
    if draft.fields.schedule_notice {
        eprintln!(
            "{} week {} mentions a holiday, exam or event",
            "info:".yellow().bold(),
            draft.week_index
        );
    }
    Ok(draft)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_extract(input: &Path, out: Option<&Path>) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let extraction = ExtractorChain::default().extract(&data);

    for failure in &extraction.failures {
        eprintln!(
            "{} {}: {}",
            "warning:".yellow().bold(),
            failure.backend,
            failure.reason
        );
    }
    if extraction.failed() {
        eprintln!(
            "{} no text could be extracted from {}",
            "warning:".yellow().bold(),
            input.display()
        );
    }

    write_output(out, &extraction.text)
}

fn cmd_weeks(config: &LessonplanConfig, source: &str, json: bool) -> Result<()> {
    let loaded = load_syllabus(config, source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.parse.weeks)?);
        return Ok(());
    }

    warn_parse_state(&loaded.parse);
    for week in &loaded.parse.weeks {
        let labels: Vec<&str> = week.class_labels.iter().map(String::as_str).collect();
        println!(
            "{} {}  {}",
            "•".cyan(),
            week.label().bold(),
            labels.join(", ")
        );
    }
    Ok(())
}

fn cmd_outline(config: &LessonplanConfig, source: &str, json: bool) -> Result<()> {
    let loaded = load_syllabus(config, source)?;
    let outline = &loaded.parse.outline_map;
    if json {
        println!("{}", serde_json::to_string_pretty(outline)?);
        return Ok(());
    }

    if outline.is_empty() {
        println!("{} no outline codes found", "info:".yellow().bold());
    }
    for entry in outline.iter() {
        match &entry.objective {
            Some(objective) => println!("{}  {} | {}", entry.code.cyan(), entry.topic, objective),
            None => println!("{}  {}", entry.code.cyan(), entry.topic),
        }
    }
    Ok(())
}

fn cmd_draft(
    config: &LessonplanConfig,
    args: &WeekArgs,
    json: bool,
    out: Option<&Path>,
) -> Result<()> {
    let draft = draft_week(config, args)?;
    if json {
        return write_output(out, &serde_json::to_string_pretty(&draft)?);
    }
    write_output(out, &draft.text())
}

fn cmd_reconcile(input: &Path, detailed: bool) -> Result<()> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?
    };

    let rows = reconcile_detailed(&text);
    for row in rows.iter().filter(|r| r.malformed) {
        eprintln!(
            "{} line {} kept as content: {}",
            "warning:".yellow().bold(),
            row.line,
            row.row.content
        );
    }

    let json = if detailed {
        serde_json::to_string_pretty(&rows)?
    } else {
        let plain: Vec<_> = rows.iter().map(|r| &r.row).collect();
        serde_json::to_string_pretty(&plain)?
    };
    println!("{json}");
    Ok(())
}

fn build_report(
    config: &LessonplanConfig,
    args: &WeekArgs,
    edited: Option<&Path>,
) -> Result<LessonReport> {
    let draft = draft_week(config, args)?;
    let mut report = draft.report();

    if let Some(path) = edited {
        report.draft_text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read edited draft: {}", path.display()))?;
    }
    if let Some(teacher) = &config.teacher_name {
        report.teacher_name = teacher.clone();
    }
    if let Some(materials) = &config.materials {
        report.materials = materials.clone();
    }
    Ok(report)
}

fn cmd_report(report: &LessonReport, fields: Option<&Path>, out: Option<&Path>) -> Result<()> {
    if let Some(path) = fields {
        let json = serde_json::to_string_pretty(&report.template_fields())?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    write_output(out, &report.compose_text())
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{text}"),
    }
    Ok(())
}
