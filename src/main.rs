mod classifier;
mod error;
mod export;
mod filter;
mod models;
mod query;
mod rank;
mod session;
mod sorter;
mod source;
mod view;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use export::ExportContext;
use models::{Category, Config};
use query::{Query, QueryForm};
use regex::Regex;
use session::Session;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use view::Direction;

fn build_cli() -> Command {
    Command::new("seat-browser")
        .version("0.1")
        .about("Browse, filter, sort and export college seat allotment records")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("URL|PATH")
                .env("SEAT_BROWSER_SOURCE")
                .help("Record source: URL returning a JSON array, or a JSON file"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for PDF and CSV exports"),
        )
        .arg(Arg::new("name").long("name").value_name("TEXT").help("Institute name contains"))
        .arg(Arg::new("rank").long("rank").value_name("N").help("Exact rank for the active category"))
        .arg(
            Arg::new("student-category")
                .long("student-category")
                .value_name("LABEL")
                .help("Category from the student info panel, e.g. \"OC Boys\""),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("LABEL")
                .help("Category from the filters panel (wins over --student-category)"),
        )
        .arg(
            Arg::new("branch")
                .long("branch")
                .value_name("CODE")
                .action(ArgAction::Append)
                .help("Branch code, repeatable"),
        )
        .arg(
            Arg::new("district")
                .long("district")
                .value_name("CODE")
                .action(ArgAction::Append)
                .help("District code, repeatable"),
        )
        .arg(
            Arg::new("college-type")
                .long("college-type")
                .value_name("all|women")
                .default_value("all"),
        )
        .arg(Arg::new("min-rank").long("min-rank").value_name("N"))
        .arg(Arg::new("max-rank").long("max-rank").value_name("N"))
        .arg(
            Arg::new("move")
                .long("move")
                .value_name("ROW:up|down")
                .action(ArgAction::Append)
                .help("Move a displayed row (1-based) after the search, repeatable"),
        )
        .arg(
            Arg::new("remove")
                .long("remove")
                .value_name("ROW")
                .action(ArgAction::Append)
                .help("Remove a displayed row (1-based) after moves are applied, repeatable"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .default_value("50")
                .help("Rows printed to the terminal, 0 for all"),
        )
        .arg(Arg::new("pdf").long("pdf").action(ArgAction::SetTrue).help("Export the view as PDF"))
        .arg(Arg::new("csv").long("csv").action(ArgAction::SetTrue).help("Export the view as CSV"))
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .action(ArgAction::SetTrue)
                .help("Keep the session open and read actions from stdin"),
        )
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

fn load_config(config_file: &str) -> Result<Config> {
    if Path::new(config_file).exists() {
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        Ok(default_config)
    }
}

fn form_from_args(matches: &ArgMatches) -> QueryForm {
    let text = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();
    let list = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };

    QueryForm {
        name: text("name"),
        rank: text("rank"),
        student_category: text("student-category"),
        filter_category: text("category"),
        branches: list("branch"),
        districts: list("district"),
        college_type: text("college-type"),
        min_rank: text("min-rank"),
        max_rank: text("max-rank"),
    }
}

/// Parse "3:up" / "7:down" into a zero-based index and direction.
fn parse_move_spec(pattern: &Regex, spec: &str) -> Option<(usize, Direction)> {
    let caps = pattern.captures(spec.trim())?;
    let row = caps.get(1)?.as_str().parse::<usize>().ok()?;
    let direction = caps.get(2)?.as_str().parse::<Direction>().ok()?;
    row.checked_sub(1).map(|index| (index, direction))
}

fn parse_row(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok()?.checked_sub(1)
}

fn export_context(form: &QueryForm, session: &Session) -> ExportContext {
    ExportContext {
        name: form.name.clone(),
        rank: form.rank.clone(),
        category: session
            .active_category()
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| form.active_category_text().trim().to_string()),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

fn print_view(session: &Session, limit: usize) {
    let rows = session.view().rows();
    let category = session.active_category();

    if rows.is_empty() {
        println!("📭 No rows to display");
        return;
    }

    let rank_header = category.map(Category::label).unwrap_or("");
    println!(
        "{:>5} {:<6} {:<40} {:<14} {:<5} {:<6} {:<28} {:>10} {:>10}",
        "#", "Inst", "Institute Name", "Place", "Dist", "Branch", "Branch Name", rank_header, "Fee"
    );

    let shown = if limit == 0 { rows.len() } else { rows.len().min(limit) };
    for (i, record) in rows.iter().take(shown).enumerate() {
        let marker = if classifier::is_women_college(record) { "♀" } else { " " };
        let rank = category.map(|c| record.rank_display(c)).unwrap_or_default();
        println!(
            "{:>4}{} {:<6} {:<40} {:<14} {:<5} {:<6} {:<28} {:>10} {:>10}",
            i + 1,
            marker,
            truncate(&record.inst_code, 6),
            truncate(&record.institute_name, 40),
            truncate(&record.place, 14),
            truncate(&record.dist_code, 5),
            truncate(&record.branch_code, 6),
            truncate(&record.branch_name, 28),
            truncate(&rank, 10),
            truncate(&record.tuition_fee_display(), 10),
        );
    }

    if shown < rows.len() {
        println!("   … {} more rows (use `show all` or --limit 0)", rows.len() - shown);
    }
    println!("{}", summary_line(shown, rows.len(), session.full_set().len(), category));
}

fn summary_line(shown: usize, view_len: usize, total: usize, category: Option<Category>) -> String {
    format!(
        "📊 {} shown · {} in view of {} records{}",
        shown,
        view_len,
        total,
        category.map(|c| format!(" · category {}", c)).unwrap_or_default()
    )
}

fn export_pdf(session: &Session, form: &QueryForm, output_dir: &Path) {
    let ctx = export_context(form, session);
    match export::write_pdf(session.view().rows(), &ctx, output_dir) {
        Ok(path) => println!("📥 PDF saved to {}", path.display()),
        Err(e) => println!("❌ {}", e),
    }
}

fn export_csv(session: &Session, form: &QueryForm, output_dir: &Path) {
    let ctx = export_context(form, session);
    match export::write_csv(session.view().rows(), &ctx, session.active_category(), output_dir) {
        Ok(path) => println!("📥 CSV saved to {}", path.display()),
        Err(e) => println!("❌ {}", e),
    }
}

fn print_help() {
    println!("Form fields:   name <text> | rank <n> | student-category <label> | category <label>");
    println!("               branch <codes…> | district <codes…> | type all|women | min <n> | max <n> | clear");
    println!("Actions:       search | reset | sort | up <row> | down <row> | rm <row>");
    println!("Output:        show [all] | codes | pdf | csv | help | quit");
    println!(
        "Categories:    {}",
        Category::ALL.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ")
    );
}

fn run_interactive(session: &mut Session, form: &mut QueryForm, output_dir: &Path, limit: usize) -> Result<()> {
    print_help();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let codes = || -> Vec<String> {
            rest.split(|c: char| c == ',' || c.is_whitespace()).map(str::to_string).collect()
        };

        match command {
            "" => continue,
            "name" => form.name = rest.to_string(),
            "rank" => form.rank = rest.to_string(),
            "student-category" => form.student_category = rest.to_string(),
            "category" => form.filter_category = rest.to_string(),
            "branch" => form.branches = codes(),
            "district" => form.districts = codes(),
            "type" => form.college_type = rest.to_string(),
            "min" => form.min_rank = rest.to_string(),
            "max" => form.max_rank = rest.to_string(),
            "clear" => *form = QueryForm::default(),
            "search" => {
                session.search(Query::from_form(form));
                print_view(session, limit);
            }
            "reset" => {
                *form = QueryForm::default();
                session.reset();
                print_view(session, limit);
            }
            "sort" => match session.sort_by_rank() {
                Ok(()) => print_view(session, limit),
                Err(e) => println!("⚠️  {}", e),
            },
            "up" | "down" => match (parse_row(rest), command.parse::<Direction>()) {
                (Some(index), Ok(direction)) => {
                    if session.move_row(index, direction) {
                        print_view(session, limit);
                    }
                }
                _ => println!("⚠️  usage: {} <row>", command),
            },
            "rm" => match parse_row(rest).and_then(|index| session.remove_row(index)) {
                Some(removed) => {
                    println!("🗑  Removed {} / {}", removed.institute_name, removed.branch_name);
                    print_view(session, limit);
                }
                None => println!("⚠️  no such row: {}", rest),
            },
            "show" => print_view(session, if rest == "all" { 0 } else { limit }),
            "codes" => {
                println!("Branches:  {}", session.branch_codes().join(" "));
                println!("Districts: {}", session.district_codes().join(" "));
            }
            "pdf" => export_pdf(session, form, output_dir),
            "csv" => export_csv(session, form, output_dir),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("⚠️  unknown command: {} (try `help`)", other),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let config = load_config(config_file)?;
    init_tracing(&config.log_filter);

    let location = matches
        .get_one::<String>("source")
        .cloned()
        .or_else(|| config.source.clone());
    let output_dir: PathBuf = matches
        .get_one::<String>("output-dir")
        .cloned()
        .or_else(|| config.output_directory.clone())
        .unwrap_or_else(|| "output".to_string())
        .into();

    let full_set = match location {
        Some(location) => {
            println!("🌐 Fetching records from: {}", location);
            let source = source::source_for(&location, Duration::from_secs(config.request_timeout_secs));
            source::load_full_set(source.as_ref()).await
        }
        None => {
            println!("⚠️  No record source configured; set `source` in {} or pass --source", config_file);
            Vec::new()
        }
    };
    println!("✅ {} records loaded", full_set.len());

    let mut session = Session::new(full_set);
    let mut form = form_from_args(&matches);
    session.search(Query::from_form(&form));

    let move_pattern = Regex::new(r"^(\d+)\s*:\s*(?i)(up|down)$")?;
    if let Some(specs) = matches.get_many::<String>("move") {
        for spec in specs {
            match parse_move_spec(&move_pattern, spec) {
                Some((index, direction)) => {
                    if !session.move_row(index, direction) {
                        println!("⚠️  Cannot move row {} {:?}", spec, direction);
                    }
                }
                None => println!("⚠️  Ignoring malformed move: {}", spec),
            }
        }
    }
    if let Some(rows) = matches.get_many::<String>("remove") {
        for row in rows {
            if parse_row(row).and_then(|index| session.remove_row(index)).is_none() {
                println!("⚠️  No such row to remove: {}", row);
            }
        }
    }

    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(50);
    print_view(&session, limit);

    if matches.get_flag("pdf") {
        export_pdf(&session, &form, &output_dir);
    }
    if matches.get_flag("csv") {
        export_csv(&session, &form, &output_dir);
    }

    if matches.get_flag("interactive") {
        run_interactive(&mut session, &mut form, &output_dir, limit)?;
    }

    Ok(())
}
