mod api;
mod browser;
mod config;
mod export;
mod models;
mod scraper;

use anyhow::{Context, Result};
use api::NotionClient;
use browser::PrairieLearnSession;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Parser;
use config::Config;
use indexmap::IndexMap;
use models::{AssignmentRecord, CourseConfig};
use std::io::{self, Write};

#[derive(Parser)]
#[command(about = "Scrape PrairieLearn assessment deadlines and import them into Notion")]
struct Args {
    /// Course id to scrape (e.g. "cpsc221"); prompts interactively when omitted
    course: Option<String>,

    /// Write the scraped assignments to a timestamped CSV instead of importing
    #[arg(long)]
    csv: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let courses = config::courses();

    let course = match args.course {
        Some(id) => {
            let id = id.to_lowercase();
            match courses.get(&id) {
                Some(course) => course.clone(),
                None => {
                    eprintln!("Unknown course: {}", id);
                    eprintln!(
                        "Available: {}",
                        courses.keys().cloned().collect::<Vec<_>>().join(", ")
                    );
                    std::process::exit(1);
                }
            }
        }
        None => select_course(&courses)?,
    };

    println!("\nScraping: {}", course.course_name);
    println!("URL: {}", course.assessments_url);

    // Fetch the assessments page, closing the browser whether or not the
    // login and navigation succeeded
    let session = PrairieLearnSession::launch()
        .await
        .context("Failed to launch browser")?;
    let fetched = fetch_assessments_page(&session, &config, &course).await;
    session.close().await;
    let html = fetched?;

    let now = Utc::now().with_timezone(&scraper::TIMEZONE);
    let records = match scraper::scrape_assessments(&html, &course.course_name, now) {
        Some(records) => records,
        None => {
            eprintln!("Assessments table not found");
            return Ok(());
        }
    };

    if records.is_empty() {
        println!("No assignments found. Check if you're enrolled in this course.");
        return Ok(());
    }

    display_assignments(&records);

    if args.csv {
        let path = export::export_to_csv(&records, &course.course_id)?;
        println!("\nWrote {}", path.display());
        return Ok(());
    }

    if confirm_import()? {
        let notion = NotionClient::new(config.notion_api_key, config.notion_database_id);
        notion.import_assignments(&records).await?;
        println!("Import complete!");
    } else {
        println!("Import cancelled.");
    }

    Ok(())
}

async fn fetch_assessments_page(
    session: &PrairieLearnSession,
    config: &Config,
    course: &CourseConfig,
) -> Result<String> {
    let page = session
        .login(&config.pl_username, &config.pl_password)
        .await
        .context("Failed to log in to PrairieLearn")?;
    session
        .fetch_page(&page, &course.assessments_url)
        .await
        .context("Failed to load the assessments page")
}

/// Interactively select a course by menu number or short id.
fn select_course(courses: &IndexMap<String, CourseConfig>) -> Result<CourseConfig> {
    println!("\nAvailable courses:");
    for (i, (key, course)) in courses.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, key, course.course_name);
    }

    loop {
        let choice = prompt("\nSelect course (number or id): ")?.to_lowercase();

        if let Ok(index) = choice.parse::<usize>() {
            if index >= 1 && index <= courses.len() {
                return Ok(courses[index - 1].clone());
            }
        }

        if let Some(course) = courses.get(&choice) {
            return Ok(course.clone());
        }

        println!("Invalid selection. Try again.");
    }
}

fn confirm_import() -> Result<bool> {
    loop {
        match prompt("\nImport to Notion? (yes/no): ")?.to_lowercase().as_str() {
            "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            _ => println!("Please enter 'yes' or 'no'."),
        }
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    Ok(line.trim().to_string())
}

/// Display scraped assignments as an aligned text table.
fn display_assignments(records: &[AssignmentRecord]) {
    let name_width = records
        .iter()
        .map(|r| r.assignment_name.len())
        .max()
        .unwrap_or(0)
        .max("Name".len());
    let project_width = records
        .iter()
        .map(|r| r.project.len())
        .max()
        .unwrap_or(0)
        .max("Project".len());

    println!("\nScraped Assignments:");
    println!(
        "{:<name_width$}  {:<project_width$}  {:<16}  {:<16}",
        "Name", "Project", "Due", "Unlock"
    );
    for record in records {
        println!(
            "{:<name_width$}  {:<project_width$}  {:<16}  {:<16}",
            record.assignment_name,
            record.project,
            format_timestamp(record.due),
            format_timestamp(record.reminder),
        );
    }
    println!("\nTotal: {} assignments", records.len());
}

fn format_timestamp(timestamp: Option<DateTime<Tz>>) -> String {
    match timestamp {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "None".to_string(),
    }
}
