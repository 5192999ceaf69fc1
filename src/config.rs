use crate::models::CourseConfig;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub pl_username: String,
    pub pl_password: String,
    pub notion_api_key: String,
    pub notion_database_id: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let pl_username = require_var("PL_USERNAME")?;
        let pl_password = require_var("PL_PASSWORD")?;
        let notion_api_key = require_var("NOTION_API_KEY")?;
        let notion_database_id = require_var("NOTION_DATABASE_ID")?;

        Ok(Config {
            pl_username,
            pl_password,
            notion_api_key,
            notion_database_id,
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    let value = env::var(name)
        .with_context(|| format!("{} not found. Please set it in .env file or environment", name))?;

    if value.is_empty() {
        anyhow::bail!("{} is empty", name);
    }

    Ok(value)
}

/// Available courses, keyed by short id. Insertion order is the order shown
/// in the interactive course menu.
pub fn courses() -> IndexMap<String, CourseConfig> {
    let mut courses = IndexMap::new();

    courses.insert(
        "cpsc121".to_string(),
        CourseConfig {
            course_id: "cpsc121".to_string(),
            course_name: "CPSC_V 121 201/202/203 2024W2".to_string(),
            assessments_url: "https://us.prairielearn.com/pl/course_instance/169408/assessments"
                .to_string(),
        },
    );
    courses.insert(
        "cpsc210".to_string(),
        CourseConfig {
            course_id: "cpsc210".to_string(),
            course_name: "CPSC_V 210 201/202/203 2024W2".to_string(),
            assessments_url: "https://us.prairielearn.com/pl/course_instance/171718/assessments"
                .to_string(),
        },
    );
    courses.insert(
        "cpsc221".to_string(),
        CourseConfig {
            course_id: "cpsc221".to_string(),
            course_name: "CPSC_V 221 201/202/203 2025W2".to_string(),
            assessments_url: "https://us.prairielearn.com/pl/course_instance/202639/assessments"
                .to_string(),
        },
    );

    courses
}
