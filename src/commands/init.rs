use std::io::{self, Write};
use std::path::PathBuf;

use trackflow::config::Config;
use trackflow::error::{Result, TrackFlowError};

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

pub async fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        let answer = prompt(&format!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("TrackFlow Configuration");
    println!("=======================\n");

    let data_file = optional(prompt(
        "Local data file to use instead of a backend (leave empty to use the API): ",
    )?)
    .map(PathBuf::from);

    let mut config = Config {
        data_file,
        ..Default::default()
    };

    if config.data_file.is_none() {
        let api_url = prompt("Backend API URL: ")?;
        if api_url.is_empty() {
            return Err(TrackFlowError::MissingApiUrl);
        }
        let api_key = prompt("API key: ")?;
        if api_key.is_empty() {
            return Err(TrackFlowError::MissingApiKey);
        }
        config.api_url = Some(api_url);
        config.api_key = Some(api_key);
        config.project_id = optional(prompt("Project ID [optional]: ")?);
        config.api_url()?;
    }

    config.author_name = optional(prompt("Your name for comments and activity [optional]: ")?);

    config.save_to(&config_path)?;

    println!("\nConfig saved to {}", config_path.display());
    println!("You can now use 'trackflow' commands!");

    Ok(())
}
