use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use clap::Parser;
use tracing::info;

pub const DEFAULT_DB_PATH: &str = "media_data.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Local media library server", long_about = None)]
pub struct Args {
    /// SQLite database file
    #[arg(short, long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not open a browser tab after start-up
    #[arg(long)]
    pub no_browser: bool,

    /// Directory holding index.html, manage.html and tags.html
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,

    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// KEY=VALUE overrides file
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Command line wins over the env file, which wins over built-in defaults.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut file = if args.env_file.exists() {
            let values = load_from_env(&args.env_file)?;
            info!("Loaded {} setting(s) from {:?}", values.len(), args.env_file);
            values
        } else {
            HashMap::new()
        };

        let port = match (args.port, file.remove("MEDIA_LIBRARY_PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("Invalid MEDIA_LIBRARY_PORT: {}", raw))?,
            (None, None) => DEFAULT_PORT,
        };

        let open_browser = if args.no_browser {
            false
        } else {
            match file.remove("MEDIA_LIBRARY_OPEN_BROWSER") {
                Some(raw) => parse_bool(&raw)?,
                None => true,
            }
        };

        Ok(Self {
            db_path: args
                .db_path
                .clone()
                .or_else(|| file.remove("MEDIA_LIBRARY_DB").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            host: args
                .host
                .clone()
                .or_else(|| file.remove("MEDIA_LIBRARY_HOST"))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            open_browser,
            templates_dir: args
                .templates_dir
                .clone()
                .or_else(|| file.remove("MEDIA_LIBRARY_TEMPLATES").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("templates")),
            static_dir: args
                .static_dir
                .clone()
                .or_else(|| file.remove("MEDIA_LIBRARY_STATIC").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("static")),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean value: {}", other)),
    }
}

/// Reads `KEY=VALUE` lines, skipping blanks and `#` comments.
fn load_from_env(path: &Path) -> Result<HashMap<String, String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut values = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            values.insert(key.trim().to_string(), value.to_string());
        }
    }

    Ok(values)
}
