mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use inspector_core::{export_report_blocking, ExportOptions, ExportProgress, ExportSummary};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Profile, ProfileStore, DEFAULT_ENCODING, DEFAULT_OUTPUT, DEFAULT_TIMEOUT_SECS};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dump vision inspector image metadata to CSV", long_about = None)]
struct Cli {
    /// (Optional) ID of a single dataset to export
    #[arg(long = "dsid")]
    dsid: Option<String>,

    /// Vision URL, e.g. https://ip/powerai-vision, without trailing slash or /api
    #[arg(long = "url")]
    url: Option<String>,

    /// Output CSV path
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Username
    #[arg(long = "user")]
    user: Option<String>,

    /// Password
    #[arg(long = "passwd", env = "VISION_PASSWORD", hide_env_values = true)]
    passwd: Option<String>,

    /// Include training data and user-uploaded images
    #[arg(long = "showall")]
    show_all: bool,

    /// Debug logging
    #[arg(long = "debug")]
    debug: bool,

    /// Output file encoding
    #[arg(short = 'e', long = "encoding")]
    encoding: Option<String>,

    /// Request timeout in seconds
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Reject self-signed TLS certificates
    #[arg(long = "strict-tls")]
    strict_tls: bool,

    /// Load defaults from a saved profile
    #[arg(long = "profile")]
    profile: Option<String>,

    /// Save the effective settings under this name after a successful run
    #[arg(long = "save-profile")]
    save_profile: Option<String>,

    /// Custom profile file path
    #[arg(long = "config-path")]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    url: String,
    user: String,
    output: PathBuf,
    dataset_id: Option<String>,
    encoding: String,
    timeout_secs: u64,
    show_all: bool,
}

impl Settings {
    /// Explicit flags win over the profile, the profile over built-in defaults.
    fn resolve(cli: &Cli, profile: Option<&Profile>) -> Result<Self> {
        let url = cli
            .url
            .clone()
            .or_else(|| profile.map(|p| p.url.clone()))
            .ok_or_else(|| anyhow!("--url is required (or use --profile)"))?;
        let user = cli
            .user
            .clone()
            .or_else(|| profile.and_then(|p| p.user.clone()))
            .ok_or_else(|| anyhow!("--user is required (or use --profile)"))?;
        let output = cli
            .output
            .clone()
            .or_else(|| profile.map(Profile::output_path))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let dataset_id = cli
            .dsid
            .clone()
            .or_else(|| profile.and_then(|p| p.dataset_id.clone()));
        let encoding = cli
            .encoding
            .clone()
            .or_else(|| profile.map(|p| p.encoding.clone()))
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string());
        let timeout_secs = cli
            .timeout
            .or_else(|| profile.map(|p| p.timeout_secs))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("--timeout must be greater than 0");
        }
        let show_all = cli.show_all || profile.is_some_and(|p| p.show_all);

        Ok(Self {
            url,
            user,
            output,
            dataset_id,
            encoding,
            timeout_secs,
            show_all,
        })
    }

    fn to_profile(&self, name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            url: self.url.clone(),
            user: Some(self.user.clone()),
            output: self.output.display().to_string(),
            dataset_id: self.dataset_id.clone(),
            encoding: self.encoding.clone(),
            timeout_secs: self.timeout_secs,
            show_all: self.show_all,
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut store = ProfileStore::load(cli.config_path.clone())?;
    let profile = match cli.profile.as_deref() {
        Some(name) => Some(store.find(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = store.profiles().iter().map(|p| p.name.as_str()).collect();
            anyhow!("unknown profile `{name}` (known: {})", known.join(", "))
        })?),
        None => None,
    };
    let settings = Settings::resolve(&cli, profile.as_ref())?;
    let password = cli
        .passwd
        .clone()
        .ok_or_else(|| anyhow!("--passwd (or VISION_PASSWORD) is required"))?;

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress_bar.enable_steady_tick(Duration::from_millis(120));
    let spinner = progress_bar.clone();

    let options = ExportOptions {
        base_url: settings.url.clone(),
        username: settings.user.clone(),
        password,
        dataset_id: settings.dataset_id.clone(),
        csv_path: settings.output.clone(),
        encoding: settings.encoding.clone(),
        show_all: settings.show_all,
        timeout_secs: settings.timeout_secs,
        accept_invalid_certs: !cli.strict_tls,
        progress_callback: Some(Arc::new(move |progress: ExportProgress| {
            spinner.set_message(format!(
                "{}: {}/{}",
                progress.dataset, progress.current, progress.total
            ));
        })),
    };

    let result = export_report_blocking(options);
    progress_bar.finish_and_clear();
    let summary = result.with_context(|| "failed to dump inspector data")?;
    print_summary(&summary);

    if let Some(name) = cli.save_profile.as_deref() {
        store.upsert(settings.to_profile(name))?;
        info!("saved profile `{name}` to {}", store.path().display());
    }
    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    println!(
        "{} {} rows to {}",
        style("Wrote").green().bold(),
        summary.rows_written,
        summary.csv_path.display()
    );
    println!(
        "{} {} datasets, {} files, {} filtered out",
        style("Scanned").dim(),
        summary.datasets,
        summary.candidates,
        style(summary.filtered_out()).yellow()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vision_inspector_dump").chain(args.iter().copied()))
            .expect("cli")
    }

    fn saved() -> Profile {
        Profile {
            name: "plant".to_string(),
            url: "https://plant/vision".to_string(),
            user: Some("inspector".to_string()),
            output: "plant.csv".to_string(),
            dataset_id: Some("ds-9".to_string()),
            encoding: "gbk".to_string(),
            timeout_secs: 5,
            show_all: true,
        }
    }

    #[test]
    fn flags_alone_resolve_with_defaults() {
        let cli = parse(&["--url", "http://v", "--user", "admin"]);
        let settings = Settings::resolve(&cli, None).expect("settings");
        assert_eq!(settings.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(settings.encoding, DEFAULT_ENCODING);
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(settings.dataset_id.is_none());
        assert!(!settings.show_all);
    }

    #[test]
    fn flags_override_profile() {
        let cli = parse(&["--url", "http://override", "-o", "x.csv"]);
        let settings = Settings::resolve(&cli, Some(&saved())).expect("settings");
        assert_eq!(settings.url, "http://override");
        assert_eq!(settings.output, PathBuf::from("x.csv"));
        assert_eq!(settings.user, "inspector");
        assert_eq!(settings.dataset_id.as_deref(), Some("ds-9"));
        assert!(settings.show_all);
        assert_eq!(settings.to_profile("plant").output, "x.csv");
    }

    #[test]
    fn missing_url_is_an_error() {
        let cli = parse(&["--user", "admin"]);
        assert!(Settings::resolve(&cli, None).is_err());
    }
}
