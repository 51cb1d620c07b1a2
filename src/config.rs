use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const TRUSTED_ORIGIN: &str = "https://fbref.com/";
pub const TRUSTED_HOST: &str = "fbref.com";

const DEFAULT_STANDINGS_URL: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";
const DEFAULT_COMPETITION: &str = "Premier League";
const DEFAULT_OUTPUT: &str = "matches.csv";
const DEFAULT_CUSTOM_OUTPUT: &str = "custom_data.csv";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub standings_url: String,
    pub season_start: i32,
    pub season_end: i32,
    pub competition: String,
    pub team_delay: Duration,
    pub team_delay_jitter: Duration,
    pub parallelism: usize,
    pub fetch_timeout: Duration,
    pub output_path: PathBuf,
    pub custom_output_path: PathBuf,
    pub page_cache: bool,
    pub render_command: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            standings_url: DEFAULT_STANDINGS_URL.to_string(),
            season_start: 2022,
            season_end: 2020,
            competition: DEFAULT_COMPETITION.to_string(),
            team_delay: Duration::from_millis(1000),
            team_delay_jitter: Duration::ZERO,
            parallelism: 1,
            fetch_timeout: Duration::from_secs(60),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            custom_output_path: PathBuf::from(DEFAULT_CUSTOM_OUTPUT),
            page_cache: false,
            render_command: None,
        }
    }
}

impl CrawlConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            standings_url: env_string("FBREF_STANDINGS_URL").unwrap_or(defaults.standings_url),
            season_start: env_parse("FBREF_SEASON_START").unwrap_or(defaults.season_start),
            season_end: env_parse("FBREF_SEASON_END").unwrap_or(defaults.season_end),
            competition: env_string("FBREF_COMPETITION").unwrap_or(defaults.competition),
            team_delay: env_parse::<u64>("FBREF_TEAM_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.team_delay),
            team_delay_jitter: env_parse::<u64>("FBREF_TEAM_DELAY_JITTER_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.team_delay_jitter),
            parallelism: env_parse::<usize>("FETCH_PARALLELISM")
                .unwrap_or(defaults.parallelism)
                .clamp(1, 8),
            fetch_timeout: env_parse::<u64>("FETCH_TIMEOUT_SECS")
                .map(|secs| Duration::from_secs(secs.clamp(5, 300)))
                .unwrap_or(defaults.fetch_timeout),
            output_path: env_string("FBREF_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            custom_output_path: env_string("FBREF_CUSTOM_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.custom_output_path),
            page_cache: env_flag("FBREF_PAGE_CACHE"),
            render_command: env_string("FBREF_RENDER_CMD"),
        }
    }

    pub fn seasons(&self) -> Vec<i32> {
        if self.season_start <= self.season_end {
            return Vec::new();
        }
        ((self.season_end + 1)..=self.season_start).rev().collect()
    }

    pub fn status_path(&self) -> PathBuf {
        let mut name = self
            .output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".status.json");
        self.output_path.with_file_name(name)
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|val| val.parse::<T>().ok())
}

fn env_flag(key: &str) -> bool {
    env_string(key).is_some_and(|val| {
        matches!(
            val.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
