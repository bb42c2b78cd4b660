use std::env;
use std::str::FromStr;

/// Raw values read from the environment.
///
/// Absent variables stay `None` so YAML and defaults can fill them in.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub app_id: Option<String>,
    pub access_token: Option<String>,
    pub speaker_id: Option<String>,
    pub cluster: Option<String>,
    pub emotional: Option<bool>,
    pub endpoint: Option<String>,
    pub sample_rate: Option<u32>,
    pub connect_timeout_seconds: Option<u64>,
    pub max_segment_chars: Option<usize>,
    pub segment_pause_ms: Option<u64>,
    pub segment_timeout_ms: Option<u64>,
    pub settings_path: Option<String>,
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_var(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} value '{value}': {e}").into()),
        None => Ok(None),
    }
}

fn bool_var(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match string_var(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(format!("Invalid {name} value '{other}': expected a boolean").into()),
        },
        None => Ok(None),
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            app_id: string_var("VOLC_TTS_APP_ID"),
            access_token: string_var("VOLC_TTS_ACCESS_TOKEN"),
            speaker_id: string_var("VOLC_TTS_SPEAKER_ID"),
            cluster: string_var("VOLC_TTS_CLUSTER"),
            emotional: bool_var("VOLC_TTS_EMOTIONAL")?,
            endpoint: string_var("VOLC_TTS_ENDPOINT"),
            sample_rate: parse_var("VOLC_TTS_SAMPLE_RATE")?,
            connect_timeout_seconds: parse_var("VOLC_TTS_CONNECT_TIMEOUT_SECS")?,
            max_segment_chars: parse_var("VOLC_TTS_MAX_SEGMENT_CHARS")?,
            segment_pause_ms: parse_var("VOLC_TTS_SEGMENT_PAUSE_MS")?,
            segment_timeout_ms: parse_var("VOLC_TTS_SEGMENT_TIMEOUT_MS")?,
            settings_path: string_var("VOLC_TTS_SETTINGS_PATH"),
        })
    }
}
