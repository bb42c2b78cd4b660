use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use volc_tts_bridge::{
    BridgeConfig, Settings, SettingsProvider, SettingsStore, SpeechParams, StaticSettings,
    SynthesisOutcome, TtsRequest, TtsService, VolcengineEngine, utils::WavFileSink,
};

/// Volcengine TTS bridge - stream speech synthesis into the OS audio path
#[derive(Parser, Debug)]
#[command(name = "volc-tts-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize text into a WAV file
    Speak {
        /// Text to synthesize
        #[arg(short = 't', long = "text", conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,

        /// Output WAV file
        #[arg(short = 'o', long = "out", default_value = "speech.wav")]
        out: PathBuf,

        /// Speech rate, 100 is normal
        #[arg(long = "rate")]
        rate: Option<u32>,

        /// Pitch, 100 is normal
        #[arg(long = "pitch")]
        pitch: Option<u32>,
    },

    /// Report how well a locale is supported
    CheckLanguage {
        language: String,
        #[arg(default_value = "")]
        country: String,
        #[arg(default_value = "")]
        variant: String,
    },

    /// Print the sample sentence for a locale
    SampleText { language: String, country: String },

    /// Manage persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Show the stored settings
    Show,

    /// Store credentials and voice
    Save {
        #[arg(long = "app-id")]
        app_id: String,

        #[arg(long = "token")]
        token: String,

        #[arg(long = "speaker-id")]
        speaker_id: String,

        #[arg(long = "cluster")]
        cluster: Option<String>,

        #[arg(long = "emotional")]
        emotional: bool,
    },
}

fn settings_store(config: &BridgeConfig) -> anyhow::Result<SettingsStore> {
    config
        .settings_path
        .as_ref()
        .map(SettingsStore::open)
        .ok_or_else(|| anyhow!("No settings path configured (set VOLC_TTS_SETTINGS_PATH)"))
}

fn settings_provider(config: &BridgeConfig) -> Arc<dyn SettingsProvider> {
    match config.settings_path.as_ref() {
        Some(path) => Arc::new(SettingsStore::open(path)),
        None => Arc::new(StaticSettings::new(config.settings())),
    }
}

async fn speak(
    config: &BridgeConfig,
    text: String,
    out: PathBuf,
    params: SpeechParams,
) -> anyhow::Result<()> {
    let engine = VolcengineEngine::new(config.engine_config())?;
    let service = Arc::new(TtsService::new(
        engine,
        settings_provider(config),
        config.synthesis_options(),
    ));

    let stopper = service.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received");
            stopper.stop();
        }
    });

    let request = TtsRequest::new(text).with_params(params);
    let mut sink = WavFileSink::new(&out);
    let outcome = service
        .synthesize(&request, &mut sink)
        .await
        .map_err(|e| anyhow!("Synthesis failed: {e}"))?;

    match outcome {
        SynthesisOutcome::Completed { segments, bytes } => {
            println!(
                "Wrote {} ({} segment(s), {} bytes of audio)",
                out.display(),
                segments,
                bytes
            );
        }
        SynthesisOutcome::Empty => println!("Nothing to synthesize"),
        SynthesisOutcome::Interrupted => println!("Interrupted, partial audio in {}", out.display()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        BridgeConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        BridgeConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command {
        Commands::Speak {
            text,
            file,
            out,
            rate,
            pitch,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))?,
                (None, None) => anyhow::bail!("Either --text or --file is required"),
            };
            let params = SpeechParams {
                speech_rate: rate,
                volume: None,
                pitch,
            };
            speak(&config, text, out, params).await?;
        }
        Commands::CheckLanguage {
            language,
            country,
            variant,
        } => {
            let availability = volc_tts_bridge::match_locale(&language, &country, &variant);
            println!("{availability:?} ({})", availability.os_code());
        }
        Commands::SampleText { language, country } => {
            println!(
                "{}",
                volc_tts_bridge::sample_text(Some(&language), Some(&country))
            );
        }
        Commands::Settings { action } => {
            let store = settings_store(&config)?;
            match action {
                SettingsAction::Show => match store.read().map_err(|e| anyhow!(e.to_string()))? {
                    Some(settings) => {
                        println!("app_id:      {}", settings.app_id);
                        println!("token:       {}", settings.masked_token());
                        println!("speaker_id:  {}", settings.speaker_id);
                        println!("cluster:     {}", settings.cluster);
                        println!("emotional:   {}", settings.emotional);
                    }
                    None => println!("No settings stored at {}", store.path().display()),
                },
                SettingsAction::Save {
                    app_id,
                    token,
                    speaker_id,
                    cluster,
                    emotional,
                } => {
                    let mut settings = Settings::new(app_id, token, speaker_id);
                    if let Some(cluster) = cluster {
                        settings.cluster = cluster;
                    }
                    settings.emotional = emotional;
                    settings
                        .check()
                        .map_err(|e| anyhow!("Refusing to save settings: {e}"))?;
                    store.save(&settings).map_err(|e| anyhow!(e.to_string()))?;
                    println!("Settings saved to {}", store.path().display());
                }
            }
        }
    }

    Ok(())
}
