mod settings;
mod station;
mod wav;

use clap::{Parser, Subcommand};
use cosbit_core::sync::detect_start_marker;
use cosbit_core::{Decoder, Encoder, SAMPLE_RATE};
use log::{debug, info};
use settings::{Settings, DEFAULT_SETTINGS_FILE};
use station::{find_callsigns, is_call_for, normalize_text, Macro};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cosbit")]
#[command(about = "AFSK text modem for voice-bandwidth radio links")]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a text message to a WAV transmission
    Tx {
        /// Message text (at most 48 bytes after normalisation)
        text: String,

        /// Output WAV file
        #[arg(short, long, value_name = "OUTPUT.WAV", default_value = "tx_output.wav")]
        output: PathBuf,

        /// Output level in [0, 1] (default: from settings)
        #[arg(long)]
        volume: Option<f32>,
    },

    /// Decode a message from a recorded WAV file
    Rx {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Mark/space decision frequency in Hz (default: from settings)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Transmit one of the canned QSO messages
    Macro {
        #[arg(value_enum)]
        kind: Macro,

        /// Call sign of the other station
        #[arg(long)]
        dx: Option<String>,

        /// Signal report for `answer`
        #[arg(long, default_value = "599")]
        rst: String,

        /// Output WAV file
        #[arg(short, long, value_name = "OUTPUT.WAV", default_value = "tx_output.wav")]
        output: PathBuf,

        /// Output level in [0, 1] (default: from settings)
        #[arg(long)]
        volume: Option<f32>,
    },

    /// Show or change the stored station settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,

    /// Update one or more settings and save them
    Set {
        #[arg(long)]
        my_call: Option<String>,

        #[arg(long)]
        tx_volume: Option<f32>,

        #[arg(long)]
        rx_threshold: Option<f32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.settings);
    debug!("settings from {}: {:?}", cli.settings.display(), settings);

    match cli.command {
        Commands::Tx { text, output, volume } => {
            transmit_command(&text, &output, volume.unwrap_or(settings.tx_volume))?
        }
        Commands::Rx { input, threshold } => {
            receive_command(&input, threshold.unwrap_or(settings.rx_threshold), &settings)?
        }
        Commands::Macro { kind, dx, rst, output, volume } => {
            let dx = dx.map(|dx| normalize_text(&dx));
            let text = kind.render(&settings.my_call, dx.as_deref(), &normalize_text(&rst))?;
            transmit_command(&text, &output, volume.unwrap_or(settings.tx_volume))?
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => print_settings(&settings, &cli.settings),
            SettingsAction::Set { my_call, tx_volume, rx_threshold } => {
                if let Some(call) = my_call {
                    settings.my_call = normalize_text(call.trim());
                }
                if let Some(volume) = tx_volume {
                    settings.set_tx_volume(volume)?;
                }
                if let Some(threshold) = rx_threshold {
                    settings.set_rx_threshold(threshold)?;
                }
                settings.save(&cli.settings)?;
                info!("Saved settings to {}", cli.settings.display());
                print_settings(&settings, &cli.settings);
            }
        },
    }

    Ok(())
}

fn print_settings(settings: &Settings, path: &Path) {
    println!("Settings ({})", path.display());
    println!("  my_call:      {}", settings.my_call);
    println!("  tx_volume:    {}", settings.tx_volume);
    println!("  rx_threshold: {} Hz", settings.rx_threshold);
}

fn transmit_command(text: &str, output_path: &Path, volume: f32) -> Result<(), Box<dyn std::error::Error>> {
    let encoder = Encoder::default();
    let text = normalize_text(text);
    encoder.validate_text(&text)?;

    let samples = encoder.modulate(&text, volume);
    wav::write_wav(output_path, &samples)?;

    println!("TX: {}", text);
    println!(
        "Wrote {} samples ({:.2} s) to {}",
        samples.len(),
        samples.len() as f32 / SAMPLE_RATE as f32,
        output_path.display()
    );
    Ok(())
}

fn receive_command(input_path: &Path, threshold: f32, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let capture = wav::read_wav(input_path)?;
    println!(
        "Read WAV: {} Hz, {} channels, {} samples",
        capture.sample_rate,
        capture.channels,
        capture.samples.len()
    );
    let samples = capture.at_modem_rate();

    let decoder = Decoder::default();
    match detect_start_marker(&samples, decoder.config()) {
        Some(pos) => println!(
            "Start marker at sample {} ({:.3} s)",
            pos,
            pos as f32 / SAMPLE_RATE as f32
        ),
        None => println!("No start marker found"),
    }

    let recovered = decoder.demodulate(&samples, Some(threshold)).into_result()?;

    println!("RX: {}", recovered.text);
    let calls = find_callsigns(&recovered.text);
    if !calls.is_empty() {
        println!("Call signs: {}", calls.join(" "));
    }
    if is_call_for(&recovered.text, &settings.my_call) {
        println!("    < !!! CALL FOR {} !!! >", settings.my_call.trim().to_uppercase());
    }
    println!("Corrected symbols: {}", recovered.corrected_symbols);

    let track = &recovered.frequency_track;
    if !track.is_empty() {
        let min = track.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = track.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let mean = track.iter().sum::<f32>() / track.len() as f32;
        println!(
            "Frequency track: min {:.0} Hz, mean {:.0} Hz, max {:.0} Hz over {} samples",
            min,
            mean,
            max,
            track.len()
        );
    }
    Ok(())
}
