use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

use powerplate_scanner::render::Report;
use powerplate_scanner::{
    AnalysisClient, Language, ScanError, ScanSession, ScannerConfig, StillImageCamera,
    UnavailableCamera,
};

#[derive(Parser)]
#[command(name = "powerplate", version, about = "Scan produce for nutrition facts and recipes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a photo of a fruit or vegetable
    Scan {
        /// Image file to analyze
        image: PathBuf,
        /// Treat the image as a camera feed and capture a JPEG frame from it
        #[arg(long)]
        frame: bool,
        /// Output language: en, sn or nd
        #[arg(short, long, env = "POWERPLATE_LANGUAGE")]
        language: Option<Language>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List supported output languages
    Languages,
}

async fn scan(
    image: PathBuf,
    frame: bool,
    language: Option<Language>,
    json: bool,
) -> Result<(), String> {
    let config = ScannerConfig::load().map_err(|e| ScanError::from(e).user_message())?;
    let language = language.unwrap_or(config.language);
    let client = AnalysisClient::from_config(&config);
    debug!("Scanning {} in {}", image.display(), language.label());

    let mut session = if frame {
        let camera = StillImageCamera::from_file(image.clone());
        let mut session = ScanSession::new(Box::new(camera), language);
        session.acquire_camera().await.map_err(|e| e.user_message())?;
        session
            .capture_and_analyze(&client)
            .await
            .map_err(|e| e.user_message())?;
        session
    } else {
        let mut session = ScanSession::new(Box::new(UnavailableCamera::default()), language);
        session
            .upload_and_analyze(&image, &client)
            .await
            .map_err(|e| e.user_message())?;
        session
    };
    session.release_camera();

    if let Some(message) = session.error() {
        return Err(message.to_string());
    }

    if let Some(result) = session.result() {
        if json {
            let output = serde_json::to_string_pretty(result).map_err(|e| e.to_string())?;
            println!("{}", output);
        } else {
            print!("{}", Report(result));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Languages => {
            for language in Language::ALL {
                println!("{}\t{}", language.code(), language.label());
            }
            ExitCode::SUCCESS
        }
        Command::Scan {
            image,
            frame,
            language,
            json,
        } => match scan(image, frame, language, json).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("{}", message);
                ExitCode::FAILURE
            }
        },
    }
}
