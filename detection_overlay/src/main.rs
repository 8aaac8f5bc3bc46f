use clap::Parser;
use detection_overlay::prediction::{ConfidenceTier, CONFIDENCE_THRESHOLD};
use image::GenericImageView;
use detection_overlay::session::{Session, ViewMode};
use detection_overlay::sorting::SortMode;
use detection_overlay::uploader::RelayClient;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "detection-overlay",
    about = "Submit a product photo for damage detection and print the detections with their overlay geometry"
)]
struct Cli {
    /// Image to submit (.png, .jpg or .jpeg)
    image: PathBuf,

    /// Base URL of the upload relay
    #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000")]
    relay_url: String,

    /// Sort order for the printed list: confidence or name
    #[arg(long, default_value = "confidence")]
    sort: SortMode,

    /// Output density: list or grid
    #[arg(long, default_value = "list")]
    view: ViewMode,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let filename = cli
        .image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let mut session = Session::new();
    session.set_sort_mode(cli.sort);
    session.set_view_mode(cli.view);

    let token = match session.begin_upload(&filename) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!("Rejected {}: {:?}", filename, e);
            eprintln!("{}", session.error().unwrap_or("Upload rejected"));
            std::process::exit(1);
        }
    };

    let data = tokio::fs::read(&cli.image).await?;

    // The rendered size is only known once the image decodes; until then the
    // session stays unmeasured and no overlay geometry is produced.
    match image::load_from_memory(&data) {
        Ok(decoded) => {
            let (width, height) = decoded.dimensions();
            session.measure_display(width as f32, height as f32);
        }
        Err(e) => tracing::warn!("Could not decode {} locally: {}", filename, e),
    }

    let client = RelayClient::new(cli.relay_url);
    match client.predict(&filename, data).await {
        Ok(predictions) => {
            session.finish_upload(token, predictions);
        }
        Err(e) => {
            tracing::error!("Upload failed: {:?}", e);
            session.fail_upload(token, &e.to_string());
        }
    }

    if let Some(error) = session.error() {
        eprintln!("{}", error);
        std::process::exit(1);
    }

    print_report(&session);

    Ok(())
}

fn print_report(session: &Session) {
    let visible = session.visible();
    if visible.is_empty() {
        println!(
            "No detections above {:.0}% confidence.",
            CONFIDENCE_THRESHOLD * 100.0
        );
        return;
    }

    match session.view_mode() {
        ViewMode::List => {
            for (index, prediction) in &visible {
                let tier = ConfidenceTier::classify(prediction.probability);
                let line = format!(
                    "[{:<6}] {:<24} {:>5.1}%",
                    tier.as_str(),
                    prediction.tag_name,
                    prediction.probability * 100.0
                );
                match session.overlay_rect(*index) {
                    Some(rect) => println!(
                        "{}  box {:.0},{:.0} {:.0}x{:.0}",
                        line, rect.left, rect.top, rect.width, rect.height
                    ),
                    None => println!("{}", line),
                }
            }
        }
        ViewMode::Grid => {
            for row in visible.chunks(3) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|(_, p)| format!("{} {:.0}%", p.tag_name, p.probability * 100.0))
                    .collect();
                println!("{}", cells.join("  |  "));
            }
        }
    }
}
