use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use eframe::NativeOptions;
use egui::ViewportBuilder;
use freshair_app::{FanCardApp, HostSettings};
use freshair_card::FanControlCard;
use freshair_hass::HomeAssistant;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Home Assistant host, eg. `homeassistant.local:8123`
    #[arg(long, env = "HASS_HOST")]
    host: String,

    /// Long-lived access token
    #[arg(long, env = "HASS_TOKEN", hide_env_values = true)]
    token: String,

    /// Use ws:// instead of wss://
    #[arg(long)]
    insecure: bool,

    /// Fan entity to bind the card to
    #[arg(long, required_unless_present = "card", conflicts_with = "card")]
    entity: Option<String>,

    /// JSON file with the full card configuration
    #[arg(long)]
    card: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let args = Args::parse();

    let config = match (&args.card, &args.entity) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("card configuration is not valid JSON")?
        }
        (None, Some(entity)) => serde_json::json!({ "entity": entity }),
        (None, None) => anyhow::bail!("either --entity or --card is required"),
    };

    let card = FanControlCard::new(&config).context("invalid card configuration")?;
    log::info!("Card bound to {}", card.config().entity);

    let host = HostSettings {
        url: HomeAssistant::websocket_url(&args.host, !args.insecure),
        token: args.token,
    };

    let opts = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("freshair")
            .with_inner_size([380., 160.]),
        ..Default::default()
    };

    eframe::run_native(
        "freshair",
        opts,
        Box::new(move |cc| Ok(Box::new(FanCardApp::new(cc, card, host)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the window: {e}"))
}
