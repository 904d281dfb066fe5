use std::sync::{
    Arc,
    mpsc::{Receiver, Sender},
};

use egui::{CentralPanel, Margin, RichText, vec2};
use freshair_card::{FanControlCard, common::StateSnapshot};
use freshair_hass::HomeAssistant;
use tokio::sync::watch;

use crate::{theme, widget};

/// Where and how to reach the host
#[derive(Debug, Clone)]
pub struct HostSettings {
    pub url: String,
    pub token: String,
}

enum HostEvent {
    Connected(HomeAssistant, watch::Receiver<Arc<StateSnapshot>>),
    Disconnected(String),
}

enum Status {
    Connecting,
    Connected,
    Disconnected(String),
}

/// The connection as seen from the UI thread
struct Host {
    hass: Option<HomeAssistant>,
    snapshots: Option<watch::Receiver<Arc<StateSnapshot>>>,
    status: Status,
}

impl Host {
    fn apply(&mut self, event: HostEvent, card: &mut FanControlCard) {
        match event {
            HostEvent::Connected(hass, snapshots) => {
                log::info!("Connected");
                self.hass = Some(hass);
                self.snapshots = Some(snapshots);
                self.status = Status::Connected;
            }
            HostEvent::Disconnected(reason) => {
                log::warn!("Disconnected: {reason}");
                self.hass = None;
                self.snapshots = None;
                card.set_hass(Arc::default());
                self.status = Status::Disconnected(reason);
            }
        }
    }

    /// Hands the card the newest table, skipping any it never got to show
    fn sync(&mut self, card: &mut FanControlCard) {
        let Some(snapshots) = &mut self.snapshots else {
            return;
        };

        if snapshots.has_changed().unwrap_or(false) {
            let snapshot = Arc::clone(&snapshots.borrow_and_update());
            log::debug!("Received snapshot with {} entities", snapshot.len());
            card.set_hass(snapshot);
        }
    }
}

pub struct FanCardApp {
    rx: Receiver<HostEvent>,
    card: FanControlCard,
    host: Host,
}

impl FanCardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, card: FanControlCard, host: HostSettings) -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<HostEvent>();

        let ctx = cc.egui_ctx.clone();
        std::thread::spawn(move || run_host(host, tx, ctx));

        cc.egui_ctx.all_styles_mut(|s| {
            s.interaction.selectable_labels = false;

            s.spacing.window_margin = Margin::symmetric(10, 8);
            s.spacing.item_spacing = vec2(8., 1.);
            s.spacing.button_padding = vec2(0., 0.);
        });

        Self { rx, card, host: Host { hass: None, snapshots: None, status: Status::Connecting } }
    }
}

/// Owns the tokio runtime for the lifetime of one connection
fn run_host(host: HostSettings, tx: Sender<HostEvent>, ctx: egui::Context) {
    let send = |event: HostEvent| {
        let sent = tx.send(event).is_ok();
        ctx.request_repaint();
        sent
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start tokio runtime: {e}");
            send(HostEvent::Disconnected(e.to_string()));
            return;
        }
    };

    rt.block_on(async {
        log::info!("Connecting to {}", host.url);

        let (hass, mut snapshots) = match HomeAssistant::connect(&host.url, &host.token).await {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Failed to connect to Home Assistant: {e}");
                send(HostEvent::Disconnected(e.to_string()));
                return;
            }
        };

        if !send(HostEvent::Connected(hass, snapshots.clone())) {
            return;
        }

        // the UI reads the table itself, this only wakes it up
        while snapshots.changed().await.is_ok() {
            ctx.request_repaint();
        }

        send(HostEvent::Disconnected("connection closed".to_owned()));
    });
}

impl eframe::App for FanCardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.rx.try_recv() {
            self.host.apply(event, &mut self.card);
        }
        self.host.sync(&mut self.card);

        CentralPanel::default().show(ctx, |ui| {
            let view = self.card.render();

            if let Some(action) = widget::card_ui(ui, &view) {
                match &self.host.hass {
                    Some(hass) => self.card.handle(action, hass),
                    None => log::warn!("Not connected, dropping {action:?}"),
                }
            }

            match &self.host.status {
                Status::Connecting => {
                    ui.label(RichText::new("Connecting…").small().color(theme::INACTIVE));
                }
                Status::Connected => {}
                Status::Disconnected(reason) => {
                    ui.label(
                        RichText::new(format!("Disconnected: {reason}"))
                            .small()
                            .color(theme::INACTIVE),
                    );
                }
            }
        });
    }
}
