pub mod driver;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use driver::{run_bridge, BridgeTabs};
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, level_filters::LevelFilter};

use crate::{
    popup::{PopupController, PopupEvent},
    report::client::ReportClient,
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::enable_logging,
    },
    view::TerminalView,
};

#[derive(Parser, Debug)]
#[command(name = "tabwatch", version)]
#[command(about = "Tracks focused-tab work sessions and submits reports to a local analysis backend", long_about = None)]
pub struct Args {
    /// Base URL of the analysis backend.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub backend_url: String,
    /// Directory for downloaded report artifacts. Defaults to <dir>/downloads.
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(&app_dir, args.log, args.log_console)?;

    let download_dir = args
        .download_dir
        .unwrap_or_else(|| app_dir.join("downloads"));

    let (sender, receiver) = mpsc::channel::<PopupEvent>(32);
    let shutdown_token = CancellationToken::new();

    let tabs = BridgeTabs::default();
    let controller = PopupController::new(
        receiver,
        sender.clone(),
        Box::new(tabs.clone()),
        ReportClient::new(args.backend_url, download_dir),
        TerminalView,
        Arc::new(DefaultClock),
        shutdown_token.clone(),
    );

    let (_, popup_result, bridge_result) = tokio::join!(
        detect_shutdown(shutdown_token.clone()),
        controller.run(),
        run_bridge(tabs, sender, shutdown_token),
    );

    if let Err(popup_result) = popup_result {
        error!("Popup controller got an error {:?}", popup_result);
    }

    if let Err(bridge_result) = bridge_result {
        error!("Event bridge got an error {:?}", bridge_result);
    }

    Ok(())
}

async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
