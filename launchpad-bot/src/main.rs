mod cli_opts;
mod cli_utils;

use cli_opts::LaunchpadBotOpt;
use cli_utils::*;

use launchpad_client::{Clock, LaunchpadConfig, LogNotifier, Participant, ReceiptWatcher, SystemClock};
use launchpad_controller::sequencer::{TxHandle, TxOutcome};
use launchpad_controller::state::ActionKind;

use anyhow::anyhow;
use env_logger::Env;
use log::{error, info, warn};
use structopt::StructOpt;
use tokio::sync::mpsc;

use std::sync::Arc;

#[tokio::main]
pub async fn main() {
    let opt = LaunchpadBotOpt::from_args();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = try_main(opt).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn try_main(opt: LaunchpadBotOpt) -> Result<(), anyhow::Error> {
    let mut config = match &opt.config {
        Some(path) => LaunchpadConfig::from_file(path)?,
        None => default_config(),
    };
    if opt.referral.is_some() {
        config.referral = opt.referral;
    }
    let deployment = config
        .deployment(opt.chain_id)
        .cloned()
        .ok_or_else(|| anyhow!("no fair auction deployed on chain {}", opt.chain_id))?;
    let tick_interval = config.tick_interval();

    let chain = Arc::new(simulated_chain(deployment, &opt, SystemClock.now())?);
    let mut participant = Participant::new(
        chain.clone(),
        chain.clone(),
        Arc::new(LogNotifier),
        chain.clone(),
        config,
    );
    participant.connect(TEST_WALLET, opt.chain_id);
    participant.refresh_all().await;
    participant.set_input(opt.amount.as_str());

    let (receipt_sender, mut receipts) = mpsc::unbounded_channel::<(TxHandle, TxOutcome)>();
    let mut ticker = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                chain.advance(opt.seconds_per_tick)?;
                chain.mine()?;
                participant.poll().await;

                let view = participant.view();
                log_view(&view);
                let pending = ActionKind::ALL
                    .iter()
                    .any(|kind| participant.sequencer().is_pending(*kind));
                match next_step(&view, opt.auto, pending) {
                    Step::Stop => {
                        info!("nothing left to do, shutting down");
                        return Ok(());
                    }
                    Step::Wait => continue,
                    Step::Invoke => {}
                }
                match participant.invoke().await {
                    Ok(handle) => {
                        let watcher = Arc::clone(&chain);
                        let sender = receipt_sender.clone();
                        tokio::spawn(async move {
                            let outcome = watcher
                                .wait_for_receipt(handle.hash)
                                .await
                                .unwrap_or_else(|err| {
                                    warn!("receipt of {} unavailable: {}", handle.hash, err);
                                    TxOutcome::Dropped
                                });
                            if sender.send((handle, outcome)).is_err() {
                                warn!("receipt of {} arrived after shutdown", handle.hash);
                            }
                        });
                    }
                    Err(err) => warn!("{}", err),
                }
            }
            Some((handle, outcome)) = receipts.recv() => {
                participant.on_receipt(handle, outcome).await?;
                if ends_session(handle.kind) {
                    log_view(&participant.view());
                    if outcome == TxOutcome::Confirmed {
                        info!("claim confirmed, shutting down");
                    } else {
                        warn!("claim {:?}, shutting down", outcome);
                    }
                    return Ok(());
                }
            }
        }
    }
}
