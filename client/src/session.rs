use crate::capabilities::{ChainReader, ChainWriter, Clock, Notification, Notifier, ReceiptWatcher};
use crate::config::{Deployment, LaunchpadConfig};

use launchpad_controller::action::{self, ControllerInputs};
use launchpad_controller::amount::InputAmount;
use launchpad_controller::reads::{ChainSnapshot, ReadKey, ReadValue};
use launchpad_controller::sequencer::{TransactionSequencer, TxHandle, TxOutcome};
use launchpad_controller::state::{Address, TxRequest};
use launchpad_controller::view::{derive, LaunchpadView};
use launchpad_controller::ControllerError;

use log::{debug, info, warn};

use std::sync::Arc;

const SUCCESS_TITLE: &str = "Success!";

/// A write request together with the snapshot revision it was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
    pub request: TxRequest,
    pub revision: u64,
}

/// Participation session of a single wallet in the fair auction.
///
/// All state changes go through `&mut self`, so reads, submissions and
/// receipts are applied one at a time by whoever drives the session.
pub struct Participant {
    reader: Arc<dyn ChainReader>,
    writer: Arc<dyn ChainWriter>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: LaunchpadConfig,
    deployment: Option<Deployment>,
    snapshot: ChainSnapshot,
    input: InputAmount,
    sequencer: TransactionSequencer,
}

impl Participant {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: LaunchpadConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            notifier,
            clock,
            config,
            deployment: None,
            snapshot: ChainSnapshot::new(),
            input: InputAmount::default(),
            sequencer: TransactionSequencer::new(),
        }
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &ChainSnapshot {
        &self.snapshot
    }

    pub fn sequencer(&self) -> &TransactionSequencer {
        &self.sequencer
    }

    pub fn input(&self) -> &InputAmount {
        &self.input
    }

    /// Binds the session to a wallet on the given chain. The network is
    /// supported if the config holds a deployment for it.
    pub fn connect(&mut self, wallet: Address, chain_id: u64) {
        self.deployment = self.config.deployment(chain_id).cloned();
        let supported = self.deployment.is_some();
        self.snapshot.connect(wallet, supported);
        if supported {
            info!("connected {} on chain {}", wallet, chain_id);
        } else {
            warn!("chain {} has no fair auction deployment", chain_id);
        }
    }

    pub fn disconnect(&mut self) {
        self.deployment = None;
        self.snapshot.disconnect();
        info!("wallet disconnected");
    }

    pub fn set_input(&mut self, raw: impl Into<String>) {
        self.input.set(raw);
    }

    /// Fills the input with the full sale token balance. Returns `false` if
    /// the balance is not known yet.
    pub fn use_balance(&mut self) -> bool {
        match (self.snapshot.sale_balance(), self.snapshot.sale_decimals()) {
            (Some(balance), Some(decimals)) => {
                self.input.use_balance(balance, decimals);
                true
            }
            _ => false,
        }
    }

    pub fn view(&self) -> LaunchpadView {
        derive(
            &self.snapshot,
            self.clock.now(),
            &self.input,
            &self.sequencer,
        )
    }

    /// Re-reads the given keys. Every key is marked in flight before the
    /// first request goes out; failed reads keep their previous value.
    pub async fn refresh(&mut self, keys: &[ReadKey]) {
        let deployment = match (&self.deployment, self.snapshot.network_supported()) {
            (Some(deployment), true) => deployment.clone(),
            _ => return,
        };
        let wallet = self.snapshot.wallet();
        let ids = keys
            .iter()
            .filter(|key| wallet.is_some() || !key.is_wallet_bound())
            .map(|key| self.snapshot.begin(*key))
            .collect::<Vec<_>>();

        for id in ids {
            match self.fetch(id.key, &deployment, wallet).await {
                Ok(value) => {
                    if !self.snapshot.complete(id, value) {
                        debug!("{:?} read superseded", id.key);
                    }
                }
                Err(err) => {
                    warn!("{:?} read failed: {}", id.key, err);
                    self.snapshot.fail(id);
                }
            }
        }
    }

    pub async fn refresh_all(&mut self) {
        self.refresh(&ReadKey::ALL).await
    }

    /// Re-reads the values watched on every tick.
    pub async fn poll(&mut self) {
        self.refresh(&ReadKey::WATCHED).await
    }

    async fn fetch(
        &self,
        key: ReadKey,
        deployment: &Deployment,
        wallet: Option<Address>,
    ) -> Result<ReadValue, anyhow::Error> {
        let reader = &self.reader;
        let user = || wallet.ok_or(ControllerError::UnresolvedInput);
        let value = match key {
            ReadKey::SaleToken => {
                ReadValue::SaleToken(reader.token_metadata(deployment.sale_token).await?)
            }
            ReadKey::ProjectToken => {
                ReadValue::ProjectToken(reader.token_metadata(deployment.project_token).await?)
            }
            ReadKey::SaleBalance => {
                ReadValue::SaleBalance(reader.balance_of(deployment.sale_token, user()?).await?)
            }
            ReadKey::Allowance => ReadValue::Allowance(
                reader
                    .allowance(user()?, deployment.fair_auction)
                    .await?,
            ),
            ReadKey::TotalRaised => ReadValue::TotalRaised(reader.total_raised().await?),
            ReadKey::UserInfo => ReadValue::UserInfo(reader.user_info(user()?).await?),
            ReadKey::ExpectedClaimAmount => {
                ReadValue::ExpectedClaimAmount(reader.expected_claim_amount(user()?).await?)
            }
            ReadKey::AuctionWindow => ReadValue::AuctionWindow(reader.auction_window().await?),
            ReadKey::PriceCurve => ReadValue::PriceCurve(reader.price_curve().await?),
        };
        Ok(value)
    }

    /// Builds the request of the currently enabled action.
    pub fn prepare(&self) -> Result<PreparedRequest, anyhow::Error> {
        let deployment = self
            .deployment
            .as_ref()
            .ok_or(ControllerError::ActionNotEnabled)?;
        let inputs =
            ControllerInputs::capture(&self.snapshot, self.clock.now(), &self.input, &self.sequencer);
        let request = action::prepare(
            &action::select(&inputs),
            inputs.spend_amount,
            deployment.fair_auction,
            self.config.referral(),
        )?;
        Ok(PreparedRequest {
            request,
            revision: self.snapshot.revision(),
        })
    }

    /// Hands a prepared request to the wallet. The slot of its kind stays
    /// occupied until [`on_receipt`](Self::on_receipt) finishes.
    ///
    /// The request must still be the one the current snapshot, input and
    /// clock select; otherwise it is refused as stale.
    pub async fn submit(&mut self, prepared: PreparedRequest) -> Result<TxHandle, anyhow::Error> {
        if prepared.revision != self.snapshot.revision() {
            return Err(ControllerError::StaleRequest.into());
        }
        let kind = prepared.request.kind();
        if self.sequencer.is_pending(kind) {
            return Err(ControllerError::TransactionPending(kind).into());
        }
        match self.prepare() {
            Ok(current) if current.request == prepared.request => {}
            _ => {
                debug!("{} request no longer matches the current state", kind);
                return Err(ControllerError::StaleRequest.into());
            }
        }
        let deployment = self
            .deployment
            .clone()
            .ok_or(ControllerError::ActionNotEnabled)?;
        let ticket = self.sequencer.begin(kind)?;

        let writer = Arc::clone(&self.writer);
        let signed = match prepared.request {
            TxRequest::Approve { spender, amount } => {
                writer.approve(deployment.sale_token, spender, amount).await
            }
            TxRequest::Buy { amount, referral } => writer.buy(amount, referral).await,
            TxRequest::Claim => writer.claim().await,
        };

        match signed {
            Ok(hash) => {
                let handle = self.sequencer.submitted(ticket, hash)?;
                info!("{} submitted    hash: {}", kind, hash);
                Ok(handle)
            }
            Err(err) => {
                self.sequencer.abort(ticket);
                warn!("{} rejected: {}", kind, err);
                Err(ControllerError::TransactionRejected.into())
            }
        }
    }

    /// Prepares and submits the enabled action.
    pub async fn invoke(&mut self) -> Result<TxHandle, anyhow::Error> {
        let prepared = self.prepare()?;
        self.submit(prepared).await
    }

    /// Applies a receipt: refreshes the dependent reads, then notifies on
    /// success and releases the slot.
    pub async fn on_receipt(
        &mut self,
        handle: TxHandle,
        outcome: TxOutcome,
    ) -> Result<(), anyhow::Error> {
        let keys = self.sequencer.resolve(&handle, outcome)?;
        match outcome {
            TxOutcome::Confirmed => info!("{} confirmed    hash: {}", handle.kind, handle.hash),
            TxOutcome::Reverted => warn!("{} reverted    hash: {}", handle.kind, handle.hash),
            TxOutcome::Dropped => warn!("{} dropped    hash: {}", handle.kind, handle.hash),
        }
        self.refresh(keys).await;
        if outcome == TxOutcome::Confirmed {
            self.notifier.notify(&Notification {
                title: SUCCESS_TITLE.to_owned(),
                message: handle.kind.success_message().to_owned(),
                link: self.config.tx_link(&handle.hash),
            });
        }
        self.sequencer.finish(&handle)?;
        Ok(())
    }

    /// Waits for the receipt of `handle` and applies it. A failed wait is
    /// treated as a dropped transaction.
    pub async fn settle(
        &mut self,
        handle: TxHandle,
        watcher: &dyn ReceiptWatcher,
    ) -> Result<TxOutcome, anyhow::Error> {
        let outcome = watcher
            .wait_for_receipt(handle.hash)
            .await
            .unwrap_or_else(|err| {
                warn!("receipt of {} unavailable: {}", handle.hash, err);
                TxOutcome::Dropped
            });
        self.on_receipt(handle, outcome).await?;
        Ok(outcome)
    }
}
