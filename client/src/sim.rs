//! In-memory fair auction used for rehearsals and tests.
//!
//! Writes are queued in a mempool and executed by [`SimulatedChain::mine`]
//! (or immediately when auto-mining is on). Execution follows the auction
//! contract rules: buys only inside the window and up to the max raise,
//! claims only after the end and at most once.
use crate::capabilities::{ChainReader, ChainWriter, Clock, Notification, Notifier, ReceiptWatcher};
use crate::config::Deployment;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use launchpad_controller::phase::estimate_allocation;
use launchpad_controller::sequencer::TxOutcome;
use launchpad_controller::state::{
    Address, Amount, AuctionWindow, PriceCurve, TokenMetadata, TxHash, UnixTimestamp, UserInfo,
};
use log::debug;
use tokio::sync::Notify;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Parameters of a simulated deployment.
#[derive(Clone, Debug)]
pub struct SimParams {
    pub deployment: Deployment,
    pub sale_token: TokenMetadata,
    pub project_token: TokenMetadata,
    pub window: AuctionWindow,
    pub curve: PriceCurve,
    /// Chain time at creation.
    pub now: UnixTimestamp,
}

#[derive(Clone, Copy, Debug)]
enum Call {
    Approve {
        token: Address,
        spender: Address,
        amount: Amount,
    },
    Buy {
        amount: Amount,
        referral: Address,
    },
    Claim,
}

struct QueuedTx {
    hash: TxHash,
    sender: Address,
    call: Call,
}

struct SimState {
    params: SimParams,
    signer: Address,
    now: UnixTimestamp,
    balances: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    contributions: HashMap<Address, Amount>,
    referrals: HashMap<Address, Amount>,
    claimed: HashSet<Address>,
    total_raised: Amount,
    mempool: Vec<QueuedTx>,
    receipts: HashMap<TxHash, TxOutcome>,
    nonce: u64,
    auto_mine: bool,
    reject_next: bool,
    fail_reads: bool,
}

impl SimState {
    fn balance(&self, token: Address, owner: Address) -> Amount {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }

    fn credit(&mut self, token: Address, owner: Address, amount: Amount) -> Option<()> {
        let balance = self.balances.entry((token, owner)).or_insert(0);
        *balance = balance.checked_add(amount)?;
        Some(())
    }

    fn debit(&mut self, token: Address, owner: Address, amount: Amount) -> Option<()> {
        let balance = self.balances.get_mut(&(token, owner))?;
        *balance = balance.checked_sub(amount)?;
        Some(())
    }

    fn contribution(&self, user: Address) -> Amount {
        self.contributions.get(&user).copied().unwrap_or(0)
    }

    fn expected_claim(&self, user: Address) -> Amount {
        if self.claimed.contains(&user) {
            return 0;
        }
        estimate_allocation(self.contribution(user), self.total_raised, &self.params.curve)
            .unwrap_or(0)
    }

    fn queue(&mut self, call: Call) -> TxHash {
        self.nonce += 1;
        let mut hash = [0_u8; 32];
        hash[0] = 0xfa;
        hash[24..].copy_from_slice(&self.nonce.to_be_bytes());
        let hash = TxHash(hash);
        self.mempool.push(QueuedTx {
            hash,
            sender: self.signer,
            call,
        });
        hash
    }

    /// Executes a call atomically; a reverted call leaves no trace.
    fn execute(&mut self, sender: Address, call: Call) -> TxOutcome {
        let deployment = self.params.deployment.clone();
        match call {
            Call::Approve {
                token,
                spender,
                amount,
            } => {
                if token != deployment.sale_token {
                    return TxOutcome::Reverted;
                }
                self.allowances.insert((sender, spender), amount);
                TxOutcome::Confirmed
            }
            Call::Buy { amount, referral } => {
                let window = self.params.window;
                let allowance = self
                    .allowances
                    .get(&(sender, deployment.fair_auction))
                    .copied()
                    .unwrap_or(0);
                let raised = match self.total_raised.checked_add(amount) {
                    Some(raised) => raised,
                    None => return TxOutcome::Reverted,
                };
                if self.now < window.start_time()
                    || self.now >= window.end_time()
                    || amount == 0
                    || allowance < amount
                    || self.balance(deployment.sale_token, sender) < amount
                    || raised > self.params.curve.max_raise
                {
                    return TxOutcome::Reverted;
                }
                let moved = self
                    .debit(deployment.sale_token, sender, amount)
                    .and_then(|_| self.credit(deployment.sale_token, deployment.fair_auction, amount));
                if moved.is_none() {
                    return TxOutcome::Reverted;
                }
                self.allowances
                    .insert((sender, deployment.fair_auction), allowance - amount);
                *self.contributions.entry(sender).or_insert(0) += amount;
                if !referral.is_zero() && referral != sender {
                    *self.referrals.entry(referral).or_insert(0) += amount;
                }
                self.total_raised = raised;
                TxOutcome::Confirmed
            }
            Call::Claim => {
                let amount = self.expected_claim(sender);
                if self.now < self.params.window.end_time()
                    || self.claimed.contains(&sender)
                    || amount == 0
                {
                    return TxOutcome::Reverted;
                }
                if self
                    .credit(deployment.project_token, sender, amount)
                    .is_none()
                {
                    return TxOutcome::Reverted;
                }
                self.claimed.insert(sender);
                TxOutcome::Confirmed
            }
        }
    }

    fn mine(&mut self) -> usize {
        let queued = std::mem::take(&mut self.mempool);
        for tx in queued.iter() {
            let outcome = self.execute(tx.sender, tx.call);
            debug!("mined {}    {:?}    {:?}", tx.hash, tx.call, outcome);
            self.receipts.insert(tx.hash, outcome);
        }
        queued.len()
    }
}

/// A fair auction deployment living in memory. Implements every chain
/// capability and doubles as the session clock.
pub struct SimulatedChain {
    state: Mutex<SimState>,
    mined: Notify,
}

impl SimulatedChain {
    /// Creates the chain with `signer` as the wallet sending every write.
    pub fn new(params: SimParams, signer: Address) -> Self {
        let now = params.now;
        Self {
            state: Mutex::new(SimState {
                params,
                signer,
                now,
                balances: HashMap::new(),
                allowances: HashMap::new(),
                contributions: HashMap::new(),
                referrals: HashMap::new(),
                claimed: HashSet::new(),
                total_raised: 0,
                mempool: Vec::new(),
                receipts: HashMap::new(),
                nonce: 0,
                auto_mine: false,
                reject_next: false,
                fail_reads: false,
            }),
            mined: Notify::new(),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SimState>, anyhow::Error> {
        self.state
            .lock()
            .map_err(|_| anyhow!("simulated chain state poisoned"))
    }

    fn readable(&self) -> Result<MutexGuard<'_, SimState>, anyhow::Error> {
        let state = self.state()?;
        if state.fail_reads {
            bail!("rpc unavailable");
        }
        Ok(state)
    }

    pub fn deployment(&self) -> Result<Deployment, anyhow::Error> {
        Ok(self.state()?.params.deployment.clone())
    }

    /// Mints sale tokens to `owner`.
    pub fn mint(&self, owner: Address, amount: Amount) -> Result<(), anyhow::Error> {
        let mut state = self.state()?;
        let token = state.params.deployment.sale_token;
        state
            .credit(token, owner, amount)
            .ok_or_else(|| anyhow!("balance overflow"))
    }

    /// Records a contribution of another participant.
    pub fn contribute(&self, participant: Address, amount: Amount) -> Result<(), anyhow::Error> {
        let mut state = self.state()?;
        let raised = state
            .total_raised
            .checked_add(amount)
            .filter(|raised| *raised <= state.params.curve.max_raise)
            .ok_or_else(|| anyhow!("contribution exceeds max raise"))?;
        state.total_raised = raised;
        *state.contributions.entry(participant).or_insert(0) += amount;
        Ok(())
    }

    pub fn set_time(&self, now: UnixTimestamp) -> Result<(), anyhow::Error> {
        self.state()?.now = now;
        Ok(())
    }

    pub fn advance(&self, seconds: i64) -> Result<(), anyhow::Error> {
        let mut state = self.state()?;
        state.now = state.now.saturating_add(seconds);
        Ok(())
    }

    /// Executes queued writes on submission instead of on [`mine`](Self::mine).
    pub fn set_auto_mine(&self, auto_mine: bool) -> Result<(), anyhow::Error> {
        self.state()?.auto_mine = auto_mine;
        Ok(())
    }

    /// Makes the wallet refuse the next signature request.
    pub fn reject_next_signature(&self) -> Result<(), anyhow::Error> {
        self.state()?.reject_next = true;
        Ok(())
    }

    pub fn set_fail_reads(&self, fail: bool) -> Result<(), anyhow::Error> {
        self.state()?.fail_reads = fail;
        Ok(())
    }

    /// Executes every queued write in submission order and wakes receipt
    /// watchers. Returns the number of executed writes.
    pub fn mine(&self) -> Result<usize, anyhow::Error> {
        let mined = self.state()?.mine();
        self.mined.notify_waiters();
        Ok(mined)
    }

    pub fn pending_count(&self) -> Result<usize, anyhow::Error> {
        Ok(self.state()?.mempool.len())
    }

    pub fn project_balance(&self, owner: Address) -> Result<Amount, anyhow::Error> {
        let state = self.state()?;
        Ok(state.balance(state.params.deployment.project_token, owner))
    }

    pub fn referred(&self, referral: Address) -> Result<Amount, anyhow::Error> {
        Ok(self.state()?.referrals.get(&referral).copied().unwrap_or(0))
    }

    fn send(&self, call: Call) -> Result<TxHash, anyhow::Error> {
        let hash = {
            let mut state = self.state()?;
            if state.reject_next {
                state.reject_next = false;
                bail!("user rejected the request");
            }
            let hash = state.queue(call);
            if !state.auto_mine {
                return Ok(hash);
            }
            state.mine();
            hash
        };
        self.mined.notify_waiters();
        Ok(hash)
    }
}

#[async_trait]
impl ChainReader for SimulatedChain {
    async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount, anyhow::Error> {
        let state = self.readable()?;
        Ok(state.allowances.get(&(owner, spender)).copied().unwrap_or(0))
    }

    async fn total_raised(&self) -> Result<Amount, anyhow::Error> {
        Ok(self.readable()?.total_raised)
    }

    async fn user_info(&self, user: Address) -> Result<UserInfo, anyhow::Error> {
        let state = self.readable()?;
        Ok(UserInfo {
            contribution: state.contribution(user),
            has_claimed: state.claimed.contains(&user),
        })
    }

    async fn expected_claim_amount(&self, user: Address) -> Result<Amount, anyhow::Error> {
        Ok(self.readable()?.expected_claim(user))
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, anyhow::Error> {
        let state = self.readable()?;
        let params = &state.params;
        if token == params.deployment.sale_token {
            Ok(params.sale_token.clone())
        } else if token == params.deployment.project_token {
            Ok(params.project_token.clone())
        } else {
            Err(anyhow!("unknown token {}", token))
        }
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<Amount, anyhow::Error> {
        Ok(self.readable()?.balance(token, owner))
    }

    async fn auction_window(&self) -> Result<AuctionWindow, anyhow::Error> {
        Ok(self.readable()?.params.window)
    }

    async fn price_curve(&self) -> Result<PriceCurve, anyhow::Error> {
        Ok(self.readable()?.params.curve)
    }
}

#[async_trait]
impl ChainWriter for SimulatedChain {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<TxHash, anyhow::Error> {
        self.send(Call::Approve {
            token,
            spender,
            amount,
        })
    }

    async fn buy(&self, amount: Amount, referral: Address) -> Result<TxHash, anyhow::Error> {
        self.send(Call::Buy { amount, referral })
    }

    async fn claim(&self) -> Result<TxHash, anyhow::Error> {
        self.send(Call::Claim)
    }
}

#[async_trait]
impl ReceiptWatcher for SimulatedChain {
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxOutcome, anyhow::Error> {
        loop {
            let mined = self.mined.notified();
            {
                let state = self.state()?;
                if let Some(outcome) = state.receipts.get(&hash) {
                    return Ok(*outcome);
                }
                if !state.mempool.iter().any(|tx| tx.hash == hash) {
                    bail!("unknown transaction {}", hash);
                }
            }
            mined.await;
        }
    }
}

impl Clock for SimulatedChain {
    fn now(&self) -> UnixTimestamp {
        self.state.lock().map(|state| state.now).unwrap_or_default()
    }
}

/// Notifier keeping every notification in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification.clone());
        }
    }
}
