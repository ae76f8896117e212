use launchpad_controller::state::Address;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Rehearse a fair auction participation against a simulated chain")]
pub struct LaunchpadBotOpt {
    #[structopt(long, short = "-c", help("Launchpad config file (JSON)"))]
    pub config: Option<PathBuf>,
    #[structopt(long, default_value = "7700", help("Chain id the wallet connects to"))]
    pub chain_id: u64,
    #[structopt(long, default_value = "100", help("Amount of sale tokens to deposit"))]
    pub amount: String,
    #[structopt(
        long,
        default_value = "10000",
        help("Sale token balance minted to the test wallet")
    )]
    pub balance: String,
    #[structopt(long, help("Referral address passed along with the deposit"))]
    pub referral: Option<Address>,
    #[structopt(
        long,
        short = "-a",
        help("Invoke the enabled action on every tick")
    )]
    pub auto: bool,
    #[structopt(
        long,
        default_value = "120",
        help("Seconds until the simulated auction starts")
    )]
    pub start_delay: i64,
    #[structopt(
        long,
        default_value = "3600",
        help("Length of the simulated auction (in seconds)")
    )]
    pub auction_length: i64,
    #[structopt(
        long,
        default_value = "60",
        help("Simulated seconds elapsing on every tick")
    )]
    pub seconds_per_tick: i64,
}
