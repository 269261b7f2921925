//! Command line and environment configuration of the auctioneer.

use {
    std::{
        fmt::{self, Display, Formatter},
        net::SocketAddr,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
};

#[derive(clap::Parser)]
pub struct Arguments {
    #[clap(long, env, default_value = "warn,auctioneer=debug,ledger=debug")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Address the REST and websocket API binds to.
    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,

    /// Address the metrics and liveness endpoints bind to.
    #[clap(long, env, default_value = "0.0.0.0:9586")]
    pub metrics_address: SocketAddr,

    /// How many auction rooms the service runs. Room ids are 0 up to this
    /// value, exclusive.
    #[clap(long, env, default_value = "10")]
    pub rooms: u16,

    /// How long an auction outcome stays on screen before the next queued
    /// item goes up.
    #[clap(long, env, default_value = "5s", value_parser = humantime::parse_duration)]
    pub grace_period: Duration,

    /// Bids landing with less than this left on the clock reset the
    /// countdown to exactly this window.
    #[clap(long, env, default_value = "10s", value_parser = humantime::parse_duration)]
    pub snipe_window: Duration,

    /// Coins a player account holds the first time it shows up on the
    /// ledger.
    #[clap(long, env, default_value = "1000")]
    pub starting_balance: u64,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            bind_address,
            metrics_address,
            rooms,
            grace_period,
            snipe_window,
            starting_balance,
        } = self;
        writeln!(f, "log_filter: {}", log_filter)?;
        writeln!(f, "log_stderr_threshold: {}", log_stderr_threshold)?;
        writeln!(f, "bind_address: {}", bind_address)?;
        writeln!(f, "metrics_address: {}", metrics_address)?;
        writeln!(f, "rooms: {}", rooms)?;
        writeln!(f, "grace_period: {:?}", grace_period)?;
        writeln!(f, "snipe_window: {:?}", snipe_window)?;
        writeln!(f, "starting_balance: {}", starting_balance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn defaults_are_a_workable_configuration() {
        let args = Arguments::parse_from(["auctioneer"]);
        assert_eq!(args.rooms, 10);
        assert_eq!(args.grace_period, Duration::from_secs(5));
        assert_eq!(args.snipe_window, Duration::from_secs(10));
        assert_eq!(args.starting_balance, 1000);
    }
}
