use clap::Parser;

#[tokio::main]
async fn main() {
    let args = auctioneer::arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, args.log_stderr_threshold);
    tracing::info!("running auctioneer with validated arguments:\n{}", args);
    auctioneer::run(args, None).await;
}
