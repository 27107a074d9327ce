use throughput_common::HarnessConfig;
use throughput_logger::{log, LogSeverity::{Fatal, Info}};
use throughput_server::server;

#[tokio::main]
async fn main() {
    throughput_logger::init();
    log("Throughput harness init".to_owned(), Info);

    let config = match HarnessConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log(format!("{}", err), Fatal);
            std::process::exit(1);
        }
    };

    if let Err(err) = server::run(config).await {
        log(format!("Server failed: {}", err), Fatal);
        std::process::exit(1);
    }
}
