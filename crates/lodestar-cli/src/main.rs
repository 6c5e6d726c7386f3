use std::process;

#[tokio::main]
async fn main() {
    let code = lodestar_cli::run().await;
    process::exit(code);
}
