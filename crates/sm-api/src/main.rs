#[tokio::main]
async fn main() {
    if let Err(err) = sm_api::run().await {
        tracing::error!(error = %err, "sm-api exited with error");
        eprintln!("sm-api: {err}");
        std::process::exit(1);
    }
}
