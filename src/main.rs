#[tokio::main]
async fn main() {
    if let Err(e) = resqnet::start_server().await {
        eprintln!("resqnet failed: {e}");
        std::process::exit(1);
    }
}
