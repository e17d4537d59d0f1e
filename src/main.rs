#[tokio::main]
async fn main() -> std::io::Result<()> {
    arena_host::frameworks::server::run_with_config().await
}
