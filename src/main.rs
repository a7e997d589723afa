#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    quickrec::app::run().await
}
