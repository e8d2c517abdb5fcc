//! Policyflow server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    policyflow::server::run().await
}
