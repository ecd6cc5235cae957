use anyhow::Result;
use cairn_adapter::AdapterRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Embedding applications register their protocol adapters here before
    // handing the registry over; the bare binary starts with none.
    let registry = AdapterRegistry::new();
    cairn_cli::run_command(registry, None).await
}
