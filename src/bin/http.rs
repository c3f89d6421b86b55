#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use office_holidays::{EngineConfig, http_api, telemetry};

    telemetry::init_tracing();

    let config = EngineConfig::from_env()?;
    let engine = config.build_engine()?;

    tracing::info!(addr = %config.http_addr, "office-holidays HTTP API listening");
    http_api::serve(config.http_addr, engine).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
