//! `financi health`: a single probe of the service's health endpoint.

use std::error::Error;
use std::time::Duration;

use crate::api::client::ServiceEndpoint;
use crate::api::HttpQueryClient;

pub async fn run_health(
    endpoint: ServiceEndpoint,
    timeout: Duration,
) -> Result<(), Box<dyn Error>> {
    let client = HttpQueryClient::new(endpoint, timeout)?;
    let url = client.endpoint().health_url();

    match client.health().await {
        Ok(health) => {
            let status = health.status.unwrap_or_else(|| "unknown".to_string());
            println!("✅ {url}: {status}");
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ {url} is not healthy");
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
