#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use staffing_planner::{PlanningConfig, http_api};

    env_logger::init();

    let addr: SocketAddr = std::env::var("STAFFING_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let defaults = match std::env::var("STAFFING_PLANNER_CONFIG") {
        Ok(path) => PlanningConfig::load_json(path)?,
        Err(_) => PlanningConfig::default(),
    };

    println!("staffing-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, defaults).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
