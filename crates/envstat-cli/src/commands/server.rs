use std::sync::Arc;

use envstat_core::LogRelay;

pub fn run(
    host: &str,
    port: u16,
    args: &super::SourceArgs,
    relay: Arc<LogRelay>,
) -> Result<(), String> {
    let service = Arc::new(super::build_service(args)?);
    let config = service.config();
    let network = service.health().network();
    let base = format!("http://{host}:{port}");

    println!("🌡  envstat v{}", envstat_core::VERSION);
    println!("   {base}");
    println!(
        "   sensor: {} | sampling every {} ms | history {} samples",
        service.sensor_name(),
        config.sample_interval.as_millis(),
        config.history_capacity
    );
    println!("   network: {} ({})", network.ssid, network.ip_address);
    println!();
    println!("   Endpoints:");
    println!("     GET /          Dashboard");
    println!("     GET /data      Current reading, min/max/avg, dew point, heat index");
    println!("     GET /stats     Uptime, memory, CPU, network, battery");
    println!("     GET /history   Last {} samples for the chart", config.history_capacity);
    println!("     GET /battery   Battery detail");
    println!("     GET /reset     Reset min/max");
    println!("     GET /ws        Live log stream (WebSocket)");
    println!();

    if service.record_sample().is_err() {
        log::warn!("no valid reading yet; /data returns 503 until one arrives");
    }
    service.record_power();

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    rt.block_on(async {
        let sampler = envstat_server::spawn_sampler(Arc::clone(&service));
        let served = envstat_server::run_server(Arc::clone(&service), relay, host, port).await;
        sampler.abort();
        served
    })
    .map_err(|e| format!("server on {host}:{port} failed: {e}"))
}
