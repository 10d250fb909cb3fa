use envstat_server::api::{DataResponse, HistoryResponse, StatsResponse};

pub fn run(samples: usize, args: &super::SourceArgs) -> Result<(), String> {
    let service = super::build_service(args)?;

    let samples = samples.max(1);
    let mut failures = 0usize;
    for _ in 0..samples {
        if service.record_sample().is_err() {
            failures += 1;
        }
        service.record_power();
    }

    let data = match service.current_data() {
        Ok(snapshot) => serde_json::to_value(DataResponse::from(&snapshot)),
        Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
    }
    .map_err(|e| e.to_string())?;

    let report = serde_json::json!({
        "sensor": service.sensor_name(),
        "samples": samples,
        "failures": failures,
        "data": data,
        "stats": StatsResponse::from(&service.current_stats()),
        "history": HistoryResponse::from(service.current_history()),
    });
    let rendered = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}
