//! Backend health, current conditions and forecast.

use crate::config::Config;
use log::info;
use wra_core::service::HealthService;

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1} {unit}"),
        None => "n/a".to_string(),
    }
}

pub async fn run_health(config: &Config) -> anyhow::Result<()> {
    let client = config.api_client()?;
    info!("Checking backend health at {}", client.base_url());
    let status = client.health().await?;
    let service = status.service.as_deref().unwrap_or("weather backend");
    if !status.is_ok() {
        anyhow::bail!("{service} reports status {:?}", status.status);
    }
    println!("{service}: {}", status.status);
    Ok(())
}

pub async fn run_current(config: &Config, lat: f64, lon: f64) -> anyhow::Result<()> {
    let conditions = config.api_client()?.current(lat, lon).await?;
    println!("Current conditions at {lat:.4}, {lon:.4}");
    if let Some(date) = &conditions.data_date {
        println!("  As of:       {date}");
    }
    println!("  Temperature: {}", reading(conditions.temperature_c, "°C"));
    println!("  Humidity:    {}", reading(conditions.humidity_pct, "%"));
    println!("  Wind speed:  {}", reading(conditions.wind_speed_ms, "m/s"));
    println!("  Pressure:    {}", reading(conditions.pressure_hpa, "hPa"));
    if let Some(description) = &conditions.description {
        println!("  Conditions:  {description}");
    }
    if let Some(source) = &conditions.data_source {
        println!("  Source:      {source}");
    }
    Ok(())
}

pub async fn run_forecast(config: &Config, lat: f64, lon: f64, days: u32) -> anyhow::Result<()> {
    let forecast = config.api_client()?.forecast(lat, lon, days).await?;
    info!("{} forecast days for {lat:.4}, {lon:.4}", forecast.len());
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record([
        "date",
        "temperature_c",
        "humidity_pct",
        "wind_speed_ms",
        "pressure_hpa",
        "description",
    ])?;
    let cell = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
    for day in forecast {
        wtr.write_record([
            day.date,
            cell(day.temperature_c),
            cell(day.humidity_pct),
            cell(day.wind_speed_ms),
            cell(day.pressure_hpa),
            day.description.unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::reading;

    #[test]
    fn test_reading() {
        assert_eq!(reading(Some(31.46), "°C"), "31.5 °C");
        assert_eq!(reading(None, "%"), "n/a");
    }
}
