//! `analyze`: drive the wizard end to end and report the result.

use crate::config::Config;
use crate::AnalyzeArgs;
use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use log::info;
use std::io;
use std::sync::Arc;
use wra_core::analysis::AnalysisResult;
use wra_core::date_range::{quick_ranges, DateRange, DateRangeSelector};
use wra_core::location::Location;
use wra_core::threshold::{
    find_parameter, parameter_catalog, Operator, ThresholdField, WeatherThreshold,
};
use wra_core::units::Unit;
use wra_data::presenter::{present, ChartRow, Presentation};
use wra_utils::dates::parse_date;
use wra_utils::numbers::round_to;
use wra_workflow::{AnalysisWorkflow, LocationResolver};

pub async fn run_analyze(config: &Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    let today = Local::now().naive_local().date();

    let location = resolve_location(config, &args).await?;
    let date_range = resolve_date_range(&args, today, config.max_range_days)?;
    let threshold = resolve_threshold(&args)?;

    let workflow = AnalysisWorkflow::new(today)
        .with_max_days(config.max_range_days)
        .with_location(location)
        .advance()
        .with_date_range(date_range)
        .advance()
        .with_threshold(threshold)
        .advance();
    if let Some(error) = workflow.error() {
        bail!("{error}");
    }

    let client = config.api_client()?;
    let workflow = workflow.run_analysis(&client).await;
    if let Some(error) = workflow.error() {
        bail!("{error}");
    }
    let Some(result) = workflow.result() else {
        bail!("analysis finished without a result");
    };

    let view = present(result, workflow.threshold());
    print_report(workflow.location(), result, &view);

    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_daily_csv(file, &view.rows)?;
        info!("Wrote {} days to {}", view.rows.len(), path.display());
    }
    Ok(())
}

async fn resolve_location(config: &Config, args: &AnalyzeArgs) -> anyhow::Result<Location> {
    match (&args.place, args.lat, args.lon) {
        (Some(place), _, _) => {
            let geocoder = Arc::new(config.geocoder()?);
            let mut resolver = LocationResolver::new(geocoder, config.search_debounce);
            resolver.on_input(place).await;
            resolver.settle().await;
            let snapshot = resolver.snapshot().await;
            if let Some(error) = snapshot.error() {
                bail!("Search for {place:?} failed: {error}");
            }
            let first = snapshot
                .results()
                .first()
                .ok_or_else(|| anyhow!("No places found for {place:?}"))?;
            info!("Using {} ({:.4}, {:.4})", first.display_name, first.lat, first.lon);
            Ok(resolver.select_result(first)?)
        }
        (None, Some(lat), Some(lon)) => match &args.name {
            Some(name) => Ok(Location::new(lat, lon, name.clone())?),
            None => {
                let geocoder = Arc::new(config.geocoder()?);
                let resolver = LocationResolver::new(geocoder, config.search_debounce);
                Ok(resolver.select_map_point(lat, lon).await?)
            }
        },
        _ => Ok(Location::default()),
    }
}

fn resolve_date_range(
    args: &AnalyzeArgs,
    today: NaiveDate,
    max_days: i64,
) -> anyhow::Result<DateRange> {
    let selector = DateRangeSelector::new(today).with_max_days(max_days);
    let selector = match (&args.start, &args.end, args.next_days) {
        (Some(start), Some(end), _) => selector.select_range(parse_date(start)?, parse_date(end)?)?,
        (_, _, Some(days)) => {
            let label = format!("Next {days} days");
            let quick = quick_ranges(today)
                .into_iter()
                .find(|quick| quick.label == label)
                .ok_or_else(|| anyhow!("--next-days must be 7, 14 or 30, got {days}"))?;
            selector.select_quick_range(&quick)?
        }
        _ => selector,
    };
    Ok(selector.range())
}

fn resolve_threshold(args: &AnalyzeArgs) -> anyhow::Result<WeatherThreshold> {
    let Some(spec) = find_parameter(&args.parameter) else {
        let known = parameter_catalog()
            .iter()
            .map(|spec| spec.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("unknown parameter {:?} (expected one of {known})", args.parameter);
    };
    let mut threshold = WeatherThreshold::default().select_parameter(spec.id.as_str());

    let number = args.preset.unwrap_or(1);
    let preset = number
        .checked_sub(1)
        .and_then(|i| spec.presets.get(i))
        .ok_or_else(|| anyhow!("{} has presets 1 to {}", spec.label, spec.presets.len()))?;
    threshold = threshold.select_preset(preset);

    if let Some(unit) = &args.unit {
        let unit: Unit = unit.parse()?;
        if !spec.unit_options.contains(&unit) {
            bail!("{} cannot be expressed in {unit}", spec.label);
        }
        threshold = threshold.set_custom_field(ThresholdField::Unit(unit));
    }
    if let Some(operator) = &args.operator {
        let operator: Operator = operator.parse()?;
        threshold = threshold.set_custom_field(ThresholdField::Operator(operator));
    }
    if let Some(value) = args.value {
        threshold = threshold.set_custom_field(ThresholdField::Value(value));
    }
    Ok(threshold)
}

fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

fn print_report(location: &Location, result: &AnalysisResult, view: &Presentation) {
    let range = &result.criteria.date_range;
    println!("Weather risk analysis {}", result.analysis_id);
    println!("  Location:    {}", location.display_name);
    println!("  Period:      {} to {}", range.start, range.end);
    println!("  Criteria:    {}", view.criteria_label);
    println!(
        "  Risk level:  {} ({} overall)",
        view.risk_level,
        percent(view.overall_probability)
    );
    if !view.summary.is_empty() {
        println!("  Summary:     {}", view.summary);
    }

    if let Some(stats) = &view.statistics {
        println!();
        println!("Statistics");
        println!("  Average daily probability: {}", percent(stats.average_probability));
        println!("  Peak daily probability:    {}", percent(stats.peak_probability));
        println!(
            "  High-risk days (>50%):     {} out of {}",
            stats.high_risk_day_count, stats.total_days
        );
    }

    let history = &result.historical_context;
    if history.total_days > 0 {
        println!();
        println!("Historical context ({})", view.value_unit);
        println!(
            "  Mean {} / std {} / min {} / max {}",
            round_to(history.mean, 2),
            round_to(history.stddev, 2),
            round_to(history.min, 2),
            round_to(history.max, 2)
        );
        println!(
            "  Exceeded on {} of {} days ({})",
            history.exceedance_days,
            history.total_days,
            percent(history.historical_exceedance_rate)
        );
    }

    println!();
    println!("Recommendations");
    for line in &view.recommendations {
        println!("  - {line}");
    }
}

/// `date,probability,predicted_value,risk_zone`
pub fn write_daily_csv<W: io::Write>(writer: W, rows: &[ChartRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "probability", "predicted_value", "risk_zone"])?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", row.probability),
            format!("{:.2}", row.predicted_value),
            row.risk_zone.as_str().to_lowercase(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wra_core::analysis::{DailyProbability, RiskLevel};
    use wra_core::date_range::RangePhase;
    use wra_data::presenter::chart_rows;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            place: None,
            lat: None,
            lon: None,
            name: None,
            start: None,
            end: None,
            next_days: None,
            parameter: "temperature".to_string(),
            preset: None,
            operator: None,
            value: None,
            unit: None,
            csv: None,
        }
    }

    #[test]
    fn test_default_threshold() {
        let threshold = resolve_threshold(&args()).unwrap();
        assert_eq!(threshold, WeatherThreshold::default());
    }

    #[test]
    fn test_preset_and_custom_threshold() {
        let wind = AnalyzeArgs {
            parameter: "windSpeed".to_string(),
            preset: Some(2),
            ..args()
        };
        let threshold = resolve_threshold(&wind).unwrap();
        assert_eq!(threshold.value, 39.0);
        assert_eq!(threshold.label, "Gale Force (>39 mph)");

        let celsius = AnalyzeArgs {
            unit: Some("°C".to_string()),
            operator: Some(">=".to_string()),
            value: Some(45.0),
            ..args()
        };
        let threshold = resolve_threshold(&celsius).unwrap();
        assert_eq!(threshold.unit, Unit::Celsius);
        assert_eq!(threshold.operator, Operator::GreaterOrEqual);
        assert_eq!(threshold.label, "Temperature >= 45°C");
    }

    #[test]
    fn test_bad_threshold_arguments() {
        let unknown = AnalyzeArgs {
            parameter: "visibility".to_string(),
            ..args()
        };
        assert!(resolve_threshold(&unknown).is_err());
        let no_preset = AnalyzeArgs {
            preset: Some(0),
            ..args()
        };
        assert!(resolve_threshold(&no_preset).is_err());
        let wrong_unit = AnalyzeArgs {
            unit: Some("mph".to_string()),
            ..args()
        };
        assert!(resolve_threshold(&wrong_unit).is_err());
    }

    #[test]
    fn test_date_range_arguments() {
        let today = ymd(2025, 5, 20);
        let default = resolve_date_range(&args(), today, 30).unwrap();
        assert_eq!(default, DateRange::complete(ymd(2025, 5, 21), ymd(2025, 6, 4)));

        let explicit = AnalyzeArgs {
            start: Some("2025-06-01".to_string()),
            end: Some("2025-06-14".to_string()),
            ..args()
        };
        let range = resolve_date_range(&explicit, today, 30).unwrap();
        assert_eq!(range.phase(), RangePhase::Complete);
        assert_eq!(range.day_count(), 14);
        assert!(resolve_date_range(&explicit, today, 7).is_err());

        let week = AnalyzeArgs {
            next_days: Some(7),
            ..args()
        };
        assert_eq!(
            resolve_date_range(&week, today, 30).unwrap(),
            DateRange::complete(ymd(2025, 5, 21), ymd(2025, 5, 27))
        );
        let odd = AnalyzeArgs {
            next_days: Some(10),
            ..args()
        };
        assert!(resolve_date_range(&odd, today, 30).is_err());

        assert_eq!(
            resolve_date_range(&args(), today, 5).unwrap(),
            DateRange::complete(ymd(2025, 5, 21), ymd(2025, 5, 26))
        );
        let past = AnalyzeArgs {
            start: Some("2025-05-01".to_string()),
            end: Some("2025-05-10".to_string()),
            ..args()
        };
        assert!(resolve_date_range(&past, today, 30).is_err());
    }

    #[test]
    fn test_write_daily_csv() {
        let days = vec![
            DailyProbability {
                date: ymd(2025, 6, 1),
                probability: 0.72,
                predicted_value: 44.126,
            },
            DailyProbability {
                date: ymd(2025, 6, 2),
                probability: 0.1,
                predicted_value: 39.0,
            },
        ];
        let rows = chart_rows(&days, 43.33);
        assert_eq!(rows[0].risk_zone, RiskLevel::High);

        let mut out = Vec::new();
        write_daily_csv(&mut out, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,probability,predicted_value,risk_zone\n\
             2025-06-01,0.7200,44.13,high\n\
             2025-06-02,0.1000,39.00,low\n"
        );
    }
}
