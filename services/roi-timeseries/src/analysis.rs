//! Time-series analysis and two-period comparison over an ROI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use geodata_common::time::{from_epoch_millis, DATE_FORMAT};
use geodata_common::DateRange;
use renderer::{LineStyle, Marker, Series, TimeSeriesChart};

use crate::error::RoiError;
use crate::platform::{AnalysisPlatform, RawObservation, SeriesQuery};
use crate::roi::{RoiContext, RoiSource};
use crate::variables::Variable;

pub const NO_DATA_WARNING: &str =
    "No se encontraron datos para el rango de fechas y la ROI seleccionada.";

pub const MAX_COMPARED_VARIABLES: usize = 2;

pub const DEFAULT_ANALYSIS_START: &str = "2010-01-01";
pub const DEFAULT_ANALYSIS_END: &str = "2020-12-31";
pub const DEFAULT_PERIOD_1: (&str, &str) = ("2010-01-01", "2015-12-31");
pub const DEFAULT_PERIOD_2: (&str, &str) = ("2016-01-01", "2020-12-31");

const PERIOD_1_COLOR: &str = "#1f77b4";
const PERIOD_2_COLOR: &str = "#ff7f0e";

/// One cleaned observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub value: f64,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format(DATE_FORMAT).to_string())
}

/// Drop observations without a date or a finite value, then sort by date.
pub fn clean_series(raw: Vec<RawObservation>) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<(i64, TimeSeriesPoint)> = raw
        .into_iter()
        .filter_map(|obs| {
            let ms = obs.time_start_ms?;
            let value = obs.value.filter(|v| v.is_finite())?;
            let date = from_epoch_millis(ms)?.date_naive();
            Some((ms, TimeSeriesPoint { date, value }))
        })
        .collect();
    points.sort_by_key(|(ms, _)| *ms);
    points.into_iter().map(|(_, p)| p).collect()
}

fn chart_points(points: &[TimeSeriesPoint]) -> Vec<(NaiveDate, f64)> {
    points.iter().map(|p| (p.date, p.value)).collect()
}

/// Body of an analysis request. Missing fields take the screen's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    pub start: Option<String>,
    pub end: Option<String>,
    pub variable: Option<String>,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(Variable, DateRange), RoiError> {
        let variable = match &self.variable {
            Some(v) => Variable::parse(v)?,
            None => Variable::Gpp,
        };
        let range = DateRange::parse(
            self.start.as_deref().unwrap_or(DEFAULT_ANALYSIS_START),
            self.end.as_deref().unwrap_or(DEFAULT_ANALYSIS_END),
        )?;
        Ok((variable, range))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub variable: Variable,
    pub label: &'static str,
    pub start: String,
    pub end: String,
    pub roi_source: RoiSource,
    pub warnings: Vec<String>,
    pub points: Vec<TimeSeriesPoint>,
    /// Absent when the series is empty.
    pub chart_svg: Option<String>,
}

impl AnalysisReport {
    pub fn chart_title(&self) -> String {
        format!("Serie de Tiempo: {}", self.label)
    }

    /// CSV export with a `date,value` header.
    pub fn to_csv(&self) -> Result<Vec<u8>, RoiError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["date", "value"])
            .map_err(|e| RoiError::Export(e.to_string()))?;
        for point in &self.points {
            writer
                .write_record([point.date.format(DATE_FORMAT).to_string(), point.value.to_string()])
                .map_err(|e| RoiError::Export(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| RoiError::Export(e.to_string()))
    }
}

/// Regional-mean time series of one variable over the session's ROI.
pub async fn run_analysis(
    platform: &dyn AnalysisPlatform,
    ctx: &RoiContext,
    variable: Variable,
    range: DateRange,
) -> Result<AnalysisReport, RoiError> {
    let resolved = ctx.resolve();
    let mut warnings: Vec<String> = resolved.warning.into_iter().collect();

    let query = SeriesQuery {
        variable,
        range,
        roi: resolved.polygon,
    };
    let points = clean_series(platform.regional_means(&query).await?);

    let chart_svg = if points.is_empty() {
        warn!(variable = variable.name(), "Empty time series");
        warnings.push(NO_DATA_WARNING.to_string());
        None
    } else {
        let label = variable.label();
        let chart = TimeSeriesChart::new(format!("Serie de Tiempo: {label}"), "Fecha", label)
            .add_series(Series::new(label, chart_points(&points)));
        Some(chart.to_svg())
    };

    info!(
        variable = variable.name(),
        roi = ?resolved.source,
        points = points.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        variable,
        label: variable.label(),
        start: range.start_str(),
        end: range.end_str(),
        roi_source: resolved.source,
        warnings,
        points,
        chart_svg,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodInput {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonRequest {
    pub period1: Option<PeriodInput>,
    pub period2: Option<PeriodInput>,
    pub variables: Option<Vec<String>>,
}

fn period(input: Option<&PeriodInput>, default: (&str, &str)) -> Result<DateRange, RoiError> {
    match input {
        Some(p) => Ok(DateRange::parse(&p.start, &p.end)?),
        None => Ok(DateRange::parse(default.0, default.1)?),
    }
}

impl ComparisonRequest {
    pub fn validate(&self) -> Result<(DateRange, DateRange, Vec<Variable>), RoiError> {
        let p1 = period(self.period1.as_ref(), DEFAULT_PERIOD_1)?;
        let p2 = period(self.period2.as_ref(), DEFAULT_PERIOD_2)?;

        let variables = match &self.variables {
            Some(names) => {
                let mut parsed = Vec::with_capacity(names.len());
                for name in names {
                    let v = Variable::parse(name)?;
                    if !parsed.contains(&v) {
                        parsed.push(v);
                    }
                }
                parsed
            }
            None => vec![Variable::Gpp, Variable::Ndvi],
        };
        if variables.len() > MAX_COMPARED_VARIABLES {
            return Err(RoiError::TooManyVariables {
                max: MAX_COMPARED_VARIABLES,
                got: variables.len(),
            });
        }
        Ok((p1, p2, variables))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableComparison {
    pub variable: Variable,
    pub label: &'static str,
    pub period1: Vec<TimeSeriesPoint>,
    pub period2: Vec<TimeSeriesPoint>,
    pub chart_svg: Option<String>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub roi_source: RoiSource,
    pub warnings: Vec<String>,
    pub period1: DateRange,
    pub period2: DateRange,
    pub results: Vec<VariableComparison>,
}

pub fn comparison_chart(
    variable: Variable,
    period1: &[TimeSeriesPoint],
    period2: &[TimeSeriesPoint],
) -> TimeSeriesChart {
    let label = variable.label();
    TimeSeriesChart::new(format!("Comparación de {label} entre Períodos"), "Fecha", label)
        .add_series(
            Series::new("Período 1", chart_points(period1))
                .with_style(Marker::Circle, LineStyle::Solid, PERIOD_1_COLOR),
        )
        .add_series(
            Series::new("Período 2", chart_points(period2))
                .with_style(Marker::Square, LineStyle::Dashed, PERIOD_2_COLOR),
        )
        .with_legend()
}

/// Compare each variable between two periods over the session's ROI.
pub async fn run_comparison(
    platform: &dyn AnalysisPlatform,
    ctx: &RoiContext,
    period1: DateRange,
    period2: DateRange,
    variables: &[Variable],
) -> Result<ComparisonReport, RoiError> {
    let resolved = ctx.resolve();
    let warnings: Vec<String> = resolved.warning.into_iter().collect();
    let mut results = Vec::with_capacity(variables.len());

    for &variable in variables {
        let mut series = Vec::with_capacity(2);
        for range in [period1, period2] {
            let query = SeriesQuery {
                variable,
                range,
                roi: resolved.polygon.clone(),
            };
            series.push(clean_series(platform.regional_means(&query).await?));
        }
        let p2 = series.pop().unwrap_or_default();
        let p1 = series.pop().unwrap_or_default();

        let (chart_svg, warning) = if p1.is_empty() || p2.is_empty() {
            warn!(variable = variable.name(), "Comparison has an empty period");
            (None, Some(format!("No se encontraron datos para {}.", variable.label())))
        } else {
            (Some(comparison_chart(variable, &p1, &p2).to_svg()), None)
        };

        results.push(VariableComparison {
            variable,
            label: variable.label(),
            period1: p1,
            period2: p2,
            chart_svg,
            warning,
        });
    }

    info!(
        variables = results.len(),
        roi = ?resolved.source,
        "Comparison complete"
    );

    Ok(ComparisonReport {
        roi_source: resolved.source,
        warnings,
        period1,
        period2,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(date: &str) -> i64 {
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_clean_series_sorts_and_drops_nulls() {
        let raw = vec![
            RawObservation::new(ms("2010-03-01"), Some(3.0)),
            RawObservation::new(ms("2010-01-01"), Some(1.0)),
            RawObservation::new(ms("2010-02-01"), None),
            RawObservation::new(ms("2010-04-01"), Some(f64::NAN)),
            RawObservation {
                time_start_ms: None,
                value: Some(9.0),
            },
        ];
        let points = clean_series(raw);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date.format(DATE_FORMAT).to_string(), "2010-01-01");
        assert_eq!(points[1].value, 3.0);
    }

    #[test]
    fn test_analysis_request_defaults() {
        let (variable, range) = AnalysisRequest::default().validate().unwrap();
        assert_eq!(variable, Variable::Gpp);
        assert_eq!(range.start_str(), "2010-01-01");
        assert_eq!(range.end_str(), "2020-12-31");
    }

    #[test]
    fn test_analysis_request_rejects_inverted_range() {
        let req = AnalysisRequest {
            start: Some("2015-01-01".into()),
            end: Some("2010-01-01".into()),
            variable: Some("ndvi".into()),
        };
        assert!(matches!(req.validate(), Err(RoiError::InvalidDateRange)));
    }

    #[test]
    fn test_comparison_request_limits_variables() {
        let req = ComparisonRequest {
            variables: Some(vec!["gpp".into(), "ndvi".into(), "precipitation".into()]),
            ..Default::default()
        };
        assert!(matches!(
            req.validate(),
            Err(RoiError::TooManyVariables { max: 2, got: 3 })
        ));

        let (p1, p2, vars) = ComparisonRequest::default().validate().unwrap();
        assert_eq!(vars, vec![Variable::Gpp, Variable::Ndvi]);
        assert_eq!(p1.end_str(), "2015-12-31");
        assert_eq!(p2.start_str(), "2016-01-01");
    }

    #[test]
    fn test_csv_export() {
        let report = AnalysisReport {
            variable: Variable::Ndvi,
            label: Variable::Ndvi.label(),
            start: "2010-01-01".into(),
            end: "2010-12-31".into(),
            roi_source: RoiSource::Default,
            warnings: vec![],
            points: vec![TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                value: 0.25,
            }],
            chart_svg: None,
        };
        let csv = String::from_utf8(report.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "date,value\n2010-01-01,0.25\n");
    }

    #[test]
    fn test_comparison_chart_styles() {
        let points = vec![TimeSeriesPoint {
            date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            value: 1.0,
        }];
        let chart = comparison_chart(Variable::Gpp, &points, &points);
        assert_eq!(chart.title, "Comparación de GPP (MODIS) entre Períodos");
        assert!(chart.legend);
        assert_eq!(chart.series[0].marker, Marker::Circle);
        assert_eq!(chart.series[1].line, LineStyle::Dashed);
    }
}
