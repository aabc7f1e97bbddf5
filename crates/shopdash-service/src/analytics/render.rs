//! Turns aggregation results into chart descriptions and metrics.

use chrono::NaiveDate;

use shopdash_core::types::CellValue;
use shopdash_database::TableSnapshot;

use super::catalog::Analytic;
use super::chart::{AnalyticOutput, ChartSpec, DataPoint, MapPoint, Metric, histogram};

const AGE_BINS: usize = 20;

fn chart(analytic: Analytic, title: &str, x_label: &str, y_label: &str, points: Vec<DataPoint>) -> ChartSpec {
    ChartSpec {
        kind: analytic.chart_kind(),
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        points,
    }
}

fn number(snapshot: &TableSnapshot, row: usize, column: &str) -> Option<f64> {
    snapshot.value(row, column).and_then(CellValue::as_f64)
}

fn cell(snapshot: &TableSnapshot, row: usize, column: &str) -> CellValue {
    snapshot.value(row, column).cloned().unwrap_or(CellValue::Null)
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Whole years between `dob` and `today`, counting 365-day years.
pub fn age_in_years(dob: NaiveDate, today: NaiveDate) -> i64 {
    (today - dob).num_days() / 365
}

/// Builds the output for `analytic` from its query result.
pub fn render(analytic: Analytic, snapshot: TableSnapshot, today: NaiveDate) -> AnalyticOutput {
    let no_data = || AnalyticOutput::NoData {
        id: analytic.id().to_string(),
        message: analytic.empty_message().to_string(),
    };
    if snapshot.is_empty() {
        return no_data();
    }

    let rows = 0..snapshot.len();
    let ready = |chart: ChartSpec, metrics: Vec<Metric>, table: Option<TableSnapshot>, map: Vec<MapPoint>| {
        AnalyticOutput::Ready {
            id: analytic.id().to_string(),
            chart,
            metrics,
            table,
            map,
        }
    };

    match analytic {
        Analytic::CustomerAgeDistribution => {
            let ages: Vec<f64> = snapshot
                .column_values("DOB")
                .iter()
                .filter_map(CellValue::as_text)
                .filter_map(|s| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
                .map(|dob| age_in_years(dob, today) as f64)
                .collect();
            if ages.is_empty() {
                return no_data();
            }
            let average = ages.iter().sum::<f64>() / ages.len() as f64;
            ready(
                chart(
                    analytic,
                    "Customer Age Distribution",
                    "Age (years)",
                    "Number of Customers",
                    histogram(&ages, AGE_BINS),
                ),
                vec![Metric::new("Average Age", format!("{average:.1} years"))],
                None,
                Vec::new(),
            )
        }
        Analytic::CustomerGrowth => {
            let mut total = 0i64;
            let points: Vec<DataPoint> = rows
                .map(|i| {
                    total += snapshot
                        .value(i, "CustomerCount")
                        .and_then(CellValue::as_i64)
                        .unwrap_or(0);
                    DataPoint::new(cell(&snapshot, i, "RegistrationDate"), total as f64)
                })
                .collect();
            ready(
                chart(analytic, "Cumulative Customer Growth", "Date", "Total Customers", points),
                vec![Metric::new("Total Customers", total.to_string())],
                None,
                Vec::new(),
            )
        }
        Analytic::ProductSales => {
            let points: Vec<DataPoint> = rows
                .clone()
                .map(|i| DataPoint {
                    color: Some(cell(&snapshot, i, "IsBestSeller")),
                    ..DataPoint::new(
                        cell(&snapshot, i, "ProductName"),
                        number(&snapshot, i, "SalesCount").unwrap_or(0.0),
                    )
                })
                .collect();
            let total: f64 = points.iter().map(|p| p.y).sum();
            let best_sellers = rows
                .filter(|i| snapshot.value(*i, "IsBestSeller").and_then(CellValue::as_i64) == Some(1))
                .count();
            ready(
                chart(analytic, "Product Sales Count", "Product", "Total Sales", points),
                vec![
                    Metric::new("Total Sales", format_count(total)),
                    Metric::new("Best Sellers", best_sellers.to_string()),
                ],
                None,
                Vec::new(),
            )
        }
        Analytic::OrderDistribution => {
            let points: Vec<DataPoint> = rows
                .map(|i| DataPoint {
                    size: number(&snapshot, i, "ShippingFee"),
                    ..DataPoint::new(
                        cell(&snapshot, i, "OrderDate"),
                        number(&snapshot, i, "TotalAmount").unwrap_or(0.0),
                    )
                })
                .collect();
            let amounts: Vec<f64> = snapshot
                .column_values("TotalAmount")
                .iter()
                .filter_map(CellValue::as_f64)
                .collect();
            let revenue: f64 = amounts.iter().sum();
            let average = if amounts.is_empty() {
                0.0
            } else {
                revenue / amounts.len() as f64
            };
            ready(
                chart(analytic, "Order Amount Over Time", "Date", "Order Amount ($)", points),
                vec![
                    Metric::new("Total Orders", snapshot.len().to_string()),
                    Metric::new("Avg Order Value", format!("${average:.2}")),
                    Metric::new("Total Revenue", format!("${revenue:.2}")),
                ],
                None,
                Vec::new(),
            )
        }
        Analytic::PaymentStatus => {
            let points = rows
                .map(|i| {
                    DataPoint::new(
                        cell(&snapshot, i, "PaymentStatus"),
                        number(&snapshot, i, "Count").unwrap_or(0.0),
                    )
                })
                .collect();
            ready(
                chart(analytic, "Payment Status Distribution", "Status", "Payments", points),
                Vec::new(),
                Some(snapshot.clone()),
                Vec::new(),
            )
        }
        Analytic::DeliveryStatus => {
            let points = rows
                .map(|i| DataPoint {
                    color: Some(cell(&snapshot, i, "Count")),
                    ..DataPoint::new(
                        cell(&snapshot, i, "DeliveryStatus"),
                        number(&snapshot, i, "Count").unwrap_or(0.0),
                    )
                })
                .collect();
            ready(
                chart(analytic, "Delivery Status Distribution", "Status", "Number of Deliveries", points),
                Vec::new(),
                None,
                Vec::new(),
            )
        }
        Analytic::DiscountUsage => {
            let points = rows
                .map(|i| DataPoint {
                    color: Some(cell(&snapshot, i, "DiscountValue")),
                    ..DataPoint::new(
                        cell(&snapshot, i, "DiscountType"),
                        number(&snapshot, i, "ProductsWithDiscount").unwrap_or(0.0),
                    )
                })
                .collect();
            ready(
                chart(analytic, "Products by Discount Type", "Discount Type", "Number of Products", points),
                Vec::new(),
                None,
                Vec::new(),
            )
        }
        Analytic::GeographicalDistribution => {
            let mut counts: Vec<(String, u64)> = Vec::new();
            for country in snapshot.column_values("CountryName").iter().filter_map(CellValue::as_text) {
                match counts.iter_mut().find(|(name, _)| *name == country) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((country, 1)),
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1));

            let map = rows
                .filter_map(|i| {
                    Some(MapPoint {
                        latitude: number(&snapshot, i, "Latitude")?,
                        longitude: number(&snapshot, i, "Longitude")?,
                        label: snapshot.value(i, "CityName").and_then(CellValue::as_text),
                    })
                })
                .collect();
            let points = counts
                .into_iter()
                .map(|(country, n)| DataPoint {
                    color: Some(CellValue::Integer(n as i64)),
                    ..DataPoint::new(CellValue::Text(country), n as f64)
                })
                .collect();
            ready(
                chart(analytic, "Address Distribution by Country", "Country", "Number of Addresses", points),
                Vec::new(),
                None,
                map,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn snapshot(columns: &[&str], rows: Vec<Vec<CellValue>>) -> TableSnapshot {
        TableSnapshot {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_empty_source_is_no_data() {
        for analytic in Analytic::ALL {
            let output = render(analytic, TableSnapshot::default(), today());
            assert!(matches!(output, AnalyticOutput::NoData { .. }), "{analytic:?}");
        }
    }

    #[test]
    fn test_customer_growth_is_cumulative() {
        let source = snapshot(
            &["RegistrationDate", "CustomerCount"],
            vec![
                vec![CellValue::Text("2024-01-01".into()), CellValue::Integer(2)],
                vec![CellValue::Text("2024-01-05".into()), CellValue::Integer(3)],
            ],
        );
        let AnalyticOutput::Ready { chart, metrics, .. } =
            render(Analytic::CustomerGrowth, source, today())
        else {
            panic!("expected a chart");
        };
        assert_eq!(chart.points[1].y, 5.0);
        assert_eq!(metrics[0].value, "5");
    }

    #[test]
    fn test_order_metrics() {
        let source = snapshot(
            &["OrderDate", "TotalAmount", "ShippingFee"],
            vec![
                vec![CellValue::Text("2024-01-01".into()), CellValue::Real(10.0), CellValue::Real(2.0)],
                vec![CellValue::Text("2024-01-02".into()), CellValue::Real(30.0), CellValue::Null],
            ],
        );
        let AnalyticOutput::Ready { chart, metrics, .. } =
            render(Analytic::OrderDistribution, source, today())
        else {
            panic!("expected a chart");
        };
        assert_eq!(chart.points[0].size, Some(2.0));
        assert_eq!(metrics[1].value, "$20.00");
        assert_eq!(metrics[2].value, "$40.00");
    }

    #[test]
    fn test_unparseable_birth_dates_are_no_data() {
        let source = snapshot(&["DOB"], vec![vec![CellValue::Text("unknown".into())]]);
        assert!(matches!(
            render(Analytic::CustomerAgeDistribution, source, today()),
            AnalyticOutput::NoData { .. }
        ));
    }

    #[test]
    fn test_geography_counts_countries_and_maps_coordinates() {
        let source = snapshot(
            &["Street", "CityName", "StateName", "CountryName", "Latitude", "Longitude"],
            vec![
                vec![
                    CellValue::Text("1 A St".into()),
                    CellValue::Text("Hanoi".into()),
                    CellValue::Null,
                    CellValue::Text("Vietnam".into()),
                    CellValue::Real(21.03),
                    CellValue::Real(105.85),
                ],
                vec![
                    CellValue::Text("2 B St".into()),
                    CellValue::Text("Lyon".into()),
                    CellValue::Null,
                    CellValue::Text("France".into()),
                    CellValue::Null,
                    CellValue::Null,
                ],
                vec![
                    CellValue::Text("3 C St".into()),
                    CellValue::Text("Hue".into()),
                    CellValue::Null,
                    CellValue::Text("Vietnam".into()),
                    CellValue::Real(16.46),
                    CellValue::Real(107.59),
                ],
            ],
        );
        let AnalyticOutput::Ready { chart, map, .. } =
            render(Analytic::GeographicalDistribution, source, today())
        else {
            panic!("expected a chart");
        };
        assert_eq!(chart.points[0].x, CellValue::Text("Vietnam".into()));
        assert_eq!(chart.points[0].y, 2.0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_age_in_years() {
        let dob = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();
        assert_eq!(age_in_years(dob, today()), 35);
    }
}
