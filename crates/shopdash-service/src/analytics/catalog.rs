//! The fixed analytics catalog.

use serde::{Deserialize, Serialize};

use super::chart::ChartKind;

/// One canned analytic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analytic {
    /// Customer ages from date of birth.
    CustomerAgeDistribution,
    /// Running total of registrations.
    CustomerGrowth,
    /// Sales count per product.
    ProductSales,
    /// Order amount over time.
    OrderDistribution,
    /// Payments by status.
    PaymentStatus,
    /// Deliveries by status.
    DeliveryStatus,
    /// Products per discount.
    DiscountUsage,
    /// Addresses by country, with map markers.
    GeographicalDistribution,
}

impl Analytic {
    /// Every analytic in menu order.
    pub const ALL: [Analytic; 8] = [
        Self::CustomerAgeDistribution,
        Self::CustomerGrowth,
        Self::ProductSales,
        Self::OrderDistribution,
        Self::PaymentStatus,
        Self::DeliveryStatus,
        Self::DiscountUsage,
        Self::GeographicalDistribution,
    ];

    /// Identifier used in role grants and URLs.
    pub fn id(&self) -> &'static str {
        match self {
            Self::CustomerAgeDistribution => "customer_age_distribution",
            Self::CustomerGrowth => "customer_growth",
            Self::ProductSales => "product_sales",
            Self::OrderDistribution => "order_distribution",
            Self::PaymentStatus => "payment_status",
            Self::DeliveryStatus => "delivery_status",
            Self::DiscountUsage => "discount_usage",
            Self::GeographicalDistribution => "geographical_distribution",
        }
    }

    /// Looks up an analytic by identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Menu title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::CustomerAgeDistribution => "Customer Age Distribution",
            Self::CustomerGrowth => "Customer Growth Over Time",
            Self::ProductSales => "Product Sales Analysis",
            Self::OrderDistribution => "Order Amount Distribution",
            Self::PaymentStatus => "Payment Status Breakdown",
            Self::DeliveryStatus => "Delivery Status Overview",
            Self::DiscountUsage => "Discount Usage Analysis",
            Self::GeographicalDistribution => "Geographical Distribution",
        }
    }

    /// Chart shape.
    pub fn chart_kind(&self) -> ChartKind {
        match self {
            Self::CustomerAgeDistribution => ChartKind::Histogram,
            Self::CustomerGrowth => ChartKind::CumulativeLine,
            Self::OrderDistribution => ChartKind::Scatter,
            Self::PaymentStatus => ChartKind::Pie,
            Self::ProductSales
            | Self::DeliveryStatus
            | Self::DiscountUsage
            | Self::GeographicalDistribution => ChartKind::Bar,
        }
    }

    /// Message shown when the source is empty.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::CustomerAgeDistribution => "No customer data available",
            Self::CustomerGrowth => "No customer registration data available",
            Self::ProductSales => "No product analytics data available",
            Self::OrderDistribution => "No order data available",
            Self::PaymentStatus => "No payment data available",
            Self::DeliveryStatus => "No delivery data available",
            Self::DiscountUsage => "No discount data available",
            Self::GeographicalDistribution => "No geographical data available",
        }
    }

    /// The aggregation query. Portable across both engines.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::CustomerAgeDistribution => "SELECT DOB FROM customer WHERE DOB IS NOT NULL",
            Self::CustomerGrowth => {
                "SELECT RegistrationDate, COUNT(*) AS CustomerCount \
                 FROM customer \
                 WHERE RegistrationDate IS NOT NULL \
                 GROUP BY RegistrationDate \
                 ORDER BY RegistrationDate"
            }
            Self::ProductSales => {
                "SELECT p.ProductName, pa.SalesCount, pa.LastMonthSales, pa.IsBestSeller \
                 FROM product p \
                 JOIN productAnalytics pa ON p.ProductID = pa.ProductID \
                 ORDER BY pa.SalesCount DESC"
            }
            Self::OrderDistribution => {
                "SELECT OrderDate, TotalAmount, ShippingFee FROM orders ORDER BY OrderDate"
            }
            Self::PaymentStatus => {
                "SELECT PaymentStatus, COUNT(*) AS Count, SUM(Amount) AS TotalAmount \
                 FROM payment \
                 GROUP BY PaymentStatus"
            }
            Self::DeliveryStatus => {
                "SELECT DeliveryStatus, COUNT(*) AS Count FROM delivery GROUP BY DeliveryStatus"
            }
            Self::DiscountUsage => {
                "SELECT d.DiscountType, d.DiscountValue, COUNT(pd.ProductID) AS ProductsWithDiscount \
                 FROM discount d \
                 LEFT JOIN productDiscount pd ON d.DiscountID = pd.DiscountID \
                 GROUP BY d.DiscountID, d.DiscountType, d.DiscountValue"
            }
            Self::GeographicalDistribution => {
                "SELECT a.Street, c.CityName, s.StateName, co.CountryName, a.Latitude, a.Longitude \
                 FROM address a \
                 LEFT JOIN addressCity ac ON a.AddressID = ac.AddressID \
                 LEFT JOIN city c ON ac.CityID = c.CityID \
                 LEFT JOIN cityState cs ON c.CityID = cs.CityID \
                 LEFT JOIN state s ON cs.StateID = s.StateID \
                 LEFT JOIN stateCountry sc ON s.StateID = sc.StateID \
                 LEFT JOIN country co ON sc.CountryID = co.CountryID"
            }
        }
    }
}
