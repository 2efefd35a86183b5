use crate::core::registry::Registry;
use crate::domain::model::{Hub, PostalCode};
use crate::utils::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// 郵遞區號表的原始 CSV 欄位
#[derive(Debug, Deserialize)]
struct RawPincodeRow {
    #[serde(rename = "CircleName", default)]
    circle_name: String,
    #[serde(rename = "RegionName", default)]
    region_name: String,
    #[serde(rename = "DivisionName", default)]
    division_name: String,
    #[serde(rename = "OfficeName", default)]
    office_name: String,
    #[serde(rename = "Pincode")]
    pincode: String,
    #[serde(rename = "OfficeType", default)]
    office_type: String,
    #[serde(rename = "Delivery", default)]
    delivery: String,
    #[serde(rename = "District", default)]
    district: String,
    #[serde(rename = "StateName", default)]
    state_name: String,
    #[serde(rename = "Latitude", default)]
    latitude: String,
    #[serde(rename = "Longitude", default)]
    longitude: String,
}

/// One post office row that survived import cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PincodeRow {
    pub circle_name: String,
    pub region_name: String,
    pub division_name: String,
    pub office_name: String,
    pub pincode: PostalCode,
    pub office_type: String,
    pub delivery: String,
    pub district: String,
    pub state_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn bound(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

/// Which postal-table column names the hub a pincode belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubColumn {
    Circle,
    Region,
    #[default]
    Division,
    District,
}

impl HubColumn {
    fn value<'a>(&self, row: &'a PincodeRow) -> &'a str {
        match self {
            HubColumn::Circle => &row.circle_name,
            HubColumn::Region => &row.region_name,
            HubColumn::Division => &row.division_name,
            HubColumn::District => &row.district,
        }
    }
}

impl std::str::FromStr for HubColumn {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(HubColumn::Circle),
            "region" => Ok(HubColumn::Region),
            "division" => Ok(HubColumn::Division),
            "district" => Ok(HubColumn::District),
            other => Err(RouterError::InvalidConfigValueError {
                field: "hub_column".to_string(),
                value: other.to_string(),
                reason: "expected circle, region, division or district".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub invalid_coordinates: usize,
    pub invalid_pincodes: usize,
}

#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub data: Vec<&'a PincodeRow>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Cleans a raw coordinate value.
///
/// Blank and `NA` values are missing. Magnitudes that look like a misplaced
/// decimal point are rescaled: (1000, 9999] is divided by 100 and
/// (10000, 99999] by 1000. Anything else above 1000, or outside the axis
/// range after rescaling, is rejected. Kept values are rounded to 8 places.
pub fn normalize_coordinate(raw: &str, axis: Axis) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("n/a")
    {
        return None;
    }

    let mut value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let magnitude = value.abs();
    if magnitude > 1000.0 {
        if magnitude <= 9999.0 {
            value /= 100.0;
        } else if magnitude > 10000.0 && magnitude <= 99999.0 {
            value /= 1000.0;
        } else {
            return None;
        }
    }

    if value.abs() > axis.bound() {
        return None;
    }

    Some((value * 1e8).round() / 1e8)
}

/// In-memory copy of the imported postal table.
#[derive(Debug, Clone, Default)]
pub struct PincodeTable {
    rows: Vec<PincodeRow>,
}

impl PincodeTable {
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<(Self, ImportReport)> {
        let file = std::fs::File::open(path.as_ref())?;
        tracing::info!("📥 Importing pincodes from {}", path.as_ref().display());
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<(Self, ImportReport)> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut report = ImportReport::default();
        let mut rows = Vec::new();

        for result in csv_reader.deserialize::<RawPincodeRow>() {
            let raw = result?;
            report.total_rows += 1;

            let Some(pincode) = PostalCode::parse(&raw.pincode) else {
                report.invalid_pincodes += 1;
                continue;
            };

            let latitude = normalize_coordinate(&raw.latitude, Axis::Latitude);
            let longitude = normalize_coordinate(&raw.longitude, Axis::Longitude);
            let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
                report.invalid_coordinates += 1;
                continue;
            };

            rows.push(PincodeRow {
                circle_name: raw.circle_name,
                region_name: raw.region_name,
                division_name: raw.division_name,
                office_name: raw.office_name,
                pincode,
                office_type: raw.office_type,
                delivery: raw.delivery,
                district: raw.district,
                state_name: raw.state_name,
                latitude,
                longitude,
            });
        }

        report.imported = rows.len();
        tracing::info!(
            "✅ Loaded {} rows ({} invalid coordinates, {} invalid pincodes skipped)",
            report.total_rows,
            report.invalid_coordinates,
            report.invalid_pincodes
        );

        Ok((Self { rows }, report))
    }

    pub fn rows(&self) -> &[PincodeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 依指定欄位把郵遞區號分組成 hub，hub 順序為第一次出現的順序
    pub fn to_registry(&self, column: HubColumn) -> Registry {
        let mut order: Vec<(String, Vec<PostalCode>)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(usize, &PostalCode)> = HashSet::new();

        for row in &self.rows {
            let name = column.value(row);
            if name.is_empty() {
                continue;
            }
            let index = *positions.entry(name).or_insert_with(|| {
                order.push((name.to_string(), Vec::new()));
                order.len() - 1
            });
            if seen.insert((index, &row.pincode)) {
                order[index].1.push(row.pincode.clone());
            }
        }

        Registry::from_hubs(order.into_iter().map(|(name, codes)| Hub::new(name, codes)))
    }

    pub fn page(&self, page: usize, per_page: usize) -> Result<Page<'_>> {
        if page == 0 || per_page == 0 {
            return Err(RouterError::invalid_input(
                "page and per_page must be at least 1",
            ));
        }
        let total = self.rows.len();
        let offset = (page - 1).saturating_mul(per_page);
        Ok(Page {
            data: self.rows.iter().skip(offset).take(per_page).collect(),
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page),
        })
    }

    /// Case-insensitive substring search over pincode, office name and district.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&PincodeRow> {
        let needle = query.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                row.pincode.as_str().contains(&needle)
                    || row.office_name.to_lowercase().contains(&needle)
                    || row.district.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}
