//! Coordinate Reference System handling
//!
//! Shapefiles carry their CRS as ESRI WKT in a `.prj` sidecar. The tool
//! never reprojects; it only needs to copy the definition to the output and
//! to know whether coordinates are in meters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear unit of a projected CRS
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinearUnit {
    Meter,
    Foot,
    UsSurveyFoot,
    /// Any other unit, with its size in meters
    Other(f64),
}

impl LinearUnit {
    /// Size of one unit in meters
    pub fn meters(&self) -> f64 {
        match self {
            LinearUnit::Meter => 1.0,
            LinearUnit::Foot => 0.3048,
            LinearUnit::UsSurveyFoot => 1200.0 / 3937.0,
            LinearUnit::Other(m) => *m,
        }
    }
}

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation as found in the `.prj` file
    wkt: String,
}

impl CRS {
    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: wkt.into().trim().to_string(),
        }
    }

    /// Get WKT representation
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    /// Name of the outermost coordinate system node, e.g.
    /// `NAD_1983_UTM_Zone_12N`
    pub fn name(&self) -> Option<&str> {
        let open = self.wkt.find('[')?;
        let rest = &self.wkt[open + 1..];
        let rest = rest.strip_prefix('"')?;
        let close = rest.find('"')?;
        Some(&rest[..close])
    }

    /// Whether coordinates are angular (longitude/latitude)
    pub fn is_geographic(&self) -> bool {
        self.wkt.trim_start().starts_with("GEOGCS")
    }

    /// Linear unit of a projected CRS.
    ///
    /// In ESRI WKT the projected unit is the last `UNIT` node; the earlier
    /// ones belong to the nested geographic CRS.
    pub fn linear_unit(&self) -> Option<LinearUnit> {
        if self.is_geographic() {
            return None;
        }
        let start = self.wkt.rfind("UNIT[")? + "UNIT[".len();
        let body = &self.wkt[start..];
        let body = &body[..body.find(']')?];
        let mut parts = body.splitn(2, ',');
        let name = parts.next()?.trim().trim_matches('"').to_ascii_lowercase();
        let size: f64 = parts.next()?.trim().parse().ok()?;

        let unit = match name.as_str() {
            "meter" | "metre" => LinearUnit::Meter,
            "foot" | "foot_international" => LinearUnit::Foot,
            "foot_us" | "us survey foot" => LinearUnit::UsSurveyFoot,
            _ if (size - 1.0).abs() < 1e-12 => LinearUnit::Meter,
            _ => LinearUnit::Other(size),
        };
        Some(unit)
    }

    /// Get a short string identifier for this CRS
    pub fn identifier(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("WKT:{}", self.wkt.chars().take(50).collect::<String>()),
        }
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM12: &str = r#"PROJCS["NAD_1983_UTM_Zone_12N",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["Central_Meridian",-111.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    #[test]
    fn test_projected_in_meters() {
        let crs = CRS::from_wkt(UTM12);
        assert_eq!(crs.name(), Some("NAD_1983_UTM_Zone_12N"));
        assert!(!crs.is_geographic());
        assert_eq!(crs.linear_unit(), Some(LinearUnit::Meter));
        assert_eq!(crs.to_string(), "NAD_1983_UTM_Zone_12N");
    }

    #[test]
    fn test_state_plane_feet() {
        let wkt = UTM12.replace(r#"UNIT["Meter",1.0]]"#, r#"UNIT["Foot_US",0.3048006096012192]]"#);
        let crs = CRS::from_wkt(wkt);
        let unit = crs.linear_unit().unwrap();
        assert_eq!(unit, LinearUnit::UsSurveyFoot);
        assert!((unit.meters() - 0.3048006096).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_has_no_linear_unit() {
        let crs = CRS::from_wkt(
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#,
        );
        assert!(crs.is_geographic());
        assert_eq!(crs.linear_unit(), None);
        assert_eq!(crs.name(), Some("GCS_WGS_1984"));
    }

    #[test]
    fn test_unnamed_identifier_truncates_on_char_boundary() {
        let wkt = format!("{}é{}", "x".repeat(49), "ü".repeat(10));
        let crs = CRS::from_wkt(wkt);
        assert_eq!(crs.name(), None);
        let shown = crs.to_string();
        assert_eq!(shown, format!("WKT:{}é", "x".repeat(49)));
    }
}
