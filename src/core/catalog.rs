//! Airport catalog
//!
//! Holds the selectable points for the lifetime of a session. The catalog is
//! loaded once (built-in list, JSON file or HTTP endpoint) and is read-only
//! afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::core::error::{Error, Result};

/// A selectable point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u32,
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Point {
    pub fn new(id: u32, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

static BUILTIN_AIRPORTS: Lazy<Vec<Point>> = Lazy::new(|| {
    vec![
        Point::new(0, "Mumbai", 19.0760, 72.8777),
        Point::new(1, "Delhi", 28.6139, 77.2090),
        Point::new(2, "Bengaluru", 12.9716, 77.5946),
        Point::new(3, "Chennai", 13.0827, 80.2707),
        Point::new(4, "Kolkata", 22.5726, 88.3639),
        Point::new(5, "Hyderabad", 17.3850, 78.4867),
        Point::new(6, "Pune", 18.5204, 73.8567),
        Point::new(7, "Ahmedabad", 23.0225, 72.5714),
        Point::new(8, "Surat", 21.1702, 72.8311),
        Point::new(9, "Jaipur", 26.9124, 75.7873),
        Point::new(10, "Lucknow", 26.8467, 80.9462),
        Point::new(11, "Nagpur", 21.1458, 79.0882),
        Point::new(12, "Indore", 22.7196, 75.8577),
        Point::new(13, "Bhopal", 23.2599, 77.4126),
        Point::new(14, "Patna", 25.5941, 85.1376),
        Point::new(15, "Vadodara", 22.3072, 73.1812),
        Point::new(16, "Guwahati", 26.1445, 91.7362),
        Point::new(17, "Srinagar", 34.0837, 74.7973),
        Point::new(18, "Thiruvananthapuram", 8.5241, 76.9366),
        Point::new(19, "Coimbatore", 11.0168, 76.9558),
    ]
});

/// Minimum blended similarity for a name to be offered as a suggestion
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Read-only set of selectable points, indexed by id
#[derive(Debug, Clone)]
pub struct AirportCatalog {
    points: Vec<Point>,
    by_id: HashMap<u32, usize>,
}

impl AirportCatalog {
    /// Build a catalog, rejecting empty lists and duplicate ids
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::CatalogError("catalog contains no airports".to_string()));
        }

        let mut by_id = HashMap::with_capacity(points.len());
        for (idx, point) in points.iter().enumerate() {
            if !point.latitude.is_finite() || !point.longitude.is_finite() {
                return Err(Error::CatalogError(format!(
                    "airport {} has non-finite coordinates",
                    point.id
                )));
            }
            if by_id.insert(point.id, idx).is_some() {
                return Err(Error::CatalogError(format!("duplicate airport id {}", point.id)));
            }
        }

        Ok(Self { points, by_id })
    }

    /// The default twenty-airport catalog
    pub fn builtin() -> Self {
        let points = BUILTIN_AIRPORTS.clone();
        let by_id = points.iter().enumerate().map(|(idx, p)| (p.id, idx)).collect();
        Self { points, by_id }
    }

    /// Parse a JSON array of `{id, name, lat, lon}` records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let points: Vec<Point> = serde_json::from_str(json)
            .map_err(|e| Error::CatalogError(format!("invalid catalog JSON: {e}")))?;
        Self::from_points(points)
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        info!("Loaded {} airports from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Fetch a catalog with a `GET` request
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        debug!("Fetching catalog from {url}");
        let response = client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::CatalogError(format!(
                "catalog endpoint {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response.text().await?;
        let catalog = Self::from_json_str(&body)?;
        info!("Loaded {} airports from {}", catalog.len(), url);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in load order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Look a point up by id
    pub fn get(&self, id: u32) -> Result<&Point> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.points[idx])
            .ok_or(Error::UnknownPoint(id))
    }

    /// Resolve a user token as an id, an exact name or a case-insensitive name
    pub fn resolve(&self, token: &str) -> Result<&Point> {
        let token = token.trim();
        if let Ok(id) = token.parse::<u32>() {
            return self.get(id);
        }

        if let Some(point) = self.points.iter().find(|p| p.name == token) {
            return Ok(point);
        }
        if let Some(point) = self
            .points
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(token))
        {
            return Ok(point);
        }

        Err(Error::UnknownName {
            name: token.to_string(),
            suggestion: self.suggest(token).map(|p| p.name.clone()),
        })
    }

    /// Closest name match for a misspelled airport, if any is close enough
    pub fn suggest(&self, name: &str) -> Option<&Point> {
        let input = name.trim().to_lowercase();
        if input.is_empty() {
            return None;
        }

        let mut best: Option<(&Point, f64)> = None;
        for point in &self.points {
            let candidate = point.name.to_lowercase();
            // Jaro-Winkler catches transpositions and prefix typos, Levenshtein
            // covers dropped or doubled letters.
            let score = 0.7 * jaro_winkler(&input, &candidate)
                + 0.3 * normalized_levenshtein(&input, &candidate);
            let better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if score >= SUGGESTION_THRESHOLD && better {
                best = Some((point, score));
            }
        }

        best.map(|(point, _)| point)
    }
}
