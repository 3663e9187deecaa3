use serde::{Deserialize, Serialize};

/// One timestamped flow-rate record, the system's sole domain entity.
///
/// `last_update` is kept verbatim as recognized from the source image and is
/// the uniqueness key in storage. `total` is always derived from the two
/// flow fields, never recognized from an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub last_update: String,
    pub through_turbine: f64,
    pub through_pond_hatch: f64,
    pub total: f64,
}

impl Reading {
    pub fn new(last_update: impl Into<String>, through_turbine: f64, through_pond_hatch: f64) -> Self {
        Self {
            last_update: last_update.into(),
            through_turbine,
            through_pond_hatch,
            total: through_turbine + through_pond_hatch,
        }
    }
}

/// A `src` attribute taken from a located image element. May be an absolute
/// URL, a site-relative path, or an embedded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three image references the locator must find on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowImages {
    pub last_update: ImageRef,
    pub through_turbine: ImageRef,
    pub through_pond_hatch: ImageRef,
}

/// How a completed poll cycle ended: either a fresh reading was stored or
/// the recognized timestamp was already present.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Inserted(Reading),
    Duplicate(Reading),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_flows() {
        let reading = Reading::new("2024-05-01 10:00", 15.2, 3.8);
        assert_eq!(reading.total, 15.2 + 3.8);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let reading = Reading::new("2024-05-01 10:00", 1.0, 2.0);
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["lastUpdate"], "2024-05-01 10:00");
        assert_eq!(json["throughTurbine"], 1.0);
        assert_eq!(json["throughPondHatch"], 2.0);
        assert_eq!(json["total"], 3.0);
    }
}
