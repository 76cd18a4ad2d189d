//! Read-only filtering over layer descriptors.

use serde::{Deserialize, Serialize};

/// Describes one named shoreline or boundary dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub layer_name: String,
    pub site: String,
    pub year: i32,
    pub parameter: String,
    pub geometry_type: String,
    pub crs: String,
}

/// Name of the shoreline layer for `site` in `year`, e.g. `SiteA_2011_Shoreline`.
pub fn shoreline_layer_name(site: &str, year: i32) -> String {
    format!("Site{}_{}_Shoreline", site, year)
}

/// Conjunctive filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerQuery {
    pub site: Option<String>,
    pub year: Option<i32>,
    pub parameter: Option<String>,
    /// Case-insensitive substring of the layer name.
    pub text: Option<String>,
}

impl LayerQuery {
    pub fn matches(&self, layer: &LayerDescriptor) -> bool {
        if self.site.as_ref().is_some_and(|site| *site != layer.site) {
            return false;
        }
        if self.year.is_some_and(|year| year != layer.year) {
            return false;
        }
        if self
            .parameter
            .as_ref()
            .is_some_and(|parameter| *parameter != layer.parameter)
        {
            return false;
        }
        match &self.text {
            Some(text) => layer
                .layer_name
                .to_lowercase()
                .contains(&text.to_lowercase()),
            None => true,
        }
    }

    pub fn apply<'a>(&self, layers: &'a [LayerDescriptor]) -> Vec<&'a LayerDescriptor> {
        layers.iter().filter(|layer| self.matches(layer)).collect()
    }
}

/// Parses a JSON array of descriptors.
pub fn parse_catalog(json: &str) -> Result<Vec<LayerDescriptor>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"layer_name": "SiteA_2011_Shoreline", "site": "A", "year": 2011, "parameter": "Shoreline",
         "geometry_type": "LineString", "crs": "EPSG:4326"},
        {"layer_name": "SiteA_2020_Shoreline", "site": "A", "year": 2020, "parameter": "Shoreline",
         "geometry_type": "LineString", "crs": "EPSG:4326"},
        {"layer_name": "SiteC_2020_Boundary", "site": "C", "year": 2020, "parameter": "Boundary",
         "geometry_type": "Polygon", "crs": "EPSG:4326"}
    ]"#;

    #[test]
    fn empty_query_matches_all() {
        let layers = parse_catalog(CATALOG).unwrap();
        assert_eq!(LayerQuery::default().apply(&layers).len(), 3);
    }

    #[test]
    fn filters_combine() {
        let layers = parse_catalog(CATALOG).unwrap();
        let query = LayerQuery {
            year: Some(2020),
            parameter: Some("Shoreline".into()),
            ..LayerQuery::default()
        };
        let found = query.apply(&layers);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].layer_name, "SiteA_2020_Shoreline");
    }

    #[test]
    fn text_is_case_insensitive_substring() {
        let layers = parse_catalog(CATALOG).unwrap();
        let query = LayerQuery {
            text: Some("sitec".into()),
            ..LayerQuery::default()
        };
        assert_eq!(query.apply(&layers)[0].site, "C");
    }

    #[test]
    fn shoreline_names() {
        assert_eq!(shoreline_layer_name("A", 2011), "SiteA_2011_Shoreline");
    }
}
