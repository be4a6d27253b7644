//! Display configuration

use serde::Deserialize;

/// Display configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    /// Vehicle class labels for the count slots (comma-separated, model order)
    pub class_names: Option<String>,
}

impl DisplayConfig {
    /// Get class names as a vector
    pub fn class_names_list(&self) -> Vec<String> {
        self.class_names
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_parsing() {
        let config = DisplayConfig {
            class_names: Some("car, motorbike,bus ,, truck".to_string()),
        };
        assert_eq!(config.class_names_list(), vec!["car", "motorbike", "bus", "truck"]);
    }

    #[test]
    fn test_no_class_names() {
        assert!(DisplayConfig::default().class_names_list().is_empty());
    }
}
