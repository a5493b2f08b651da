/// Weather categories in the order of the model's output vector.
pub const WEATHER_CATEGORIES: [&str; 11] = [
    "dew",
    "rain",
    "rime",
    "rainbow",
    "hail",
    "frost",
    "snow",
    "fogsmog",
    "glaze",
    "sandstorm",
    "lightning",
];

#[derive(Debug, Clone)]
pub struct CategoryLabels {
    class_labels: Vec<String>,
}

impl CategoryLabels {
    pub fn new() -> Self {
        Self {
            class_labels: WEATHER_CATEGORIES.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn get_labels(&self) -> &[String] {
        &self.class_labels
    }

    pub fn len(&self) -> usize {
        self.class_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_labels.is_empty()
    }
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self::new()
    }
}
