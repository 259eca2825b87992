use reqwest::Url;
use std::fmt;

/// Resolved content for one scan: display metadata plus the model to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub name: String,
    pub description: String,
    pub price: String,
    pub origin: String,
    pub model_url: Url,
}

impl ContentDescriptor {
    /// Descriptor for a bare asset URL, no display metadata
    pub fn for_asset(model_url: Url) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            origin: String::new(),
            model_url,
        }
    }

    /// True when there is no metadata worth showing
    pub fn is_bare(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.price.is_empty()
            && self.origin.is_empty()
    }
}

impl fmt::Display for ContentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.model_url)
        } else {
            write!(f, "{} ({})", self.name, self.model_url)
        }
    }
}
