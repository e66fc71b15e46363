use indexmap::IndexMap;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub capabilities: Vec<String>,
    pub max_thinking_budget: Option<u32>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }

    /// Clamp a requested thinking budget to what the model accepts.
    /// `None` means the model takes no thinking config at all.
    pub fn clamp_thinking_budget(&self, requested: u32) -> Option<u32> {
        if !self.supports("reasoning") {
            return None;
        }
        Some(match self.max_thinking_budget {
            Some(max) => requested.min(max),
            None => requested,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, capabilities: &[&str], max_thinking_budget: Option<u32>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
                max_thinking_budget,
            },
        );
    };

    insert(DEFAULT_MODEL, &["text", "vision", "reasoning"], Some(32768));
    insert("gemini-2.5-pro", &["text", "vision", "reasoning"], Some(32768));
    insert("gemini-2.5-flash", &["text", "vision", "reasoning"], Some(24576));
    insert("gemini-2.0-flash", &["text", "vision"], None);

    map
}
