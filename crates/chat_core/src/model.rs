/// Catalog entry for a model served by the inference server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Identifier sent on the wire as `model`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub context_length: u32,
}

impl Model {
    fn new(id: &str, name: &str, description: &str, context_length: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            context_length,
        }
    }
}

/// Model selected on a fresh start or when persisted state is unusable.
pub fn default_model() -> Model {
    Model::new(
        "DeepSeek-R1:8b",
        "DeepSeek R1 8B",
        "Efficient and powerful 8B parameter model",
        8192,
    )
}

/// Models offered for selection. The default model is always first.
pub fn model_catalog() -> Vec<Model> {
    vec![
        default_model(),
        Model::new(
            "llama2",
            "Llama 2",
            "Meta's open source large language model",
            4096,
        ),
        Model::new("mistral", "Mistral", "High-performance 7B parameter model", 8192),
    ]
}

/// Case-insensitive lookup in the catalog.
pub fn find_model(id: &str) -> Option<Model> {
    let id = id.trim();
    model_catalog()
        .into_iter()
        .find(|model| model.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::{default_model, find_model, model_catalog};

    #[test]
    fn catalog_starts_with_default() {
        assert_eq!(model_catalog()[0], default_model());
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert_eq!(find_model(" deepseek-r1:8B "), Some(default_model()));
        assert!(find_model("gpt-unknown").is_none());
    }
}
