use super::GenerationError;

/// Blocking text-generation backend.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str)
        -> Result<String, GenerationError>;

    fn is_model_available(&self, model: &str) -> Result<bool, GenerationError>;

    fn list_models(&self) -> Result<Vec<String>, GenerationError>;
}
