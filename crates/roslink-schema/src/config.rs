/// Controls schema registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, registering an existing type name replaces it.
    pub allow_overwrite: bool,
    /// Maximum number of message and service types held by the registry.
    pub max_types: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_overwrite: false,
            max_types: 4096,
        }
    }
}
