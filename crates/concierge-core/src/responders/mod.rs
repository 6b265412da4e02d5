//! Built-in responder implementations

pub mod model;
pub mod template;

use std::sync::Arc;

pub use model::{ModelClient, ModelConfig, ModelResponder};
pub use template::TemplateResponder;

use crate::responder::ResponderRegistry;
use crate::types::Domain;

/// Registry with a template responder for every domain
pub fn template_registry() -> ResponderRegistry {
    let mut registry = ResponderRegistry::new();
    for domain in Domain::PRIORITY {
        registry.register(Arc::new(TemplateResponder::new(domain)));
    }
    registry
}

/// Registry with a model responder for every domain, all sharing `client`
pub fn model_registry(client: Arc<ModelClient>) -> ResponderRegistry {
    let mut registry = ResponderRegistry::new();
    for domain in Domain::PRIORITY {
        registry.register(Arc::new(ModelResponder::new(domain, client.clone())));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_registry_covers_all_domains() {
        let registry = template_registry();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.domains(), Domain::PRIORITY.to_vec());
    }

    #[test]
    fn test_model_registry_shares_client() {
        let client = Arc::new(ModelClient::new(&ModelConfig::default()).unwrap());
        let registry = model_registry(client.clone());
        assert_eq!(registry.len(), 4);
        assert_eq!(Arc::strong_count(&client), 5);
    }
}
