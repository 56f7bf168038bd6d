//! Per-sender chat provider selection for `/providers` and `/provider`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use unibot_core::traits::Provider;

/// Configured chat providers and each sender's pick, held in memory.
pub struct ProviderChoice {
    /// Default first, then the rest in config order.
    providers: Vec<Arc<dyn Provider>>,
    selected: Mutex<HashMap<String, String>>,
}

impl ProviderChoice {
    /// Build from the default provider and any other configured ones.
    /// Providers sharing the default's name are ignored.
    pub fn new(default: Arc<dyn Provider>, others: Vec<Arc<dyn Provider>>) -> Self {
        let mut providers = vec![default];
        for provider in others {
            if providers.iter().all(|p| p.name() != provider.name()) {
                providers.push(provider);
            }
        }
        Self {
            providers,
            selected: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_provider(&self) -> &Arc<dyn Provider> {
        &self.providers[0]
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// The provider answering this sender.
    pub async fn for_sender(&self, sender_id: &str) -> Arc<dyn Provider> {
        let selected = self.selected.lock().await;
        selected
            .get(sender_id)
            .and_then(|name| self.find(name))
            .unwrap_or_else(|| self.default_provider())
            .clone()
    }

    /// Markdown list of providers with the default and the sender's current one marked.
    pub async fn describe(&self, sender_id: &str) -> String {
        let current = self.for_sender(sender_id).await;
        let mut text = String::from("*Available providers*\n");
        for (i, provider) in self.providers.iter().enumerate() {
            text.push_str(&format!("• {} (`{}`)", provider.name(), provider.model()));
            if i == 0 {
                text.push_str(" default");
            }
            if provider.name() == current.name() {
                text.push_str(" ✅");
            }
            text.push('\n');
        }
        text.push_str("\nSwitch with /provider <name>.");
        text
    }

    /// Run `/provider [name|reset]` for a sender and return the reply.
    pub async fn apply(&self, sender_id: &str, args: &str) -> String {
        let arg = args.trim();
        let default = self.default_provider().name();

        if arg.is_empty() {
            let current = self.for_sender(sender_id).await;
            return format!(
                "You're using {} ({}). Use /provider <name> to switch or /provider reset to go back to {default}.",
                current.name(),
                current.model()
            );
        }

        if arg.eq_ignore_ascii_case("reset") {
            self.selected.lock().await.remove(sender_id);
            return format!("Switched back to the default provider ({default}).");
        }

        match self.find(arg) {
            Some(provider) => {
                let name = provider.name().to_string();
                info!("sender {sender_id} switched provider to {name}");
                let reply = format!("Switched to {name} ({}).", provider.model());
                self.selected
                    .lock()
                    .await
                    .insert(sender_id.to_string(), name);
                reply
            }
            None => format!(
                "Unknown provider '{arg}'. Available: {}.",
                self.names().join(", ")
            ),
        }
    }
}
