use crate::chain::Chain;
use crate::settings::Settings;
use crate::support::ChainSupport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Creates one chain instance per logical channel. The first chain handled
/// is the system channel: a startup transport failure there is fatal and
/// must abort process startup, while later channels surface the error and
/// the process carries on.
pub struct Consenter {
    settings: Settings,
    create_system_channel: AtomicBool,
}

impl Consenter {
    pub fn new(settings: Settings) -> Consenter {
        Consenter { settings, create_system_channel: AtomicBool::new(true) }
    }

    pub fn handle_chain(&self, support: Arc<dyn ChainSupport>) -> Arc<Chain> {
        let is_system_channel = self.create_system_channel.swap(false, Ordering::SeqCst);
        Arc::new(Chain::new(is_system_channel, self.settings.clone(), support))
    }
}
