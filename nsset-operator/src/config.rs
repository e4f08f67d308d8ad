use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    #[envconfig(from = "NSOP_HTTP_PORT", default = "8088")]
    pub http_port: u16,

    /// Requeue interval after a successful pass, seconds.
    #[envconfig(from = "NSOP_REQUEUE_SECS", default = "300")]
    pub requeue_secs: u64,

    /// Settle wait after a namespace creation before any write into it,
    /// milliseconds. Covers the store's eventual-consistency lag.
    #[envconfig(from = "NSOP_SETTLE_WAIT_MS", default = "500")]
    pub settle_wait_ms: u64,

    /// Tear down all declared namespaces when the NamespaceSet itself is
    /// deleted. Off by default.
    #[envconfig(from = "NSOP_DELETE_ON_CR_REMOVAL", default = "false")]
    pub delete_on_cr_removal: bool,
}

impl OperatorConfig {
    pub fn settle_wait(&self) -> Duration {
        Duration::from_millis(self.settle_wait_ms)
    }

    pub fn requeue(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }
}
