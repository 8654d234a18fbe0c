use crate::gateway::GatewayError;

/// Errors produced by the Discord adapter.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("gateway connection failed after {attempts} attempts")]
    ConnectExhausted { attempts: u32 },
}

/// Why a rule gave up on a message. Logged at the dispatcher boundary.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("gateway call failed: {0}")]
    Gateway(#[from] GatewayError),
}
