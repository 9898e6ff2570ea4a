//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{
    ActionRepo, ChronicleRepo, ClockPort, ImageGenPort, MasterGrantRepo, NarratorPort,
    RandomPort, RoleNotifier, SessionRepo,
};
use crate::stores::{PendingDiceRequests, PresenceRegistry};
use crate::use_cases::{
    self,
    session::{CreateSession, JoinSession, MasterAuthority, SessionManagement},
    DiceMediation, SubmitAction,
};

/// Main application state.
///
/// Holds the use cases. Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Persistence ports, injected directly.
#[derive(Clone)]
pub struct Repositories {
    pub sessions: Arc<dyn SessionRepo>,
    pub masters: Arc<dyn MasterGrantRepo>,
    pub actions: Arc<dyn ActionRepo>,
    pub chronicle: Arc<dyn ChronicleRepo>,
}

/// Everything outside the database the use cases talk to.
#[derive(Clone)]
pub struct Services {
    pub narrator: Arc<dyn NarratorPort>,
    /// `None` when image generation is not configured
    pub image_gen: Option<Arc<dyn ImageGenPort>>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

/// Container for all use cases.
pub struct UseCases {
    pub session: use_cases::SessionUseCases,
    pub dice: Arc<DiceMediation>,
    pub action: Arc<SubmitAction>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// `notifier` pushes master-authority changes to live connections; the
    /// WebSocket connection manager provides it.
    pub fn new(
        repos: Repositories,
        services: Services,
        presence: Arc<PresenceRegistry>,
        pending_dice: Arc<PendingDiceRequests>,
        notifier: Arc<dyn RoleNotifier>,
    ) -> Self {
        let clock = services.clock;
        let random = services.random;

        let masters = Arc::new(MasterAuthority::new(
            repos.sessions.clone(),
            repos.masters.clone(),
            clock.clone(),
            notifier,
        ));
        let session = use_cases::SessionUseCases::new(
            Arc::new(CreateSession::new(
                repos.sessions.clone(),
                clock.clone(),
                random.clone(),
            )),
            Arc::new(SessionManagement::new(
                repos.sessions.clone(),
                repos.actions.clone(),
                repos.chronicle.clone(),
                clock.clone(),
            )),
            masters.clone(),
            Arc::new(JoinSession::new(masters, presence, clock.clone())),
        );

        let dice = Arc::new(DiceMediation::new(pending_dice, clock.clone(), random));
        let action = Arc::new(SubmitAction::new(
            repos.sessions,
            repos.actions,
            repos.chronicle,
            services.narrator,
            services.image_gen,
            clock,
        ));

        Self {
            use_cases: UseCases {
                session,
                dice,
                action,
            },
        }
    }
}
