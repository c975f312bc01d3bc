/// Lifecycle phases of a page request, in strict execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Tree constructed, lifecycle not started
    Created,
    Init,
    LoadState,
    LoadPostbackData,
    RaiseChangedEvents,
    RaisePostbackEvent,
    PreRender,
    Render,
    SaveState,
    Unload,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Created => "Created",
            Phase::Init => "Init",
            Phase::LoadState => "LoadState",
            Phase::LoadPostbackData => "LoadPostbackData",
            Phase::RaiseChangedEvents => "RaiseChangedEvents",
            Phase::RaisePostbackEvent => "RaisePostbackEvent",
            Phase::PreRender => "PreRender",
            Phase::Render => "Render",
            Phase::SaveState => "SaveState",
            Phase::Unload => "Unload",
        }
    }
}
