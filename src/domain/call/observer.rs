//! Call lifecycle observer interface

use crate::domain::call::aggregate::Call;

/// Receives call lifecycle callbacks from the coordinator.
///
/// The coordinator holds observers weakly: dropping the last `Arc` is enough
/// to stop delivery. Callbacks run on the coordinator's task and must not
/// block; call back into the coordinator freely, requests are queued.
///
/// Every method defaults to a no-op so implementors only pick what they
/// care about.
pub trait CallObserver: Send + Sync {
    /// An incoming call was answered
    fn on_call_received(&self, _call: &Call) {}

    /// An outgoing call was started by the native subsystem
    fn on_call_initiated(&self, _call: &Call) {}

    fn on_call_ended(&self, _call: &Call) {}

    fn on_mute_state_changed(&self, _call: &Call) {}

    /// The native subsystem activated or deactivated the audio session.
    /// Restarting local capture, if needed, is the observer's business.
    fn on_audio_session_changed(&self, _active: bool) {}
}
