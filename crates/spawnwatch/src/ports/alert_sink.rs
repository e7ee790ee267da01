//! Alert Sink Port
//!
//! Where sounds go. Desktop front ends attach audio; tests record calls.

use crate::domain::AlertKind;

pub trait AlertSink: Send + Sync {
    /// Play the sound for a kind of alert
    fn play(&self, kind: AlertKind);
}
