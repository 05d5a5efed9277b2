//! Host-facing side effects.
//!
//! The core never talks to the host directly; it drives a [`HostChannel`].
//! All calls are fire-and-forget.

use crate::selection::prompt::UnitPrompt;

/// Impact strength; unit selection is the only haptic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticStyle {
    Medium,
}

impl HapticStyle {
    pub fn label(self) -> &'static str {
        match self {
            Self::Medium => "medium",
        }
    }
}

pub trait HostChannel {
    fn send_data(&mut self, data: &str);
    fn show_popup(&mut self, prompt: &UnitPrompt);
    fn show_alert(&mut self, message: &str);
    fn haptic_impact(&mut self, style: HapticStyle);
    /// `None` hides the main button.
    fn set_main_button(&mut self, label: Option<&str>);
    fn open_link(&mut self, url: &str);
    fn close(&mut self);
}

/// Recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEffect {
    SendData(String),
    ShowPopup(UnitPrompt),
    ShowAlert(String),
    Haptic(HapticStyle),
    MainButton(Option<String>),
    OpenLink(String),
    Close,
}

/// Host channel that queues effects for the caller to replay.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    effects: Vec<HostEffect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> &[HostEffect] {
        &self.effects
    }

    pub fn drain(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }
}

impl HostChannel for EffectQueue {
    fn send_data(&mut self, data: &str) {
        self.effects.push(HostEffect::SendData(data.to_string()));
    }

    fn show_popup(&mut self, prompt: &UnitPrompt) {
        self.effects.push(HostEffect::ShowPopup(prompt.clone()));
    }

    fn show_alert(&mut self, message: &str) {
        self.effects.push(HostEffect::ShowAlert(message.to_string()));
    }

    fn haptic_impact(&mut self, style: HapticStyle) {
        self.effects.push(HostEffect::Haptic(style));
    }

    fn set_main_button(&mut self, label: Option<&str>) {
        self.effects
            .push(HostEffect::MainButton(label.map(str::to_string)));
    }

    fn open_link(&mut self, url: &str) {
        self.effects.push(HostEffect::OpenLink(url.to_string()));
    }

    fn close(&mut self) {
        self.effects.push(HostEffect::Close);
    }
}
