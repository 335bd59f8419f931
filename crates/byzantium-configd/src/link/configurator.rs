//! The bounded apply/validate state machine.

use super::{
    InterfaceState, LinkDriver, LinkField, LinkOutcome, LinkPhase, LinkSetting, LinkSpec,
    ValidationFailure,
};
use crate::net::NetworkDevice;
use crate::wireless::LinkStatus;

/// Brings a device into its requested link state.
pub trait Configure {
    /// Drive `state.device` to `state.spec`, trying at most `max_attempts`
    /// apply/validate cycles. Never fails outright: exhausting the budget is
    /// reported as [`LinkOutcome::Failed`].
    fn configure(&self, state: InterfaceState, max_attempts: u32) -> LinkOutcome;
}

impl<T: Configure + ?Sized> Configure for &T {
    fn configure(&self, state: InterfaceState, max_attempts: u32) -> LinkOutcome {
        (**self).configure(state, max_attempts)
    }
}

/// Configures devices through a [`LinkDriver`].
pub struct LinkConfigurator<D> {
    driver: D,
}

impl<D: LinkDriver> LinkConfigurator<D> {
    pub fn new(driver: D) -> Self {
        LinkConfigurator { driver }
    }

    /// Apply every parameter of `spec`, one command each.
    fn apply(&self, device: &NetworkDevice, spec: &LinkSpec) -> Result<(), ValidationFailure> {
        let settings = [
            LinkSetting::Mode(spec.mode),
            LinkSetting::Essid(&spec.essid),
            LinkSetting::Bssid(&spec.bssid),
            LinkSetting::Channel(spec.channel),
        ];
        for setting in settings {
            self.driver
                .apply(device, setting)
                .map_err(|e| ValidationFailure::Driver(e.to_string()))?;
        }
        Ok(())
    }

    /// Read the device's live status and compare it with `spec`.
    pub fn validate(&self, device: &NetworkDevice, spec: &LinkSpec) -> Result<(), ValidationFailure> {
        let text = self
            .driver
            .read_status(device)
            .map_err(|e| ValidationFailure::Driver(e.to_string()))?;
        check_status(&LinkStatus::parse(&text), spec)
    }
}

impl<D: LinkDriver> Configure for LinkConfigurator<D> {
    fn configure(&self, mut state: InterfaceState, max_attempts: u32) -> LinkOutcome {
        let device = state.device.clone();
        let role = state.role;
        state.validated = false;

        tracing::info!(%device, %role, max_attempts, "attempting to configure interface");

        let mut phase = LinkPhase::Down;
        if let Err(e) = self.driver.set_down(&device) {
            tracing::warn!(%device, %role, error = %e, "failed to take interface down");
        }

        let mut attempts = 0;
        while attempts < max_attempts {
            attempts += 1;
            phase = advance(&device, phase, LinkPhase::Configuring);

            if let Err(failure) = self.apply(&device, &state.spec) {
                tracing::warn!(%device, %role, attempt = attempts, %failure, "apply failed");
                continue;
            }

            phase = advance(&device, phase, LinkPhase::Validating);
            match self.validate(&device, &state.spec) {
                Ok(()) => break,
                Err(failure) => {
                    tracing::debug!(%device, %role, attempt = attempts, %failure, "validation failed");
                }
            }
        }

        if let Err(e) = self.driver.set_up(&device) {
            tracing::warn!(%device, %role, error = %e, "failed to bring interface up");
        }

        match self.validate(&device, &state.spec) {
            Ok(()) => {
                advance(&device, phase, LinkPhase::Up);
                state.validated = true;
                tracing::info!(%device, %role, attempts, "interface configured");
                LinkOutcome::Up(state)
            }
            Err(failure) => {
                advance(&device, phase, LinkPhase::Failed);
                tracing::warn!(%device, %role, attempts, %failure, "giving up on interface");
                LinkOutcome::Failed {
                    state,
                    attempts,
                    failure,
                }
            }
        }
    }
}

fn advance(device: &NetworkDevice, from: LinkPhase, to: LinkPhase) -> LinkPhase {
    if from != to {
        tracing::trace!(%device, from = from.as_str(), to = to.as_str(), "link phase");
    }
    to
}

/// Compare parsed status against `spec`: mode, ESSID, BSSID, then
/// frequency. Exact equality on every field.
pub fn check_status(status: &LinkStatus, spec: &LinkSpec) -> Result<(), ValidationFailure> {
    let mismatch = |field, expected: String, found: Option<String>| {
        Err(ValidationFailure::Mismatch {
            field,
            expected,
            found,
        })
    };

    if status.mode.as_deref() != Some(spec.mode.reported()) {
        return mismatch(LinkField::Mode, spec.mode.reported().into(), status.mode.clone());
    }
    if status.essid.as_deref() != Some(spec.essid.as_str()) {
        return mismatch(LinkField::Essid, spec.essid.clone(), status.essid.clone());
    }
    if status.bssid.as_deref() != Some(spec.bssid.as_str()) {
        return mismatch(LinkField::Bssid, spec.bssid.clone(), status.bssid.clone());
    }
    let expected = spec.frequency();
    if expected.is_none() || status.frequency != expected {
        return mismatch(
            LinkField::Frequency,
            expected.map_or_else(
                || format!("channel {} unallocated in {}", spec.channel, spec.spectrum),
                |f| f.to_string(),
            ),
            status.frequency.map(|f| f.to_string()),
        );
    }
    Ok(())
}
